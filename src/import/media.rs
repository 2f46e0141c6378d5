//! Media library import and asset URL rewriting

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::archive::{sanitize_entry_path, to_entry_name};
use crate::models::media::{mime_from_filename, upload_url};
use crate::models::{LibraryId, MediaImage, MediaLibrary};
use crate::package::LibraryListing;

use super::orchestrator::ImportContext;
use super::result::Outcome;

/// Import every library listed in the manifest along with the image files
/// physically present under its archive directory
pub fn import_media(ctx: &mut ImportContext<'_>) {
    let listings = ctx.staged.manifest.contents.libraries.clone();
    for listing in &listings {
        let library_id = match import_library(ctx, listing) {
            Ok((id, outcome)) => {
                ctx.result.libraries.record(Ok(outcome));
                id
            }
            Err(message) => {
                ctx.result.libraries.record(Err(message));
                continue;
            }
        };

        let files = match library_files(ctx, listing) {
            Ok(files) => files,
            Err(message) => {
                ctx.result.images.record(Err(message));
                continue;
            }
        };

        for filename in files {
            let outcome = import_image(ctx, listing, library_id, &filename);
            ctx.result.images.record(outcome);
        }
    }
}

fn import_library(
    ctx: &ImportContext<'_>,
    listing: &LibraryListing,
) -> Result<(LibraryId, Outcome), String> {
    let label = format!("Library '{}'", listing.name);
    let repo = &ctx.storage.media;

    if let Some(existing) = repo
        .get_library_by_name(&listing.name)
        .map_err(|e| format!("{}: {}", label, e))?
    {
        return Ok((existing.id, Outcome::Skipped));
    }

    let mut library = MediaLibrary::new(listing.name.clone());
    library.description = ctx
        .snapshot
        .media
        .libraries
        .iter()
        .filter_map(|r| r.valid())
        .find(|l| l.id == listing.library_id)
        .map(|l| l.description.clone())
        .unwrap_or_default();
    let id = library.id;

    repo.upsert_library(library)
        .map_err(|e| format!("{}: {}", label, e))?;
    Ok((id, Outcome::Imported))
}

/// Regular files under the listing's directory, sorted by name. After a
/// verified extraction only files covered by a manifest checksum qualify;
/// anything else is skipped with a warning.
fn library_files(
    ctx: &mut ImportContext<'_>,
    listing: &LibraryListing,
) -> Result<Vec<String>, String> {
    let relative = sanitize_entry_path(&listing.path)
        .map_err(|e| format!("Library '{}': {}", listing.name, e))?;
    let dir = ctx.staged.root().join(&relative);
    if !dir.is_dir() {
        debug!(path = %listing.path, "Library directory absent from package");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let entries = fs::read_dir(&dir)
        .map_err(|e| format!("Library '{}': {}", listing.name, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| format!("Library '{}': {}", listing.name, e))?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };

        let entry_name = to_entry_name(&relative.join(&name));
        if ctx.result.checksums_verified
            && !ctx.staged.manifest.checksums.contains_key(&entry_name)
        {
            warn!(entry = %entry_name, "Skipping image without a manifest checksum");
            ctx.result.warnings.push(format!(
                "Image '{}' in library '{}' has no manifest checksum and was not imported",
                name, listing.name
            ));
            continue;
        }
        files.push(name);
    }
    files.sort();
    Ok(files)
}

fn import_image(
    ctx: &mut ImportContext<'_>,
    listing: &LibraryListing,
    library_id: LibraryId,
    filename: &str,
) -> Result<Outcome, String> {
    let label = format!("Image '{}'", filename);
    let source = ctx
        .staged
        .root()
        .join(Path::new(&listing.path))
        .join(filename);

    let stored = ctx
        .storage
        .assets
        .import_file(&source)
        .map_err(|e| format!("{}: {}", label, e))?;

    let mut image = MediaImage::new(library_id, stored.filename.clone(), stored.size_bytes);
    let exported = ctx.snapshot.find_image(&listing.library_id, filename);
    match exported {
        Some(exported) => {
            image.original_name = if exported.original_name.is_empty() {
                filename.to_string()
            } else {
                exported.original_name.clone()
            };
            if !exported.mime_type.is_empty() {
                image.mime_type = exported.mime_type.clone();
            }
            image.width = exported.width;
            image.height = exported.height;
            image.alt_text = exported.alt_text.clone();
        }
        None => {
            image.original_name = filename.to_string();
            image.mime_type = mime_from_filename(filename).to_string();
        }
    }

    if let Err(e) = ctx.storage.media.insert_image(image) {
        if let Err(cleanup) = ctx.storage.assets.remove(&stored.filename) {
            warn!(file = %stored.filename, error = %cleanup, "Failed to remove orphaned asset");
        }
        return Err(format!("{}: {}", label, e));
    }

    if let Some(exported) = exported {
        ctx.remap.record_image_url(&exported.url, &stored.url);
    }
    ctx.remap.record_image_url(&upload_url(filename), &stored.url);
    debug!(from = %filename, to = %stored.filename, "Imported image");
    Ok(Outcome::Imported)
}

/// Replace every old image URL in persisted widget and group configs.
/// Returns how many configs changed.
pub fn rewrite_media_references(ctx: &mut ImportContext<'_>) -> usize {
    if !ctx.remap.has_image_urls() {
        return 0;
    }
    let storage = ctx.storage;
    let repo = &storage.dashboards;
    let mut rewritten = 0;

    match repo.get_all_widgets() {
        Ok(widgets) => {
            for mut widget in widgets {
                let mut changed = false;
                for (old, new) in ctx.remap.image_urls() {
                    changed |= widget.config.replace_url(old, new);
                }
                if !changed {
                    continue;
                }
                let label = widget.label();
                match repo.upsert_widget(widget) {
                    Ok(()) => rewritten += 1,
                    Err(e) => ctx
                        .result
                        .widgets
                        .record(Err(format!("Widget '{}': rewriting media URLs: {}", label, e))),
                }
            }
        }
        Err(e) => ctx.result.warnings.push(format!("Could not scan widgets: {}", e)),
    }

    match repo.get_all_groups() {
        Ok(groups) => {
            for mut group in groups {
                let mut changed = false;
                for (old, new) in ctx.remap.image_urls() {
                    changed |= group.config.replace_url(old, new);
                }
                if !changed {
                    continue;
                }
                let name = group.name.clone();
                match repo.upsert_group(group) {
                    Ok(()) => rewritten += 1,
                    Err(e) => ctx
                        .result
                        .groups
                        .record(Err(format!("Group '{}': rewriting media URLs: {}", name, e))),
                }
            }
        }
        Err(e) => ctx.result.warnings.push(format!("Could not scan groups: {}", e)),
    }

    debug!(rewritten, "Rewrote media references");
    rewritten
}
