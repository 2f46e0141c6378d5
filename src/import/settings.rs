//! Settings blob import: branding, templates and network topology

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::models::media::local_upload_name;
use crate::storage::settings::{
    BRANDING, DEVICE_TEMPLATES, FAVICON_URL, LOGO_URL, NETWORK_CONNECTIONS, NETWORK_DEVICES,
    NIC_MAPPINGS, PORT_MAPPINGS, SWITCH_TEMPLATES, TEMPLATE_SETTINGS,
};

use super::orchestrator::ImportContext;
use super::result::Outcome;

/// Import branding (with its asset files), templates and network settings
pub fn import_settings(ctx: &mut ImportContext<'_>) {
    let outcome = import_branding(ctx);
    ctx.result.settings.record(outcome);

    let snapshot = ctx.snapshot;
    for (key, incoming) in [
        (DEVICE_TEMPLATES, &snapshot.templates.device_templates),
        (SWITCH_TEMPLATES, &snapshot.templates.switch_templates),
    ] {
        if incoming.is_empty() {
            continue;
        }
        let outcome = import_templates(ctx, key, incoming);
        ctx.result.settings.record(outcome);
    }

    if let Some(editor) = &snapshot.templates.editor_settings {
        let outcome = set_blob(ctx, TEMPLATE_SETTINGS, editor.clone());
        ctx.result.settings.record(outcome);
    }

    let network = &snapshot.network;
    for (key, value) in [
        (NETWORK_DEVICES, array_or_null(&network.devices)),
        (NETWORK_CONNECTIONS, array_or_null(&network.connections)),
        (PORT_MAPPINGS, network.port_mappings.clone()),
        (NIC_MAPPINGS, network.nic_mappings.clone()),
    ] {
        if value.is_null() {
            continue;
        }
        let outcome = set_blob(ctx, key, value);
        ctx.result.settings.record(outcome);
    }
}

fn array_or_null(items: &[Value]) -> Value {
    if items.is_empty() {
        Value::Null
    } else {
        Value::Array(items.to_vec())
    }
}

fn set_blob(ctx: &ImportContext<'_>, key: &str, value: Value) -> Result<Outcome, String> {
    ctx.storage
        .settings
        .set(key, value)
        .map(|_| Outcome::Imported)
        .map_err(|e| format!("Setting '{}': {}", key, e))
}

/// Merge archived branding keys over the existing ones. Packaged logo and
/// favicon files are copied into the asset store under new names first and
/// removed again if the branding blob cannot be written.
fn import_branding(ctx: &mut ImportContext<'_>) -> Result<Outcome, String> {
    let mut incoming = ctx.snapshot.branding.clone();
    if incoming.is_empty() {
        return Ok(Outcome::Skipped);
    }

    let staged = ctx.staged;
    let contents = &staged.manifest.contents;
    let entries = [(LOGO_URL, &contents.logo), (FAVICON_URL, &contents.favicon)];
    let sources: Vec<(&str, PathBuf)> = entries
        .into_iter()
        .filter_map(|(key, entry)| {
            let source = staged.entry_path(entry.as_deref()?)?;
            source.is_file().then_some((key, source))
        })
        .collect();
    let paths: Vec<&Path> = sources.iter().map(|(_, path)| path.as_path()).collect();

    let assets = &ctx.storage.assets;
    let stored = assets
        .import_files(&paths)
        .map_err(|e| format!("Branding assets: {}", e))?;

    let mut rewritten = Vec::new();
    for ((key, _), asset) in sources.iter().zip(&stored) {
        if let Some(Value::String(old_url)) = incoming.get(*key) {
            if local_upload_name(old_url).is_some() {
                rewritten.push((old_url.clone(), asset.url.clone()));
            }
        }
        debug!(key, url = %asset.url, "Imported branding asset");
        incoming.insert(key.to_string(), Value::String(asset.url.clone()));
    }

    let settings = &ctx.storage.settings;
    let written = settings.get_object(BRANDING).and_then(|mut branding| {
        branding.extend(incoming);
        settings.set(BRANDING, Value::Object(branding))
    });
    if let Err(e) = written {
        assets.discard(&stored);
        return Err(format!("Branding: {}", e));
    }

    for (old_url, new_url) in &rewritten {
        ctx.remap.record_image_url(old_url, new_url);
    }
    Ok(Outcome::Imported)
}

fn import_templates(
    ctx: &ImportContext<'_>,
    key: &str,
    incoming: &[Value],
) -> Result<Outcome, String> {
    let existing = if ctx.replace_all {
        Vec::new()
    } else {
        ctx.storage
            .settings
            .get_array(key)
            .map_err(|e| format!("Setting '{}': {}", key, e))?
    };

    let (merged, added) = merge_templates(existing, incoming);
    debug!(key, added, total = merged.len(), "Merged templates");

    set_blob(ctx, key, Value::Array(merged))
}

/// Stable identifier of a template, if it has one
fn template_id(template: &Value) -> Option<String> {
    match template.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Append incoming templates whose id is not already present. Templates
/// without an id are appended unless an identical one exists. Existing
/// templates win on id conflicts.
pub fn merge_templates(mut existing: Vec<Value>, incoming: &[Value]) -> (Vec<Value>, usize) {
    let mut ids: HashSet<String> = existing.iter().filter_map(template_id).collect();
    let mut added = 0;

    for template in incoming {
        let duplicate = match template_id(template) {
            Some(id) => !ids.insert(id),
            None => existing.contains(template),
        };
        if !duplicate {
            existing.push(template.clone());
            added += 1;
        }
    }

    (existing, added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_templates_by_id() {
        let existing = vec![json!({"id": "a", "ports": 8})];
        let incoming = vec![
            json!({"id": "a", "ports": 24}),
            json!({"id": "b", "ports": 48}),
            json!({"id": "b", "ports": 96}),
        ];

        let (merged, added) = merge_templates(existing, &incoming);
        assert_eq!(added, 1);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0]["ports"], 8);
        assert_eq!(merged[1]["id"], "b");
    }

    #[test]
    fn test_merge_templates_without_ids() {
        let existing = vec![json!({"name": "rack"})];
        let incoming = vec![json!({"name": "rack"}), json!({"name": "shelf"})];

        let (merged, added) = merge_templates(existing, &incoming);
        assert_eq!(added, 1);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_numeric_ids() {
        let (merged, added) = merge_templates(vec![json!({"id": 1})], &[json!({"id": 1})]);
        assert_eq!(added, 0);
        assert_eq!(merged.len(), 1);
    }
}
