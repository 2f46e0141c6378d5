//! End-to-end export/import tests against the library API

use std::io::{Cursor, Read};

use serde_json::{json, Value};
use tempfile::TempDir;

use dashpack::archive::ArchiveWriter;
use dashpack::config::{paths::DashPaths, settings::KeyDerivationCost};
use dashpack::crypto::CredentialVault;
use dashpack::export::{ExportAssembler, ExportWriter};
use dashpack::import::{ImportOptions, ImportResult, Importer};
use dashpack::models::{
    Dashboard, Group, GroupLayout, GroupMember, Integration, LayoutRect, MediaImage,
    MediaLibrary, Widget, WidgetLayout,
};
use dashpack::storage::settings::{BRANDING, DEVICE_TEMPLATES};
use dashpack::storage::{Storage, StoreCounts};
use dashpack::PackError;

const TOKEN: &str = "s3cret-token";

fn fast_vault() -> CredentialVault {
    CredentialVault::new(KeyDerivationCost {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    })
}

fn empty_store(dir: &TempDir, name: &str) -> Storage {
    Storage::new(DashPaths::with_base_dir(dir.path().join(name))).unwrap()
}

fn place(storage: &Storage, widget: &Widget, x: i32) {
    storage
        .dashboards
        .set_widget_layout(WidgetLayout {
            widget_id: widget.id,
            dashboard_id: widget.dashboard_id,
            rect: LayoutRect::new(x, 0, 2, 2),
        })
        .unwrap();
}

/// Two dashboards, four widgets (one only inside a group, one both standalone
/// and grouped), one integration with a secret, branding with a logo, one
/// media library with one image referenced from a widget
fn populated_store(dir: &TempDir) -> Storage {
    let storage = empty_store(dir, "source");

    let mut hub = Integration::new("Hub", "homeassistant");
    hub.config.host = Some("hub.local".into());
    hub.config.fields.insert("token".into(), json!(TOKEN));
    let hub_id = hub.id;
    storage.integrations.upsert(hub).unwrap();

    let mut home = Dashboard::new("Home");
    home.is_default = true;
    let home_id = home.id;
    storage.dashboards.upsert_dashboard(home).unwrap();
    storage
        .dashboards
        .upsert_dashboard(Dashboard::new("Garage"))
        .unwrap();

    let clock = Widget::new(home_id, "clock").with_title("Clock");
    storage.dashboards.upsert_widget(clock.clone()).unwrap();
    place(&storage, &clock, 0);

    let mut weather = Widget::new(home_id, "weather").with_title("Weather");
    weather.integration_id = Some(hub_id);
    weather.config.set_integration_ref(Some(hub_id));
    storage.dashboards.upsert_widget(weather.clone()).unwrap();
    place(&storage, &weather, 2);

    let mut photo = Widget::new(home_id, "image").with_title("Photo");
    photo
        .config
        .extra
        .insert("src".into(), json!("/uploads/photo.png"));
    storage.dashboards.upsert_widget(photo.clone()).unwrap();
    place(&storage, &photo, 4);

    let sensor = Widget::new(home_id, "sensor").with_title("Sensor");
    storage.dashboards.upsert_widget(sensor.clone()).unwrap();

    let group = Group::new(home_id, "Status");
    let group_id = group.id;
    storage.dashboards.upsert_group(group).unwrap();
    storage
        .dashboards
        .set_group_layout(GroupLayout {
            group_id,
            dashboard_id: home_id,
            rect: LayoutRect::new(0, 4, 6, 3),
        })
        .unwrap();
    for (position, widget) in [&weather, &sensor].into_iter().enumerate() {
        storage
            .dashboards
            .add_member(GroupMember {
                group_id,
                widget_id: widget.id,
                position: position as u32,
            })
            .unwrap();
    }

    storage.assets.write("logo.png", b"logo-bytes").unwrap();
    storage
        .settings
        .set(
            BRANDING,
            json!({"title": "Lab", "logo_url": "/uploads/logo.png"}),
        )
        .unwrap();
    storage
        .settings
        .set(DEVICE_TEMPLATES, json!([{"id": "t1", "name": "Switch"}]))
        .unwrap();

    let library = MediaLibrary::new("Photos");
    let library_id = library.id;
    storage.media.upsert_library(library).unwrap();
    let stored = storage.assets.write("photo.png", b"png-bytes").unwrap();
    storage
        .media
        .insert_image(MediaImage::new(library_id, stored.filename, stored.size_bytes))
        .unwrap();

    storage
}

fn export_bytes(storage: &Storage, password: Option<&str>) -> Vec<u8> {
    let bundle = ExportAssembler::new(storage).assemble().unwrap();
    let writer = ExportWriter::new("test-source", fast_vault());
    let (cursor, _) = writer
        .write(&bundle, Cursor::new(Vec::new()), password)
        .unwrap();
    cursor.into_inner()
}

fn import(storage: &Storage, bytes: &[u8], options: ImportOptions<'_>) -> Result<ImportResult, PackError> {
    Importer::new(storage, fast_vault()).import(Cursor::new(bytes.to_vec()), &options)
}

/// Copy an archive, passing every entry's bytes through `edit`. The original
/// manifest is kept, so edited entries no longer match their checksums.
fn rewrite_archive(bytes: &[u8], edit: impl Fn(&str, Vec<u8>) -> Vec<u8>) -> Vec<u8> {
    let mut source = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut writer = ArchiveWriter::new(Cursor::new(Vec::new()));
    for i in 0..source.len() {
        let mut entry = source.by_index(i).unwrap();
        let name = entry.name().to_string();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        writer.add_unchecked(&name, &edit(&name, data)).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn edit_config(bytes: &[u8], edit: impl Fn(&mut Value)) -> Vec<u8> {
    rewrite_archive(bytes, |name, data| {
        if name != "config.json" {
            return data;
        }
        let mut config: Value = serde_json::from_slice(&data).unwrap();
        edit(&mut config);
        serde_json::to_vec(&config).unwrap()
    })
}

fn integration_token(storage: &Storage) -> Value {
    let integrations = storage.integrations.get_all().unwrap();
    assert_eq!(integrations.len(), 1);
    integrations[0]
        .config
        .fields
        .get("token")
        .cloned()
        .unwrap_or(Value::Null)
}

#[test]
fn round_trip_preserves_entity_counts() {
    let dir = TempDir::new().unwrap();
    let source = populated_store(&dir);
    let bytes = export_bytes(&source, None);

    let target = empty_store(&dir, "target");
    let result = import(&target, &bytes, ImportOptions::default()).unwrap();

    assert_eq!(result.total_errors(), 0, "{:?}", result);
    assert!(result.checksums_verified);
    assert_eq!(
        target.counts().unwrap(),
        StoreCounts {
            dashboards: 2,
            widgets: 4,
            groups: 1,
            integrations: 1,
            libraries: 1,
            images: 1,
        }
    );
    assert_eq!(source.counts().unwrap(), target.counts().unwrap());

    let home = target.dashboards.get_dashboard_by_name("Home").unwrap().unwrap();
    assert!(home.is_default);

    let hub = &target.integrations.get_all().unwrap()[0];
    let weather = target
        .dashboards
        .get_all_widgets()
        .unwrap()
        .into_iter()
        .find(|w| w.widget_type == "weather")
        .unwrap();
    assert_eq!(weather.integration_id, Some(hub.id));
    assert_eq!(weather.config.integration_ref(), Some(hub.id));

    let group = &target.dashboards.get_all_groups().unwrap()[0];
    assert_eq!(target.dashboards.get_members(group.id).unwrap().len(), 2);
    assert!(target.dashboards.get_group_layout(group.id).unwrap().is_some());
}

#[test]
fn plain_export_leaves_secrets_empty_with_warning() {
    let dir = TempDir::new().unwrap();
    let bytes = export_bytes(&populated_store(&dir), None);

    let target = empty_store(&dir, "target");
    let result = import(&target, &bytes, ImportOptions::default()).unwrap();

    assert_eq!(integration_token(&target), json!(""));
    assert!(result.credential_warning.is_none());
    assert!(result.warnings.iter().any(|w| w.contains("Hub")));
}

#[test]
fn tampered_member_aborts_before_mutation() {
    let dir = TempDir::new().unwrap();
    let bytes = export_bytes(&populated_store(&dir), None);
    let tampered = edit_config(&bytes, |config| {
        config["dashboards"][0]["name"] = json!("Hijacked");
    });

    let target = empty_store(&dir, "target");
    match import(&target, &tampered, ImportOptions::default()) {
        Err(PackError::ChecksumMismatch { paths }) => assert_eq!(paths, vec!["config.json"]),
        other => panic!("expected checksum mismatch, got {:?}", other),
    }
    assert_eq!(target.counts().unwrap(), StoreCounts::default());

    let result = import(
        &target,
        &tampered,
        ImportOptions {
            skip_checksums: true,
            ..ImportOptions::default()
        },
    )
    .unwrap();
    assert!(!result.checksums_verified);
    assert!(target
        .dashboards
        .get_dashboard_by_name("Hijacked")
        .unwrap()
        .is_some());
}

#[test]
fn tampered_asset_is_named_in_mismatch() {
    let dir = TempDir::new().unwrap();
    let bytes = export_bytes(&populated_store(&dir), None);
    let tampered = rewrite_archive(&bytes, |name, data| {
        if name.starts_with("images/") {
            b"other-bytes".to_vec()
        } else {
            data
        }
    });

    let target = empty_store(&dir, "target");
    let err = import(&target, &tampered, ImportOptions::default()).unwrap_err();
    match err {
        PackError::ChecksumMismatch { paths } => {
            assert_eq!(paths.len(), 1);
            assert!(paths[0].ends_with("/photo.png"));
        }
        other => panic!("expected checksum mismatch, got {:?}", other),
    }
}

#[test]
fn credentials_round_trip_with_matching_password() {
    let dir = TempDir::new().unwrap();
    let bytes = export_bytes(&populated_store(&dir), Some("correct horse"));

    let target = empty_store(&dir, "target");
    let result = import(
        &target,
        &bytes,
        ImportOptions {
            password: Some("correct horse"),
            ..ImportOptions::default()
        },
    )
    .unwrap();

    assert!(result.credential_warning.is_none());
    assert!(result.is_clean());
    assert_eq!(integration_token(&target), json!(TOKEN));
}

#[test]
fn wrong_password_warns_and_imports_the_rest() {
    let dir = TempDir::new().unwrap();
    let bytes = export_bytes(&populated_store(&dir), Some("correct horse"));

    let target = empty_store(&dir, "target");
    let result = import(
        &target,
        &bytes,
        ImportOptions {
            password: Some("battery staple"),
            ..ImportOptions::default()
        },
    )
    .unwrap();

    let warning = result.credential_warning.clone().unwrap();
    assert!(warning.contains("wrong password"));
    assert!(!warning.contains("correct horse"));
    assert!(!warning.contains(TOKEN));
    assert_eq!(integration_token(&target), json!(""));
    assert_eq!(target.counts().unwrap().widgets, 4);
}

#[test]
fn missing_password_warning_differs_from_missing_credentials() {
    let dir = TempDir::new().unwrap();
    let source = populated_store(&dir);
    let encrypted = export_bytes(&source, Some("correct horse"));
    let plain = export_bytes(&source, None);

    let no_password = import(&empty_store(&dir, "a"), &encrypted, ImportOptions::default())
        .unwrap()
        .credential_warning
        .unwrap();
    let no_credentials = import(
        &empty_store(&dir, "b"),
        &plain,
        ImportOptions {
            password: Some("correct horse"),
            ..ImportOptions::default()
        },
    )
    .unwrap()
    .credential_warning
    .unwrap();

    assert_ne!(no_password, no_credentials);
    assert!(no_password.contains("no password"));
    assert!(no_credentials.contains("no encrypted credentials"));
}

#[test]
fn malformed_credentials_warn_and_import_the_rest() {
    let dir = TempDir::new().unwrap();
    let bytes = export_bytes(&populated_store(&dir), Some("correct horse"));
    let broken = rewrite_archive(&bytes, |name, data| {
        if name == "credentials.json" {
            br#"{"ciphertext":5}"#.to_vec()
        } else {
            data
        }
    });

    let target = empty_store(&dir, "target");
    let result = import(
        &target,
        &broken,
        ImportOptions {
            password: Some("correct horse"),
            skip_checksums: true,
            ..ImportOptions::default()
        },
    )
    .unwrap();

    let warning = result.credential_warning.clone().unwrap();
    assert!(warning.contains("malformed"));
    assert!(!warning.contains("wrong password"));
    assert!(!warning.contains("correct horse"));
    assert_eq!(integration_token(&target), json!(""));
    assert_eq!(target.counts().unwrap().widgets, 4);
}

#[test]
fn excessive_key_derivation_cost_is_rejected_quickly() {
    let dir = TempDir::new().unwrap();
    let bytes = export_bytes(&populated_store(&dir), Some("correct horse"));
    let expensive = rewrite_archive(&bytes, |name, data| {
        if name != "credentials.json" {
            return data;
        }
        let mut payload: Value = serde_json::from_slice(&data).unwrap();
        payload["kdf"]["time_cost"] = json!(u32::MAX);
        serde_json::to_vec(&payload).unwrap()
    });

    let target = empty_store(&dir, "target");
    let result = import(
        &target,
        &expensive,
        ImportOptions {
            password: Some("correct horse"),
            skip_checksums: true,
            ..ImportOptions::default()
        },
    )
    .unwrap();

    assert!(result.credential_warning.unwrap().contains("malformed"));
    assert_eq!(integration_token(&target), json!(""));
    assert_eq!(result.dashboards.imported, 2);
}

#[test]
fn widget_pointing_at_unknown_integration_is_detached() {
    let dir = TempDir::new().unwrap();
    let bytes = export_bytes(&populated_store(&dir), None);
    let foreign = "00000000-0000-4000-8000-000000000000";
    let edited = edit_config(&bytes, |config| {
        for dashboard in config["dashboards"].as_array_mut().unwrap() {
            for widget in dashboard["widgets"].as_array_mut().unwrap() {
                if widget["widget_type"] == "weather" {
                    widget["integration_id"] = json!(foreign);
                    widget["config"]["integration_id"] = json!(foreign);
                }
            }
        }
    });

    let target = empty_store(&dir, "target");
    let result = import(
        &target,
        &edited,
        ImportOptions {
            skip_checksums: true,
            ..ImportOptions::default()
        },
    )
    .unwrap();
    assert_eq!(result.total_errors(), 0, "{:?}", result);

    let weather = target
        .dashboards
        .get_all_widgets()
        .unwrap()
        .into_iter()
        .find(|w| w.widget_type == "weather")
        .unwrap();
    assert_eq!(weather.integration_id, None);
    assert_eq!(weather.config.integration_ref(), None);
    let config = serde_json::to_value(&weather.config).unwrap();
    assert!(config.get("integration_id").is_none());
    assert!(!serde_json::to_string(&weather).unwrap().contains(foreign));
}

#[test]
fn reimport_reuses_dashboards_and_integrations_but_not_widgets() {
    let dir = TempDir::new().unwrap();
    let bytes = export_bytes(&populated_store(&dir), None);
    let target = empty_store(&dir, "target");

    import(&target, &bytes, ImportOptions::default()).unwrap();
    let second = import(&target, &bytes, ImportOptions::default()).unwrap();

    assert_eq!(second.dashboards.skipped, 2);
    assert_eq!(second.integrations.skipped, 1);
    assert_eq!(second.libraries.skipped, 1);

    let counts = target.counts().unwrap();
    assert_eq!(counts.dashboards, 2);
    assert_eq!(counts.integrations, 1);
    assert_eq!(counts.libraries, 1);
    assert_eq!(counts.widgets, 8);
    assert_eq!(counts.images, 2);

    let templates = target.settings.get_array(DEVICE_TEMPLATES).unwrap();
    assert_eq!(templates.len(), 1);
}

#[test]
fn replace_all_clears_existing_dashboards() {
    let dir = TempDir::new().unwrap();
    let bytes = export_bytes(&populated_store(&dir), None);

    let target = empty_store(&dir, "target");
    for name in ["Office", "Kitchen", "Hall"] {
        let dashboard = Dashboard::new(name);
        let widget = Widget::new(dashboard.id, "clock");
        target.dashboards.upsert_dashboard(dashboard).unwrap();
        target.dashboards.upsert_widget(widget.clone()).unwrap();
        place(&target, &widget, 0);
    }

    let result = import(
        &target,
        &bytes,
        ImportOptions {
            replace_all: true,
            ..ImportOptions::default()
        },
    )
    .unwrap();

    let cleared = result.cleared.unwrap();
    assert_eq!(cleared.dashboards, 3);
    assert_eq!(cleared.widgets, 3);
    assert_eq!(cleared.widget_layouts, 3);

    let names: Vec<String> = target
        .dashboards
        .get_all_dashboards()
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["Home", "Garage"]);
}

#[test]
fn one_invalid_widget_does_not_block_the_others() {
    let dir = TempDir::new().unwrap();
    let source = empty_store(&dir, "source");
    let wall = Dashboard::new("Wall");
    let wall_id = wall.id;
    source.dashboards.upsert_dashboard(wall).unwrap();
    for i in 0..10 {
        let widget = Widget::new(wall_id, "clock").with_title(format!("Clock {}", i));
        source.dashboards.upsert_widget(widget.clone()).unwrap();
        place(&source, &widget, i * 2);
    }

    let bytes = export_bytes(&source, None);
    let broken = edit_config(&bytes, |config| {
        let widget = &mut config["dashboards"][0]["widgets"][3];
        widget.as_object_mut().unwrap().remove("widget_type");
    });

    let target = empty_store(&dir, "target");
    let result = import(
        &target,
        &broken,
        ImportOptions {
            skip_checksums: true,
            ..ImportOptions::default()
        },
    )
    .unwrap();

    assert_eq!(result.widgets.imported, 9);
    assert_eq!(result.widgets.errors.len(), 1);
    assert!(result.widgets.errors[0].starts_with("Widget"));
    assert_eq!(result.dashboards.imported, 1);
    assert_eq!(target.counts().unwrap().widgets, 9);
}

#[test]
fn media_urls_are_rewritten_to_new_assets() {
    let dir = TempDir::new().unwrap();
    let bytes = export_bytes(&populated_store(&dir), None);

    let target = empty_store(&dir, "target");
    let result = import(&target, &bytes, ImportOptions::default()).unwrap();
    assert_eq!(result.rewritten_configs, 1);

    let photo = target
        .dashboards
        .get_all_widgets()
        .unwrap()
        .into_iter()
        .find(|w| w.widget_type == "image")
        .unwrap();
    let src = photo.config.extra["src"].as_str().unwrap().to_string();
    assert_ne!(src, "/uploads/photo.png");
    assert!(target.assets.resolve_url(&src).is_some());

    let images = target.media.get_libraries().unwrap();
    let image = &target.media.get_images(images[0].id).unwrap()[0];
    assert_eq!(image.url, src);
    assert_eq!(image.original_name, "photo.png");

    let branding = target.settings.get_object(BRANDING).unwrap();
    let logo = branding["logo_url"].as_str().unwrap();
    assert_ne!(logo, "/uploads/logo.png");
    assert!(target.assets.resolve_url(logo).is_some());
    assert_eq!(branding["title"], "Lab");
}

#[test]
fn unchecksummed_library_file_is_not_imported_after_verification() {
    let dir = TempDir::new().unwrap();
    let bytes = export_bytes(&populated_store(&dir), None);

    let mut source = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut writer = ArchiveWriter::new(Cursor::new(Vec::new()));
    let mut library_dir = String::new();
    for i in 0..source.len() {
        let mut entry = source.by_index(i).unwrap();
        let name = entry.name().to_string();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        if let Some(prefix) = name.strip_suffix("photo.png") {
            library_dir = prefix.to_string();
        }
        writer.add_unchecked(&name, &data).unwrap();
    }
    assert!(library_dir.starts_with("images/"));
    writer
        .add_unchecked(&format!("{}smuggled.png", library_dir), b"extra")
        .unwrap();
    let padded = writer.finish().unwrap().into_inner();

    let verified = empty_store(&dir, "verified");
    let result = import(&verified, &padded, ImportOptions::default()).unwrap();
    assert_eq!(result.images.imported, 1);
    assert!(result.warnings.iter().any(|w| w.contains("smuggled.png")));
    assert_eq!(verified.counts().unwrap().images, 1);

    let unverified = empty_store(&dir, "unverified");
    let result = import(
        &unverified,
        &padded,
        ImportOptions {
            skip_checksums: true,
            ..ImportOptions::default()
        },
    )
    .unwrap();
    assert_eq!(result.images.imported, 2);
}

#[test]
fn scratch_directories_are_removed() {
    let dir = TempDir::new().unwrap();
    let bytes = export_bytes(&populated_store(&dir), None);
    let target = empty_store(&dir, "target");

    import(&target, &bytes, ImportOptions::default()).unwrap();
    let tampered = edit_config(&bytes, |config| config["format_version"] = json!("9.9"));
    import(&target, &tampered, ImportOptions::default()).unwrap_err();
    import(&target, b"not a zip", ImportOptions::default()).unwrap_err();

    let scratch = target.paths().scratch_dir();
    let leftovers = std::fs::read_dir(&scratch)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}
