//! Package preview
//!
//! Reads an archive's manifest and config without touching any store and
//! reports what an import would bring in.

use std::collections::BTreeMap;
use std::io::{Read, Seek};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::PackResult;
use crate::package::{format_major, ConfigSnapshot, Manifest, APP_VERSION, FORMAT_VERSION};

use super::staging::StagedPackage;

/// Entity totals found in a package
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCounts {
    pub dashboards: usize,
    pub widgets: usize,
    pub groups: usize,
    pub integrations: usize,
    pub libraries: usize,
    pub images: usize,
    pub device_templates: usize,
    pub switch_templates: usize,
}

/// What a package contains
#[derive(Debug, Clone, Serialize)]
pub struct PackageSummary {
    pub format_version: String,
    pub app_version: String,
    pub created_at: DateTime<Utc>,
    pub producer: String,
    pub total_files: usize,
    pub counts: SummaryCounts,
    pub has_logo: bool,
    pub has_favicon: bool,
    pub has_branding: bool,
    pub has_credentials: bool,
    pub checksums_verified: bool,
    pub warnings: Vec<String>,
}

/// Summarize an archive. The scratch directory is removed before returning,
/// whether or not the preview succeeds.
pub fn preview<R: Read + Seek>(
    source: R,
    scratch_root: &Path,
    verify_checksums: bool,
) -> PackResult<PackageSummary> {
    let staged = StagedPackage::extract(source, scratch_root)?;
    let summary = summarize(&staged, verify_checksums);
    staged.close();
    summary
}

fn summarize(staged: &StagedPackage, verify_checksums: bool) -> PackResult<PackageSummary> {
    if verify_checksums {
        staged.verify_checksums()?;
    }
    let snapshot = staged.load_snapshot()?;
    let manifest = &staged.manifest;
    let has_credentials = staged.has_credentials();

    let summary = PackageSummary {
        format_version: manifest.format_version.clone(),
        app_version: manifest.app_version.clone(),
        created_at: manifest.created_at,
        producer: manifest.producer.clone(),
        total_files: manifest.total_files,
        counts: SummaryCounts {
            dashboards: snapshot.dashboard_count(),
            widgets: snapshot.widget_count(),
            groups: snapshot.group_count(),
            integrations: snapshot.integration_count(),
            libraries: snapshot.library_count().max(manifest.contents.libraries.len()),
            images: snapshot.image_count().max(manifest.image_count()),
            device_templates: snapshot.templates.device_templates.len(),
            switch_templates: snapshot.templates.switch_templates.len(),
        },
        has_logo: manifest.contents.logo.is_some(),
        has_favicon: manifest.contents.favicon.is_some(),
        has_branding: !snapshot.branding.is_empty(),
        has_credentials,
        checksums_verified: verify_checksums,
        warnings: compatibility_warnings(manifest, &snapshot, has_credentials),
    };

    info!(
        dashboards = summary.counts.dashboards,
        warnings = summary.warnings.len(),
        "Package previewed"
    );
    Ok(summary)
}

/// Warnings about versions and secrets that an import cannot restore
pub fn compatibility_warnings(
    manifest: &Manifest,
    snapshot: &ConfigSnapshot,
    has_credentials: bool,
) -> Vec<String> {
    let mut warnings = Vec::new();

    if format_major(&manifest.format_version) != format_major(FORMAT_VERSION) {
        warnings.push(format!(
            "Package format {} differs from supported format {}",
            manifest.format_version, FORMAT_VERSION
        ));
    }

    if manifest.app_version != APP_VERSION {
        warnings.push(format!(
            "Package was created by version {}; this is version {}",
            manifest.app_version, APP_VERSION
        ));
    }

    if !has_credentials {
        let mut by_integration: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (integration, field) in snapshot.redacted_fields() {
            by_integration.entry(integration).or_default().push(field);
        }
        for (integration, fields) in by_integration {
            warnings.push(format!(
                "Integration '{}' has redacted fields ({}) and the package has no encrypted credentials; they will be left empty",
                integration,
                fields.join(", ")
            ));
        }
    }

    warnings
}
