//! Import result report

use serde::Serialize;

/// What happened to one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Imported,
    /// Matched an existing record, which was reused
    Skipped,
}

/// Counters and error messages for one entity kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KindReport {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl KindReport {
    /// Account for one record's outcome
    pub fn record(&mut self, outcome: Result<Outcome, String>) {
        match outcome {
            Ok(Outcome::Imported) => self.imported += 1,
            Ok(Outcome::Skipped) => self.skipped += 1,
            Err(message) => {
                tracing::warn!(error = %message, "Record not imported");
                self.errors.push(message);
            }
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// Rows removed by replace-all mode before importing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearedCounts {
    pub dashboards: usize,
    pub widgets: usize,
    pub widget_layouts: usize,
    pub groups: usize,
    pub group_members: usize,
    pub group_layouts: usize,
    pub integrations: usize,
    pub libraries: usize,
    pub images: usize,
}

/// Per-kind outcome of one import run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportResult {
    pub integrations: KindReport,
    pub dashboards: KindReport,
    pub widgets: KindReport,
    pub groups: KindReport,
    pub group_members: KindReport,
    pub libraries: KindReport,
    pub images: KindReport,
    /// Branding, templates and network settings
    pub settings: KindReport,
    pub cleared: Option<ClearedCounts>,
    /// Set when credentials were expected or present but could not be applied
    pub credential_warning: Option<String>,
    /// Compatibility notes about the package
    pub warnings: Vec<String>,
    /// Widget and group configs whose media URLs were rewritten
    pub rewritten_configs: usize,
    pub checksums_verified: bool,
}

impl ImportResult {
    /// Every kind report with its display name
    pub fn kinds(&self) -> [(&'static str, &KindReport); 8] {
        [
            ("Integrations", &self.integrations),
            ("Dashboards", &self.dashboards),
            ("Widgets", &self.widgets),
            ("Groups", &self.groups),
            ("Group members", &self.group_members),
            ("Libraries", &self.libraries),
            ("Images", &self.images),
            ("Settings", &self.settings),
        ]
    }

    pub fn total_errors(&self) -> usize {
        self.kinds().iter().map(|(_, k)| k.error_count()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total_errors() == 0 && self.credential_warning.is_none()
    }
}
