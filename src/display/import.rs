//! Import and export report formatting

use crate::export::ExportReport;
use crate::import::ImportResult;

/// Format an import result: cleared counts, a per-kind table, then warnings
/// and every error message
pub fn format_import_result(result: &ImportResult) -> String {
    let mut output = String::new();

    if let Some(cleared) = &result.cleared {
        output.push_str(&format!(
            "Cleared: {} dashboards, {} widgets, {} groups, {} integrations, {} libraries, {} images\n\n",
            cleared.dashboards,
            cleared.widgets,
            cleared.groups,
            cleared.integrations,
            cleared.libraries,
            cleared.images
        ));
    }

    let kinds = result.kinds();
    let name_width = kinds.iter().map(|(name, _)| name.len()).max().unwrap_or(4);

    output.push_str(&format!(
        "{:<name_width$}  {:>8}  {:>8}  {:>6}\n",
        "Kind",
        "Imported",
        "Skipped",
        "Errors",
        name_width = name_width
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:->8}  {:->8}  {:->6}\n",
        "",
        "",
        "",
        "",
        name_width = name_width
    ));
    for (name, report) in &kinds {
        output.push_str(&format!(
            "{:<name_width$}  {:>8}  {:>8}  {:>6}\n",
            name,
            report.imported,
            report.skipped,
            report.error_count(),
            name_width = name_width
        ));
    }

    if result.rewritten_configs > 0 {
        output.push_str(&format!(
            "\nRewrote media URLs in {} configuration(s)\n",
            result.rewritten_configs
        ));
    }
    if !result.checksums_verified {
        output.push_str("\nChecksum verification was skipped\n");
    }

    if let Some(warning) = &result.credential_warning {
        output.push_str(&format!("\nCredentials: {}\n", warning));
    }

    if !result.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &result.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    if result.total_errors() > 0 {
        output.push_str("\nErrors:\n");
        for (_, report) in &kinds {
            for error in &report.errors {
                output.push_str(&format!("  - {}\n", error));
            }
        }
    }

    output
}

/// One-paragraph description of a written archive
pub fn format_export_report(report: &ExportReport) -> String {
    let contents = &report.manifest.contents;
    let mut output = format!(
        "Exported to: {}\n  Size:        {} bytes\n  Files:       {}\n  Libraries:   {}\n  Credentials: {}\n",
        report.path.display(),
        report.size_bytes,
        report.manifest.total_files,
        contents.libraries.len(),
        if contents.has_credentials {
            "encrypted"
        } else {
            "not included"
        }
    );

    if report.unprotected_secrets {
        output.push_str(
            "\nNote: integration secrets were redacted. Re-run with --encrypt to include them.\n",
        );
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{ClearedCounts, Outcome};

    #[test]
    fn test_format_import_result_lists_errors() {
        let mut result = ImportResult {
            checksums_verified: true,
            ..ImportResult::default()
        };
        result.widgets.record(Ok(Outcome::Imported));
        result.widgets.record(Err("Widget 'Clock': missing type".into()));
        result.dashboards.record(Ok(Outcome::Skipped));
        result.cleared = Some(ClearedCounts {
            dashboards: 2,
            ..ClearedCounts::default()
        });

        let output = format_import_result(&result);
        assert!(output.starts_with("Cleared: 2 dashboards"));
        assert!(output.contains("Errors:\n  - Widget 'Clock': missing type"));
        assert!(!output.contains("Checksum verification was skipped"));
    }

    #[test]
    fn test_format_import_result_credential_warning() {
        let result = ImportResult {
            credential_warning: Some("wrong password".into()),
            ..ImportResult::default()
        };
        let output = format_import_result(&result);
        assert!(output.contains("Credentials: wrong password"));
        assert!(output.contains("Checksum verification was skipped"));
    }
}
