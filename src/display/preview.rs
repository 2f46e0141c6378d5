//! Package summary and store count formatting

use crate::import::PackageSummary;
use crate::storage::StoreCounts;

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Format a preview summary as a detail view followed by a counts table
pub fn format_summary(summary: &PackageSummary) -> String {
    let mut output = String::new();

    output.push_str("Package\n");
    output.push_str(&format!("  Format version:   {}\n", summary.format_version));
    output.push_str(&format!("  App version:      {}\n", summary.app_version));
    output.push_str(&format!(
        "  Created:          {}\n",
        summary.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if !summary.producer.is_empty() {
        output.push_str(&format!("  Producer:         {}\n", summary.producer));
    }
    output.push_str(&format!("  Files:            {}\n", summary.total_files));
    output.push_str(&format!(
        "  Checksums:        {}\n",
        if summary.checksums_verified {
            "verified"
        } else {
            "not checked"
        }
    ));
    output.push('\n');

    let counts = &summary.counts;
    let rows = [
        ("Dashboards", counts.dashboards),
        ("Widgets", counts.widgets),
        ("Groups", counts.groups),
        ("Integrations", counts.integrations),
        ("Media libraries", counts.libraries),
        ("Images", counts.images),
        ("Device templates", counts.device_templates),
        ("Switch templates", counts.switch_templates),
    ];
    output.push_str(&format_count_table(&rows));
    output.push('\n');

    output.push_str(&format!("  Logo:                  {}\n", yes_no(summary.has_logo)));
    output.push_str(&format!("  Favicon:               {}\n", yes_no(summary.has_favicon)));
    output.push_str(&format!("  Branding:              {}\n", yes_no(summary.has_branding)));
    output.push_str(&format!(
        "  Encrypted credentials: {}\n",
        yes_no(summary.has_credentials)
    ));

    if !summary.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &summary.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}

/// Format store totals for `status`
pub fn format_store_counts(counts: &StoreCounts) -> String {
    format_count_table(&[
        ("Dashboards", counts.dashboards),
        ("Widgets", counts.widgets),
        ("Groups", counts.groups),
        ("Integrations", counts.integrations),
        ("Media libraries", counts.libraries),
        ("Images", counts.images),
    ])
}

fn format_count_table(rows: &[(&str, usize)]) -> String {
    let name_width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(4).max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:>8}\n",
        "Kind",
        "Count",
        name_width = name_width
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:->8}\n",
        "",
        "",
        name_width = name_width
    ));
    for (name, count) in rows {
        output.push_str(&format!(
            "{:<name_width$}  {:>8}\n",
            name,
            count,
            name_width = name_width
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::SummaryCounts;
    use chrono::Utc;

    fn summary() -> PackageSummary {
        PackageSummary {
            format_version: "1.0".into(),
            app_version: "0.1.0".into(),
            created_at: Utc::now(),
            producer: "lab".into(),
            total_files: 4,
            counts: SummaryCounts {
                dashboards: 2,
                widgets: 7,
                ..SummaryCounts::default()
            },
            has_logo: true,
            has_favicon: false,
            has_branding: true,
            has_credentials: false,
            checksums_verified: true,
            warnings: vec!["Integration 'Hub' has redacted fields".into()],
        }
    }

    #[test]
    fn test_format_summary() {
        let output = format_summary(&summary());
        assert!(output.contains("Format version:   1.0"));
        assert!(output.contains("Producer:         lab"));
        assert!(output.contains("Widgets"));
        assert!(output.contains("Logo:                  Yes"));
        assert!(output.contains("Warnings:\n  - Integration 'Hub'"));
    }

    #[test]
    fn test_store_counts_table_aligns() {
        let output = format_store_counts(&StoreCounts {
            dashboards: 3,
            ..StoreCounts::default()
        });
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[2].starts_with("Dashboards"));
        assert!(lines[2].ends_with("       3"));
    }
}
