//! Config snapshot document
//!
//! The whole exported state as one JSON document. Identifiers are kept as
//! strings: they are the source instance's ids and only ever used as keys
//! into the import-time remap tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{GroupConfig, IntegrationConfig, LayoutRect, WidgetConfig};

use super::record::Record;

/// A widget with its standalone placement, if it has one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedWidget {
    pub id: String,
    pub widget_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub integration_id: Option<String>,
    #[serde(default)]
    pub config: WidgetConfig,
    #[serde(default)]
    pub layout: Option<LayoutRect>,
}

/// A widget's membership in a group, carrying the full widget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedMember {
    pub widget_id: String,
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub widget: Option<ExportedWidget>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub config: GroupConfig,
    #[serde(default)]
    pub layout: Option<LayoutRect>,
    #[serde(default)]
    pub members: Vec<Record<ExportedMember>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedDashboard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub settings: Map<String, Value>,
    /// Widgets placed directly on the dashboard, or belonging to no group
    #[serde(default)]
    pub widgets: Vec<Record<ExportedWidget>>,
    #[serde(default)]
    pub groups: Vec<Record<ExportedGroup>>,
}

/// An integration with secrets replaced by the redaction placeholder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedIntegration {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub integration_type: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub config: IntegrationConfig,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateSnapshot {
    #[serde(default)]
    pub device_templates: Vec<Value>,
    #[serde(default)]
    pub switch_templates: Vec<Value>,
    #[serde(default)]
    pub editor_settings: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    #[serde(default)]
    pub devices: Vec<Value>,
    #[serde(default)]
    pub connections: Vec<Value>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub port_mappings: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub nic_mappings: Value,
}

/// Image metadata; the bytes live under the library's archive directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedImage {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub original_name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub alt_text: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedLibrary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<ExportedImage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaSnapshot {
    #[serde(default)]
    pub libraries: Vec<Record<ExportedLibrary>>,
}

/// Full exported state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub format_version: String,
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub dashboards: Vec<Record<ExportedDashboard>>,
    #[serde(default)]
    pub integrations: Vec<Record<ExportedIntegration>>,
    #[serde(default)]
    pub branding: Map<String, Value>,
    #[serde(default)]
    pub templates: TemplateSnapshot,
    #[serde(default)]
    pub network: NetworkSnapshot,
    #[serde(default)]
    pub media: MediaSnapshot,
}

impl ConfigSnapshot {
    pub fn dashboard_count(&self) -> usize {
        self.dashboards.len()
    }

    /// Distinct widgets, whether placed standalone or only inside a group
    pub fn widget_count(&self) -> usize {
        let mut ids = std::collections::BTreeSet::new();
        for dashboard in self.dashboards.iter().filter_map(Record::valid) {
            for widget in dashboard.widgets.iter().filter_map(Record::valid) {
                ids.insert(widget.id.as_str());
            }
            for group in dashboard.groups.iter().filter_map(Record::valid) {
                for member in group.members.iter().filter_map(Record::valid) {
                    ids.insert(member.widget_id.as_str());
                }
            }
        }
        ids.len()
    }

    pub fn group_count(&self) -> usize {
        self.dashboards
            .iter()
            .filter_map(Record::valid)
            .map(|d| d.groups.len())
            .sum()
    }

    pub fn integration_count(&self) -> usize {
        self.integrations.len()
    }

    pub fn library_count(&self) -> usize {
        self.media.libraries.len()
    }

    pub fn image_count(&self) -> usize {
        self.media
            .libraries
            .iter()
            .filter_map(Record::valid)
            .map(|l| l.images.len())
            .sum()
    }

    /// `(integration name, field)` for every redacted secret in the snapshot
    pub fn redacted_fields(&self) -> Vec<(String, String)> {
        self.integrations
            .iter()
            .filter_map(Record::valid)
            .flat_map(|i| {
                i.config
                    .redacted_fields()
                    .into_iter()
                    .map(move |field| (i.name.clone(), field))
            })
            .collect()
    }

    /// Look up an image record by library id and filename
    pub fn find_image(&self, library_id: &str, filename: &str) -> Option<&ExportedImage> {
        self.media
            .libraries
            .iter()
            .filter_map(Record::valid)
            .find(|l| l.id == library_id)?
            .images
            .iter()
            .find(|i| i.filename == filename)
    }
}
