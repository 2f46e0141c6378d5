//! Widget group model
//!
//! A group is a titled container placed on a dashboard; its members are
//! widgets of the same dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::blob::replace_in_map;
use super::dashboard::LayoutRect;
use super::ids::{DashboardId, GroupId, WidgetId};

/// Group configuration blob
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Whether the group can be collapsed in the UI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsible: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GroupConfig {
    /// Replace an asset URL wherever it appears in the free-form part
    pub fn replace_url(&mut self, from: &str, to: &str) -> bool {
        replace_in_map(&mut self.extra, from, to)
    }
}

/// A widget group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub dashboard_id: DashboardId,
    pub name: String,
    #[serde(default)]
    pub config: GroupConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    /// Create a new group on a dashboard
    pub fn new(dashboard_id: DashboardId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: GroupId::new(),
            dashboard_id,
            name: name.into(),
            config: GroupConfig::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate the group
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Group name cannot be empty".into());
        }
        Ok(())
    }
}

/// Membership of a widget in a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub group_id: GroupId,
    pub widget_id: WidgetId,
    /// Order inside the group
    #[serde(default)]
    pub position: u32,
}

/// Placement of a group on its dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLayout {
    pub group_id: GroupId,
    pub dashboard_id: DashboardId,
    #[serde(flatten)]
    pub rect: LayoutRect,
}
