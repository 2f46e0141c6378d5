//! Dashboard model
//!
//! A dashboard is a named canvas holding standalone widgets and widget groups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::ids::{DashboardId, WidgetId};

/// Grid placement of a widget or group on a dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LayoutRect {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "w")]
    pub width: u32,
    #[serde(rename = "h")]
    pub height: u32,
}

impl LayoutRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    /// Unique identifier
    pub id: DashboardId,

    /// Display name, unique per store (case-insensitive)
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// The dashboard shown when none is selected
    #[serde(default)]
    pub is_default: bool,

    /// Sort order for display
    #[serde(default)]
    pub sort_order: i32,

    /// Free-form presentation settings (theme, columns, background...)
    #[serde(default)]
    pub settings: Map<String, Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dashboard {
    /// Create a new dashboard with default values
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: DashboardId::new(),
            name: name.into(),
            description: String::new(),
            is_default: false,
            sort_order: 0,
            settings: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate the dashboard
    pub fn validate(&self) -> Result<(), DashboardValidationError> {
        if self.name.trim().is_empty() {
            return Err(DashboardValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(DashboardValidationError::NameTooLong(self.name.len()));
        }

        Ok(())
    }
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default {
            write!(f, "{} (default)", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Standalone placement of a widget on a dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetLayout {
    pub widget_id: WidgetId,
    pub dashboard_id: DashboardId,
    #[serde(flatten)]
    pub rect: LayoutRect,
}

/// Validation errors for dashboards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardValidationError {
    EmptyName,
    NameTooLong(usize),
}

impl fmt::Display for DashboardValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Dashboard name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Dashboard name too long ({} chars, max 100)", len)
            }
        }
    }
}

impl std::error::Error for DashboardValidationError {}
