//! Widget model
//!
//! Widgets render data from an integration (or static content) on a dashboard.
//! Their configuration is a JSON blob; the fields the pipeline needs to
//! rewrite are decoded into typed members and everything else is preserved
//! in `extra`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::blob::replace_in_map;
use super::ids::{DashboardId, IntegrationId, WidgetId};

/// Widget configuration blob
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Secondary integration reference carried inside the blob
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_id: Option<String>,

    /// Refresh interval in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<u64>,

    /// Everything else, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WidgetConfig {
    /// Parse the secondary integration reference, if it is a valid id
    pub fn integration_ref(&self) -> Option<IntegrationId> {
        self.integration_id
            .as_deref()
            .and_then(|s| IntegrationId::parse(s).ok())
    }

    /// Rewrite the secondary integration reference.
    ///
    /// `None` drops the field so the widget never points at a foreign id.
    pub fn set_integration_ref(&mut self, id: Option<IntegrationId>) {
        self.integration_id = id.map(|id| id.as_uuid().to_string());
    }

    /// Replace an asset URL wherever it appears in the free-form part
    pub fn replace_url(&mut self, from: &str, to: &str) -> bool {
        replace_in_map(&mut self.extra, from, to)
    }
}

/// A dashboard widget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Widget {
    /// Unique identifier
    pub id: WidgetId,

    /// Owning dashboard
    pub dashboard_id: DashboardId,

    /// Renderer key (e.g. "clock", "weather", "image")
    pub widget_type: String,

    #[serde(default)]
    pub title: String,

    /// Integration supplying live data
    #[serde(default)]
    pub integration_id: Option<IntegrationId>,

    #[serde(default)]
    pub config: WidgetConfig,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Widget {
    /// Create a new widget on a dashboard
    pub fn new(dashboard_id: DashboardId, widget_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: WidgetId::new(),
            dashboard_id,
            widget_type: widget_type.into(),
            title: String::new(),
            integration_id: None,
            config: WidgetConfig::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder-style title setter
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Human-readable label for error messages
    pub fn label(&self) -> String {
        if self.title.is_empty() {
            format!("{} {}", self.widget_type, self.id)
        } else {
            self.title.clone()
        }
    }

    /// Validate the widget
    pub fn validate(&self) -> Result<(), WidgetValidationError> {
        if self.widget_type.trim().is_empty() {
            return Err(WidgetValidationError::MissingType);
        }

        if self.title.len() > 200 {
            return Err(WidgetValidationError::TitleTooLong(self.title.len()));
        }

        Ok(())
    }
}

impl fmt::Display for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.label(), self.widget_type)
    }
}

/// Validation errors for widgets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetValidationError {
    MissingType,
    TitleTooLong(usize),
}

impl fmt::Display for WidgetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingType => write!(f, "Widget type cannot be empty"),
            Self::TitleTooLong(len) => write!(f, "Widget title too long ({} chars, max 200)", len),
        }
    }
}

impl std::error::Error for WidgetValidationError {}
