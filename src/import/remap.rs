//! Identifier remapping
//!
//! Records, for one import run, which target-store identifier each source
//! identifier became. Keys are the ids as written in the archive.

use std::collections::{BTreeMap, HashMap};

use crate::models::{DashboardId, IntegrationId, WidgetId};

/// Old id -> new id tables built while importing
#[derive(Debug, Default)]
pub struct IdentityRemap {
    dashboards: HashMap<String, DashboardId>,
    integrations: HashMap<String, IntegrationId>,
    widgets: HashMap<String, WidgetId>,
    image_urls: BTreeMap<String, String>,
}

impl IdentityRemap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_dashboard(&mut self, old: &str, new: DashboardId) {
        self.dashboards.insert(old.to_string(), new);
    }

    pub fn map_dashboard(&self, old: &str) -> Option<DashboardId> {
        self.dashboards.get(old).copied()
    }

    pub fn record_integration(&mut self, old: &str, new: IntegrationId) {
        self.integrations.insert(old.to_string(), new);
    }

    /// New id for an archived integration reference; `None` when the
    /// reference does not resolve to anything imported in this run
    pub fn map_integration(&self, old: &str) -> Option<IntegrationId> {
        self.integrations.get(old.trim()).copied()
    }

    pub fn record_widget(&mut self, old: &str, new: WidgetId) {
        self.widgets.insert(old.to_string(), new);
    }

    pub fn map_widget(&self, old: &str) -> Option<WidgetId> {
        self.widgets.get(old).copied()
    }

    /// Record a rewritten asset URL; identical URLs are ignored
    pub fn record_image_url(&mut self, old: &str, new: &str) {
        if !old.is_empty() && old != new {
            self.image_urls.insert(old.to_string(), new.to_string());
        }
    }

    pub fn map_image_url(&self, old: &str) -> Option<&str> {
        self.image_urls.get(old).map(String::as_str)
    }

    /// Every old URL -> new URL pair
    pub fn image_urls(&self) -> impl Iterator<Item = (&str, &str)> {
        self.image_urls
            .iter()
            .map(|(old, new)| (old.as_str(), new.as_str()))
    }

    pub fn has_image_urls(&self) -> bool {
        !self.image_urls.is_empty()
    }
}
