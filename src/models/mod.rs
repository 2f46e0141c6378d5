//! Core data models for dashpack
//!
//! This module contains the entities of the dashboard application that an
//! archive captures: dashboards, widgets, groups, integrations and media.

pub mod blob;
pub mod dashboard;
pub mod group;
pub mod ids;
pub mod integration;
pub mod media;
pub mod widget;

pub use dashboard::{Dashboard, LayoutRect, WidgetLayout};
pub use group::{Group, GroupConfig, GroupLayout, GroupMember};
pub use ids::{DashboardId, GroupId, ImageId, IntegrationId, LibraryId, WidgetId};
pub use integration::{Integration, IntegrationConfig, SecretFields, REDACTED, SENSITIVE_FIELDS};
pub use media::{MediaImage, MediaLibrary};
pub use widget::{Widget, WidgetConfig};
