//! Integration model
//!
//! An integration holds the connection settings for an external data source
//! (home automation hub, network controller, media server...). Some of its
//! configuration fields are secrets and get special treatment on export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use super::ids::IntegrationId;

/// Configuration field names treated as secrets
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "api_key",
    "token",
    "token_secret",
    "client_secret",
];

/// Placeholder written in place of secret values in exported configs
pub const REDACTED: &str = "__REDACTED__";

/// Secret field name -> plaintext value for one integration
pub type SecretFields = BTreeMap<String, String>;

/// Integration connection settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Type-specific fields, including any secrets
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl IntegrationConfig {
    /// Secret fields holding a real (non-empty, non-placeholder) value
    pub fn secrets(&self) -> SecretFields {
        SENSITIVE_FIELDS
            .iter()
            .filter_map(|name| match self.fields.get(*name) {
                Some(Value::String(v)) if !v.is_empty() && v != REDACTED => {
                    Some((name.to_string(), v.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Replace every populated secret with [`REDACTED`].
    ///
    /// Returns the names of the redacted fields.
    pub fn redact(&mut self) -> Vec<String> {
        let mut redacted = Vec::new();
        for name in SENSITIVE_FIELDS {
            if let Some(Value::String(v)) = self.fields.get_mut(*name) {
                if !v.is_empty() {
                    *v = REDACTED.to_string();
                    redacted.push(name.to_string());
                }
            }
        }
        redacted
    }

    /// Names of fields currently holding the placeholder
    pub fn redacted_fields(&self) -> Vec<String> {
        SENSITIVE_FIELDS
            .iter()
            .filter(|name| {
                matches!(self.fields.get(**name), Some(Value::String(v)) if v == REDACTED)
            })
            .map(|name| name.to_string())
            .collect()
    }

    /// Put plaintext secrets back, clearing any placeholder left without a value
    pub fn restore_secrets(&mut self, secrets: Option<&SecretFields>) {
        if let Some(secrets) = secrets {
            for (name, value) in secrets {
                if SENSITIVE_FIELDS.contains(&name.as_str()) {
                    self.fields
                        .insert(name.clone(), Value::String(value.clone()));
                }
            }
        }

        for name in SENSITIVE_FIELDS {
            if let Some(Value::String(v)) = self.fields.get_mut(*name) {
                if v == REDACTED {
                    v.clear();
                }
            }
        }
    }
}

/// An integration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
    pub id: IntegrationId,

    /// Display name; name + type identifies an integration across instances
    pub name: String,

    /// Client key (e.g. "homeassistant", "unifi", "kasa")
    #[serde(rename = "type")]
    pub integration_type: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub config: IntegrationConfig,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

impl Integration {
    /// Create a new integration with an empty config
    pub fn new(name: impl Into<String>, integration_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: IntegrationId::new(),
            name: name.into(),
            integration_type: integration_type.into(),
            enabled: true,
            config: IntegrationConfig::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this integration is the same logical source as another
    pub fn matches(&self, name: &str, integration_type: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            && self.integration_type.eq_ignore_ascii_case(integration_type)
    }

    /// Validate the integration
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Integration name cannot be empty".into());
        }
        if self.integration_type.trim().is_empty() {
            return Err(format!("Integration '{}' has no type", self.name));
        }
        Ok(())
    }
}

impl fmt::Display for Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.integration_type)
    }
}
