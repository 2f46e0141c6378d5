//! Lenient per-record decoding
//!
//! Snapshot lists wrap each element in [`Record`] so one malformed element
//! does not fail decoding of the whole document. The malformed JSON is kept
//! so the importer can report it by name.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded record, or the raw JSON it failed to decode from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record<T> {
    Valid(T),
    Invalid(Value),
}

impl<T> Record<T> {
    pub fn valid(&self) -> Option<&T> {
        match self {
            Record::Valid(value) => Some(value),
            Record::Invalid(_) => None,
        }
    }
}

impl<T: DeserializeOwned> Record<T> {
    /// The typed record, or a message naming the bad record and why it failed
    pub fn into_result(self, kind: &str) -> Result<T, String> {
        match self {
            Record::Valid(value) => Ok(value),
            Record::Invalid(raw) => {
                let label = describe(&raw);
                match serde_json::from_value::<T>(raw) {
                    Ok(value) => Ok(value),
                    Err(e) => Err(format!("{} {}: {}", kind, label, e)),
                }
            }
        }
    }
}

impl<T> From<T> for Record<T> {
    fn from(value: T) -> Self {
        Record::Valid(value)
    }
}

/// Best human-readable label for a raw record
pub fn describe(raw: &Value) -> String {
    for key in ["name", "title", "id", "filename"] {
        if let Some(Value::String(s)) = raw.get(key) {
            if !s.is_empty() {
                return format!("'{}'", s);
            }
        }
    }
    "<unnamed>".to_string()
}
