//! Integration repository for JSON storage
//!
//! Manages loading and saving integrations to integrations.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::PackError;
use crate::models::{Integration, IntegrationId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable integration data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct IntegrationData {
    integrations: Vec<Integration>,
}

/// Repository for integration persistence
pub struct IntegrationRepository {
    path: PathBuf,
    data: RwLock<HashMap<IntegrationId, Integration>>,
}

impl IntegrationRepository {
    /// Create a new integration repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load integrations from disk
    pub fn load(&self) -> Result<(), PackError> {
        let file_data: IntegrationData = read_json(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| PackError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.clear();
        for integration in file_data.integrations {
            data.insert(integration.id, integration);
        }

        Ok(())
    }

    /// Save integrations to disk
    pub fn save(&self) -> Result<(), PackError> {
        let integrations = self.get_all()?;
        write_json_atomic(&self.path, &IntegrationData { integrations })
    }

    /// Get an integration by ID
    pub fn get(&self, id: IntegrationId) -> Result<Option<Integration>, PackError> {
        let data = self
            .data
            .read()
            .map_err(|e| PackError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.get(&id).cloned())
    }

    /// Get all integrations sorted by name
    pub fn get_all(&self) -> Result<Vec<Integration>, PackError> {
        let data = self
            .data
            .read()
            .map_err(|e| PackError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut list: Vec<_> = data.values().cloned().collect();
        list.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.integration_type.cmp(&b.integration_type))
        });
        Ok(list)
    }

    /// Find an integration with the same name and type
    pub fn find_matching(
        &self,
        name: &str,
        integration_type: &str,
    ) -> Result<Option<Integration>, PackError> {
        let data = self
            .data
            .read()
            .map_err(|e| PackError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data
            .values()
            .find(|i| i.matches(name, integration_type))
            .cloned())
    }

    /// Insert or update an integration
    pub fn upsert(&self, integration: Integration) -> Result<(), PackError> {
        integration.validate().map_err(PackError::Validation)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| PackError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.insert(integration.id, integration);
        Ok(())
    }

    /// Delete every integration, returning how many were removed
    pub fn clear(&self) -> Result<usize, PackError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| PackError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let count = data.len();
        data.clear();
        Ok(count)
    }

    /// Count integrations
    pub fn count(&self) -> Result<usize, PackError> {
        let data = self
            .data
            .read()
            .map_err(|e| PackError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, IntegrationRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("integrations.json");
        let repo = IntegrationRepository::new(path);
        (temp_dir, repo)
    }

    #[test]
    fn test_upsert_and_get() {
        let (_temp_dir, repo) = create_test_repo();
        let integration = Integration::new("Hub", "homeassistant");
        let id = integration.id;

        repo.upsert(integration).unwrap();

        let retrieved = repo.get(id).unwrap().unwrap();
        assert_eq!(retrieved.name, "Hub");
    }

    #[test]
    fn test_find_matching_requires_type() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert(Integration::new("Hub", "homeassistant")).unwrap();

        assert!(repo.find_matching("hub", "homeassistant").unwrap().is_some());
        assert!(repo.find_matching("Hub", "unifi").unwrap().is_none());
    }

    #[test]
    fn test_sorted_by_name() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert(Integration::new("zigbee", "z2m")).unwrap();
        repo.upsert(Integration::new("Alpha", "unifi")).unwrap();

        let names: Vec<_> = repo.get_all().unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Alpha", "zigbee"]);
    }

    #[test]
    fn test_save_and_load_keeps_config() {
        let (temp_dir, repo) = create_test_repo();
        let mut integration = Integration::new("Router", "unifi");
        integration.config = serde_json::from_value(json!({
            "host": "192.168.1.1",
            "port": 8443,
            "password": "secret"
        }))
        .unwrap();
        let id = integration.id;
        repo.upsert(integration).unwrap();
        repo.save().unwrap();

        let repo2 = IntegrationRepository::new(temp_dir.path().join("integrations.json"));
        repo2.load().unwrap();
        let loaded = repo2.get(id).unwrap().unwrap();
        assert_eq!(loaded.config.port, Some(8443));
        assert_eq!(loaded.config.fields["password"], "secret");
    }

    #[test]
    fn test_clear_returns_count() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert(Integration::new("A", "x")).unwrap();
        repo.upsert(Integration::new("B", "x")).unwrap();

        assert_eq!(repo.clear().unwrap(), 2);
        assert_eq!(repo.count().unwrap(), 0);
    }
}
