use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::store::{read_json, write_json, KvStore};
use crate::{now_millis, Error, Result};

pub const VERSIONS_KEY: &str = "seo-generator-versions";
pub const CURRENT_VERSION_KEY: &str = "seo-generator-current-version";

/// Missing fields take the dashboard defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct TrafficSettings {
    pub yandex_android: u8,
    pub google_android: u8,
    pub other: u8,
    pub target_yandex: u8,
    pub optimize_channel: bool,
}

impl Default for TrafficSettings {
    fn default() -> Self {
        Self {
            yandex_android: 80,
            google_android: 15,
            other: 5,
            target_yandex: 85,
            optimize_channel: true,
        }
    }
}

/// `null` reads as the type's default, same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Snapshot of the dashboard's working state. Every field defaults when absent
/// or `null`, so partially filled documents still load.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct VersionData {
    #[serde(deserialize_with = "null_as_default")]
    pub active_tab: String,
    #[serde(deserialize_with = "null_as_default")]
    pub generation_topic: String,
    #[serde(deserialize_with = "null_as_default")]
    pub brand_description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub product_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub extracted_data: String,
    #[serde(deserialize_with = "null_as_default")]
    pub generation_results: BTreeMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub selected_fields: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub traffic_settings: TrafficSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Version {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    pub data: VersionData,
}

/// Named snapshots plus a pointer to the one currently loaded.
#[derive(Clone)]
pub struct VersionStore {
    store: Arc<dyn KvStore>,
}

impl VersionStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn list_versions(&self) -> Result<Vec<Version>> {
        Ok(read_json(&*self.store, VERSIONS_KEY)?.unwrap_or_default())
    }

    fn save_all(&self, versions: &[Version]) -> Result<()> {
        write_json(&*self.store, VERSIONS_KEY, versions)
    }

    pub fn get_version(&self, id: &str) -> Result<Version> {
        self.list_versions()?
            .into_iter()
            .find(|v| v.id == id)
            .ok_or_else(|| Error::VersionNotFound(id.to_string()))
    }

    pub fn current_version_id(&self) -> Result<Option<String>> {
        read_json(&*self.store, CURRENT_VERSION_KEY)
    }

    /// Append a new snapshot and make it current.
    pub fn save_version(
        &self,
        name: &str,
        description: &str,
        data: VersionData,
        commit: Option<String>,
    ) -> Result<Version> {
        let _guard = self.store.write_lock();
        let mut versions = self.list_versions()?;
        let timestamp = now_millis();
        let version = Version {
            id: unique_id(&versions, timestamp),
            name: name.to_string(),
            description: description.to_string(),
            timestamp,
            commit,
            data,
        };
        versions.push(version.clone());
        self.save_all(&versions)?;
        write_json(&*self.store, CURRENT_VERSION_KEY, &version.id)?;
        info!(id = %version.id, name, "saved version");
        Ok(version)
    }

    pub fn set_current_version(&self, id: &str) -> Result<Version> {
        let _guard = self.store.write_lock();
        let version = self.get_version(id)?;
        write_json(&*self.store, CURRENT_VERSION_KEY, &version.id)?;
        Ok(version)
    }

    /// Remove a snapshot, clearing the current pointer if it pointed here.
    pub fn delete_version(&self, id: &str) -> Result<()> {
        let _guard = self.store.write_lock();
        let mut versions = self.list_versions()?;
        let before = versions.len();
        versions.retain(|v| v.id != id);
        if versions.len() == before {
            warn!(id, "delete: version not found");
            return Err(Error::VersionNotFound(id.to_string()));
        }
        self.save_all(&versions)?;
        if self.current_version_id()?.as_deref() == Some(id) {
            self.store.remove(CURRENT_VERSION_KEY)?;
        }
        info!(id, "deleted version");
        Ok(())
    }

    /// Pretty JSON document for saving to a file.
    pub fn export_version(&self, id: &str) -> Result<String> {
        let version = self.get_version(id)?;
        Ok(serde_json::to_string_pretty(&version)?)
    }

    /// Load a document produced by [`export_version`](Self::export_version).
    ///
    /// Only the presence of `id`, `name` and `data` is checked. The imported
    /// version gets a fresh id and does not become current.
    pub fn import_version(&self, document: &str) -> Result<Version> {
        let value: serde_json::Value =
            serde_json::from_str(document).map_err(|e| Error::InvalidVersion(e.to_string()))?;
        for field in ["id", "name"] {
            let present = value
                .get(field)
                .and_then(serde_json::Value::as_str)
                .is_some_and(|s| !s.is_empty());
            if !present {
                return Err(Error::InvalidVersion(format!("missing {}", field)));
            }
        }
        if value.get("data").map_or(true, serde_json::Value::is_null) {
            return Err(Error::InvalidVersion("missing data".to_string()));
        }

        let mut version: Version =
            serde_json::from_value(value).map_err(|e| Error::InvalidVersion(e.to_string()))?;
        let _guard = self.store.write_lock();
        let mut versions = self.list_versions()?;
        version.id = unique_id(&versions, now_millis());
        versions.push(version.clone());
        self.save_all(&versions)?;
        info!(id = %version.id, name = %version.name, "imported version");
        Ok(version)
    }
}

/// `v_<millis>`, bumped until no stored version uses it.
fn unique_id(versions: &[Version], mut millis: i64) -> String {
    loop {
        let id = format!("v_{}", millis);
        if !versions.iter().any(|v| v.id == id) {
            return id;
        }
        millis += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn version_store() -> VersionStore {
        VersionStore::new(Arc::new(MemoryStore::new()))
    }

    fn sample_data() -> VersionData {
        VersionData {
            active_tab: "generation".to_string(),
            generation_topic: "Кофемашина".to_string(),
            selected_fields: vec!["h1".to_string(), "title".to_string()],
            ..VersionData::default()
        }
    }

    #[test]
    fn save_makes_version_current() {
        let versions = version_store();
        let first = versions.save_version("one", "", sample_data(), None).unwrap();
        let second = versions
            .save_version("two", "desc", sample_data(), Some("abc123".to_string()))
            .unwrap();

        assert_ne!(first.id, second.id);
        assert!(second.id.starts_with("v_"));
        assert_eq!(versions.current_version_id().unwrap(), Some(second.id.clone()));
        assert_eq!(versions.list_versions().unwrap().len(), 2);

        versions.set_current_version(&first.id).unwrap();
        assert_eq!(versions.current_version_id().unwrap(), Some(first.id));
    }

    #[test]
    fn set_current_to_unknown_is_not_found() {
        let versions = version_store();
        assert!(matches!(
            versions.set_current_version("v_1"),
            Err(Error::VersionNotFound(_))
        ));
    }

    #[test]
    fn delete_clears_current_pointer() {
        let versions = version_store();
        let saved = versions.save_version("one", "", sample_data(), None).unwrap();
        versions.delete_version(&saved.id).unwrap();
        assert_eq!(versions.current_version_id().unwrap(), None);
        assert!(versions.list_versions().unwrap().is_empty());
        assert!(matches!(
            versions.delete_version(&saved.id),
            Err(Error::VersionNotFound(_))
        ));
    }

    #[test]
    fn export_then_import_assigns_fresh_id() {
        let versions = version_store();
        let saved = versions.save_version("one", "", sample_data(), None).unwrap();
        let exported = versions.export_version(&saved.id).unwrap();

        let imported = versions.import_version(&exported).unwrap();
        assert_ne!(imported.id, saved.id);
        assert_eq!(imported.name, "one");
        assert_eq!(imported.data, saved.data);
        // Import does not move the current pointer.
        assert_eq!(versions.current_version_id().unwrap(), Some(saved.id));
    }

    #[test]
    fn import_accepts_partial_data() {
        let versions = version_store();
        let imported = versions
            .import_version(r#"{"id": "x", "name": "legacy", "data": {"generationTopic": "Чайник"}}"#)
            .unwrap();
        assert_eq!(imported.data.generation_topic, "Чайник");
        assert_eq!(imported.data.traffic_settings, TrafficSettings::default());

        let imported = versions
            .import_version(
                r#"{"id": "y", "name": "n", "description": null, "timestamp": null,
                "data": {"trafficSettings": {"yandexAndroid": 60, "optimizeChannel": false},
                "generationResults": null, "selectedFields": null, "productUrl": null}}"#,
            )
            .unwrap();
        assert_eq!(imported.description, "");
        assert_eq!(imported.timestamp, 0);
        assert_eq!(
            imported.data.traffic_settings,
            TrafficSettings {
                yandex_android: 60,
                optimize_channel: false,
                ..TrafficSettings::default()
            }
        );
        assert!(imported.data.generation_results.is_empty());
        assert!(imported.data.selected_fields.is_empty());
        assert_eq!(imported.data.product_url, "");
        assert_eq!(versions.list_versions().unwrap().len(), 2);
    }

    #[test]
    fn import_rejects_incomplete_documents() {
        let versions = version_store();
        for doc in [
            "not json",
            r#"{"name": "n", "data": {}}"#,
            r#"{"id": "x", "name": "", "data": {}}"#,
            r#"{"id": "x", "name": "n"}"#,
        ] {
            assert!(
                matches!(versions.import_version(doc), Err(Error::InvalidVersion(_))),
                "accepted {doc}"
            );
        }
        assert!(versions.list_versions().unwrap().is_empty());
    }
}
