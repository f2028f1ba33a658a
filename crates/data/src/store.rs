use chrono::{DateTime, Utc};
use picker_core::{KeyValueStore, StoreError, StoredEntry};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Key-value jar kept in one JSON file. Expired entries read as absent and
/// are dropped on the next write.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_jar(&self) -> Result<BTreeMap<String, StoredEntry>, StoreError> {
        let body = match fs::read_to_string(&self.path) {
            Ok(body) => body,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => {
                return Err(StoreError::Unavailable(format!(
                    "read {}: {err}",
                    self.path.display()
                )))
            }
        };
        serde_json::from_str(&body).map_err(|err| {
            StoreError::Unavailable(format!("parse {}: {err}", self.path.display()))
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<String>, StoreError> {
        let jar = self.read_jar()?;
        Ok(jar
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    fn set(
        &mut self,
        key: &str,
        value: String,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut jar = self.read_jar().unwrap_or_else(|err| {
            warn!(error = %err, "replacing unreadable state jar");
            BTreeMap::new()
        });
        jar.retain(|_, entry| entry.is_live(now));
        jar.insert(key.to_string(), StoredEntry { value, expires_at });
        let body = serde_json::to_string_pretty(&jar)
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| {
                    StoreError::Unavailable(format!("create {}: {err}", parent.display()))
                })?;
            }
        }
        fs::write(&self.path, body).map_err(|err| {
            StoreError::Unavailable(format!("write {}: {err}", self.path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn set_get_roundtrip_with_expiry() {
        let file = unique_temp_file();
        let mut store = FileStore::new(&file);
        let now = Utc::now();
        store
            .set("live", "one".to_string(), Some(now + Duration::days(7)), now)
            .expect("set");
        store.set("plain", "two".to_string(), None, now).expect("set");
        assert_eq!(store.get("live", now).expect("get").as_deref(), Some("one"));
        assert_eq!(store.get("plain", now).expect("get").as_deref(), Some("two"));
        assert_eq!(store.get("live", now + Duration::days(8)).expect("get"), None);
        assert_eq!(store.get("missing", now).expect("get"), None);
        let _ = std::fs::remove_file(file);
    }

    #[test]
    fn expiry_purge_follows_the_supplied_clock() {
        let file = unique_temp_file();
        let mut store = FileStore::new(&file);
        let start = Utc::now() + Duration::days(30);
        store
            .set("old", "a".to_string(), Some(start + Duration::days(7)), start)
            .expect("set");
        store
            .set("new", "b".to_string(), None, start + Duration::days(1))
            .expect("set");
        let jar = std::fs::read_to_string(&file).expect("read");
        assert!(jar.contains("\"old\""));
        store
            .set("new", "c".to_string(), None, start + Duration::days(8))
            .expect("set");
        let jar = std::fs::read_to_string(&file).expect("read");
        assert!(!jar.contains("\"old\""));
        let _ = std::fs::remove_file(file);
    }

    #[test]
    fn missing_file_reads_empty() {
        let store = FileStore::new(unique_temp_file());
        assert_eq!(store.get("k", Utc::now()).expect("get"), None);
    }

    #[test]
    fn corrupt_jar_is_an_error_then_replaced() {
        let file = unique_temp_file();
        std::fs::write(&file, "{{{").expect("write");
        let mut store = FileStore::new(&file);
        assert!(store.get("k", Utc::now()).is_err());
        store.set("k", "v".to_string(), None, Utc::now()).expect("set");
        assert_eq!(store.get("k", Utc::now()).expect("get").as_deref(), Some("v"));
        let _ = std::fs::remove_file(file);
    }

    fn unique_temp_file() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "picker_data_store_test_{}_{}.json",
            std::process::id(),
            nanos
        ))
    }
}
