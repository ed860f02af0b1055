//! JSON file backed tag store
//!
//! Stores tags for any number of resources in a single document:
//!
//! ```json
//! { "resources": { "<resource id>": { "<key>": "<value>" } } }
//! ```
//!
//! A missing file, or a resource absent from the document, reads as a
//! resource without tags. Every mutating call rewrites the whole document
//! through a uniquely named sibling temp file that is then renamed over it.
//! Calls on one `JsonFileStore` are serialized by an internal lock, so
//! concurrent read-modify-write cycles through the same handle do not lose
//! updates. Separate handles or processes on the same file are not
//! coordinated.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::StoreError;
use crate::{TagMap, TagStore};

/// On-disk document layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub resources: BTreeMap<String, TagMap>,
}

/// Tag store persisted as a JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document, treating a missing file as empty
    pub fn load(&self) -> Result<StoreDocument, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(StoreDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the whole document.
    ///
    /// The temp file is removed if the final rename fails.
    pub fn save(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let json = serde_json::to_vec_pretty(doc)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.lock.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl TagStore for JsonFileStore {
    fn list_tags(&self, resource_id: &str) -> Result<TagMap, StoreError> {
        let _guard = self.guard()?;
        let doc = self.load()?;
        Ok(doc.resources.get(resource_id).cloned().unwrap_or_default())
    }

    fn tag_resource(&self, resource_id: &str, tags: &TagMap) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut doc = self.load()?;
        let entry = doc.resources.entry(resource_id.to_string()).or_default();
        entry.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        tracing::debug!(resource_id, path = %self.path.display(), count = tags.len(), "wrote tags");
        self.save(&doc)
    }

    fn untag_resource(
        &self,
        resource_id: &str,
        keys: &BTreeSet<String>,
    ) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut doc = self.load()?;
        let Some(entry) = doc.resources.get_mut(resource_id) else {
            return Ok(());
        };
        entry.retain(|k, _| !keys.contains(k));
        tracing::debug!(resource_id, path = %self.path.display(), count = keys.len(), "removed tags");
        self.save(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn tags(pairs: &[(&str, &str)]) -> TagMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_file_lists_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));

        assert!(store.list_tags("pool").unwrap().is_empty());
    }

    #[test]
    fn test_tag_creates_file_and_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let store = JsonFileStore::new(&path);

        store.tag_resource("pool", &tags(&[("Team", "infra")])).unwrap();

        assert!(path.exists());
        assert_eq!(store.list_tags("pool").unwrap(), tags(&[("Team", "infra")]));
    }

    #[test]
    fn test_writes_leave_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));

        store.tag_resource("pool", &tags(&[("a", "1")])).unwrap();
        let keys: BTreeSet<String> = ["a".to_string()].into_iter().collect();
        store.untag_resource("pool", &keys).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("store.json")]);
    }

    #[test]
    fn test_failed_rename_cleans_up_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        // A non-empty directory at the target path makes the rename fail.
        fs::create_dir_all(path.join("occupied")).unwrap();
        let store = JsonFileStore::new(&path);

        let mut doc = StoreDocument::default();
        doc.resources.insert("pool".to_string(), tags(&[("a", "1")]));
        let err = store.save(&doc).unwrap_err();

        assert!(matches!(err, StoreError::Io(_)), "unexpected error: {err}");
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("store.json")]);
    }

    #[test]
    fn test_concurrent_writes_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path().join("store.json")));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..20 {
                        let key = format!("k{i}");
                        store
                            .tag_resource(&format!("res-{t}"), &tags(&[(key.as_str(), "v")]))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let doc = store.load().unwrap();
        assert_eq!(doc.resources.len(), 8);
        assert!(doc.resources.values().all(|tags| tags.len() == 20));
    }

    #[test]
    fn test_untag_removes_only_named_keys() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));
        store
            .tag_resource("pool", &tags(&[("a", "1"), ("b", "2"), ("aws:x", "y")]))
            .unwrap();

        let keys: BTreeSet<String> = ["a".to_string()].into_iter().collect();
        store.untag_resource("pool", &keys).unwrap();

        assert_eq!(
            store.list_tags("pool").unwrap(),
            tags(&[("aws:x", "y"), ("b", "2")])
        );
    }

    #[test]
    fn test_untag_unknown_resource_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let store = JsonFileStore::new(&path);

        let keys: BTreeSet<String> = ["a".to_string()].into_iter().collect();
        store.untag_resource("pool", &keys).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_resources_are_independent() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));

        store.tag_resource("one", &tags(&[("a", "1")])).unwrap();
        store.tag_resource("two", &tags(&[("b", "2")])).unwrap();

        let doc = store.load().unwrap();
        assert_eq!(doc.resources.len(), 2);
        assert_eq!(store.list_tags("one").unwrap(), tags(&[("a", "1")]));
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::new(&path).list_tags("pool").unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
