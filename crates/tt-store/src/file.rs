// file.rs - FileRecordStore: JSON-file-per-record persistence.
//
// Layout: `<root>/<table>/<key>.json`, pretty-printed so records are easy
// to inspect by hand. Writes go to a temp file in the same directory and
// are renamed into place, so a reader never sees a half-written record.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreError;
use crate::item::{validate_name, Collection, Item};
use crate::scan::{paginate, ScanPage, ScanRequest};
use crate::store::{apply_update, RecordStore, UpdateMode};
use crate::DEFAULT_PAGE_SIZE;

/// Record store backed by a directory tree of JSON files.
pub struct FileRecordStore {
    root: PathBuf,
    page_size: usize,
    // Serializes read-modify-write in `update` within this process.
    update_lock: Mutex<()>,
}

impl FileRecordStore {
    /// Create a store rooted at the given directory.
    /// Creates the directory if it doesn't exist.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self {
            root,
            page_size: DEFAULT_PAGE_SIZE,
            update_lock: Mutex::new(()),
        })
    }

    /// Number of items examined per scan page when the request sets no limit.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn table_dir(&self, collection: &Collection) -> Result<PathBuf, StoreError> {
        validate_name(collection.table())?;
        Ok(self.root.join(collection.table()))
    }

    fn item_file(&self, collection: &Collection, key: &str) -> Result<PathBuf, StoreError> {
        validate_name(key)?;
        Ok(self.table_dir(collection)?.join(format!("{key}.json")))
    }

    fn read_item(path: &Path) -> Result<Option<Item>, StoreError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        match serde_json::from_str::<Value>(&json)? {
            Value::Object(item) => Ok(Some(item)),
            _ => Err(StoreError::NotAnObject(path.display().to_string())),
        }
    }

    fn write_item(path: &Path, item: &Item) -> Result<(), StoreError> {
        let dir = path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let json = serde_json::to_string_pretty(item)?;
        let tmp = dir.join(format!(".{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Keys present in a table, ascending.
    fn sorted_keys(&self, collection: &Collection) -> Result<Vec<String>, StoreError> {
        let dir = self.table_dir(collection)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path: dir, source }),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !stem.starts_with('.') {
                        keys.push(stem.to_string());
                    }
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl RecordStore for FileRecordStore {
    fn get(&self, collection: &Collection, key: &str) -> Result<Option<Item>, StoreError> {
        Self::read_item(&self.item_file(collection, key)?)
    }

    fn put(&self, collection: &Collection, item: Item) -> Result<(), StoreError> {
        let key = collection.key_of(&item)?;
        Self::write_item(&self.item_file(collection, &key)?, &item)
    }

    fn update(
        &self,
        collection: &Collection,
        key: &str,
        attributes: Item,
        mode: UpdateMode,
    ) -> Result<Item, StoreError> {
        let path = self.item_file(collection, key)?;
        let _guard = self.update_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let existing = Self::read_item(&path)?;
        let item = apply_update(collection, key, existing, attributes, mode)?;
        Self::write_item(&path, &item)?;
        Ok(item)
    }

    fn delete(&self, collection: &Collection, key: &str) -> Result<bool, StoreError> {
        let path = self.item_file(collection, key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn scan(&self, collection: &Collection, request: &ScanRequest) -> Result<ScanPage, StoreError> {
        let keys = self.sorted_keys(collection)?;
        paginate(&keys, request, self.page_size, |key| {
            Self::read_item(&self.item_file(collection, key)?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{scan_all, ScanFilter};
    use serde_json::json;
    use tempfile::tempdir;

    fn tasks() -> Collection {
        Collection::new("Tasks", "taskId")
    }

    fn task(id: &str, assignees: &[&str]) -> Item {
        json!({ "taskId": id, "title": format!("Task {id}"), "assignedTo": assignees })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn put_and_get_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileRecordStore::new(dir.path().join("data")).unwrap();

        store.put(&tasks(), task("t-1", &["a@x.io"])).unwrap();

        let found = store.get(&tasks(), "t-1").unwrap().unwrap();
        assert_eq!(found["title"], json!("Task t-1"));
        assert!(dir.path().join("data/Tasks/t-1.json").exists());
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let dir = tempdir().unwrap();
        let store = FileRecordStore::new(dir.path()).unwrap();
        assert!(store.get(&tasks(), "missing").unwrap().is_none());
    }

    #[test]
    fn put_without_key_attribute_fails() {
        let dir = tempdir().unwrap();
        let store = FileRecordStore::new(dir.path()).unwrap();
        let item = json!({"title": "no key"}).as_object().cloned().unwrap();
        assert!(matches!(
            store.put(&tasks(), item),
            Err(StoreError::MissingKeyAttribute { .. })
        ));
    }

    #[test]
    fn path_like_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let store = FileRecordStore::new(dir.path()).unwrap();
        assert!(matches!(
            store.get(&tasks(), "../../etc/passwd"),
            Err(StoreError::InvalidKey { .. })
        ));
        assert!(store.delete(&tasks(), "a/b").is_err());
    }

    #[test]
    fn update_sets_attributes_and_keeps_the_rest() {
        let dir = tempdir().unwrap();
        let store = FileRecordStore::new(dir.path()).unwrap();
        store.put(&tasks(), task("t-1", &["a@x.io"])).unwrap();

        let attrs = json!({"status": "completed", "taskId": "ignored"})
            .as_object()
            .cloned()
            .unwrap();
        let updated = store
            .update(&tasks(), "t-1", attrs, UpdateMode::MustExist)
            .unwrap();
        assert_eq!(updated["status"], json!("completed"));
        assert_eq!(updated["taskId"], json!("t-1"));
        assert_eq!(updated["title"], json!("Task t-1"));

        let reloaded = store.get(&tasks(), "t-1").unwrap().unwrap();
        assert_eq!(reloaded, updated);
    }

    #[test]
    fn update_must_exist_fails_on_missing_key() {
        let dir = tempdir().unwrap();
        let store = FileRecordStore::new(dir.path()).unwrap();
        let result = store.update(&tasks(), "ghost", Item::new(), UpdateMode::MustExist);
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert!(store.get(&tasks(), "ghost").unwrap().is_none());
    }

    #[test]
    fn update_upsert_materializes_item() {
        let dir = tempdir().unwrap();
        let store = FileRecordStore::new(dir.path()).unwrap();
        let attrs = json!({"status": "overdue"}).as_object().cloned().unwrap();
        store
            .update(&tasks(), "fresh", attrs, UpdateMode::Upsert)
            .unwrap();
        let item = store.get(&tasks(), "fresh").unwrap().unwrap();
        assert_eq!(item["taskId"], json!("fresh"));
        assert_eq!(item["status"], json!("overdue"));
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FileRecordStore::new(dir.path()).unwrap();
        store.put(&tasks(), task("t-1", &[])).unwrap();

        assert!(store.delete(&tasks(), "t-1").unwrap());
        assert!(!store.delete(&tasks(), "t-1").unwrap());
        assert!(store.get(&tasks(), "t-1").unwrap().is_none());
    }

    #[test]
    fn scan_pages_follow_key_order() {
        let dir = tempdir().unwrap();
        let store = FileRecordStore::new(dir.path()).unwrap().with_page_size(2);
        for id in ["t-3", "t-1", "t-2"] {
            store.put(&tasks(), task(id, &[])).unwrap();
        }

        let first = store.scan(&tasks(), &ScanRequest::all()).unwrap();
        let ids: Vec<_> = first.items.iter().map(|i| i["taskId"].clone()).collect();
        assert_eq!(ids, vec![json!("t-1"), json!("t-2")]);
        assert_eq!(first.last_evaluated_key.as_deref(), Some("t-2"));

        let all = scan_all(&store, &tasks(), None).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn scan_all_applies_filter_across_pages() {
        let dir = tempdir().unwrap();
        let store = FileRecordStore::new(dir.path()).unwrap().with_page_size(1);
        store.put(&tasks(), task("t-1", &["a@x.io"])).unwrap();
        store.put(&tasks(), task("t-2", &["b@x.io"])).unwrap();
        store.put(&tasks(), task("t-3", &["b@x.io", "a@x.io"])).unwrap();

        let mine = scan_all(
            &store,
            &tasks(),
            Some(ScanFilter::contains("assignedTo", "a@x.io")),
        )
        .unwrap();
        let ids: Vec<_> = mine.iter().map(|i| i["taskId"].clone()).collect();
        assert_eq!(ids, vec![json!("t-1"), json!("t-3")]);
    }

    #[test]
    fn scan_of_missing_table_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileRecordStore::new(dir.path()).unwrap();
        let page = store.scan(&tasks(), &ScanRequest::all()).unwrap();
        assert!(page.items.is_empty());
        assert!(page.last_evaluated_key.is_none());
    }

    #[test]
    fn decimal_numbers_survive_disk() {
        let dir = tempdir().unwrap();
        let store = FileRecordStore::new(dir.path()).unwrap();
        let goals = Collection::new("Goals", "goalId");
        let item = json!({"goalId": "g-1", "progress": 42.5, "whole": 42})
            .as_object()
            .cloned()
            .unwrap();
        store.put(&goals, item).unwrap();

        let back = store.get(&goals, "g-1").unwrap().unwrap();
        assert_eq!(back["progress"].to_string(), "42.5");
        assert_eq!(back["whole"].to_string(), "42");
    }

    #[test]
    fn store_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = FileRecordStore::new(dir.path()).unwrap();
            store.put(&tasks(), task("t-9", &[])).unwrap();
        }
        let store = FileRecordStore::new(dir.path()).unwrap();
        assert!(store.get(&tasks(), "t-9").unwrap().is_some());
    }
}
