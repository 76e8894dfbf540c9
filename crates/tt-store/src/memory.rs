// memory.rs - MemoryRecordStore: process-local maps with store semantics.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;
use crate::item::{Collection, Item};
use crate::scan::{paginate, ScanPage, ScanRequest};
use crate::store::{apply_update, RecordStore, UpdateMode};
use crate::DEFAULT_PAGE_SIZE;

type Tables = BTreeMap<String, BTreeMap<String, Item>>;

/// In-memory record store. Contents vanish with the process.
pub struct MemoryRecordStore {
    tables: Mutex<Tables>,
    page_size: usize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::new()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Number of items currently stored in a table.
    pub fn len(&self, collection: &Collection) -> usize {
        self.tables()
            .get(collection.table())
            .map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, collection: &Collection) -> bool {
        self.len(collection) == 0
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, collection: &Collection, key: &str) -> Result<Option<Item>, StoreError> {
        Ok(self
            .tables()
            .get(collection.table())
            .and_then(|table| table.get(key))
            .cloned())
    }

    fn put(&self, collection: &Collection, item: Item) -> Result<(), StoreError> {
        let key = collection.key_of(&item)?;
        self.tables()
            .entry(collection.table().to_string())
            .or_default()
            .insert(key, item);
        Ok(())
    }

    fn update(
        &self,
        collection: &Collection,
        key: &str,
        attributes: Item,
        mode: UpdateMode,
    ) -> Result<Item, StoreError> {
        let mut tables = self.tables();
        let table = tables.entry(collection.table().to_string()).or_default();
        let existing = table.get(key).cloned();
        let item = apply_update(collection, key, existing, attributes, mode)?;
        table.insert(key.to_string(), item.clone());
        Ok(item)
    }

    fn delete(&self, collection: &Collection, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .tables()
            .get_mut(collection.table())
            .is_some_and(|table| table.remove(key).is_some()))
    }

    fn scan(&self, collection: &Collection, request: &ScanRequest) -> Result<ScanPage, StoreError> {
        let tables = self.tables();
        let Some(table) = tables.get(collection.table()) else {
            return Ok(ScanPage::default());
        };
        let keys: Vec<String> = table.keys().cloned().collect();
        paginate(&keys, request, self.page_size, |key| Ok(table.get(key).cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{scan_all, ScanFilter};
    use serde_json::json;

    fn goals() -> Collection {
        Collection::new("Goals", "goalId")
    }

    fn goal(id: &str, task_id: &str) -> Item {
        json!({ "goalId": id, "taskId": task_id, "progress": 0 })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn put_get_delete() {
        let store = MemoryRecordStore::new();
        store.put(&goals(), goal("g-1", "t-1")).unwrap();
        assert_eq!(store.len(&goals()), 1);
        assert!(store.get(&goals(), "g-1").unwrap().is_some());

        assert!(store.delete(&goals(), "g-1").unwrap());
        assert!(!store.delete(&goals(), "g-1").unwrap());
        assert!(store.is_empty(&goals()));
    }

    #[test]
    fn delete_from_unknown_table_is_not_an_error() {
        let store = MemoryRecordStore::new();
        assert!(!store.delete(&goals(), "anything").unwrap());
    }

    #[test]
    fn update_modes() {
        let store = MemoryRecordStore::new();
        let attrs = json!({"progress": 50}).as_object().cloned().unwrap();

        let missing = store.update(&goals(), "g-1", attrs.clone(), UpdateMode::MustExist);
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
        assert!(store.is_empty(&goals()));

        store.put(&goals(), goal("g-1", "t-1")).unwrap();
        let updated = store
            .update(&goals(), "g-1", attrs, UpdateMode::MustExist)
            .unwrap();
        assert_eq!(updated["progress"], json!(50));
        assert_eq!(updated["taskId"], json!("t-1"));
    }

    #[test]
    fn filtered_scan_across_small_pages() {
        let store = MemoryRecordStore::new().with_page_size(1);
        store.put(&goals(), goal("g-1", "t-1")).unwrap();
        store.put(&goals(), goal("g-2", "t-2")).unwrap();
        store.put(&goals(), goal("g-3", "t-1")).unwrap();

        let first = store
            .scan(&goals(), &ScanRequest::filtered(ScanFilter::eq("taskId", "t-1")))
            .unwrap();
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.last_evaluated_key.as_deref(), Some("g-1"));

        let all = scan_all(&store, &goals(), Some(ScanFilter::eq("taskId", "t-1"))).unwrap();
        assert_eq!(all.len(), 2);
    }
}
