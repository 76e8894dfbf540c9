// store.rs - The RecordStore trait shared by every backend.
//
// Each call is atomic for the one item it touches. Nothing here spans
// items: callers that read one record and write another accept that a
// concurrent writer may interleave (last write wins).

use serde_json::Value;

use crate::error::StoreError;
use crate::item::{Collection, Item};
use crate::scan::{ScanPage, ScanRequest};

/// What `update` does when the key has no item yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Create the item from the key plus the updated attributes.
    Upsert,

    /// Fail with [`StoreError::NotFound`].
    MustExist,
}

/// Point reads and writes plus paginated scans over keyed collections.
///
/// Implementations must be shareable across request handlers, hence
/// `Send + Sync` with interior mutability where needed.
pub trait RecordStore: Send + Sync {
    /// Fetch one item by key.
    fn get(&self, collection: &Collection, key: &str) -> Result<Option<Item>, StoreError>;

    /// Write a full item, replacing any item with the same key.
    fn put(&self, collection: &Collection, item: Item) -> Result<(), StoreError>;

    /// Set the given attributes on the item with this key and return the
    /// full item as stored afterwards.
    fn update(
        &self,
        collection: &Collection,
        key: &str,
        attributes: Item,
        mode: UpdateMode,
    ) -> Result<Item, StoreError>;

    /// Delete by key. Returns whether an item was removed; deleting an
    /// absent key is not an error.
    fn delete(&self, collection: &Collection, key: &str) -> Result<bool, StoreError>;

    /// Read one page of a scan.
    fn scan(&self, collection: &Collection, request: &ScanRequest) -> Result<ScanPage, StoreError>;
}

/// Merge `attributes` into `existing` according to `mode`.
///
/// The key attribute is never overwritten.
pub(crate) fn apply_update(
    collection: &Collection,
    key: &str,
    existing: Option<Item>,
    attributes: Item,
    mode: UpdateMode,
) -> Result<Item, StoreError> {
    let mut item = match (existing, mode) {
        (Some(item), _) => item,
        (None, UpdateMode::Upsert) => {
            let mut item = Item::new();
            item.insert(
                collection.key_attribute().to_string(),
                Value::String(key.to_string()),
            );
            item
        }
        (None, UpdateMode::MustExist) => {
            return Err(StoreError::NotFound {
                table: collection.table().to_string(),
                key: key.to_string(),
            })
        }
    };
    for (name, value) in attributes {
        if name != collection.key_attribute() {
            item.insert(name, value);
        }
    }
    Ok(item)
}
