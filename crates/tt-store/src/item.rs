// item.rs - Items, collections, and conversion to/from typed records.
//
// An Item is the stored form of a record: a flat JSON object whose
// attribute names are the wire names (`taskId`, `assignedTo`, ...).
// Typed records convert through serde at the edges of the store.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::StoreError;

/// A stored record.
pub type Item = Map<String, Value>;

/// A named table and the attribute that keys its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    table: String,
    key_attribute: String,
}

impl Collection {
    pub fn new(table: impl Into<String>, key_attribute: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key_attribute: key_attribute.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn key_attribute(&self) -> &str {
        &self.key_attribute
    }

    /// Extract the key of an item. The key attribute must be a string.
    pub fn key_of(&self, item: &Item) -> Result<String, StoreError> {
        match item.get(&self.key_attribute) {
            Some(Value::String(key)) => Ok(key.clone()),
            _ => Err(StoreError::MissingKeyAttribute {
                table: self.table.clone(),
                attribute: self.key_attribute.clone(),
            }),
        }
    }
}

/// Serialize a typed record into an item.
pub fn to_item<T: Serialize>(record: &T) -> Result<Item, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::NotAnObject(other.to_string())),
    }
}

/// Deserialize an item into a typed record.
pub fn from_item<T: DeserializeOwned>(item: Item) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(item))?)
}

/// Why `name` cannot be used as a file name, or `None` if it can.
///
/// Record keys, table names and directory usernames all become file names.
pub fn file_name_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("must not be empty")
    } else if name.starts_with('.') {
        Some("must not start with '.'")
    } else if name.contains(['/', '\\', '\0']) {
        Some("must not contain path separators")
    } else {
        None
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), StoreError> {
    match file_name_problem(name) {
        None => Ok(()),
        Some(reason) => Err(StoreError::InvalidKey {
            key: name.to_string(),
            reason,
        }),
    }
}
