// scan.rs - Scan filters, pagination, and the merge-all-pages helper.
//
// A scan examines items in ascending key order. The page limit counts
// items examined, not items matched, so a filtered page can come back
// short (even empty) while still carrying a continuation key.

use serde_json::Value;

use crate::error::StoreError;
use crate::item::{Collection, Item};
use crate::store::RecordStore;

/// Attribute predicate applied to each examined item.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanFilter {
    /// The attribute equals the value.
    Eq { attribute: String, value: Value },

    /// The attribute is a list containing the value, or a string
    /// containing the value as a substring.
    Contains { attribute: String, value: Value },

    /// Every inner filter matches.
    And(Vec<ScanFilter>),
}

impl ScanFilter {
    pub fn eq(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        ScanFilter::Eq {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn contains(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        ScanFilter::Contains {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        match self {
            ScanFilter::Eq { attribute, value } => item.get(attribute) == Some(value),
            ScanFilter::Contains { attribute, value } => match item.get(attribute) {
                Some(Value::Array(values)) => values.contains(value),
                Some(Value::String(text)) => value
                    .as_str()
                    .is_some_and(|needle| text.contains(needle)),
                _ => false,
            },
            ScanFilter::And(filters) => filters.iter().all(|f| f.matches(item)),
        }
    }
}

/// Parameters for one scan page.
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub filter: Option<ScanFilter>,

    /// Resume after this key (the previous page's `last_evaluated_key`).
    pub exclusive_start_key: Option<String>,

    /// Maximum number of items to examine. Falls back to the store's page size.
    pub limit: Option<usize>,
}

impl ScanRequest {
    /// Scan every item, no filter.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filtered(filter: ScanFilter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One page of scan results.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub items: Vec<Item>,

    /// Set when more items remain after this page.
    pub last_evaluated_key: Option<String>,
}

/// Build one page from keys sorted ascending, loading items on demand.
///
/// `load` may return `None` for a key that vanished between listing and
/// reading; that key still counts as examined.
pub(crate) fn paginate<F>(
    sorted_keys: &[String],
    request: &ScanRequest,
    default_limit: usize,
    mut load: F,
) -> Result<ScanPage, StoreError>
where
    F: FnMut(&str) -> Result<Option<Item>, StoreError>,
{
    let limit = request.limit.unwrap_or(default_limit).max(1);
    let start = match &request.exclusive_start_key {
        Some(after) => sorted_keys.partition_point(|k| k.as_str() <= after.as_str()),
        None => 0,
    };
    let remaining = &sorted_keys[start..];
    let window = &remaining[..remaining.len().min(limit)];

    let mut page = ScanPage::default();
    for key in window {
        let Some(item) = load(key)? else { continue };
        if request.filter.as_ref().map_or(true, |f| f.matches(&item)) {
            page.items.push(item);
        }
    }
    if remaining.len() > window.len() {
        page.last_evaluated_key = window.last().cloned();
    }
    Ok(page)
}

/// Scan a collection to the end, merging every page.
pub fn scan_all<S>(
    store: &S,
    collection: &Collection,
    filter: Option<ScanFilter>,
) -> Result<Vec<Item>, StoreError>
where
    S: RecordStore + ?Sized,
{
    let mut request = ScanRequest {
        filter,
        ..ScanRequest::default()
    };
    let mut items = Vec::new();
    loop {
        let page = store.scan(collection, &request)?;
        items.extend(page.items);
        match page.last_evaluated_key {
            Some(key) => {
                tracing::debug!(table = collection.table(), after = %key, "fetching next scan page");
                request.exclusive_start_key = Some(key);
            }
            None => break,
        }
    }
    tracing::debug!(table = collection.table(), count = items.len(), "scan complete");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> Item {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn eq_filter_matches_exact_value() {
        let f = ScanFilter::eq("taskId", "t-1");
        assert!(f.matches(&item(json!({"taskId": "t-1"}))));
        assert!(!f.matches(&item(json!({"taskId": "t-2"}))));
        assert!(!f.matches(&item(json!({}))));
    }

    #[test]
    fn contains_filter_checks_list_membership_and_substrings() {
        let f = ScanFilter::contains("assignedTo", "a@x.io");
        assert!(f.matches(&item(json!({"assignedTo": ["b@x.io", "a@x.io"]}))));
        assert!(!f.matches(&item(json!({"assignedTo": ["b@x.io"]}))));
        assert!(f.matches(&item(json!({"assignedTo": "team a@x.io"}))));
        assert!(!f.matches(&item(json!({"assignedTo": 3}))));
    }

    #[test]
    fn and_filter_requires_all() {
        let f = ScanFilter::And(vec![
            ScanFilter::eq("status", "pending"),
            ScanFilter::contains("assignedTo", "a@x.io"),
        ]);
        assert!(f.matches(&item(json!({"status": "pending", "assignedTo": ["a@x.io"]}))));
        assert!(!f.matches(&item(json!({"status": "completed", "assignedTo": ["a@x.io"]}))));
    }

    #[test]
    fn paginate_counts_examined_items_not_matches() {
        let keys: Vec<String> = ["a", "b", "c", "d"].iter().map(|k| k.to_string()).collect();
        let request = ScanRequest::filtered(ScanFilter::eq("n", 3)).with_limit(2);
        let load = |k: &str| {
            let n = match k {
                "a" => 1,
                "b" => 2,
                "c" => 3,
                _ => 4,
            };
            Ok::<_, StoreError>(Some(item(json!({ "k": k, "n": n }))))
        };

        let first = paginate(&keys, &request, 100, load).unwrap();
        assert!(first.items.is_empty());
        assert_eq!(first.last_evaluated_key.as_deref(), Some("b"));

        let next = ScanRequest {
            exclusive_start_key: first.last_evaluated_key,
            ..request
        };
        let second = paginate(&keys, &next, 100, load).unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0]["k"], json!("c"));
        assert!(second.last_evaluated_key.is_none());
    }
}
