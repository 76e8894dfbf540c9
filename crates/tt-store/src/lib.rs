//! # tt-store
//!
//! Key-value record storage for the task tracker.
//!
//! Records are schemaless JSON objects grouped into collections (tables),
//! each keyed by one string attribute. The store is atomic per item only;
//! nothing spans more than one record.
//!
//! ## Key components
//!
//! - [`RecordStore`] - point get/put/update/delete plus paginated scans with
//!   attribute filters
//! - [`FileRecordStore`] - one JSON file per record, one directory per table
//! - [`MemoryRecordStore`] - in-process maps with the same semantics
//! - [`scan_all`] - follows continuation keys and merges every page

pub mod error;
pub mod file;
pub mod item;
pub mod memory;
pub mod scan;
pub mod store;

pub use error::StoreError;
pub use file::FileRecordStore;
pub use item::{file_name_problem, from_item, to_item, Collection, Item};
pub use memory::MemoryRecordStore;
pub use scan::{scan_all, ScanFilter, ScanPage, ScanRequest};
pub use store::{RecordStore, UpdateMode};

/// Page size used when a scan request does not set its own limit.
pub const DEFAULT_PAGE_SIZE: usize = 100;
