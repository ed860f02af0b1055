//! Tagsync Store
//!
//! The remote side of tag reconciliation: the three operations a tag store
//! must expose, the errors they report, and the backends shipped with tagsync.
//!
//! - `MemoryStore`: in-process store with call recording and failure injection
//! - `JsonFileStore`: tags persisted in a local JSON document

pub mod error;
pub mod failure;
pub mod file;
pub mod memory;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

pub use error::StoreError;
pub use failure::{FailureConfig, FailureInjector};
pub use file::JsonFileStore;
pub use memory::{MemoryStore, StoreCall};

/// Tag key/value pairs as exchanged with a store.
pub type TagMap = BTreeMap<String, String>;

/// Operations supported by a tag store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreOp {
    /// List all tags on a resource
    List,
    /// Create or update tags on a resource
    Tag,
    /// Delete tag keys from a resource
    Untag,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list_tags"),
            Self::Tag => write!(f, "tag_resource"),
            Self::Untag => write!(f, "untag_resource"),
        }
    }
}

/// A remote tag store.
///
/// Each call is one round trip to the backend. Implementations report
/// failure through `StoreError` and apply whatever timeout or retry policy
/// their transport has; callers do not retry.
pub trait TagStore: Send + Sync {
    /// Return every tag currently on `resource_id`, reserved keys included.
    fn list_tags(&self, resource_id: &str) -> Result<TagMap, StoreError>;

    /// Create or overwrite the given tags on `resource_id`.
    fn tag_resource(&self, resource_id: &str, tags: &TagMap) -> Result<(), StoreError>;

    /// Remove the given keys from `resource_id`.
    fn untag_resource(&self, resource_id: &str, keys: &BTreeSet<String>)
        -> Result<(), StoreError>;
}
