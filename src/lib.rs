//! tagsync - resource tag reconciliation
//!
//! Brings the user-managed tags of a cloud resource in line with a desired
//! state. Provider-reserved keys are filtered out, the old and new desired
//! tag sets are diffed, and the difference is applied to a remote tag store
//! with at most one untag call followed by one tag call.

pub mod config;
pub mod diff;
pub mod filter;
pub mod reconcile;
pub mod tagset;

pub use config::{EffectiveConfig, Settings};
pub use diff::{diff, TagDiff};
pub use filter::{FilterError, TagFilter, DEFAULT_RESERVED_PATTERNS};
pub use reconcile::{ReconcileError, Reconciler, TagChange};
pub use tagset::{TagSet, TagSetError};
pub use tagsync_store::{JsonFileStore, MemoryStore, StoreError, StoreOp, TagMap, TagStore};
