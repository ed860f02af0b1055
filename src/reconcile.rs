//! Tag reconciliation against a remote store
//!
//! `Reconciler` applies the difference between two desired tag sets to a
//! store and reads a resource's tags back. It holds nothing but the reserved
//! key filter, so one instance can serve any number of resources.
//!
//! Each call makes at most two sequential store calls. Removals go first: if
//! the untag call fails, the error is returned and no tag call is made.
//! Nothing is retried or rolled back; re-running recomputes the diff.

use serde_json::{Map, Value};
use tagsync_store::{StoreError, StoreOp, TagStore};

use crate::diff::{diff, TagDiff};
use crate::filter::TagFilter;
use crate::tagset::{json_type_name, TagSet, TagSetError};

/// Errors from reconciling or refreshing tags
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Invalid tags: {0}")]
    InvalidTags(#[from] TagSetError),

    #[error("Remote {op} failed for {resource_id}: {source}")]
    Remote {
        op: StoreOp,
        resource_id: String,
        #[source]
        source: StoreError,
    },
}

impl ReconcileError {
    fn remote(op: StoreOp, resource_id: &str, source: StoreError) -> Self {
        Self::Remote {
            op,
            resource_id: resource_id.to_string(),
            source,
        }
    }

    /// The store operation that failed, if this is a remote error
    pub fn failed_op(&self) -> Option<StoreOp> {
        match self {
            Self::Remote { op, .. } => Some(*op),
            Self::InvalidTags(_) => None,
        }
    }
}

/// Previous and new value of a resource's tags attribute, as recorded by
/// the desired-state source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagChange {
    pub old: Map<String, Value>,
    pub new: Map<String, Value>,
}

impl TagChange {
    pub fn new(old: Map<String, Value>, new: Map<String, Value>) -> Self {
        Self { old, new }
    }

    /// Build from arbitrary JSON values. `null` reads as no tags; anything
    /// else that is not an object is rejected.
    pub fn from_json(old: Value, new: Value) -> Result<Self, TagSetError> {
        Ok(Self {
            old: into_object(old)?,
            new: into_object(new)?,
        })
    }

    /// Whether the desired tags differ at all between the two records
    pub fn has_change(&self) -> bool {
        self.old != self.new
    }
}

fn into_object(value: Value) -> Result<Map<String, Value>, TagSetError> {
    match value {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        other => Err(TagSetError::NotAnObject {
            found: json_type_name(&other),
        }),
    }
}

/// Stateless tag reconciler
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    filter: TagFilter,
}

impl Reconciler {
    pub fn new(filter: TagFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &TagFilter {
        &self.filter
    }

    /// Build a tag set from raw desired-state input using this reconciler's filter
    pub fn tag_set(&self, raw: &Map<String, Value>) -> Result<TagSet, TagSetError> {
        TagSet::from_raw_map(raw, &self.filter)
    }

    /// Compute the diff between two raw desired-state records
    pub fn plan(&self, change: &TagChange) -> Result<TagDiff, ReconcileError> {
        let old = self.tag_set(&change.old)?;
        let new = self.tag_set(&change.new)?;
        Ok(diff(&old, &new))
    }

    /// Apply a desired-state change to `resource_id`.
    ///
    /// Returns `Ok(None)` without touching the store when the desired tags
    /// did not change.
    pub fn sync(
        &self,
        store: &dyn TagStore,
        resource_id: &str,
        change: &TagChange,
    ) -> Result<Option<TagDiff>, ReconcileError> {
        if !change.has_change() {
            tracing::debug!(resource_id, "tags unchanged, skipping");
            return Ok(None);
        }

        let old = self.tag_set(&change.old)?;
        let new = self.tag_set(&change.new)?;
        self.reconcile(store, resource_id, &old, &new).map(Some)
    }

    /// Move `resource_id` from the `old` tag set to the `new` one.
    ///
    /// Reserved keys in either set are dropped first, so they are never
    /// sent to the store.
    pub fn reconcile(
        &self,
        store: &dyn TagStore,
        resource_id: &str,
        old: &TagSet,
        new: &TagSet,
    ) -> Result<TagDiff, ReconcileError> {
        let old = old.without_reserved(&self.filter);
        let new = new.without_reserved(&self.filter);
        let plan = diff(&old, &new);

        if !plan.to_remove.is_empty() {
            tracing::debug!(resource_id, tags = ?plan.to_remove, "removing tags");
            store
                .untag_resource(resource_id, &plan.removed_keys())
                .map_err(|e| ReconcileError::remote(StoreOp::Untag, resource_id, e))?;
        }

        if !plan.to_create.is_empty() {
            tracing::debug!(resource_id, tags = ?plan.to_create, "creating tags");
            store
                .tag_resource(resource_id, plan.to_create.as_map())
                .map_err(|e| ReconcileError::remote(StoreOp::Tag, resource_id, e))?;
        }

        if !plan.is_empty() {
            tracing::info!(
                resource_id,
                created = plan.to_create.len(),
                removed = plan.to_remove.len(),
                "reconciled tags"
            );
        }

        Ok(plan)
    }

    /// Read the current user-managed tags of `resource_id` from the store
    pub fn refresh(&self, store: &dyn TagStore, resource_id: &str) -> Result<TagSet, ReconcileError> {
        let remote = store
            .list_tags(resource_id)
            .map_err(|e| ReconcileError::remote(StoreOp::List, resource_id, e))?;

        Ok(TagSet::from_remote(remote, &self.filter))
    }
}
