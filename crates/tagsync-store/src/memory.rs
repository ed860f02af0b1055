//! In-memory tag store
//!
//! Keeps resource tags in process memory and records every call made
//! against it. Supports per-operation failure injection for exercising
//! error paths.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;
use crate::failure::{FailureConfig, FailureInjector};
use crate::{StoreOp, TagMap, TagStore};

/// A call observed by the store, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List { resource_id: String },
    Tag { resource_id: String, tags: TagMap },
    Untag { resource_id: String, keys: BTreeSet<String> },
}

impl StoreCall {
    /// The operation this call performed
    pub fn op(&self) -> StoreOp {
        match self {
            Self::List { .. } => StoreOp::List,
            Self::Tag { .. } => StoreOp::Tag,
            Self::Untag { .. } => StoreOp::Untag,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    resources: HashMap<String, TagMap>,
    calls: Vec<StoreCall>,
}

/// In-process tag store
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    failures: Mutex<FailureInjector>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource with its initial tags, replacing any existing entry
    pub fn add_resource(&self, resource_id: impl Into<String>, tags: TagMap) {
        self.state_unpoisoned().resources.insert(resource_id.into(), tags);
    }

    /// Builder form of `add_resource`
    pub fn with_resource(self, resource_id: impl Into<String>, tags: TagMap) -> Self {
        self.add_resource(resource_id, tags);
        self
    }

    /// Current tags on a resource, if it exists
    pub fn tags(&self, resource_id: &str) -> Option<TagMap> {
        self.state_unpoisoned().resources.get(resource_id).cloned()
    }

    /// Every call made so far, failed ones included
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state_unpoisoned().calls.clone()
    }

    /// Number of calls made for one operation
    pub fn call_count(&self, op: StoreOp) -> usize {
        self.state_unpoisoned()
            .calls
            .iter()
            .filter(|c| c.op() == op)
            .count()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.state_unpoisoned().calls.clear();
    }

    /// Inject a failure for an operation
    pub fn inject_failure(&self, op: StoreOp, config: FailureConfig) {
        self.failures_unpoisoned().inject(op, config);
    }

    /// Make an operation fail with the given code and message
    pub fn inject_error(&self, op: StoreOp, code: impl Into<String>, message: impl Into<String>) {
        self.failures_unpoisoned().inject_error(op, code, message);
    }

    /// Clear all failure injections
    pub fn clear_failures(&self) {
        self.failures_unpoisoned().clear();
    }

    fn state_unpoisoned(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn failures_unpoisoned(&self) -> MutexGuard<'_, FailureInjector> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call, then apply any injected failure for it
    fn begin(&self, call: StoreCall) -> Result<MutexGuard<'_, State>, StoreError> {
        let op = call.op();
        let mut state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        state.calls.push(call);

        let injected = self
            .failures
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .check(op);
        match injected {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

impl TagStore for MemoryStore {
    fn list_tags(&self, resource_id: &str) -> Result<TagMap, StoreError> {
        let state = self.begin(StoreCall::List {
            resource_id: resource_id.to_string(),
        })?;

        state
            .resources
            .get(resource_id)
            .cloned()
            .ok_or_else(|| StoreError::ResourceNotFound(resource_id.to_string()))
    }

    fn tag_resource(&self, resource_id: &str, tags: &TagMap) -> Result<(), StoreError> {
        let mut state = self.begin(StoreCall::Tag {
            resource_id: resource_id.to_string(),
            tags: tags.clone(),
        })?;

        let current = state
            .resources
            .get_mut(resource_id)
            .ok_or_else(|| StoreError::ResourceNotFound(resource_id.to_string()))?;
        current.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    fn untag_resource(
        &self,
        resource_id: &str,
        keys: &BTreeSet<String>,
    ) -> Result<(), StoreError> {
        let mut state = self.begin(StoreCall::Untag {
            resource_id: resource_id.to_string(),
            keys: keys.clone(),
        })?;

        let current = state
            .resources
            .get_mut(resource_id)
            .ok_or_else(|| StoreError::ResourceNotFound(resource_id.to_string()))?;
        current.retain(|k, _| !keys.contains(k));
        Ok(())
    }
}
