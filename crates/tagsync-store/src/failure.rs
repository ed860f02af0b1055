//! Failure injection for the in-memory store
//!
//! Lets tests make a given store operation fail, optionally only for the
//! first N calls.

use std::collections::HashMap;

use crate::error::StoreError;
use crate::StoreOp;

/// Failure configuration for an operation
#[derive(Debug, Clone)]
pub struct FailureConfig {
    /// Error code to report
    pub error_code: String,
    /// Error message to report
    pub error_message: String,
    /// Number of times to fail before succeeding (None = always fail)
    pub fail_count: Option<u32>,
}

impl FailureConfig {
    /// Create a config that returns an error
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: code.into(),
            error_message: message.into(),
            fail_count: None,
        }
    }

    /// Set the number of times to fail before succeeding
    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = Some(count);
        self
    }

    /// Build the store error this config reports
    pub fn to_error(&self) -> StoreError {
        StoreError::rejected(self.error_code.clone(), self.error_message.clone())
    }
}

/// Per-operation failure injector
#[derive(Debug, Default)]
pub struct FailureInjector {
    configs: HashMap<StoreOp, FailureConfig>,
    call_counts: HashMap<StoreOp, u32>,
}

impl FailureInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a failure for an operation
    pub fn inject(&mut self, op: StoreOp, config: FailureConfig) {
        self.configs.insert(op, config);
        self.call_counts.insert(op, 0);
    }

    /// Inject an error for an operation
    pub fn inject_error(&mut self, op: StoreOp, code: impl Into<String>, message: impl Into<String>) {
        self.inject(op, FailureConfig::error(code, message));
    }

    /// Clear all failure injections
    pub fn clear(&mut self) {
        self.configs.clear();
        self.call_counts.clear();
    }

    /// Clear failure injection for a specific operation
    pub fn clear_op(&mut self, op: StoreOp) {
        self.configs.remove(&op);
        self.call_counts.remove(&op);
    }

    /// Check if a failure should occur for an operation.
    /// Returns the error to report, or None if the call should succeed.
    pub fn check(&mut self, op: StoreOp) -> Option<StoreError> {
        let config = self.configs.get(&op)?;
        let count = self.call_counts.entry(op).or_insert(0);
        *count += 1;

        if let Some(fail_limit) = config.fail_count {
            if *count > fail_limit {
                return None;
            }
        }

        Some(config.to_error())
    }
}
