//! Application state for the payroll API.

use std::sync::Arc;

use crate::engine::PayrollEngine;

/// Shared application state.
///
/// Holds the payroll engine that every request handler works against.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<PayrollEngine>,
}

impl AppState {
    /// Creates a new application state around `engine`.
    pub fn new(engine: PayrollEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Returns the payroll engine.
    pub fn engine(&self) -> &PayrollEngine {
        &self.engine
    }
}
