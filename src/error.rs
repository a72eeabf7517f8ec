//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while generating, processing
//! and paying payroll records.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::PayrollStatus;

/// The main error type for the payroll engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::NotFound {
///     entity: "tax rules".to_string(),
///     id: "ZZ".to_string(),
/// };
/// assert_eq!(error.to_string(), "tax rules not found: ZZ");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A tax rule set was malformed.
    #[error("Invalid tax rules field '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// Compensation or period data made no sense.
    #[error("Invalid input field '{field}': {message}")]
    InvalidInput {
        /// The offending field.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// A record, employee or country was unknown.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of thing that was looked up.
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A duplicate generation key, or a lost optimistic-update race.
    #[error("Conflict: {message}")]
    Conflict {
        /// A description of the conflict.
        message: String,
    },

    /// A lifecycle precondition was violated.
    #[error("Invalid state transition from '{from}' to '{to}'")]
    InvalidStateTransition {
        /// The record's current state.
        from: PayrollStatus,
        /// The state the operation needed to move to.
        to: PayrollStatus,
    },

    /// A per-employee calculation exceeded its time bound.
    #[error("Calculation for employee '{employee_id}' timed out after {timeout_ms}ms")]
    CalculationTimeout {
        /// The employee whose calculation timed out.
        employee_id: String,
        /// The bound that was exceeded.
        timeout_ms: u64,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },

    /// A collaborator store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the failure.
        message: String,
    },
}

/// Stable category of an [`EngineError`].
///
/// Used where an error is recorded rather than propagated, such as bulk job
/// outcomes, and as the basis of API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Configuration missing or malformed.
    Config,
    /// Malformed tax rule set.
    Validation,
    /// Non-sensical compensation or period data.
    InvalidInput,
    /// Unknown record, employee or country.
    NotFound,
    /// Duplicate key or lost race.
    Conflict,
    /// Lifecycle precondition violated.
    InvalidStateTransition,
    /// Per-employee time bound exceeded.
    CalculationTimeout,
    /// Calculation failed.
    Calculation,
    /// Collaborator store failed.
    Storage,
}

impl EngineError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                ErrorKind::Config
            }
            EngineError::Validation { .. } => ErrorKind::Validation,
            EngineError::InvalidInput { .. } => ErrorKind::InvalidInput,
            EngineError::NotFound { .. } => ErrorKind::NotFound,
            EngineError::Conflict { .. } => ErrorKind::Conflict,
            EngineError::InvalidStateTransition { .. } => ErrorKind::InvalidStateTransition,
            EngineError::CalculationTimeout { .. } => ErrorKind::CalculationTimeout,
            EngineError::CalculationError { .. } => ErrorKind::Calculation,
            EngineError::Storage { .. } => ErrorKind::Storage,
        }
    }

    /// Shorthand for a [`EngineError::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Shorthand for a [`EngineError::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        EngineError::Conflict {
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
