//! Bulk generation job models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PayPeriod;
use crate::error::ErrorKind;

/// Selects the population of a bulk generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkFilter {
    /// Calendar month.
    pub month: u32,
    /// Calendar year.
    pub year: i32,
    /// Payroll country.
    pub country: String,
    /// Restricts the population to one department.
    #[serde(default)]
    pub department: Option<String>,
}

impl BulkFilter {
    /// Returns the pay period the filter targets.
    pub fn period(&self) -> PayPeriod {
        PayPeriod {
            month: self.month,
            year: self.year,
        }
    }
}

/// The outcome of one employee within a bulk job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BulkOutcome {
    /// A record was generated.
    Success {
        /// The new record's id.
        record_id: Uuid,
    },
    /// Generation failed for this employee only.
    Failure {
        /// Error category.
        kind: ErrorKind,
        /// Human-readable reason.
        reason: String,
    },
    /// The job was cancelled before this employee was dispatched.
    Cancelled,
}

/// Counts of a bulk job's outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSummary {
    /// Employees in the population.
    pub total: usize,
    /// Records generated.
    pub succeeded: usize,
    /// Employees whose generation failed.
    pub failed: usize,
    /// Employees never dispatched because of cancellation.
    pub cancelled: usize,
}

impl BulkSummary {
    /// Tallies a set of outcomes.
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a BulkOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(BulkSummary::default(), |mut summary, outcome| {
                summary.total += 1;
                match outcome {
                    BulkOutcome::Success { .. } => summary.succeeded += 1,
                    BulkOutcome::Failure { .. } => summary.failed += 1,
                    BulkOutcome::Cancelled => summary.cancelled += 1,
                }
                summary
            })
    }
}

/// A batch of independent per-employee generation attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkJob {
    /// Job identifier.
    pub id: Uuid,
    /// The filter the population was resolved from.
    pub filter: BulkFilter,
    /// Outcome per employee id.
    pub outcomes: BTreeMap<String, BulkOutcome>,
    /// Outcome counts.
    pub summary: BulkSummary,
    /// True when cancellation was requested while the job ran.
    pub cancelled: bool,
    /// When the job started.
    pub started_at: DateTime<Utc>,
    /// When the job finished.
    pub completed_at: Option<DateTime<Utc>>,
}
