//! Collaborator ports of the payroll engine.
//!
//! The engine persists records through [`PayrollStore`] and reads employee
//! compensation through [`EmployeeDirectory`]. In-memory implementations of
//! both live in [`in_memory`].

pub mod in_memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{BulkFilter, CompensationProfile, PayrollRecord, RecordFilter};

pub use in_memory::{EmployeeEntry, InMemoryEmployeeDirectory, InMemoryPayrollStore};

/// Persistence of payroll records.
///
/// Implementations must make `insert` atomic with respect to the record's
/// key: at most one non-failed record may exist per employee, month, year
/// and country, even under concurrent inserts.
#[async_trait]
pub trait PayrollStore: Send + Sync {
    /// Inserts a new record.
    ///
    /// Fails with `Conflict` when a non-failed record already holds the key.
    async fn insert(&self, record: PayrollRecord) -> EngineResult<PayrollRecord>;

    /// Fetches a record by id.
    async fn get(&self, id: Uuid) -> EngineResult<Option<PayrollRecord>>;

    /// Replaces a record if its stored version still equals `expected_version`.
    ///
    /// The stored version is bumped. Fails with `NotFound` for an unknown id
    /// and `Conflict` when another writer got there first.
    async fn update(
        &self,
        record: PayrollRecord,
        expected_version: u64,
    ) -> EngineResult<PayrollRecord>;

    /// Returns every record matching `filter`, in no particular order.
    async fn query(&self, filter: &RecordFilter) -> EngineResult<Vec<PayrollRecord>>;
}

/// Read-only view of employee compensation.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// Returns the compensation of an active employee.
    async fn compensation(&self, employee_id: &str) -> EngineResult<Option<CompensationProfile>>;

    /// Returns the active employees selected by a bulk filter.
    async fn population(&self, filter: &BulkFilter) -> EngineResult<Vec<CompensationProfile>>;
}
