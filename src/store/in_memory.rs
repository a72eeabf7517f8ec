use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EmployeeDirectory, PayrollStore};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    BulkFilter, CompensationProfile, PayrollKey, PayrollRecord, PayrollStatus, RecordFilter,
};

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<Uuid, PayrollRecord>,
    // Key of every non-failed record.
    active: HashMap<PayrollKey, Uuid>,
}

/// A thread-safe in-memory payroll record store.
///
/// Records and the uniqueness index share one lock, so the duplicate check
/// and the insert happen as a single step.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPayrollStore {
    records: Arc<RwLock<Records>>,
}

impl InMemoryPayrollStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PayrollStore for InMemoryPayrollStore {
    async fn insert(&self, record: PayrollRecord) -> EngineResult<PayrollRecord> {
        let mut records = self.records.write().await;

        if records.by_id.contains_key(&record.id) {
            return Err(EngineError::conflict(format!(
                "payroll record {} already exists",
                record.id
            )));
        }

        let key = record.key();
        if record.status != PayrollStatus::Failed {
            if let Some(existing) = records.active.get(&key) {
                return Err(EngineError::conflict(format!(
                    "payroll for employee {} in {}/{} ({}) already exists as record {}",
                    key.employee_id, key.month, key.year, key.country, existing
                )));
            }
            records.active.insert(key, record.id);
        }

        records.by_id.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> EngineResult<Option<PayrollRecord>> {
        let records = self.records.read().await;
        Ok(records.by_id.get(&id).cloned())
    }

    async fn update(
        &self,
        mut record: PayrollRecord,
        expected_version: u64,
    ) -> EngineResult<PayrollRecord> {
        let mut records = self.records.write().await;

        let stored_version = records
            .by_id
            .get(&record.id)
            .map(|stored| stored.version)
            .ok_or_else(|| EngineError::not_found("payroll record", record.id.to_string()))?;

        if stored_version != expected_version {
            return Err(EngineError::conflict(format!(
                "payroll record {} was modified concurrently (version {}, expected {})",
                record.id, stored_version, expected_version
            )));
        }

        record.version = expected_version + 1;
        if record.status == PayrollStatus::Failed {
            let key = record.key();
            if records.active.get(&key) == Some(&record.id) {
                records.active.remove(&key);
            }
        }

        records.by_id.insert(record.id, record.clone());
        Ok(record)
    }

    async fn query(&self, filter: &RecordFilter) -> EngineResult<Vec<PayrollRecord>> {
        let records = self.records.read().await;
        Ok(records
            .by_id
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}

/// An employee known to the in-memory directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeEntry {
    /// The employee's compensation.
    #[serde(flatten)]
    pub profile: CompensationProfile,
    /// Department, used by bulk filters.
    #[serde(default)]
    pub department: Option<String>,
    /// Inactive employees are invisible to payroll.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// A thread-safe in-memory employee directory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEmployeeDirectory {
    employees: Arc<RwLock<HashMap<String, EmployeeEntry>>>,
}

impl InMemoryEmployeeDirectory {
    /// Creates a new, empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory holding `entries`.
    pub fn with_entries(entries: impl IntoIterator<Item = EmployeeEntry>) -> Self {
        let employees = entries
            .into_iter()
            .map(|entry| (entry.profile.employee_id.clone(), entry))
            .collect();
        Self {
            employees: Arc::new(RwLock::new(employees)),
        }
    }

    /// Adds or replaces an employee.
    pub async fn upsert(&self, entry: EmployeeEntry) {
        let mut employees = self.employees.write().await;
        employees.insert(entry.profile.employee_id.clone(), entry);
    }
}

#[async_trait]
impl EmployeeDirectory for InMemoryEmployeeDirectory {
    async fn compensation(&self, employee_id: &str) -> EngineResult<Option<CompensationProfile>> {
        let employees = self.employees.read().await;
        Ok(employees
            .get(employee_id)
            .filter(|entry| entry.active)
            .map(|entry| entry.profile.clone()))
    }

    async fn population(&self, filter: &BulkFilter) -> EngineResult<Vec<CompensationProfile>> {
        let employees = self.employees.read().await;
        let mut population: Vec<CompensationProfile> = employees
            .values()
            .filter(|entry| entry.active)
            .filter(|entry| entry.profile.country == filter.country)
            .filter(|entry| {
                filter
                    .department
                    .as_deref()
                    .is_none_or(|dept| entry.department.as_deref() == Some(dept))
            })
            .map(|entry| entry.profile.clone())
            .collect();
        population.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));
        Ok(population)
    }
}
