//! Payroll record models.
//!
//! This module contains the [`PayrollRecord`] type persisted by the record
//! store, the [`PayrollStatus`] state machine that governs it, and the
//! query types used to list records.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuditStep, BankDetails, CompensationProfile, PaymentMethod, TaxRule};
use crate::error::{EngineError, EngineResult};

/// Lifecycle state of a payroll record.
///
/// ```text
/// generated ──> processing ──> processed ──> paid
///     │              │
///     └──> failed <──┘
/// ```
///
/// `paid` and `failed` are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollStatus {
    /// Calculated and stored, awaiting processing.
    Generated,
    /// Claimed by a process request that is running its validation.
    Processing,
    /// Validated and ready for payment.
    Processed,
    /// Payment recorded.
    Paid,
    /// Processing failed; kept for audit.
    Failed,
}

impl PayrollStatus {
    /// All states, in lifecycle order.
    pub const ALL: [PayrollStatus; 5] = [
        PayrollStatus::Generated,
        PayrollStatus::Processing,
        PayrollStatus::Processed,
        PayrollStatus::Paid,
        PayrollStatus::Failed,
    ];

    /// Returns true when the lifecycle allows moving from `self` to `next`.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::PayrollStatus;
    ///
    /// assert!(PayrollStatus::Generated.can_transition_to(PayrollStatus::Processing));
    /// assert!(!PayrollStatus::Paid.can_transition_to(PayrollStatus::Processing));
    /// ```
    pub fn can_transition_to(self, next: PayrollStatus) -> bool {
        use PayrollStatus::*;

        match (self, next) {
            (Generated, Processing) | (Generated, Failed) => true,
            (Processing, Processed) | (Processing, Failed) => true,
            (Processed, Paid) => true,
            (Generated, _) | (Processing, _) | (Processed, _) => false,
            (Paid, _) | (Failed, _) => false,
        }
    }

    /// Checks a transition, returning `InvalidStateTransition` when disallowed.
    pub fn transition(self, next: PayrollStatus) -> EngineResult<PayrollStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(EngineError::InvalidStateTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Returns true for states no transition leaves.
    pub fn is_terminal(self) -> bool {
        matches!(self, PayrollStatus::Paid | PayrollStatus::Failed)
    }

    /// Returns the snake_case name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            PayrollStatus::Generated => "generated",
            PayrollStatus::Processing => "processing",
            PayrollStatus::Processed => "processed",
            PayrollStatus::Paid => "paid",
            PayrollStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PayrollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of a deduction line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionKind {
    /// Progressive income tax.
    Tax,
    /// Flat statutory contribution.
    Statutory,
}

/// One line withheld from gross pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionLine {
    /// Name of the deduction (e.g., "tax", "social").
    pub name: String,
    /// Kind of deduction.
    pub kind: DeductionKind,
    /// Amount withheld, rounded to the currency minor unit.
    pub amount: Decimal,
}

/// One employer-side contribution, paid on top of gross.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionLine {
    /// Name of the contribution.
    pub name: String,
    /// Amount, rounded to the currency minor unit.
    pub amount: Decimal,
}

/// Outcome of a compliance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    /// The check passed.
    Passed,
    /// The check failed; processing will fail the record.
    Failed,
    /// The check raised a warning.
    Warning,
}

/// A compliance check attached to a payroll record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    /// Name of the check.
    pub name: String,
    /// Outcome.
    pub status: ComplianceStatus,
    /// Human-readable explanation.
    pub message: String,
}

/// Inputs captured by value when a record is generated.
///
/// Later edits to the employee's compensation or to the country's tax rules
/// never alter a record that already exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSnapshot {
    /// The compensation profile used for the calculation.
    pub compensation: CompensationProfile,
    /// The tax rule used for the calculation.
    pub tax_rule: TaxRule,
}

/// Uniqueness key of a payroll record among non-failed records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayrollKey {
    /// Employee identifier.
    pub employee_id: String,
    /// Calendar month.
    pub month: u32,
    /// Calendar year.
    pub year: i32,
    /// Payroll country.
    pub country: String,
}

/// A stored payroll record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Employee the record pays.
    pub employee_id: String,
    /// Payroll country.
    pub country: String,
    /// Calendar month.
    pub month: u32,
    /// Calendar year.
    pub year: i32,
    /// Lifecycle state.
    pub status: PayrollStatus,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Base salary plus allowances.
    pub gross_pay: Decimal,
    /// Ordered deduction lines.
    pub deductions: Vec<DeductionLine>,
    /// Gross minus the sum of deductions.
    pub net_pay: Decimal,
    /// Employer-side contributions.
    pub employer_contributions: Vec<ContributionLine>,
    /// Gross plus employer contributions.
    pub total_employer_cost: Decimal,
    /// Compliance checks run at generation.
    pub compliance_checks: Vec<ComplianceCheck>,
    /// Date the payment was made.
    pub payment_date: Option<NaiveDate>,
    /// How the payment is made.
    pub payment_method: Option<PaymentMethod>,
    /// Bank account for transfers.
    pub bank_details: Option<BankDetails>,
    /// Reason captured when the record failed.
    pub failure_reason: Option<String>,
    /// Inputs captured at generation.
    pub snapshot: GenerationSnapshot,
    /// Calculation trace.
    pub calculation_steps: Vec<AuditStep>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// When processing succeeded.
    pub processed_at: Option<DateTime<Utc>>,
    /// When payment was recorded.
    pub paid_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency version, bumped by the store on every write.
    pub version: u64,
}

impl PayrollRecord {
    /// Returns the uniqueness key of this record.
    pub fn key(&self) -> PayrollKey {
        PayrollKey {
            employee_id: self.employee_id.clone(),
            month: self.month,
            year: self.year,
            country: self.country.clone(),
        }
    }

    /// Sum of all deduction lines.
    pub fn total_deductions(&self) -> Decimal {
        self.deductions.iter().map(|d| d.amount).sum()
    }
}

/// Filters for listing and aggregating payroll records.
///
/// Every field is optional; an empty filter matches all records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Only records of this employee.
    #[serde(default)]
    pub employee_id: Option<String>,
    /// Only records for this month.
    #[serde(default)]
    pub month: Option<u32>,
    /// Only records for this year.
    #[serde(default)]
    pub year: Option<i32>,
    /// Only records for this country.
    #[serde(default)]
    pub country: Option<String>,
    /// Only records in this state.
    #[serde(default)]
    pub status: Option<PayrollStatus>,
}

impl RecordFilter {
    /// Returns true when the record satisfies every set field.
    pub fn matches(&self, record: &PayrollRecord) -> bool {
        self.employee_id
            .as_deref()
            .is_none_or(|id| record.employee_id == id)
            && self.month.is_none_or(|m| record.month == m)
            && self.year.is_none_or(|y| record.year == y)
            && self
                .country
                .as_deref()
                .is_none_or(|c| record.country == c)
            && self.status.is_none_or(|s| record.status == s)
    }
}

/// Page request for listing records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Maximum records per page.
    pub limit: u32,
}

/// Pagination metadata returned with a page of records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Total number of matching records.
    pub total: usize,
    /// 1-based page number.
    pub page: u32,
    /// Records per page.
    pub limit: u32,
    /// Number of pages.
    pub pages: u32,
}

/// One page of payroll records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPage {
    /// Records on this page.
    pub records: Vec<PayrollRecord>,
    /// Pagination metadata.
    pub pagination: Pagination,
}
