//! Request types for the payroll API.
//!
//! Bodies and query strings are decoded into these explicit types and
//! validated before they reach the engine.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::PaymentDetails;
use crate::models::{
    BankDetails, BulkFilter, FlatDeduction, PayPeriod, PaymentMethod, PayrollStatus, RecordFilter,
    StatsFilter, TaxBracket, TaxRuleSet,
};

use super::response::ApiError;

/// Request body for `POST /payroll/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The employee to generate payroll for.
    pub employee_id: String,
    /// Calendar month, 1 through 12.
    pub month: u32,
    /// Calendar year.
    pub year: i32,
    /// Payroll country.
    pub country: String,
}

impl GenerateRequest {
    /// Checks the fields the engine cannot check itself.
    pub fn validate(&self) -> Result<(), ApiError> {
        require_non_blank("employee_id", &self.employee_id)?;
        require_non_blank("country", &self.country)
    }

    /// Returns the requested pay period, unvalidated.
    pub fn period(&self) -> PayPeriod {
        PayPeriod {
            month: self.month,
            year: self.year,
        }
    }
}

/// Request body for `POST /payroll/bulk`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkGenerateRequest {
    /// Calendar month, 1 through 12.
    pub month: u32,
    /// Calendar year.
    pub year: i32,
    /// Payroll country.
    pub country: String,
    /// Restricts the population to one department.
    #[serde(default)]
    pub department: Option<String>,
    /// Caller-chosen job id, used to cancel the job while it runs.
    #[serde(default)]
    pub job_id: Option<Uuid>,
}

impl BulkGenerateRequest {
    /// Checks the fields the engine cannot check itself.
    pub fn validate(&self) -> Result<(), ApiError> {
        require_non_blank("country", &self.country)
    }
}

impl From<BulkGenerateRequest> for BulkFilter {
    fn from(req: BulkGenerateRequest) -> Self {
        BulkFilter {
            month: req.month,
            year: req.year,
            country: req.country,
            department: req.department,
        }
    }
}

/// Request body for `POST /payroll/records/:id/pay`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkPaidRequest {
    /// Date the payment was made; defaults to today.
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    /// How the payment was made.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    /// Account the payment went to.
    #[serde(default)]
    pub bank_details: Option<BankDetails>,
}

impl From<MarkPaidRequest> for PaymentDetails {
    fn from(req: MarkPaidRequest) -> Self {
        PaymentDetails {
            payment_date: req.payment_date,
            payment_method: req.payment_method,
            bank_details: req.bank_details,
        }
    }
}

/// Request body for `PUT /payroll/tax-rules/:country`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTaxRulesRequest {
    /// ISO 4217 currency code.
    pub currency: String,
    /// Progressive brackets, ascending by threshold.
    pub brackets: Vec<TaxBracket>,
    /// Flat deductions.
    #[serde(default)]
    pub flat_deductions: Vec<FlatDeduction>,
    /// Amount subtracted from gross before the progressive tax.
    #[serde(default)]
    pub standard_deduction: Decimal,
    /// Minimum base salary per period.
    #[serde(default)]
    pub minimum_wage: Option<Decimal>,
    /// Date from which the rules apply; defaults to today.
    #[serde(default)]
    pub effective_from: Option<NaiveDate>,
    /// Version the caller last read; the update fails if it is stale.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

impl UpdateTaxRulesRequest {
    /// Splits the request into the rule set and the optimistic version check.
    pub fn into_parts(self) -> (TaxRuleSet, Option<u64>) {
        let rule_set = TaxRuleSet {
            currency: self.currency,
            brackets: self.brackets,
            flat_deductions: self.flat_deductions,
            standard_deduction: self.standard_deduction,
            minimum_wage: self.minimum_wage,
            effective_from: self.effective_from,
        };
        (rule_set, self.expected_version)
    }
}

/// Query string of `GET /payroll/records`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRecordsQuery {
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
    /// 1-based page number.
    #[serde(default)]
    pub page: Option<u32>,
    /// Records per page.
    #[serde(default)]
    pub limit: Option<u32>,
}

impl ListRecordsQuery {
    /// Returns the record filter part of the query.
    pub fn filter(&self) -> RecordFilter {
        RecordFilter {
            employee_id: self.employee_id.clone(),
            month: self.month,
            year: self.year,
            country: self.country.clone(),
            status: self.status,
        }
    }
}

/// Query string of `GET /payroll/stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsQuery {
    /// Only records for this month.
    #[serde(default)]
    pub month: Option<u32>,
    /// Only records for this year.
    #[serde(default)]
    pub year: Option<i32>,
    /// Only records for this country.
    #[serde(default)]
    pub country: Option<String>,
}

impl From<StatsQuery> for StatsFilter {
    fn from(query: StatsQuery) -> Self {
        StatsFilter {
            month: query.month,
            year: query.year,
            country: query.country,
        }
    }
}

fn require_non_blank(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::with_details(
            "VALIDATION_ERROR",
            format!("{} cannot be empty", field),
            format!("Required field '{}' must not be blank", field),
        ))
    } else {
        Ok(())
    }
}
