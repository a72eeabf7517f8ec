//! Aggregate statistics over payroll records.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PayrollStatus;

/// Filters accepted by the stats aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsFilter {
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

/// Totals for one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryBreakdown {
    /// Payroll country.
    pub country: String,
    /// Currency of the country's records.
    pub currency: String,
    /// Non-failed records counted.
    pub count: usize,
    /// Sum of gross pay.
    pub total_gross: Decimal,
    /// Sum of net pay.
    pub total_net: Decimal,
}

/// Tally of compliance check outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceTally {
    /// Checks that passed.
    pub passed: usize,
    /// Checks that failed.
    pub failed: usize,
    /// Checks that raised a warning.
    pub warning: usize,
}

/// Rollup over the records matching a [`StatsFilter`].
///
/// Monetary totals cover non-failed records only; `count_by_status` covers
/// every matching record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollStats {
    /// Every matching record, failed ones included.
    pub record_count: usize,
    /// Sum of gross pay.
    pub total_gross: Decimal,
    /// Sum of net pay.
    pub total_net: Decimal,
    /// Sum of all deduction lines.
    pub total_deductions: Decimal,
    /// Sum of gross plus employer contributions.
    pub total_employer_cost: Decimal,
    /// Mean net pay, rounded half-to-even to two places.
    pub average_net: Decimal,
    /// Records per lifecycle state.
    pub count_by_status: BTreeMap<PayrollStatus, usize>,
    /// Totals per country, ordered by record count descending.
    pub by_country: Vec<CountryBreakdown>,
    /// Compliance check outcomes.
    pub compliance: ComplianceTally,
}
