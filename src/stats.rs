//! Aggregate statistics over stored payroll records.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculation::round_half_even;
use crate::error::EngineResult;
use crate::models::{
    ComplianceStatus, ComplianceTally, CountryBreakdown, PayrollRecord, PayrollStats,
    PayrollStatus, RecordFilter, StatsFilter,
};
use crate::store::PayrollStore;

/// Computes rollups by scanning the record store.
pub struct StatsAggregator {
    store: Arc<dyn PayrollStore>,
}

impl StatsAggregator {
    /// Creates an aggregator over `store`.
    pub fn new(store: Arc<dyn PayrollStore>) -> Self {
        Self { store }
    }

    /// Aggregates the records matching `filter`.
    ///
    /// Failed records count towards `record_count`, `count_by_status` and
    /// the compliance tally, but not towards any monetary total.
    pub async fn stats(&self, filter: &StatsFilter) -> EngineResult<PayrollStats> {
        let records = self
            .store
            .query(&RecordFilter {
                month: filter.month,
                year: filter.year,
                country: filter.country.clone(),
                ..Default::default()
            })
            .await?;

        let stats = aggregate(&records);
        debug!(
            records = stats.record_count,
            total_net = %stats.total_net,
            "Payroll stats computed"
        );
        Ok(stats)
    }
}

fn aggregate(records: &[PayrollRecord]) -> PayrollStats {
    let mut count_by_status: BTreeMap<PayrollStatus, usize> = BTreeMap::new();
    let mut countries: HashMap<&str, CountryBreakdown> = HashMap::new();
    let mut compliance = ComplianceTally::default();

    let mut total_gross = Decimal::ZERO;
    let mut total_net = Decimal::ZERO;
    let mut total_deductions = Decimal::ZERO;
    let mut total_employer_cost = Decimal::ZERO;
    let mut counted = 0usize;

    for record in records {
        *count_by_status.entry(record.status).or_default() += 1;

        for check in &record.compliance_checks {
            match check.status {
                ComplianceStatus::Passed => compliance.passed += 1,
                ComplianceStatus::Failed => compliance.failed += 1,
                ComplianceStatus::Warning => compliance.warning += 1,
            }
        }

        if record.status == PayrollStatus::Failed {
            continue;
        }

        counted += 1;
        total_gross += record.gross_pay;
        total_net += record.net_pay;
        total_deductions += record.total_deductions();
        total_employer_cost += record.total_employer_cost;

        let country = countries
            .entry(record.country.as_str())
            .or_insert_with(|| CountryBreakdown {
                country: record.country.clone(),
                currency: record.currency.clone(),
                count: 0,
                total_gross: Decimal::ZERO,
                total_net: Decimal::ZERO,
            });
        country.count += 1;
        country.total_gross += record.gross_pay;
        country.total_net += record.net_pay;
    }

    let average_net = if counted == 0 {
        Decimal::ZERO
    } else {
        round_half_even(total_net / Decimal::from(counted), 2)
    };

    let mut by_country: Vec<CountryBreakdown> = countries.into_values().collect();
    by_country.sort_by(|a, b| b.count.cmp(&a.count).then(a.country.cmp(&b.country)));

    PayrollStats {
        record_count: records.len(),
        total_gross,
        total_net,
        total_deductions,
        total_employer_cost,
        average_net,
        count_by_status,
        by_country,
        compliance,
    }
}
