//! Payroll record lifecycle.
//!
//! [`PayrollLifecycle`] generates records, moves them through
//! `generated → processing → processed → paid` and serves the read-only
//! queries. Every mutation goes through the store's version-checked update,
//! so a request that loses a race gets `Conflict` instead of overwriting.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::calculation::compute_payroll;
use crate::config::ListingSettings;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    BankDetails, CompensationProfile, ComplianceStatus, GenerationSnapshot, PageRequest,
    Pagination, PayPeriod, PaymentMethod, PayrollRecord, PayrollStatus, RecordFilter, RecordPage,
    TaxRule,
};
use crate::registry::TaxRuleRegistry;
use crate::store::{EmployeeDirectory, PayrollStore};

/// Payment metadata supplied when a record is marked paid.
///
/// Unset fields keep the values captured at generation; the payment date
/// defaults to today.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    /// Date the payment was made.
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    /// How the payment was made.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    /// Account the payment went to.
    #[serde(default)]
    pub bank_details: Option<BankDetails>,
}

/// Drives payroll records through their lifecycle.
pub struct PayrollLifecycle {
    store: Arc<dyn PayrollStore>,
    directory: Arc<dyn EmployeeDirectory>,
    registry: Arc<TaxRuleRegistry>,
    listing: ListingSettings,
}

impl PayrollLifecycle {
    /// Creates a lifecycle manager over the given collaborators.
    pub fn new(
        store: Arc<dyn PayrollStore>,
        directory: Arc<dyn EmployeeDirectory>,
        registry: Arc<TaxRuleRegistry>,
        listing: ListingSettings,
    ) -> Self {
        Self {
            store,
            directory,
            registry,
            listing,
        }
    }

    /// Returns the listing settings used to clamp page sizes.
    pub fn listing(&self) -> ListingSettings {
        self.listing
    }

    /// Generates the payroll record of one employee for one period.
    ///
    /// # Returns
    ///
    /// The stored record in `generated`, or:
    /// - `NotFound` for an unknown employee or a country without tax rules
    /// - `InvalidInput` for a bad period, bad compensation, or an employee
    ///   not paid in `country`
    /// - `Conflict` when a non-failed record already exists for the key
    pub async fn generate(
        &self,
        employee_id: &str,
        period: PayPeriod,
        country: &str,
    ) -> EngineResult<PayrollRecord> {
        period.validate()?;

        let profile = self
            .directory
            .compensation(employee_id)
            .await?
            .ok_or_else(|| EngineError::not_found("employee", employee_id))?;

        if profile.country != country {
            return Err(EngineError::InvalidInput {
                field: "country".to_string(),
                message: format!(
                    "employee {} is paid in {}, not {}",
                    employee_id, profile.country, country
                ),
            });
        }

        let tax_rule = self.registry.get(country).await?;
        self.generate_from_snapshot(profile, &tax_rule, period).await
    }

    /// Generates a record from an already captured profile and tax rule.
    ///
    /// Bulk jobs use this to share one tax rule snapshot across employees.
    pub async fn generate_from_snapshot(
        &self,
        profile: CompensationProfile,
        tax_rule: &TaxRule,
        period: PayPeriod,
    ) -> EngineResult<PayrollRecord> {
        let breakdown = compute_payroll(&profile, tax_rule, period)?;

        let now = Utc::now();
        let record = PayrollRecord {
            id: Uuid::new_v4(),
            employee_id: profile.employee_id.clone(),
            country: tax_rule.country.clone(),
            month: period.month,
            year: period.year,
            status: PayrollStatus::Generated,
            currency: tax_rule.currency.clone(),
            gross_pay: breakdown.gross_pay,
            deductions: breakdown.deductions,
            net_pay: breakdown.net_pay,
            employer_contributions: breakdown.employer_contributions,
            total_employer_cost: breakdown.total_employer_cost,
            compliance_checks: breakdown.compliance_checks,
            payment_date: None,
            payment_method: Some(profile.payment_method),
            bank_details: profile.bank_details.clone(),
            failure_reason: None,
            calculation_steps: breakdown.audit_steps,
            snapshot: GenerationSnapshot {
                compensation: profile,
                tax_rule: tax_rule.clone(),
            },
            created_at: now,
            updated_at: now,
            processed_at: None,
            paid_at: None,
            version: 0,
        };

        let record = self.store.insert(record).await?;
        info!(
            record_id = %record.id,
            employee_id = %record.employee_id,
            country = %record.country,
            month = record.month,
            year = record.year,
            gross_pay = %record.gross_pay,
            net_pay = %record.net_pay,
            tax_rules_version = tax_rule.version,
            "Payroll generated"
        );
        Ok(record)
    }

    /// Processes a generated record.
    ///
    /// The record is first claimed by moving it to `processing`; then the
    /// processing checks run and the record ends in `processed`, or in
    /// `failed` with the reasons joined into `failure_reason`.
    ///
    /// # Returns
    ///
    /// The updated record, or:
    /// - `NotFound` for an unknown id
    /// - `InvalidStateTransition` when the record is not `generated`
    /// - `Conflict` when another request modified the record first
    ///
    /// When the final write fails after the claim, the record is released to
    /// `failed` and the write error is returned.
    pub async fn process(&self, record_id: Uuid) -> EngineResult<PayrollRecord> {
        let record = self.get_by_id(record_id).await?;

        let mut claimed = record.clone();
        claimed.status = record.status.transition(PayrollStatus::Processing)?;
        claimed.updated_at = Utc::now();
        let claimed = self.store.update(claimed, record.version).await?;
        debug!(record_id = %record_id, "Payroll record claimed for processing");

        let failures = processing_failures(&claimed);
        let mut finished = claimed.clone();
        let now = Utc::now();
        finished.updated_at = now;

        if failures.is_empty() {
            finished.status = claimed.status.transition(PayrollStatus::Processed)?;
            finished.processed_at = Some(now);
        } else {
            finished.status = claimed.status.transition(PayrollStatus::Failed)?;
            finished.failure_reason = Some(failures.join("; "));
        }

        let finished = match self.store.update(finished, claimed.version).await {
            Ok(finished) => finished,
            Err(err) => return Err(self.release_claim(claimed, err).await),
        };
        match &finished.failure_reason {
            Some(reason) => warn!(
                record_id = %record_id,
                employee_id = %finished.employee_id,
                reason = %reason,
                "Payroll processing failed"
            ),
            None => info!(
                record_id = %record_id,
                employee_id = %finished.employee_id,
                "Payroll processed"
            ),
        }
        Ok(finished)
    }

    /// Moves a claimed record to `failed` after its final write was lost, so
    /// it does not stay in `processing` and block its key. Returns the
    /// original error either way.
    async fn release_claim(&self, claimed: PayrollRecord, err: EngineError) -> EngineError {
        let mut released = claimed.clone();
        released.status = PayrollStatus::Failed;
        released.failure_reason = Some(format!("processing did not complete: {}", err));
        released.updated_at = Utc::now();

        match self.store.update(released, claimed.version).await {
            Ok(_) => warn!(
                record_id = %claimed.id,
                error = %err,
                "Payroll processing write failed; record released as failed"
            ),
            Err(release_err) => error!(
                record_id = %claimed.id,
                error = %err,
                release_error = %release_err,
                "Payroll processing write failed; record left in processing"
            ),
        }
        err
    }

    /// Records payment of a processed record.
    ///
    /// # Returns
    ///
    /// The paid record, or:
    /// - `NotFound` for an unknown id
    /// - `InvalidStateTransition` when the record is not `processed`
    /// - `InvalidInput` when a bank transfer ends up without an account number
    /// - `Conflict` when another request modified the record first
    pub async fn mark_paid(
        &self,
        record_id: Uuid,
        payment: PaymentDetails,
    ) -> EngineResult<PayrollRecord> {
        let record = self.get_by_id(record_id).await?;

        let mut paid = record.clone();
        paid.status = record.status.transition(PayrollStatus::Paid)?;

        if let Some(method) = payment.payment_method {
            paid.payment_method = Some(method);
        }
        if let Some(details) = payment.bank_details {
            paid.bank_details = Some(details);
        }
        if paid.payment_method == Some(PaymentMethod::BankTransfer)
            && !has_account_number(paid.bank_details.as_ref())
        {
            return Err(EngineError::InvalidInput {
                field: "bank_details".to_string(),
                message: "bank transfer requires bank details with an account number"
                    .to_string(),
            });
        }

        let now = Utc::now();
        paid.payment_date = Some(payment.payment_date.unwrap_or_else(|| now.date_naive()));
        paid.paid_at = Some(now);
        paid.updated_at = now;

        let paid = self.store.update(paid, record.version).await?;
        info!(
            record_id = %record_id,
            employee_id = %paid.employee_id,
            net_pay = %paid.net_pay,
            payment_date = ?paid.payment_date,
            "Payroll marked paid"
        );
        Ok(paid)
    }

    /// Fetches one record.
    pub async fn get_by_id(&self, record_id: Uuid) -> EngineResult<PayrollRecord> {
        self.store
            .get(record_id)
            .await?
            .ok_or_else(|| EngineError::not_found("payroll record", record_id.to_string()))
    }

    /// Lists records matching `filter`, newest period first.
    ///
    /// Records are ordered by year, month and creation time, all descending.
    /// `page` is 1-based and `limit` is clamped to the configured maximum.
    pub async fn list(
        &self,
        filter: &RecordFilter,
        page: PageRequest,
    ) -> EngineResult<RecordPage> {
        let mut records = self.store.query(filter).await?;
        records.sort_by(|a, b| {
            b.year
                .cmp(&a.year)
                .then(b.month.cmp(&a.month))
                .then(b.created_at.cmp(&a.created_at))
        });

        let limit = page.limit.clamp(1, self.listing.max_page_size.max(1));
        let page_number = page.page.max(1);
        let total = records.len();
        let pages = total.div_ceil(limit as usize) as u32;

        let records = records
            .into_iter()
            .skip((page_number as usize - 1) * limit as usize)
            .take(limit as usize)
            .collect();

        Ok(RecordPage {
            records,
            pagination: Pagination {
                total,
                page: page_number,
                limit,
                pages,
            },
        })
    }
}

fn has_account_number(details: Option<&BankDetails>) -> bool {
    details.is_some_and(BankDetails::has_account_number)
}

fn processing_failures(record: &PayrollRecord) -> Vec<String> {
    let mut failures = Vec::new();

    if record.payment_method == Some(PaymentMethod::BankTransfer)
        && !has_account_number(record.bank_details.as_ref())
    {
        failures.push("bank transfer requires bank details with an account number".to_string());
    }

    for check in record
        .compliance_checks
        .iter()
        .filter(|check| check.status == ComplianceStatus::Failed)
    {
        failures.push(format!(
            "compliance check '{}' failed: {}",
            check.name, check.message
        ));
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlatDeduction, TaxBracket, TaxRuleSet};
    use crate::store::{EmployeeEntry, InMemoryEmployeeDirectory, InMemoryPayrollStore};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn us_rules() -> TaxRuleSet {
        TaxRuleSet {
            currency: "USD".to_string(),
            brackets: vec![
                TaxBracket {
                    threshold: dec("0"),
                    rate: dec("0.10"),
                },
                TaxBracket {
                    threshold: dec("2000"),
                    rate: dec("0.20"),
                },
                TaxBracket {
                    threshold: dec("5000"),
                    rate: dec("0.30"),
                },
            ],
            flat_deductions: vec![FlatDeduction {
                name: "social".to_string(),
                rate: dec("0.05"),
                employer_rate: Decimal::ZERO,
                max_contribution_base: None,
            }],
            standard_deduction: Decimal::ZERO,
            minimum_wage: Some(dec("1000")),
            effective_from: None,
        }
    }

    fn employee(id: &str, salary: &str, method: PaymentMethod, bank: bool) -> EmployeeEntry {
        EmployeeEntry {
            profile: CompensationProfile {
                employee_id: id.to_string(),
                country: "US".to_string(),
                base_salary: dec(salary),
                allowances: vec![],
                currency: "USD".to_string(),
                payment_method: method,
                bank_details: bank.then(|| BankDetails {
                    account_number: Some("000123".to_string()),
                    ..Default::default()
                }),
            },
            department: None,
            active: true,
        }
    }

    async fn lifecycle() -> (PayrollLifecycle, Arc<TaxRuleRegistry>) {
        let registry = Arc::new(TaxRuleRegistry::new());
        registry.update("US", us_rules(), None).await.unwrap();

        let directory = InMemoryEmployeeDirectory::with_entries([
            employee("emp_001", "5000", PaymentMethod::BankTransfer, true),
            employee("emp_002", "4000", PaymentMethod::BankTransfer, false),
            employee("emp_003", "3000", PaymentMethod::Cash, false),
            employee("emp_004", "800", PaymentMethod::Cash, false),
        ]);

        let lifecycle = PayrollLifecycle::new(
            Arc::new(InMemoryPayrollStore::new()),
            Arc::new(directory),
            Arc::clone(&registry),
            ListingSettings::default(),
        );
        (lifecycle, registry)
    }

    fn period(month: u32) -> PayPeriod {
        PayPeriod::new(month, 2026).unwrap()
    }

    /// Store that fails one chosen update call.
    struct FailingUpdateStore {
        inner: InMemoryPayrollStore,
        updates: AtomicUsize,
        fail_on: usize,
    }

    #[async_trait]
    impl PayrollStore for FailingUpdateStore {
        async fn insert(&self, record: PayrollRecord) -> EngineResult<PayrollRecord> {
            self.inner.insert(record).await
        }

        async fn get(&self, id: Uuid) -> EngineResult<Option<PayrollRecord>> {
            self.inner.get(id).await
        }

        async fn update(
            &self,
            record: PayrollRecord,
            expected_version: u64,
        ) -> EngineResult<PayrollRecord> {
            if self.updates.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
                return Err(EngineError::Storage {
                    message: "disk unavailable".to_string(),
                });
            }
            self.inner.update(record, expected_version).await
        }

        async fn query(&self, filter: &RecordFilter) -> EngineResult<Vec<PayrollRecord>> {
            self.inner.query(filter).await
        }
    }

    #[tokio::test]
    async fn test_generate_stores_generated_record() {
        let (lifecycle, _) = lifecycle().await;

        let record = lifecycle.generate("emp_001", period(1), "US").await.unwrap();

        assert_eq!(record.status, PayrollStatus::Generated);
        assert_eq!(record.gross_pay, dec("5000"));
        assert_eq!(record.net_pay.to_string(), "3950.00");
        assert_eq!(record.net_pay, record.gross_pay - record.total_deductions());
        assert_eq!(record.snapshot.tax_rule.version, 1);
        assert_eq!(record.payment_method, Some(PaymentMethod::BankTransfer));
        assert_eq!(lifecycle.get_by_id(record.id).await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_generate_twice_conflicts() {
        let (lifecycle, _) = lifecycle().await;
        lifecycle.generate("emp_001", period(1), "US").await.unwrap();

        let result = lifecycle.generate("emp_001", period(1), "US").await;
        assert!(matches!(result, Err(EngineError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_generate_unknown_employee_not_found() {
        let (lifecycle, _) = lifecycle().await;

        match lifecycle.generate("emp_404", period(1), "US").await {
            Err(EngineError::NotFound { entity, .. }) => assert_eq!(entity, "employee"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_wrong_country_is_invalid_input() {
        let (lifecycle, _) = lifecycle().await;

        let result = lifecycle.generate("emp_001", period(1), "UK").await;
        assert!(matches!(result, Err(EngineError::InvalidInput { field, .. }) if field == "country"));
    }

    #[tokio::test]
    async fn test_generate_invalid_month_is_invalid_input() {
        let (lifecycle, _) = lifecycle().await;
        let bad = PayPeriod {
            month: 0,
            year: 2026,
        };

        let result = lifecycle.generate("emp_001", bad, "US").await;
        assert!(matches!(result, Err(EngineError::InvalidInput { field, .. }) if field == "month"));
    }

    #[tokio::test]
    async fn test_snapshot_unaffected_by_later_rule_update() {
        let (lifecycle, registry) = lifecycle().await;
        let record = lifecycle.generate("emp_001", period(1), "US").await.unwrap();

        let mut higher = us_rules();
        higher.brackets[0].rate = dec("0.15");
        registry.update("US", higher, None).await.unwrap();

        let stored = lifecycle.get_by_id(record.id).await.unwrap();
        assert_eq!(stored.net_pay, record.net_pay);
        assert_eq!(stored.snapshot.tax_rule.brackets[0].rate, dec("0.10"));
    }

    #[tokio::test]
    async fn test_process_success() {
        let (lifecycle, _) = lifecycle().await;
        let record = lifecycle.generate("emp_001", period(1), "US").await.unwrap();

        let processed = lifecycle.process(record.id).await.unwrap();

        assert_eq!(processed.status, PayrollStatus::Processed);
        assert!(processed.processed_at.is_some());
        assert!(processed.failure_reason.is_none());
        assert_eq!(processed.version, 2);
    }

    #[tokio::test]
    async fn test_process_missing_bank_details_fails_record() {
        let (lifecycle, _) = lifecycle().await;
        let record = lifecycle.generate("emp_002", period(1), "US").await.unwrap();

        let failed = lifecycle.process(record.id).await.unwrap();

        assert_eq!(failed.status, PayrollStatus::Failed);
        assert!(failed.failure_reason.unwrap().contains("bank transfer"));
        assert!(failed.processed_at.is_none());
    }

    #[tokio::test]
    async fn test_failed_record_does_not_block_regeneration() {
        let (lifecycle, _) = lifecycle().await;
        let record = lifecycle.generate("emp_002", period(1), "US").await.unwrap();
        lifecycle.process(record.id).await.unwrap();

        let fresh = lifecycle.generate("emp_002", period(1), "US").await.unwrap();
        assert_ne!(fresh.id, record.id);
        assert_eq!(fresh.status, PayrollStatus::Generated);
    }

    #[tokio::test]
    async fn test_lost_final_write_releases_record_as_failed() {
        let registry = Arc::new(TaxRuleRegistry::new());
        registry.update("US", us_rules(), None).await.unwrap();
        let lifecycle = PayrollLifecycle::new(
            Arc::new(FailingUpdateStore {
                inner: InMemoryPayrollStore::new(),
                updates: AtomicUsize::new(0),
                fail_on: 2,
            }),
            Arc::new(InMemoryEmployeeDirectory::with_entries([employee(
                "emp_003",
                "3000",
                PaymentMethod::Cash,
                false,
            )])),
            registry,
            ListingSettings::default(),
        );
        let record = lifecycle.generate("emp_003", period(1), "US").await.unwrap();

        let result = lifecycle.process(record.id).await;
        assert!(matches!(result, Err(EngineError::Storage { .. })));

        let stored = lifecycle.get_by_id(record.id).await.unwrap();
        assert_eq!(stored.status, PayrollStatus::Failed);
        assert!(
            stored
                .failure_reason
                .as_deref()
                .unwrap()
                .contains("disk unavailable")
        );

        // The key is free again
        let fresh = lifecycle.generate("emp_003", period(1), "US").await.unwrap();
        assert_eq!(fresh.status, PayrollStatus::Generated);
    }

    #[tokio::test]
    async fn test_process_failed_compliance_fails_record() {
        let (lifecycle, _) = lifecycle().await;
        let record = lifecycle.generate("emp_004", period(1), "US").await.unwrap();

        let failed = lifecycle.process(record.id).await.unwrap();

        assert_eq!(failed.status, PayrollStatus::Failed);
        assert!(failed.failure_reason.unwrap().contains("Minimum Wage"));
    }

    #[tokio::test]
    async fn test_process_twice_is_invalid_transition() {
        let (lifecycle, _) = lifecycle().await;
        let record = lifecycle.generate("emp_003", period(1), "US").await.unwrap();
        lifecycle.process(record.id).await.unwrap();

        match lifecycle.process(record.id).await {
            Err(EngineError::InvalidStateTransition { from, to }) => {
                assert_eq!(from, PayrollStatus::Processed);
                assert_eq!(to, PayrollStatus::Processing);
            }
            other => panic!("Expected InvalidStateTransition, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrent_process_has_one_winner() {
        let (lifecycle, _) = lifecycle().await;
        let lifecycle = Arc::new(lifecycle);
        let record_id = lifecycle
            .generate("emp_003", period(1), "US")
            .await
            .unwrap()
            .id;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let lifecycle = Arc::clone(&lifecycle);
            handles.push(tokio::spawn(async move { lifecycle.process(record_id).await }));
        }

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(EngineError::Conflict { .. })
                | Err(EngineError::InvalidStateTransition { .. }) => {}
                Err(other) => panic!("Unexpected error: {:?}", other),
            }
        }

        assert_eq!(winners, 1);
        let stored = lifecycle.get_by_id(record_id).await.unwrap();
        assert_eq!(stored.status, PayrollStatus::Processed);
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_mark_paid_requires_processed() {
        let (lifecycle, _) = lifecycle().await;
        let record = lifecycle.generate("emp_003", period(1), "US").await.unwrap();

        let result = lifecycle
            .mark_paid(record.id, PaymentDetails::default())
            .await;
        assert!(matches!(
            result,
            Err(EngineError::InvalidStateTransition {
                from: PayrollStatus::Generated,
                to: PayrollStatus::Paid
            })
        ));
    }

    #[tokio::test]
    async fn test_mark_paid_defaults_payment_date_to_today() {
        let (lifecycle, _) = lifecycle().await;
        let record = lifecycle.generate("emp_003", period(1), "US").await.unwrap();
        lifecycle.process(record.id).await.unwrap();

        let paid = lifecycle
            .mark_paid(record.id, PaymentDetails::default())
            .await
            .unwrap();

        assert_eq!(paid.status, PayrollStatus::Paid);
        assert_eq!(paid.payment_date, Some(Utc::now().date_naive()));
        assert!(paid.paid_at.is_some());
        assert_eq!(paid.payment_method, Some(PaymentMethod::Cash));
    }

    #[tokio::test]
    async fn test_mark_paid_records_payment_metadata() {
        let (lifecycle, _) = lifecycle().await;
        let record = lifecycle.generate("emp_003", period(1), "US").await.unwrap();
        lifecycle.process(record.id).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let paid = lifecycle
            .mark_paid(
                record.id,
                PaymentDetails {
                    payment_date: Some(date),
                    payment_method: Some(PaymentMethod::Check),
                    bank_details: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(paid.payment_date, Some(date));
        assert_eq!(paid.payment_method, Some(PaymentMethod::Check));

        let again = lifecycle
            .mark_paid(record.id, PaymentDetails::default())
            .await;
        assert!(matches!(
            again,
            Err(EngineError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_mark_paid_bank_transfer_needs_account() {
        let (lifecycle, _) = lifecycle().await;
        let record = lifecycle.generate("emp_003", period(1), "US").await.unwrap();
        lifecycle.process(record.id).await.unwrap();

        let result = lifecycle
            .mark_paid(
                record.id,
                PaymentDetails {
                    payment_method: Some(PaymentMethod::BankTransfer),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_get_unknown_record_not_found() {
        let (lifecycle, _) = lifecycle().await;

        let result = lifecycle.get_by_id(Uuid::new_v4()).await;
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_orders_newest_period_first() {
        let (lifecycle, _) = lifecycle().await;
        for month in [3, 1, 2] {
            lifecycle
                .generate("emp_001", period(month), "US")
                .await
                .unwrap();
        }

        let page = lifecycle
            .list(
                &RecordFilter::default(),
                PageRequest { page: 1, limit: 10 },
            )
            .await
            .unwrap();

        let months: Vec<u32> = page.records.iter().map(|r| r.month).collect();
        assert_eq!(months, vec![3, 2, 1]);
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.pages, 1);
    }

    #[tokio::test]
    async fn test_list_paginates_and_filters() {
        let (lifecycle, _) = lifecycle().await;
        for month in 1..=5 {
            lifecycle
                .generate("emp_003", period(month), "US")
                .await
                .unwrap();
        }
        lifecycle.generate("emp_001", period(1), "US").await.unwrap();

        let filter = RecordFilter {
            employee_id: Some("emp_003".to_string()),
            ..Default::default()
        };
        let page = lifecycle
            .list(&filter, PageRequest { page: 2, limit: 2 })
            .await
            .unwrap();

        let months: Vec<u32> = page.records.iter().map(|r| r.month).collect();
        assert_eq!(months, vec![3, 2]);
        assert_eq!(page.pagination.total, 5);
        assert_eq!(page.pagination.pages, 3);

        let beyond = lifecycle
            .list(&filter, PageRequest { page: 9, limit: 2 })
            .await
            .unwrap();
        assert!(beyond.records.is_empty());
    }

    #[tokio::test]
    async fn test_list_clamps_limit() {
        let (lifecycle, _) = lifecycle().await;
        lifecycle.generate("emp_001", period(1), "US").await.unwrap();

        let page = lifecycle
            .list(
                &RecordFilter::default(),
                PageRequest {
                    page: 0,
                    limit: 10_000,
                },
            )
            .await
            .unwrap();

        assert_eq!(page.pagination.page, 1);
        assert_eq!(page.pagination.limit, 100);

        let zero = lifecycle
            .list(&RecordFilter::default(), PageRequest { page: 1, limit: 0 })
            .await
            .unwrap();
        assert_eq!(zero.pagination.limit, 1);
    }
}
