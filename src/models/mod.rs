//! Core data models for the payroll engine.
//!
//! This module contains all the domain models used throughout the engine.

mod audit;
mod bulk_job;
mod compensation;
mod payroll_record;
mod stats;
mod tax_rule;

pub use audit::AuditStep;
pub use bulk_job::{BulkFilter, BulkJob, BulkOutcome, BulkSummary};
pub use compensation::{Allowance, BankDetails, CompensationProfile, PayPeriod, PaymentMethod};
pub use payroll_record::{
    ComplianceCheck, ComplianceStatus, ContributionLine, DeductionKind, DeductionLine,
    GenerationSnapshot, PageRequest, Pagination, PayrollKey, PayrollRecord, PayrollStatus,
    RecordFilter, RecordPage,
};
pub use stats::{ComplianceTally, CountryBreakdown, PayrollStats, StatsFilter};
pub use tax_rule::{FlatDeduction, TaxBracket, TaxRule, TaxRuleSet};
