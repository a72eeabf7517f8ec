//! Payroll breakdown for one employee and one period.
//!
//! This is the pure entry point of the calculator: compensation and tax
//! rules in, gross/deductions/net out. It never reads the clock or any
//! shared state, so identical inputs always produce identical output.

use rust_decimal::Decimal;

use super::{
    calculate_flat_deductions, calculate_progressive_tax, check_minimum_wage, minor_units,
    round_money,
};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, CompensationProfile, ComplianceCheck, ContributionLine, DeductionKind,
    DeductionLine, PayPeriod, TaxRule,
};

/// Name of the progressive tax deduction line.
pub const TAX_DEDUCTION_NAME: &str = "tax";

/// The computed payroll for one employee and one period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayrollBreakdown {
    /// Base salary plus allowances, rounded.
    pub gross_pay: Decimal,
    /// Gross minus the standard deduction, floored at zero.
    pub taxable_income: Decimal,
    /// Tax line first, then flat deductions in rule order.
    pub deductions: Vec<DeductionLine>,
    /// Gross minus the sum of deductions.
    pub net_pay: Decimal,
    /// Employer-side contributions.
    pub employer_contributions: Vec<ContributionLine>,
    /// Gross plus employer contributions.
    pub total_employer_cost: Decimal,
    /// Compliance checks.
    pub compliance_checks: Vec<ComplianceCheck>,
    /// Calculation trace.
    pub audit_steps: Vec<AuditStep>,
}

impl PayrollBreakdown {
    /// Sum of all deduction lines.
    pub fn total_deductions(&self) -> Decimal {
        self.deductions.iter().map(|d| d.amount).sum()
    }
}

/// Computes the payroll breakdown for `profile` under `tax_rule`.
///
/// # Arguments
///
/// * `profile` - The employee's compensation
/// * `tax_rule` - The country's tax rules
/// * `period` - The pay period being generated
///
/// # Returns
///
/// Returns the breakdown, or `InvalidInput` if:
/// - the period is invalid
/// - base salary, an allowance, or gross is negative
/// - base salary plus allowances overflows
/// - the profile's currency differs from the rule's currency
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::compute_payroll;
/// use payroll_engine::models::{
///     CompensationProfile, FlatDeduction, PayPeriod, PaymentMethod, TaxBracket, TaxRule,
/// };
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let dec = |s: &str| Decimal::from_str(s).unwrap();
/// let rule = TaxRule {
///     country: "US".to_string(),
///     currency: "USD".to_string(),
///     brackets: vec![
///         TaxBracket { threshold: dec("0"), rate: dec("0.10") },
///         TaxBracket { threshold: dec("2000"), rate: dec("0.20") },
///         TaxBracket { threshold: dec("5000"), rate: dec("0.30") },
///     ],
///     flat_deductions: vec![FlatDeduction {
///         name: "social".to_string(),
///         rate: dec("0.05"),
///         employer_rate: Decimal::ZERO,
///         max_contribution_base: None,
///     }],
///     standard_deduction: Decimal::ZERO,
///     minimum_wage: None,
///     effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///     version: 1,
/// };
/// let profile = CompensationProfile {
///     employee_id: "emp_001".to_string(),
///     country: "US".to_string(),
///     base_salary: dec("5000"),
///     allowances: vec![],
///     currency: "USD".to_string(),
///     payment_method: PaymentMethod::BankTransfer,
///     bank_details: None,
/// };
///
/// let breakdown = compute_payroll(&profile, &rule, PayPeriod::new(1, 2026).unwrap()).unwrap();
/// assert_eq!(breakdown.net_pay.to_string(), "3950.00");
/// ```
pub fn compute_payroll(
    profile: &CompensationProfile,
    tax_rule: &TaxRule,
    period: PayPeriod,
) -> EngineResult<PayrollBreakdown> {
    period.validate()?;
    validate_profile(profile, tax_rule)?;

    let currency = tax_rule.currency.as_str();
    let mut audit_steps = Vec::new();
    let mut step_number: u32 = 1;

    let raw_gross = profile.gross_amount()?;
    if raw_gross < Decimal::ZERO {
        return Err(EngineError::InvalidInput {
            field: "gross".to_string(),
            message: format!("gross pay cannot be negative, got {}", raw_gross),
        });
    }
    let gross_pay = round_money(raw_gross, currency);
    audit_steps.push(gross_step(profile, gross_pay, step_number));
    step_number += 1;

    let taxable_income = (gross_pay - tax_rule.standard_deduction).max(Decimal::ZERO);
    let tax_result = calculate_progressive_tax(taxable_income, &tax_rule.brackets, step_number);
    let tax = round_money(tax_result.tax, currency);
    audit_steps.push(tax_result.audit_step);
    step_number += 1;

    let flat = calculate_flat_deductions(
        gross_pay,
        gross_pay - tax,
        &tax_rule.flat_deductions,
        currency,
        step_number,
    );
    step_number += flat.audit_steps.len() as u32;
    audit_steps.extend(flat.audit_steps);

    let mut deductions = Vec::with_capacity(flat.deductions.len() + 1);
    deductions.push(DeductionLine {
        name: TAX_DEDUCTION_NAME.to_string(),
        kind: DeductionKind::Tax,
        amount: tax,
    });
    deductions.extend(flat.deductions);

    let total_deductions: Decimal = deductions.iter().map(|d| d.amount).sum();
    let net_pay = round_money(gross_pay - total_deductions, currency);
    if net_pay < Decimal::ZERO {
        return Err(EngineError::CalculationError {
            message: format!(
                "deductions {} exceed gross pay {} for employee '{}'",
                total_deductions, gross_pay, profile.employee_id
            ),
        });
    }

    let total_employer_cost = flat
        .employer_contributions
        .iter()
        .try_fold(gross_pay, |total, c| total.checked_add(c.amount))
        .map(|cost| round_money(cost, currency))
        .ok_or_else(|| EngineError::CalculationError {
            message: format!(
                "employer cost overflows for employee '{}'",
                profile.employee_id
            ),
        })?;

    let compliance_checks: Vec<ComplianceCheck> =
        check_minimum_wage(profile.base_salary, tax_rule.minimum_wage)
            .into_iter()
            .collect();

    audit_steps.push(AuditStep {
        step_number,
        rule_id: "net_pay".to_string(),
        rule_name: "Net Pay".to_string(),
        input: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "total_deductions": total_deductions.to_string(),
            "minor_units": minor_units(currency)
        }),
        output: serde_json::json!({
            "net_pay": net_pay.to_string(),
            "total_employer_cost": total_employer_cost.to_string()
        }),
        reasoning: format!("{} - {} = {}", gross_pay, total_deductions, net_pay),
    });

    Ok(PayrollBreakdown {
        gross_pay,
        taxable_income,
        deductions,
        net_pay,
        employer_contributions: flat.employer_contributions,
        total_employer_cost,
        compliance_checks,
        audit_steps,
    })
}

fn validate_profile(profile: &CompensationProfile, tax_rule: &TaxRule) -> EngineResult<()> {
    if profile.base_salary < Decimal::ZERO {
        return Err(EngineError::InvalidInput {
            field: "base_salary".to_string(),
            message: format!(
                "base salary cannot be negative, got {}",
                profile.base_salary
            ),
        });
    }

    if let Some(allowance) = profile.allowances.iter().find(|a| a.amount < Decimal::ZERO) {
        return Err(EngineError::InvalidInput {
            field: format!("allowances.{}", allowance.name),
            message: format!("allowance cannot be negative, got {}", allowance.amount),
        });
    }

    if profile.currency != tax_rule.currency {
        return Err(EngineError::InvalidInput {
            field: "currency".to_string(),
            message: format!(
                "compensation currency {} does not match {} tax rules currency {}",
                profile.currency, tax_rule.country, tax_rule.currency
            ),
        });
    }

    Ok(())
}

fn gross_step(profile: &CompensationProfile, gross_pay: Decimal, step_number: u32) -> AuditStep {
    let allowances: Vec<serde_json::Value> = profile
        .allowances
        .iter()
        .map(|a| serde_json::json!({ "name": a.name, "amount": a.amount.to_string() }))
        .collect();

    AuditStep {
        step_number,
        rule_id: "gross_pay".to_string(),
        rule_name: "Gross Pay".to_string(),
        input: serde_json::json!({
            "base_salary": profile.base_salary.to_string(),
            "allowances": allowances
        }),
        output: serde_json::json!({
            "gross_pay": gross_pay.to_string()
        }),
        reasoning: format!(
            "Base salary {} plus {} allowance(s) = {}",
            profile.base_salary.normalize(),
            profile.allowances.len(),
            gross_pay
        ),
    }
}
