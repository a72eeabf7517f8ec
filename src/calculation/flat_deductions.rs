//! Flat, rate-based deductions and employer contributions.
//!
//! Each flat deduction withholds `rate × base` from the employee, where the
//! base is gross pay capped at the deduction's `max_contribution_base`. The
//! employer-side rate on the same base is recorded separately.
//!
//! Lines are rounded one by one, so their sum can round past what the
//! employee has left. Each line is therefore limited to the amount still
//! available after the lines before it.

use rust_decimal::Decimal;

use super::round_money;
use crate::models::{AuditStep, ContributionLine, DeductionKind, DeductionLine, FlatDeduction};

/// The result of applying flat deductions.
#[derive(Debug, Clone)]
pub struct FlatDeductionsResult {
    /// Employee deduction lines, in rule order.
    pub deductions: Vec<DeductionLine>,
    /// Employer contribution lines, for deductions with an employer rate.
    pub employer_contributions: Vec<ContributionLine>,
    /// One audit step per flat deduction.
    pub audit_steps: Vec<AuditStep>,
}

/// Applies every flat deduction to `gross`.
///
/// Amounts are rounded to the minor unit of `currency`. The employee lines
/// together never exceed `available`. A deduction with a zero employer rate
/// contributes no employer line.
pub fn calculate_flat_deductions(
    gross: Decimal,
    available: Decimal,
    flat_deductions: &[FlatDeduction],
    currency: &str,
    first_step_number: u32,
) -> FlatDeductionsResult {
    let mut remaining = available.max(Decimal::ZERO);
    let mut deductions = Vec::with_capacity(flat_deductions.len());
    let mut employer_contributions = Vec::new();
    let mut audit_steps = Vec::with_capacity(flat_deductions.len());

    for (offset, rule) in flat_deductions.iter().enumerate() {
        let base = rule.contribution_base(gross);
        let rounded = round_money(base * rule.rate, currency);
        let amount = rounded.min(remaining);
        remaining -= amount;
        let employer_amount = round_money(base * rule.employer_rate, currency);

        deductions.push(DeductionLine {
            name: rule.name.clone(),
            kind: DeductionKind::Statutory,
            amount,
        });
        if rule.employer_rate > Decimal::ZERO {
            employer_contributions.push(ContributionLine {
                name: format!("employer_{}", rule.name),
                amount: employer_amount,
            });
        }

        let capped = base < gross;
        audit_steps.push(AuditStep {
            step_number: first_step_number + offset as u32,
            rule_id: "flat_deduction".to_string(),
            rule_name: format!("Flat Deduction: {}", rule.name),
            input: serde_json::json!({
                "gross": gross.normalize().to_string(),
                "rate": rule.rate.normalize().to_string(),
                "employer_rate": rule.employer_rate.normalize().to_string(),
                "max_contribution_base": rule.max_contribution_base.map(|c| c.normalize().to_string())
            }),
            output: serde_json::json!({
                "base": base.normalize().to_string(),
                "amount": amount.to_string(),
                "employer_amount": employer_amount.to_string(),
                "capped": capped,
                "limited": amount < rounded
            }),
            reasoning: if amount < rounded {
                format!(
                    "{} x {} = {}, limited to remaining pay {}",
                    base.normalize(),
                    rule.rate.normalize(),
                    rounded,
                    amount
                )
            } else if capped {
                format!(
                    "{} x {} = {} (base capped at {})",
                    base.normalize(),
                    rule.rate.normalize(),
                    amount,
                    base.normalize()
                )
            } else {
                format!(
                    "{} x {} = {}",
                    base.normalize(),
                    rule.rate.normalize(),
                    amount
                )
            },
        });
    }

    FlatDeductionsResult {
        deductions,
        employer_contributions,
        audit_steps,
    }
}
