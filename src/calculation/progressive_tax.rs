//! Progressive income tax across brackets.
//!
//! Each bracket taxes only the portion of income that falls inside it; the
//! highest bracket's rate applies to everything above its threshold.

use rust_decimal::Decimal;

use crate::models::{AuditStep, TaxBracket};

/// The tax owed within one bracket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketPortion {
    /// Lower bound of the bracket.
    pub threshold: Decimal,
    /// Upper bound of the bracket, `None` for the last bracket.
    pub upper: Option<Decimal>,
    /// Marginal rate of the bracket.
    pub rate: Decimal,
    /// Income falling inside the bracket.
    pub taxable: Decimal,
    /// `taxable × rate`, unrounded.
    pub tax: Decimal,
}

/// The result of a progressive tax calculation.
#[derive(Debug, Clone)]
pub struct ProgressiveTaxResult {
    /// Total tax, unrounded.
    pub tax: Decimal,
    /// Per-bracket breakdown, for brackets that taxed anything.
    pub portions: Vec<BracketPortion>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Computes progressive tax on `taxable_income`.
///
/// Brackets must be sorted ascending by threshold (the registry guarantees
/// this). Income at or below zero owes nothing.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_progressive_tax;
/// use payroll_engine::models::TaxBracket;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let brackets = vec![
///     TaxBracket { threshold: Decimal::ZERO, rate: Decimal::from_str("0.10").unwrap() },
///     TaxBracket { threshold: Decimal::from(2000), rate: Decimal::from_str("0.20").unwrap() },
///     TaxBracket { threshold: Decimal::from(5000), rate: Decimal::from_str("0.30").unwrap() },
/// ];
///
/// let result = calculate_progressive_tax(Decimal::from(5000), &brackets, 1);
/// assert_eq!(result.tax, Decimal::from(800));
/// ```
pub fn calculate_progressive_tax(
    taxable_income: Decimal,
    brackets: &[TaxBracket],
    step_number: u32,
) -> ProgressiveTaxResult {
    let mut tax = Decimal::ZERO;
    let mut portions = Vec::new();

    for (index, bracket) in brackets.iter().enumerate() {
        if taxable_income <= bracket.threshold {
            break;
        }

        let upper = brackets.get(index + 1).map(|next| next.threshold);
        let top = match upper {
            Some(upper) => taxable_income.min(upper),
            None => taxable_income,
        };
        let taxable = top - bracket.threshold;
        let bracket_tax = taxable * bracket.rate;
        tax += bracket_tax;

        portions.push(BracketPortion {
            threshold: bracket.threshold,
            upper,
            rate: bracket.rate,
            taxable,
            tax: bracket_tax,
        });
    }

    let breakdown: Vec<serde_json::Value> = portions
        .iter()
        .map(|p| {
            serde_json::json!({
                "threshold": p.threshold.normalize().to_string(),
                "upper": p.upper.map(|u| u.normalize().to_string()),
                "rate": p.rate.normalize().to_string(),
                "taxable": p.taxable.normalize().to_string(),
                "tax": p.tax.normalize().to_string()
            })
        })
        .collect();

    let reasoning = if portions.is_empty() {
        format!(
            "Taxable income {} falls below the first bracket; no tax owed",
            taxable_income.normalize()
        )
    } else {
        let terms: Vec<String> = portions
            .iter()
            .map(|p| format!("{} x {}", p.taxable.normalize(), p.rate.normalize()))
            .collect();
        format!("{} = {}", terms.join(" + "), tax.normalize())
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "progressive_tax".to_string(),
        rule_name: "Progressive Income Tax".to_string(),
        input: serde_json::json!({
            "taxable_income": taxable_income.normalize().to_string(),
            "bracket_count": brackets.len()
        }),
        output: serde_json::json!({
            "tax": tax.normalize().to_string(),
            "brackets": breakdown
        }),
        reasoning,
    };

    ProgressiveTaxResult {
        tax,
        portions,
        audit_step,
    }
}
