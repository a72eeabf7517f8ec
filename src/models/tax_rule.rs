//! Tax rule models.
//!
//! This module contains the [`TaxRule`] type held by the registry and the
//! [`TaxRuleSet`] payload used to create or replace a country's rules.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A salary sub-range taxed at one marginal rate.
///
/// A bracket covers `[threshold, next_threshold)`; the last bracket of a
/// rule set extends indefinitely.
///
/// # Example
///
/// ```
/// use payroll_engine::models::TaxBracket;
/// use rust_decimal::Decimal;
///
/// let bracket = TaxBracket {
///     threshold: Decimal::ZERO,
///     rate: Decimal::new(10, 2),
/// };
/// assert_eq!(bracket.rate.to_string(), "0.10");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Lower bound of the bracket (inclusive).
    pub threshold: Decimal,
    /// Marginal rate applied to the portion inside the bracket.
    pub rate: Decimal,
}

/// A flat, rate-based deduction such as a social contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatDeduction {
    /// Name of the deduction line (e.g., "social_security").
    pub name: String,
    /// Employee-side rate applied to the contribution base.
    pub rate: Decimal,
    /// Employer-side rate applied to the same base.
    #[serde(default)]
    pub employer_rate: Decimal,
    /// Optional cap on the amount the rates apply to.
    #[serde(default)]
    pub max_contribution_base: Option<Decimal>,
}

impl FlatDeduction {
    /// Returns the base the rates apply to for a given gross amount.
    pub fn contribution_base(&self, gross: Decimal) -> Decimal {
        match self.max_contribution_base {
            Some(cap) => gross.min(cap),
            None => gross,
        }
    }
}

/// The rule set a client submits when creating or replacing a country's rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRuleSet {
    /// ISO 4217 currency code the rules are expressed in.
    pub currency: String,
    /// Progressive brackets, ascending by threshold, first threshold zero.
    pub brackets: Vec<TaxBracket>,
    /// Flat deductions applied after the progressive tax.
    #[serde(default)]
    pub flat_deductions: Vec<FlatDeduction>,
    /// Amount subtracted from gross before the progressive tax.
    #[serde(default)]
    pub standard_deduction: Decimal,
    /// Minimum base salary per period, used by the compliance check.
    #[serde(default)]
    pub minimum_wage: Option<Decimal>,
    /// Date from which the rules apply. Defaults to the day of the update.
    #[serde(default)]
    pub effective_from: Option<NaiveDate>,
}

impl TaxRuleSet {
    /// Validates bracket ordering and coverage, rate bounds and currency.
    ///
    /// # Returns
    ///
    /// Returns `Ok(())` when the rule set is well formed, or a
    /// [`EngineError::Validation`] naming the offending field.
    pub fn validate(&self) -> EngineResult<()> {
        validate_currency(&self.currency)?;

        let first = self
            .brackets
            .first()
            .ok_or_else(|| validation("brackets", "at least one bracket is required"))?;
        if first.threshold != Decimal::ZERO {
            return Err(validation(
                "brackets[0].threshold",
                format!("first bracket must start at 0, got {}", first.threshold),
            ));
        }

        for (index, bracket) in self.brackets.iter().enumerate() {
            if bracket.threshold < Decimal::ZERO {
                return Err(validation(
                    format!("brackets[{}].threshold", index),
                    format!("threshold cannot be negative, got {}", bracket.threshold),
                ));
            }
            check_rate(format!("brackets[{}].rate", index), bracket.rate)?;
        }

        for (index, pair) in self.brackets.windows(2).enumerate() {
            if pair[1].threshold <= pair[0].threshold {
                return Err(validation(
                    format!("brackets[{}].threshold", index + 1),
                    format!(
                        "brackets overlap: threshold {} does not exceed previous threshold {}",
                        pair[1].threshold, pair[0].threshold
                    ),
                ));
            }
        }

        let mut names = HashSet::new();
        for (index, deduction) in self.flat_deductions.iter().enumerate() {
            let name = deduction.name.trim();
            if name.is_empty() {
                return Err(validation(
                    format!("flat_deductions[{}].name", index),
                    "name cannot be empty",
                ));
            }
            if !names.insert(name.to_string()) {
                return Err(validation(
                    format!("flat_deductions[{}].name", index),
                    format!("duplicate deduction name '{}'", name),
                ));
            }
            check_rate(format!("flat_deductions[{}].rate", index), deduction.rate)?;
            check_rate(
                format!("flat_deductions[{}].employer_rate", index),
                deduction.employer_rate,
            )?;
            if let Some(cap) = deduction.max_contribution_base
                && cap <= Decimal::ZERO
            {
                return Err(validation(
                    format!("flat_deductions[{}].max_contribution_base", index),
                    format!("contribution cap must be positive, got {}", cap),
                ));
            }
        }

        if self.standard_deduction < Decimal::ZERO {
            return Err(validation(
                "standard_deduction",
                format!("cannot be negative, got {}", self.standard_deduction),
            ));
        }
        if let Some(minimum) = self.minimum_wage
            && minimum < Decimal::ZERO
        {
            return Err(validation(
                "minimum_wage",
                format!("cannot be negative, got {}", minimum),
            ));
        }

        // Unrounded deductions stay within gross: top marginal rate plus every
        // flat employee rate is at most 100%.
        let top_rate = self
            .brackets
            .iter()
            .map(|b| b.rate)
            .max()
            .unwrap_or(Decimal::ZERO);
        let flat_total: Decimal = self.flat_deductions.iter().map(|d| d.rate).sum();
        if top_rate + flat_total > Decimal::ONE {
            return Err(validation(
                "flat_deductions",
                format!(
                    "top marginal rate {} plus flat rates {} exceeds 1",
                    top_rate, flat_total
                ),
            ));
        }

        Ok(())
    }
}

/// The active tax rules for one country.
///
/// Instances are immutable once activated; the registry replaces them
/// wholesale on update and hands out shared snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRule {
    /// Country the rules apply to (e.g., "US").
    pub country: String,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Progressive brackets, ascending by threshold.
    pub brackets: Vec<TaxBracket>,
    /// Flat deductions applied after the progressive tax.
    #[serde(default)]
    pub flat_deductions: Vec<FlatDeduction>,
    /// Amount subtracted from gross before the progressive tax.
    #[serde(default)]
    pub standard_deduction: Decimal,
    /// Minimum base salary per period.
    #[serde(default)]
    pub minimum_wage: Option<Decimal>,
    /// Date from which these rules apply.
    pub effective_from: NaiveDate,
    /// Registry-assigned version, starting at 1.
    #[serde(default)]
    pub version: u64,
}

impl TaxRule {
    /// Builds an activated rule from a validated rule set.
    pub fn from_rule_set(
        country: impl Into<String>,
        rule_set: TaxRuleSet,
        effective_from: NaiveDate,
        version: u64,
    ) -> Self {
        Self {
            country: country.into(),
            currency: rule_set.currency,
            brackets: rule_set.brackets,
            flat_deductions: rule_set.flat_deductions,
            standard_deduction: rule_set.standard_deduction,
            minimum_wage: rule_set.minimum_wage,
            effective_from: rule_set.effective_from.unwrap_or(effective_from),
            version,
        }
    }

    /// Returns the rule set this rule was built from.
    pub fn to_rule_set(&self) -> TaxRuleSet {
        TaxRuleSet {
            currency: self.currency.clone(),
            brackets: self.brackets.clone(),
            flat_deductions: self.flat_deductions.clone(),
            standard_deduction: self.standard_deduction,
            minimum_wage: self.minimum_wage,
            effective_from: Some(self.effective_from),
        }
    }
}

fn validate_currency(currency: &str) -> EngineResult<()> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(validation(
            "currency",
            format!("expected a three-letter ISO 4217 code, got '{}'", currency),
        ))
    }
}

fn check_rate(field: String, rate: Decimal) -> EngineResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(validation(
            field,
            format!("rate must be within [0, 1], got {}", rate),
        ));
    }
    Ok(())
}

fn validation(field: impl Into<String>, message: impl Into<String>) -> EngineError {
    EngineError::Validation {
        field: field.into(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn bracket(threshold: &str, rate: &str) -> TaxBracket {
        TaxBracket {
            threshold: dec(threshold),
            rate: dec(rate),
        }
    }

    fn us_rule_set() -> TaxRuleSet {
        TaxRuleSet {
            currency: "USD".to_string(),
            brackets: vec![
                bracket("0", "0.10"),
                bracket("2000", "0.20"),
                bracket("5000", "0.30"),
            ],
            flat_deductions: vec![FlatDeduction {
                name: "social".to_string(),
                rate: dec("0.05"),
                employer_rate: Decimal::ZERO,
                max_contribution_base: None,
            }],
            standard_deduction: Decimal::ZERO,
            minimum_wage: None,
            effective_from: None,
        }
    }

    fn expect_validation_field(result: EngineResult<()>) -> String {
        match result {
            Err(EngineError::Validation { field, .. }) => field,
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_rule_set_passes() {
        assert!(us_rule_set().validate().is_ok());
    }

    #[test]
    fn test_overlapping_brackets_rejected() {
        let mut rules = us_rule_set();
        rules.brackets = vec![
            bracket("0", "0.10"),
            bracket("1000", "0.20"),
            bracket("500", "0.30"),
        ];

        let field = expect_validation_field(rules.validate());
        assert_eq!(field, "brackets[2].threshold");
    }

    #[test]
    fn test_duplicate_threshold_rejected() {
        let mut rules = us_rule_set();
        rules.brackets = vec![bracket("0", "0.10"), bracket("0", "0.20")];

        let field = expect_validation_field(rules.validate());
        assert_eq!(field, "brackets[1].threshold");
    }

    #[test]
    fn test_first_bracket_must_start_at_zero() {
        let mut rules = us_rule_set();
        rules.brackets = vec![bracket("100", "0.10")];

        let field = expect_validation_field(rules.validate());
        assert_eq!(field, "brackets[0].threshold");
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let mut rules = us_rule_set();
        rules.brackets = vec![bracket("0", "0.10"), bracket("-5", "0.20")];

        let field = expect_validation_field(rules.validate());
        assert_eq!(field, "brackets[1].threshold");
    }

    #[test]
    fn test_rate_above_one_rejected() {
        let mut rules = us_rule_set();
        rules.brackets[1].rate = dec("1.5");

        let field = expect_validation_field(rules.validate());
        assert_eq!(field, "brackets[1].rate");
    }

    #[test]
    fn test_negative_flat_rate_rejected() {
        let mut rules = us_rule_set();
        rules.flat_deductions[0].rate = dec("-0.01");

        let field = expect_validation_field(rules.validate());
        assert_eq!(field, "flat_deductions[0].rate");
    }

    #[test]
    fn test_empty_brackets_rejected() {
        let mut rules = us_rule_set();
        rules.brackets.clear();

        let field = expect_validation_field(rules.validate());
        assert_eq!(field, "brackets");
    }

    #[test]
    fn test_lowercase_currency_rejected() {
        let mut rules = us_rule_set();
        rules.currency = "usd".to_string();

        let field = expect_validation_field(rules.validate());
        assert_eq!(field, "currency");
    }

    #[test]
    fn test_duplicate_deduction_names_rejected() {
        let mut rules = us_rule_set();
        rules.flat_deductions.push(rules.flat_deductions[0].clone());

        let field = expect_validation_field(rules.validate());
        assert_eq!(field, "flat_deductions[1].name");
    }

    #[test]
    fn test_combined_rates_above_one_rejected() {
        let mut rules = us_rule_set();
        rules.brackets[2].rate = dec("0.98");

        let field = expect_validation_field(rules.validate());
        assert_eq!(field, "flat_deductions");
    }

    #[test]
    fn test_contribution_base_respects_cap() {
        let deduction = FlatDeduction {
            name: "cpf".to_string(),
            rate: dec("0.2"),
            employer_rate: dec("0.17"),
            max_contribution_base: Some(dec("6000")),
        };

        assert_eq!(deduction.contribution_base(dec("8000")), dec("6000"));
        assert_eq!(deduction.contribution_base(dec("4000")), dec("4000"));
    }

    #[test]
    fn test_rule_set_effective_date_wins_over_stamp() {
        let mut rules = us_rule_set();
        let declared = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        rules.effective_from = Some(declared);

        let stamped = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let rule = TaxRule::from_rule_set("US", rules, stamped, 1);

        assert_eq!(rule.effective_from, declared);
        assert_eq!(rule.version, 1);
    }

    #[test]
    fn test_deserialize_rule_set_defaults() {
        let json = r#"{
            "currency": "GBP",
            "brackets": [{"threshold": "0", "rate": "0.2"}]
        }"#;

        let rules: TaxRuleSet = serde_json::from_str(json).unwrap();
        assert!(rules.flat_deductions.is_empty());
        assert_eq!(rules.standard_deduction, Decimal::ZERO);
        assert!(rules.minimum_wage.is_none());
        assert!(rules.validate().is_ok());
    }
}
