//! Per-country tax rule registry.
//!
//! Rules are versioned and copy-on-write: readers receive an `Arc` snapshot
//! that no later update can mutate, and updates replace the whole rule set
//! under the registry's write lock so two updates never interleave.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::models::{TaxRule, TaxRuleSet};

#[derive(Debug)]
struct CountryRules {
    active: Arc<TaxRule>,
    history: Vec<Arc<TaxRule>>,
}

/// Stores and validates the active tax rules of each country.
#[derive(Debug, Default)]
pub struct TaxRuleRegistry {
    countries: RwLock<HashMap<String, CountryRules>>,
}

impl TaxRuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the active rules for `country`.
    ///
    /// # Returns
    ///
    /// A shared snapshot of the rules, or `NotFound` if the country has no
    /// active rule set.
    pub async fn get(&self, country: &str) -> EngineResult<Arc<TaxRule>> {
        let countries = self.countries.read().await;
        countries
            .get(country)
            .map(|rules| Arc::clone(&rules.active))
            .ok_or_else(|| EngineError::not_found("tax rules", country))
    }

    /// Validates `rule_set` and makes it the active rule set for `country`.
    ///
    /// The effective date is the rule set's own `effective_from` when given,
    /// otherwise today's UTC date. When `expected_version` is set, the update
    /// only applies if the active version still matches it (0 meaning "no
    /// rules yet").
    ///
    /// # Returns
    ///
    /// The newly active rule, or:
    /// - `Validation` if the rule set is malformed (the active set is kept)
    /// - `Conflict` if `expected_version` is stale
    pub async fn update(
        &self,
        country: &str,
        rule_set: TaxRuleSet,
        expected_version: Option<u64>,
    ) -> EngineResult<Arc<TaxRule>> {
        let country = validate_country(country)?;
        rule_set.validate()?;

        let mut countries = self.countries.write().await;
        let current_version = countries
            .get(country)
            .map(|rules| rules.active.version)
            .unwrap_or(0);

        if let Some(expected) = expected_version
            && expected != current_version
        {
            return Err(EngineError::conflict(format!(
                "tax rules for {} are at version {}, expected {}",
                country, current_version, expected
            )));
        }

        let rule = Arc::new(TaxRule::from_rule_set(
            country,
            rule_set,
            Utc::now().date_naive(),
            current_version + 1,
        ));
        activate(&mut countries, Arc::clone(&rule));

        info!(
            country = %country,
            version = rule.version,
            effective_from = %rule.effective_from,
            brackets = rule.brackets.len(),
            "Tax rules updated"
        );
        Ok(rule)
    }

    /// Returns the countries that have an active rule set, sorted.
    pub async fn list_supported_countries(&self) -> BTreeSet<String> {
        self.countries.read().await.keys().cloned().collect()
    }

    /// Returns every version ever activated for `country`, oldest first.
    pub async fn history(&self, country: &str) -> EngineResult<Vec<Arc<TaxRule>>> {
        let countries = self.countries.read().await;
        countries
            .get(country)
            .map(|rules| rules.history.clone())
            .ok_or_else(|| EngineError::not_found("tax rules", country))
    }

    /// Loads rules from configuration, validating each one.
    ///
    /// Seeded rules keep their configured effective date and become the next
    /// version of their country.
    pub async fn seed(&self, rules: Vec<TaxRule>) -> EngineResult<()> {
        for rule in &rules {
            validate_country(&rule.country)?;
            rule.to_rule_set().validate()?;
        }

        let mut countries = self.countries.write().await;
        for mut rule in rules {
            rule.version = countries
                .get(&rule.country)
                .map(|rules| rules.active.version + 1)
                .unwrap_or(1);
            debug!(country = %rule.country, version = rule.version, "Seeding tax rules");
            activate(&mut countries, Arc::new(rule));
        }
        Ok(())
    }
}

fn activate(countries: &mut HashMap<String, CountryRules>, rule: Arc<TaxRule>) {
    match countries.get_mut(&rule.country) {
        Some(rules) => {
            rules.active = Arc::clone(&rule);
            rules.history.push(rule);
        }
        None => {
            countries.insert(
                rule.country.clone(),
                CountryRules {
                    active: Arc::clone(&rule),
                    history: vec![rule],
                },
            );
        }
    }
}

fn validate_country(country: &str) -> EngineResult<&str> {
    let trimmed = country.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation {
            field: "country".to_string(),
            message: "country cannot be empty".to_string(),
        });
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlatDeduction, TaxBracket};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rule_set(thresholds: &[&str]) -> TaxRuleSet {
        TaxRuleSet {
            currency: "USD".to_string(),
            brackets: thresholds
                .iter()
                .map(|t| TaxBracket {
                    threshold: dec(t),
                    rate: dec("0.10"),
                })
                .collect(),
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

    #[tokio::test]
    async fn test_get_unknown_country_is_not_found() {
        let registry = TaxRuleRegistry::new();

        match registry.get("ZZ").await {
            Err(EngineError::NotFound { entity, id }) => {
                assert_eq!(entity, "tax rules");
                assert_eq!(id, "ZZ");
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_then_get() {
        let registry = TaxRuleRegistry::new();
        let rule = registry
            .update("US", rule_set(&["0", "2000"]), None)
            .await
            .unwrap();

        assert_eq!(rule.version, 1);
        assert_eq!(rule.effective_from, Utc::now().date_naive());

        let fetched = registry.get("US").await.unwrap();
        assert_eq!(fetched, rule);
    }

    #[tokio::test]
    async fn test_overlapping_update_keeps_previous_rules() {
        let registry = TaxRuleRegistry::new();
        registry
            .update("US", rule_set(&["0", "2000"]), None)
            .await
            .unwrap();

        let result = registry
            .update("US", rule_set(&["0", "1000", "500"]), None)
            .await;
        assert!(matches!(result, Err(EngineError::Validation { .. })));

        let active = registry.get("US").await.unwrap();
        assert_eq!(active.version, 1);
        assert_eq!(active.brackets.len(), 2);
    }

    #[tokio::test]
    async fn test_stale_expected_version_conflicts() {
        let registry = TaxRuleRegistry::new();
        registry.update("UK", rule_set(&["0"]), None).await.unwrap();
        registry
            .update("UK", rule_set(&["0", "1000"]), Some(1))
            .await
            .unwrap();

        let result = registry
            .update("UK", rule_set(&["0", "3000"]), Some(1))
            .await;
        assert!(matches!(result, Err(EngineError::Conflict { .. })));
        assert_eq!(registry.get("UK").await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_snapshot_survives_update() {
        let registry = TaxRuleRegistry::new();
        registry.update("US", rule_set(&["0"]), None).await.unwrap();

        let snapshot = registry.get("US").await.unwrap();
        registry
            .update("US", rule_set(&["0", "5000"]), None)
            .await
            .unwrap();

        assert_eq!(snapshot.brackets.len(), 1);
        assert_eq!(registry.get("US").await.unwrap().brackets.len(), 2);
    }

    #[tokio::test]
    async fn test_history_records_every_version() {
        let registry = TaxRuleRegistry::new();
        registry.update("SG", rule_set(&["0"]), None).await.unwrap();
        registry
            .update("SG", rule_set(&["0", "100"]), None)
            .await
            .unwrap();

        let versions: Vec<u64> = registry
            .history("SG")
            .await
            .unwrap()
            .iter()
            .map(|r| r.version)
            .collect();
        assert_eq!(versions, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_supported_countries_are_sorted() {
        let registry = TaxRuleRegistry::new();
        for country in ["US", "India", "UK"] {
            registry
                .update(country, rule_set(&["0"]), None)
                .await
                .unwrap();
        }

        let countries: Vec<String> = registry
            .list_supported_countries()
            .await
            .into_iter()
            .collect();
        assert_eq!(countries, vec!["India", "UK", "US"]);
    }

    #[tokio::test]
    async fn test_empty_country_rejected() {
        let registry = TaxRuleRegistry::new();
        let result = registry.update("  ", rule_set(&["0"]), None).await;

        assert!(matches!(result, Err(EngineError::Validation { field, .. }) if field == "country"));
    }

    #[tokio::test]
    async fn test_seed_keeps_configured_effective_date() {
        let registry = TaxRuleRegistry::new();
        let effective = NaiveDate::from_ymd_opt(2025, 4, 6).unwrap();
        let rule = TaxRule::from_rule_set("UK", rule_set(&["0"]), effective, 0);

        registry.seed(vec![rule]).await.unwrap();

        let active = registry.get("UK").await.unwrap();
        assert_eq!(active.version, 1);
        assert_eq!(active.effective_from, effective);
    }

    #[tokio::test]
    async fn test_seed_rejects_invalid_rules() {
        let registry = TaxRuleRegistry::new();
        let rule = TaxRule::from_rule_set(
            "UK",
            rule_set(&["0", "0"]),
            NaiveDate::from_ymd_opt(2025, 4, 6).unwrap(),
            0,
        );

        assert!(registry.seed(vec![rule]).await.is_err());
        assert!(registry.list_supported_countries().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_versioned_updates_serialize() {
        let registry = Arc::new(TaxRuleRegistry::new());
        registry.update("US", rule_set(&["0"]), None).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry
                    .update("US", rule_set(&["0", "1000"]), Some(1))
                    .await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 1);
        assert_eq!(registry.get("US").await.unwrap().version, 2);
    }
}
