//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! settings, seed tax rules and seed employees from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::TaxRule;
use crate::store::EmployeeEntry;

use super::types::{EmployeesConfig, EngineSettings};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/
/// ├── engine.yaml        # Server, bulk and listing settings
/// ├── employees.yaml     # Optional seed employees
/// └── tax_rules/
///     ├── us.yaml        # One tax rule set per file
///     └── uk.yaml
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config")?;
/// println!("Pool size: {}", loader.settings().bulk.pool_size);
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    settings: EngineSettings,
    tax_rules: Vec<TaxRule>,
    employees: Vec<EmployeeEntry>,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - `engine.yaml` or the `tax_rules` directory is missing
    /// - any file contains invalid YAML
    /// - any tax rule set fails validation
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings = Self::load_yaml::<EngineSettings>(&path.join("engine.yaml"))?;
        let tax_rules = Self::load_tax_rules(&path.join("tax_rules"))?;

        let employees_path = path.join("employees.yaml");
        let employees = if employees_path.exists() {
            Self::load_yaml::<EmployeesConfig>(&employees_path)?.employees
        } else {
            Vec::new()
        };

        Ok(Self {
            settings,
            tax_rules,
            employees,
        })
    }

    /// Builds a loader from values already in memory.
    pub fn from_parts(
        settings: EngineSettings,
        tax_rules: Vec<TaxRule>,
        employees: Vec<EmployeeEntry>,
    ) -> Self {
        Self {
            settings,
            tax_rules,
            employees,
        }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads every tax rule file, sorted by file name.
    fn load_tax_rules(rules_dir: &Path) -> EngineResult<Vec<TaxRule>> {
        let rules_dir_str = rules_dir.display().to_string();

        let entries = fs::read_dir(rules_dir).map_err(|_| EngineError::ConfigNotFound {
            path: rules_dir_str.clone(),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: rules_dir_str.clone(),
            })?;
            let path = entry.path();
            if path
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
            {
                paths.push(path);
            }
        }
        paths.sort();

        let mut rules = Vec::with_capacity(paths.len());
        for path in paths {
            let rule = Self::load_yaml::<TaxRule>(&path)?;
            rule.to_rule_set().validate()?;
            rules.push(rule);
        }

        if rules.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no tax rule files found)", rules_dir_str),
            });
        }

        Ok(rules)
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns the seed tax rules.
    pub fn tax_rules(&self) -> &[TaxRule] {
        &self.tax_rules
    }

    /// Returns the seed employees.
    pub fn employees(&self) -> &[EmployeeEntry] {
        &self.employees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config")
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "payroll-config-{}-{}",
            name,
            uuid::Uuid::new_v4()
        ));
        fs::create_dir_all(dir.join("tax_rules")).unwrap();
        dir
    }

    #[test]
    fn test_load_shipped_config() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        assert_eq!(loader.settings().bulk.pool_size, 8);
        let countries: Vec<&str> = loader
            .tax_rules()
            .iter()
            .map(|r| r.country.as_str())
            .collect();
        assert!(countries.contains(&"US"));
        assert!(countries.contains(&"UK"));
        assert!(!loader.employees().is_empty());
    }

    #[test]
    fn test_missing_directory() {
        let result = ConfigLoader::load("/nonexistent/path");
        assert!(matches!(result, Err(EngineError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let dir = scratch_dir("bad-yaml");
        fs::write(dir.join("engine.yaml"), "bulk: [not, a, map").unwrap();

        let result = ConfigLoader::load(&dir);
        assert!(matches!(result, Err(EngineError::ConfigParseError { .. })));

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_empty_tax_rules_directory() {
        let dir = scratch_dir("no-rules");
        fs::write(dir.join("engine.yaml"), "{}").unwrap();

        match ConfigLoader::load(&dir) {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("no tax rule files found"))
            }
            other => panic!("Expected ConfigNotFound, got {:?}", other),
        }

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_invalid_tax_rules_rejected() {
        let dir = scratch_dir("bad-rules");
        fs::write(dir.join("engine.yaml"), "{}").unwrap();
        fs::write(
            dir.join("tax_rules/xx.yaml"),
            r#"
country: XX
currency: USD
effective_from: 2026-01-01
brackets:
  - { threshold: "0", rate: "0.1" }
  - { threshold: "0", rate: "0.2" }
"#,
        )
        .unwrap();

        let result = ConfigLoader::load(&dir);
        assert!(matches!(result, Err(EngineError::Validation { .. })));

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_employees_file_is_optional() {
        let dir = scratch_dir("no-employees");
        fs::write(dir.join("engine.yaml"), "{}").unwrap();
        fs::write(
            dir.join("tax_rules/us.yaml"),
            r#"
country: US
currency: USD
effective_from: 2026-01-01
brackets:
  - { threshold: "0", rate: "0.1" }
"#,
        )
        .unwrap();

        let loader = ConfigLoader::load(&dir).unwrap();
        assert!(loader.employees().is_empty());
        assert_eq!(loader.tax_rules().len(), 1);

        fs::remove_dir_all(dir).unwrap();
    }
}
