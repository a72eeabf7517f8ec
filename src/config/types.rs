//! Configuration types for the payroll engine.
//!
//! These types are deserialized from the YAML files in the configuration
//! directory. Every engine setting is optional and falls back to a default.

use serde::{Deserialize, Serialize};

use crate::store::EmployeeEntry;

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address the server listens on (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Bulk generation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkSettings {
    /// Maximum number of employees generated concurrently.
    pub pool_size: usize,
    /// Per-employee time bound in milliseconds.
    pub task_timeout_ms: u64,
}

impl BulkSettings {
    /// Default worker pool size.
    pub const DEFAULT_POOL_SIZE: usize = 8;
    /// Default per-employee time bound.
    pub const DEFAULT_TASK_TIMEOUT_MS: u64 = 5000;
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self {
            pool_size: Self::DEFAULT_POOL_SIZE,
            task_timeout_ms: Self::DEFAULT_TASK_TIMEOUT_MS,
        }
    }
}

/// Record listing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSettings {
    /// Page size used when a request gives none.
    pub default_page_size: u32,
    /// Largest page size a request may ask for.
    pub max_page_size: u32,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// Top-level engine settings, read from `engine.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Bulk generation settings.
    pub bulk: BulkSettings,
    /// Record listing settings.
    pub listing: ListingSettings,
}

/// Employee seed file structure (`employees.yaml`).
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct EmployeesConfig {
    #[serde(default)]
    pub employees: Vec<EmployeeEntry>,
}
