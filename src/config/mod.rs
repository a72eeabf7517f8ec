//! Configuration loading for the payroll engine.
//!
//! This module loads engine settings, seed tax rules and seed employees
//! from a directory of YAML files.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config").unwrap();
//! println!("Seeded countries: {}", config.tax_rules().len());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{BulkSettings, EngineSettings, ListingSettings, ServerSettings};
