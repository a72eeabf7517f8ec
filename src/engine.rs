//! The payroll engine facade.
//!
//! [`PayrollEngine`] wires the tax rule registry, lifecycle manager, bulk
//! orchestrator and stats aggregator over one record store and one employee
//! directory.

use std::sync::Arc;

use tracing::info;

use crate::bulk::BulkOrchestrator;
use crate::config::{ConfigLoader, EngineSettings};
use crate::error::EngineResult;
use crate::lifecycle::PayrollLifecycle;
use crate::registry::TaxRuleRegistry;
use crate::stats::StatsAggregator;
use crate::store::{
    EmployeeDirectory, InMemoryEmployeeDirectory, InMemoryPayrollStore, PayrollStore,
};

/// All engine components, sharing one store, directory and registry.
pub struct PayrollEngine {
    settings: EngineSettings,
    registry: Arc<TaxRuleRegistry>,
    lifecycle: Arc<PayrollLifecycle>,
    bulk: BulkOrchestrator,
    stats: StatsAggregator,
}

impl PayrollEngine {
    /// Builds an engine with an empty tax rule registry.
    pub fn new(
        settings: EngineSettings,
        store: Arc<dyn PayrollStore>,
        directory: Arc<dyn EmployeeDirectory>,
    ) -> Self {
        let registry = Arc::new(TaxRuleRegistry::new());
        let lifecycle = Arc::new(PayrollLifecycle::new(
            Arc::clone(&store),
            Arc::clone(&directory),
            Arc::clone(&registry),
            settings.listing,
        ));
        let bulk = BulkOrchestrator::new(
            Arc::clone(&lifecycle),
            directory,
            Arc::clone(&registry),
            settings.bulk,
        );
        let stats = StatsAggregator::new(store);

        Self {
            settings,
            registry,
            lifecycle,
            bulk,
            stats,
        }
    }

    /// Builds an in-memory engine seeded from configuration.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use payroll_engine::config::ConfigLoader;
    /// use payroll_engine::engine::PayrollEngine;
    ///
    /// # async fn run() -> Result<(), payroll_engine::error::EngineError> {
    /// let config = ConfigLoader::load("./config")?;
    /// let engine = PayrollEngine::from_config(&config).await?;
    /// let countries = engine.registry().list_supported_countries().await;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn from_config(config: &ConfigLoader) -> EngineResult<Self> {
        let directory = InMemoryEmployeeDirectory::with_entries(config.employees().to_vec());
        let engine = Self::new(
            config.settings().clone(),
            Arc::new(InMemoryPayrollStore::new()),
            Arc::new(directory),
        );
        engine.registry.seed(config.tax_rules().to_vec()).await?;

        info!(
            countries = config.tax_rules().len(),
            employees = config.employees().len(),
            "Payroll engine initialised"
        );
        Ok(engine)
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns the tax rule registry.
    pub fn registry(&self) -> &TaxRuleRegistry {
        &self.registry
    }

    /// Returns the lifecycle manager.
    pub fn lifecycle(&self) -> &PayrollLifecycle {
        &self.lifecycle
    }

    /// Returns the bulk orchestrator.
    pub fn bulk(&self) -> &BulkOrchestrator {
        &self.bulk
    }

    /// Returns the stats aggregator.
    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }
}
