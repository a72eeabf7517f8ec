//! Bulk payroll generation.
//!
//! A bulk job resolves a population from the employee directory, takes one
//! tax rule snapshot, and generates every employee's record under a bounded
//! worker pool. Each employee's outcome is recorded on its own; one failure
//! never aborts the job.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::BulkSettings;
use crate::error::{EngineError, EngineResult, ErrorKind};
use crate::lifecycle::PayrollLifecycle;
use crate::models::{BulkFilter, BulkJob, BulkOutcome, BulkSummary, CompensationProfile, TaxRule};
use crate::registry::TaxRuleRegistry;
use crate::store::EmployeeDirectory;

/// Cooperative cancellation flag shared between a running job and its
/// callers.
///
/// Once set, employees not yet dispatched are recorded as cancelled;
/// in-flight generations finish normally.
#[derive(Debug, Clone, Default)]
pub struct BulkCancellation {
    cancelled: Arc<AtomicBool>,
}

impl BulkCancellation {
    /// Creates a flag that is not set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

type RunningJobs = Arc<Mutex<HashMap<Uuid, BulkCancellation>>>;

/// Registration of a running job; unregisters the job when dropped, even if
/// the job future is dropped before it finishes.
struct RunningJob {
    jobs: RunningJobs,
    job_id: Uuid,
}

impl RunningJob {
    fn register(
        jobs: &RunningJobs,
        job_id: Uuid,
        cancellation: &BulkCancellation,
    ) -> EngineResult<Self> {
        let mut running = jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if running.contains_key(&job_id) {
            return Err(EngineError::conflict(format!(
                "bulk job {} is already running",
                job_id
            )));
        }
        running.insert(job_id, cancellation.clone());
        Ok(Self {
            jobs: Arc::clone(jobs),
            job_id,
        })
    }
}

impl Drop for RunningJob {
    fn drop(&mut self) {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.job_id);
    }
}

/// Runs bulk generation jobs.
pub struct BulkOrchestrator {
    lifecycle: Arc<PayrollLifecycle>,
    directory: Arc<dyn EmployeeDirectory>,
    registry: Arc<TaxRuleRegistry>,
    settings: BulkSettings,
    running: RunningJobs,
}

impl BulkOrchestrator {
    /// Creates an orchestrator.
    pub fn new(
        lifecycle: Arc<PayrollLifecycle>,
        directory: Arc<dyn EmployeeDirectory>,
        registry: Arc<TaxRuleRegistry>,
        settings: BulkSettings,
    ) -> Self {
        Self {
            lifecycle,
            directory,
            registry,
            settings,
            running: RunningJobs::default(),
        }
    }

    /// Runs a bulk job to completion.
    ///
    /// `job_id` lets the caller know the id up front so it can
    /// [`cancel`](Self::cancel) the job while it runs.
    pub async fn run(&self, filter: BulkFilter, job_id: Option<Uuid>) -> EngineResult<BulkJob> {
        self.run_with_cancellation(filter, job_id, BulkCancellation::new())
            .await
    }

    /// Runs a bulk job with a caller-owned cancellation flag.
    ///
    /// # Returns
    ///
    /// The finished job, or an error only when the job could not start:
    /// - `InvalidInput` for a bad period
    /// - `NotFound` when the country has no tax rules
    /// - `Conflict` when a job with the same id is already running
    pub async fn run_with_cancellation(
        &self,
        filter: BulkFilter,
        job_id: Option<Uuid>,
        cancellation: BulkCancellation,
    ) -> EngineResult<BulkJob> {
        filter.period().validate()?;
        let tax_rule = self.registry.get(&filter.country).await?;
        let population = dedupe(self.directory.population(&filter).await?);

        let job_id = job_id.unwrap_or_else(Uuid::new_v4);
        let registration = RunningJob::register(&self.running, job_id, &cancellation)?;

        let started_at = Utc::now();
        let start_time = Instant::now();
        info!(
            job_id = %job_id,
            country = %filter.country,
            month = filter.month,
            year = filter.year,
            department = ?filter.department,
            employees = population.len(),
            pool_size = self.settings.pool_size,
            "Bulk generation started"
        );

        let slots = self
            .dispatch(job_id, &filter, tax_rule, &population, &cancellation)
            .await;
        drop(registration);

        let outcomes: BTreeMap<String, BulkOutcome> = population
            .into_iter()
            .zip(slots)
            .map(|(profile, slot)| (profile.employee_id, slot.unwrap_or(BulkOutcome::Cancelled)))
            .collect();
        let summary = BulkSummary::from_outcomes(outcomes.values());

        info!(
            job_id = %job_id,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            cancelled = summary.cancelled,
            duration_ms = start_time.elapsed().as_millis(),
            "Bulk generation finished"
        );

        Ok(BulkJob {
            id: job_id,
            filter,
            outcomes,
            summary,
            cancelled: cancellation.is_cancelled(),
            started_at,
            completed_at: Some(Utc::now()),
        })
    }

    /// Requests cancellation of a running job.
    ///
    /// Returns false when no job with that id is running.
    pub async fn cancel(&self, job_id: Uuid) -> bool {
        let running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        match running.get(&job_id) {
            Some(cancellation) => {
                cancellation.cancel();
                info!(job_id = %job_id, "Bulk generation cancellation requested");
                true
            }
            None => false,
        }
    }

    async fn dispatch(
        &self,
        job_id: Uuid,
        filter: &BulkFilter,
        tax_rule: Arc<TaxRule>,
        population: &[CompensationProfile],
        cancellation: &BulkCancellation,
    ) -> Vec<Option<BulkOutcome>> {
        let period = filter.period();
        let timeout_ms = self.settings.task_timeout_ms;
        let semaphore = Arc::new(Semaphore::new(self.settings.pool_size.max(1)));

        let mut slots: Vec<Option<BulkOutcome>> = vec![None; population.len()];
        let mut handles: Vec<(usize, JoinHandle<BulkOutcome>)> =
            Vec::with_capacity(population.len());

        for (index, profile) in population.iter().enumerate() {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                slots[index] = Some(BulkOutcome::Cancelled);
                continue;
            };
            if cancellation.is_cancelled() {
                slots[index] = Some(BulkOutcome::Cancelled);
                continue;
            }

            let lifecycle = Arc::clone(&self.lifecycle);
            let tax_rule = Arc::clone(&tax_rule);
            let profile = profile.clone();
            handles.push((
                index,
                tokio::spawn(async move {
                    let _permit = permit;
                    let employee_id = profile.employee_id.clone();
                    let generation = lifecycle.generate_from_snapshot(profile, &tax_rule, period);

                    match tokio::time::timeout(Duration::from_millis(timeout_ms), generation).await
                    {
                        Ok(Ok(record)) => BulkOutcome::Success {
                            record_id: record.id,
                        },
                        Ok(Err(err)) => failure(job_id, &employee_id, err),
                        Err(_) => failure(
                            job_id,
                            &employee_id,
                            EngineError::CalculationTimeout {
                                employee_id: employee_id.clone(),
                                timeout_ms,
                            },
                        ),
                    }
                }),
            ));
        }

        for (index, handle) in handles {
            slots[index] = Some(match handle.await {
                Ok(outcome) => outcome,
                Err(err) => BulkOutcome::Failure {
                    kind: ErrorKind::Calculation,
                    reason: format!("generation task aborted: {}", err),
                },
            });
        }

        slots
    }
}

fn failure(job_id: Uuid, employee_id: &str, err: EngineError) -> BulkOutcome {
    warn!(
        job_id = %job_id,
        employee_id = %employee_id,
        error = %err,
        "Bulk generation failed for employee"
    );
    BulkOutcome::Failure {
        kind: err.kind(),
        reason: err.to_string(),
    }
}

/// Keeps the first profile of each employee id.
fn dedupe(population: Vec<CompensationProfile>) -> Vec<CompensationProfile> {
    let mut seen = HashSet::new();
    population
        .into_iter()
        .filter(|profile| seen.insert(profile.employee_id.clone()))
        .collect()
}
