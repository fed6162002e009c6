//! Collector Registry and Poll Loop
//!
//! The scheduler owns the ordered list of collectors and the shared client.
//!
//! # Lifecycle
//!
//! - **Initializing**: collectors are registered and [`Scheduler::define_all`] declares
//!   their metrics, in registration order
//! - **Polling**: [`Scheduler::run`] repeats a cycle (every collector's `collect`, in
//!   registration order, one at a time) followed by a fixed sleep, until shutdown
//!
//! Collectors never run concurrently, so the client needs no locking. Each
//! `collect` is bounded by `collector_timeout`; a collector that times out or
//! errors is logged and the cycle moves on to the next one.

use crate::collectors::{CollectionReport, CollectionStatus, Collector, CommonLabels};
use crate::config::MetricsConfig;
use crate::error::Result;
use crate::metrics::MetricsRegistry;
use crate::vsa::DataSource;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Initializing,
    Polling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Sleep between the end of one cycle and the start of the next
    pub interval: Duration,
    /// Upper bound for a single collector's `collect`
    pub collector_timeout: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            collector_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&MetricsConfig> for SchedulerSettings {
    fn from(config: &MetricsConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.poll_interval_seconds),
            collector_timeout: Duration::from_secs(config.collector_timeout_seconds),
        }
    }
}

/// What happened to one collector during a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectorOutcome {
    Collected(CollectionReport),
    Failed(String),
    TimedOut,
}

impl CollectorOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            CollectorOutcome::Collected(CollectionReport {
                status: CollectionStatus::Success,
                ..
            })
        )
    }
}

/// Per-collector outcomes of one cycle, in registration order
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub outcomes: Vec<(&'static str, CollectorOutcome)>,
}

impl CycleReport {
    pub fn any_success(&self) -> bool {
        self.outcomes.iter().any(|(_, o)| o.is_success())
    }
}

pub struct Scheduler {
    client: Arc<dyn DataSource>,
    metrics: MetricsRegistry,
    settings: SchedulerSettings,
    collectors: Vec<Box<dyn Collector>>,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(
        client: Arc<dyn DataSource>,
        metrics: MetricsRegistry,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            client,
            metrics,
            settings,
            collectors: Vec::new(),
            state: SchedulerState::Initializing,
        }
    }

    pub fn register(&mut self, collector: Box<dyn Collector>) -> &mut Self {
        self.collectors.push(collector);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Names of the registered collectors, in registration order
    pub fn collector_names(&self) -> Vec<&'static str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    /// Declare every collector's metrics, in registration order
    pub fn define_all(&mut self, common: &CommonLabels) -> Result<()> {
        for collector in &mut self.collectors {
            collector.define(common, &self.metrics)?;
            debug!("Defined metrics for {} collector", collector.name());
        }
        Ok(())
    }

    /// Run every collector once, in registration order
    ///
    /// Each `collect` is bounded by the collector timeout. Afterwards the
    /// `vsa_collector_*` series of every collector and `vsa_up` are updated.
    ///
    /// # Returns
    ///
    /// One [`CollectorOutcome`] per registered collector:
    ///
    /// * `Collected` - The collector returned a report (success or absent)
    /// * `Failed` - The collector returned an error (logged)
    /// * `TimedOut` - The collector was cancelled after the timeout (logged)
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        for collector in &self.collectors {
            let name = collector.name();
            let started = Instant::now();

            let outcome = match timeout(
                self.settings.collector_timeout,
                collector.collect(self.client.as_ref()),
            )
            .await
            {
                Ok(Ok(collected)) => CollectorOutcome::Collected(collected),
                Ok(Err(e)) => {
                    error!("Collector {} failed: {}", name, e);
                    CollectorOutcome::Failed(e.to_string())
                }
                Err(_) => {
                    warn!(
                        "Collector {} timed out after {:?}",
                        name, self.settings.collector_timeout
                    );
                    CollectorOutcome::TimedOut
                }
            };

            self.metrics
                .collector_duration_seconds
                .with_label_values(&[name])
                .set(started.elapsed().as_secs_f64());
            self.metrics
                .collector_up
                .with_label_values(&[name])
                .set(if outcome.is_success() { 1.0 } else { 0.0 });
            if let CollectorOutcome::Collected(collected) = &outcome {
                self.metrics
                    .collector_rows_skipped
                    .with_label_values(&[name])
                    .set(collected.skipped as f64);
            }

            report.outcomes.push((name, outcome));
        }

        self.metrics
            .up
            .set(if report.any_success() { 1.0 } else { 0.0 });
        report
    }

    /// Poll until `shutdown` resolves
    ///
    /// # Arguments
    ///
    /// * `shutdown` - Future that resolves when polling must stop; a cycle in
    ///   progress is dropped at its next await point
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        self.state = SchedulerState::Polling;
        info!(
            "Polling {} collectors every {:?}",
            self.collectors.len(),
            self.settings.interval
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping poll loop");
                    break;
                }
                _ = self.cycle_then_sleep() => {}
            }
        }
    }

    async fn cycle_then_sleep(&self) {
        let report = self.run_cycle().await;
        if !report.any_success() {
            warn!("No collector reached the VSA API this cycle");
        }
        sleep(self.settings.interval).await;
    }
}
