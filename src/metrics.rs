//! Prometheus Metrics Registry
//!
//! This module is the metric sink the collectors write into. Collectors declare
//! their metric families once at startup and then update them every poll cycle.
//!
//! # Metric Types
//!
//! - [`GaugeFamily`]: one numeric value per label-value tuple
//! - [`EnumFamily`]: one state out of a closed set per label-value tuple, exposed as
//!   one sample per declared state (`1` for the current state, `0` otherwise) with an
//!   extra label named after the metric
//! - [`InfoFamily`]: an arbitrary string-to-string mapping per label-value tuple,
//!   exposed as `<name>_info{labels..., fields...} 1`
//!
//! Process-level metrics (`vsa_up`, `vsa_collector_*`) are registered by
//! [`MetricsRegistry::new`] and maintained by the scheduler.
//!
//! Every setter checks the number of label values against the family's label set
//! and returns an error instead of panicking. Values are last-write-wins; nothing
//! is ever removed, so a series that disappears from the API keeps its last value.

use crate::error::{ExporterError, Result};
use prometheus::core::{Collector, Desc};
use prometheus::proto::{Gauge as GaugeProto, LabelPair, Metric, MetricFamily, MetricType};
use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Metric sink shared by the scheduler, the collectors and the HTTP server
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Arc<Registry>,

    pub up: Arc<Gauge>,
    pub collector_up: Arc<GaugeVec>,
    pub collector_duration_seconds: Arc<GaugeVec>,
    pub collector_rows_skipped: Arc<GaugeVec>,
}

impl MetricsRegistry {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let up = Gauge::new(
            "vsa_up",
            "Whether the last poll cycle reached the VSA API (1=up, 0=down)",
        )?;

        let collector_up = GaugeVec::new(
            Opts::new(
                "collector_up",
                "Whether the collector got a usable response in the last cycle",
            )
            .namespace("vsa"),
            &["collector"],
        )?;

        let collector_duration_seconds = GaugeVec::new(
            Opts::new(
                "collector_duration_seconds",
                "Time spent by the collector in the last cycle",
            )
            .namespace("vsa"),
            &["collector"],
        )?;

        let collector_rows_skipped = GaugeVec::new(
            Opts::new(
                "collector_rows_skipped",
                "Rows skipped as malformed by the collector in the last cycle",
            )
            .namespace("vsa"),
            &["collector"],
        )?;

        registry.register(Box::new(up.clone()))?;
        registry.register(Box::new(collector_up.clone()))?;
        registry.register(Box::new(collector_duration_seconds.clone()))?;
        registry.register(Box::new(collector_rows_skipped.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            up: Arc::new(up),
            collector_up: Arc::new(collector_up),
            collector_duration_seconds: Arc::new(collector_duration_seconds),
            collector_rows_skipped: Arc::new(collector_rows_skipped),
        })
    }

    /// Declare a labeled gauge
    pub fn define_gauge(&self, name: &str, help: &str, labels: &[String]) -> Result<GaugeFamily> {
        let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        let inner = GaugeVec::new(Opts::new(name, help), &label_refs)?;
        self.registry.register(Box::new(inner.clone()))?;

        Ok(GaugeFamily {
            name: name.to_string(),
            label_count: labels.len(),
            inner,
        })
    }

    /// Declare a labeled enum restricted to `states`
    pub fn define_enum(
        &self,
        name: &str,
        help: &str,
        labels: &[String],
        states: &[&str],
    ) -> Result<EnumFamily> {
        if states.is_empty() {
            return Err(ExporterError::Config(format!(
                "enum metric {} needs at least one state",
                name
            )));
        }

        let mut label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        label_refs.push(name);
        let inner = GaugeVec::new(Opts::new(name, help), &label_refs)?;
        self.registry.register(Box::new(inner.clone()))?;

        Ok(EnumFamily {
            name: name.to_string(),
            label_count: labels.len(),
            states: states.iter().map(|s| s.to_string()).collect(),
            inner,
        })
    }

    /// Declare a labeled info metric; it is exposed as `<name>_info`
    pub fn define_info(&self, name: &str, help: &str, labels: &[String]) -> Result<InfoFamily> {
        let info = InfoFamily::new(name, help, labels)?;
        self.registry.register(Box::new(info.clone()))?;
        Ok(info)
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn check_arity(metric: &str, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(ExporterError::LabelMismatch {
            metric: metric.to_string(),
            expected,
            got,
        });
    }
    Ok(())
}

/// Handle to a declared gauge
#[derive(Clone)]
pub struct GaugeFamily {
    name: String,
    label_count: usize,
    inner: GaugeVec,
}

impl GaugeFamily {
    pub fn set(&self, values: &[&str], value: f64) -> Result<()> {
        check_arity(&self.name, self.label_count, values.len())?;
        self.inner.get_metric_with_label_values(values)?.set(value);
        Ok(())
    }
}

/// Handle to a declared enum
#[derive(Clone)]
pub struct EnumFamily {
    name: String,
    label_count: usize,
    states: Vec<String>,
    inner: GaugeVec,
}

impl EnumFamily {
    /// Move the series at `values` to `state`.
    ///
    /// An undeclared state is rejected with [`ExporterError::UnknownState`] and the
    /// series keeps whatever state it had before.
    pub fn set_state(&self, values: &[&str], state: &str) -> Result<()> {
        check_arity(&self.name, self.label_count, values.len())?;
        if !self.states.iter().any(|s| s == state) {
            return Err(ExporterError::UnknownState {
                metric: self.name.clone(),
                state: state.to_string(),
            });
        }

        let mut label_values: Vec<&str> = Vec::with_capacity(values.len() + 1);
        label_values.extend_from_slice(values);
        label_values.push("");
        for declared in &self.states {
            if let Some(last) = label_values.last_mut() {
                *last = declared.as_str();
            }
            let value = if declared == state { 1.0 } else { 0.0 };
            self.inner
                .get_metric_with_label_values(&label_values)?
                .set(value);
        }
        Ok(())
    }
}

/// Handle to a declared info metric
#[derive(Clone)]
pub struct InfoFamily {
    inner: Arc<InfoInner>,
}

struct InfoInner {
    name: String,
    help: String,
    labels: Vec<String>,
    desc: Desc,
    series: RwLock<BTreeMap<Vec<String>, BTreeMap<String, String>>>,
}

impl InfoFamily {
    fn new(name: &str, help: &str, labels: &[String]) -> Result<Self> {
        let name = format!("{}_info", name);
        let desc = Desc::new(
            name.clone(),
            help.to_string(),
            labels.to_vec(),
            HashMap::new(),
        )?;

        Ok(Self {
            inner: Arc::new(InfoInner {
                name,
                help: help.to_string(),
                labels: labels.to_vec(),
                desc,
                series: RwLock::new(BTreeMap::new()),
            }),
        })
    }

    /// Exposed metric name, including the `_info` suffix
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Replace the field mapping of the series at `values`.
    ///
    /// Keys are turned into valid label names. A key is dropped when it collides
    /// with a base label, starts with the reserved `__` prefix, or sanitizes to the
    /// same name as an earlier key (in key order).
    ///
    /// # Arguments
    ///
    /// * `values` - Base label values, one per declared label
    /// * `fields` - Field mapping exposed as extra labels
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The series now carries exactly the kept fields
    /// * `Err(ExporterError::LabelMismatch)` - Wrong number of base label values
    pub fn set_fields(&self, values: &[&str], fields: &BTreeMap<String, String>) -> Result<()> {
        check_arity(&self.inner.name, self.inner.labels.len(), values.len())?;

        let mut sanitized: BTreeMap<String, String> = BTreeMap::new();
        for (raw, value) in fields {
            let key = sanitize_label_name(raw);
            if self.inner.labels.contains(&key) {
                debug!(
                    "Dropping field {} from {}: collides with a base label",
                    key, self.inner.name
                );
                continue;
            }
            if key.starts_with("__") {
                warn!(
                    "Dropping field {} from {}: reserved label prefix",
                    raw, self.inner.name
                );
                continue;
            }
            if sanitized.contains_key(&key) {
                warn!(
                    "Dropping field {} from {}: another field already maps to label {}",
                    raw, self.inner.name, key
                );
                continue;
            }
            sanitized.insert(key, value.clone());
        }

        let key = values.iter().map(|v| v.to_string()).collect();
        self.inner
            .series
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, sanitized);
        Ok(())
    }

    /// Number of series currently held
    pub fn len(&self) -> usize {
        self.inner
            .series
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn label_pair(name: &str, value: &str) -> LabelPair {
    let mut pair = LabelPair::default();
    pair.set_name(name.to_string());
    pair.set_value(value.to_string());
    pair
}

impl Collector for InfoFamily {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.inner.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let series = self
            .inner
            .series
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let metrics: Vec<Metric> = series
            .iter()
            .map(|(values, fields)| {
                let mut labels: Vec<LabelPair> = self
                    .inner
                    .labels
                    .iter()
                    .zip(values)
                    .map(|(name, value)| label_pair(name, value))
                    .collect();
                labels.extend(fields.iter().map(|(k, v)| label_pair(k, v)));

                let mut gauge = GaugeProto::default();
                gauge.set_value(1.0);

                let mut metric = Metric::default();
                metric.set_label(labels);
                metric.set_gauge(gauge);
                metric
            })
            .collect();

        let mut family = MetricFamily::default();
        family.set_name(self.inner.name.clone());
        family.set_help(self.inner.help.clone());
        family.set_field_type(MetricType::GAUGE);
        family.set_metric(metrics);
        vec![family]
    }
}

/// Turn an arbitrary field key into a valid Prometheus label name
pub fn sanitize_label_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}
