//! Metrics Collectors
//!
//! One collector per VSA entity kind: disks, pools, volumes and virtual disks.
//!
//! # Architecture
//!
//! Collectors follow a consistent two-step protocol:
//! - [`Collector::define`] runs once at startup and declares the collector's metric
//!   families with the sink, using a [`LabelSchema`] made of the process-wide common
//!   labels followed by the entity's identity labels
//! - [`Collector::collect`] runs every cycle: one GET to the entity's endpoint, then
//!   every row is decoded and written to the declared families
//!
//! # Error Handling
//!
//! Failures are contained to the smallest unit:
//! - absent response: the cycle is a no-op for this collector, old values stay exposed
//! - malformed row: the row is skipped and logged, remaining rows are still mapped
//! - undeclared enum state: that single observation is skipped and logged

use crate::error::{ExporterError, Result};
use crate::metrics::{EnumFamily, MetricsRegistry};
use crate::vsa::types::{NodeFields, RowsEnvelope};
use crate::vsa::DataSource;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

pub mod disk;
pub mod pool;
pub mod virtual_disk;
pub mod volume;

pub use disk::DiskCollector;
pub use pool::PoolCollector;
pub use virtual_disk::VirtualDiskCollector;
pub use volume::VolumeCollector;

/// A label shared by every entity kind, resolved from the row's node fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommonLabel {
    NodeName,
}

impl CommonLabel {
    pub fn name(&self) -> &'static str {
        match self {
            CommonLabel::NodeName => "node_name",
        }
    }

    pub fn value<'a>(&self, node: &'a NodeFields) -> &'a str {
        match self {
            CommonLabel::NodeName => &node.node_name,
        }
    }
}

impl FromStr for CommonLabel {
    type Err = ExporterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "node_name" => Ok(CommonLabel::NodeName),
            other => Err(ExporterError::Config(format!(
                "unknown common label '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for CommonLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered common labels, prepended to every metric's label set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonLabels(Vec<CommonLabel>);

impl CommonLabels {
    pub fn new(labels: Vec<CommonLabel>) -> Result<Self> {
        if labels.is_empty() {
            return Err(ExporterError::Config(
                "at least one common label is required".to_string(),
            ));
        }
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(ExporterError::Config(format!(
                    "common label '{}' listed twice",
                    label
                )));
            }
        }
        Ok(Self(labels))
    }

    pub fn parse(names: &[String]) -> Result<Self> {
        let labels = names
            .iter()
            .map(|n| n.trim().parse())
            .collect::<Result<Vec<CommonLabel>>>()?;
        Self::new(labels)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommonLabel> {
        self.0.iter()
    }
}

impl Default for CommonLabels {
    fn default() -> Self {
        Self(vec![CommonLabel::NodeName])
    }
}

/// Label set of one entity kind: common labels followed by identity labels
#[derive(Debug, Clone)]
pub struct LabelSchema {
    common: CommonLabels,
    identity: &'static [&'static str],
}

impl LabelSchema {
    pub fn new(common: &CommonLabels, identity: &'static [&'static str]) -> Self {
        Self {
            common: common.clone(),
            identity,
        }
    }

    /// Label names in exposition order
    pub fn names(&self) -> Vec<String> {
        self.common
            .iter()
            .map(|l| l.name().to_string())
            .chain(self.identity.iter().map(|l| l.to_string()))
            .collect()
    }

    /// Label names followed by `extra`, for nested series
    pub fn names_with(&self, extra: &[&str]) -> Vec<String> {
        let mut names = self.names();
        names.extend(extra.iter().map(|l| l.to_string()));
        names
    }

    /// Label values for one row, in the same order as [`LabelSchema::names`]
    ///
    /// # Arguments
    ///
    /// * `node` - Node fields of the row, resolving the common labels
    /// * `identity` - Identity label values, in declaration order
    pub fn values<'a>(&self, node: &'a NodeFields, identity: &[&'a str]) -> Result<Vec<&'a str>> {
        if identity.len() != self.identity.len() {
            return Err(ExporterError::LabelMismatch {
                metric: self.identity.join(","),
                expected: self.identity.len(),
                got: identity.len(),
            });
        }
        Ok(self
            .common
            .iter()
            .map(|l| l.value(node))
            .chain(identity.iter().copied())
            .collect())
    }
}

/// Status of a metrics collection operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// A document was received and its rows were mapped
    Success,
    /// No usable response; nothing was updated this cycle
    Absent,
}

/// Outcome of one `collect` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionReport {
    pub status: CollectionStatus,
    /// Rows written to the metric families
    pub rows: usize,
    /// Rows skipped as malformed
    pub skipped: usize,
}

impl CollectionReport {
    pub fn absent() -> Self {
        Self {
            status: CollectionStatus::Absent,
            rows: 0,
            skipped: 0,
        }
    }

    fn success() -> Self {
        Self {
            status: CollectionStatus::Success,
            rows: 0,
            skipped: 0,
        }
    }
}

/// Declares and populates the metrics of one entity kind
#[async_trait]
pub trait Collector: Send + Sync {
    /// Short name used in logs and the `collector` label
    fn name(&self) -> &'static str;

    /// API path fetched each cycle
    fn path(&self) -> &'static str;

    /// Declare this collector's metric families; must run exactly once before `collect`
    fn define(&mut self, common: &CommonLabels, sink: &MetricsRegistry) -> Result<()>;

    /// Fetch the entity snapshot and update every declared family
    async fn collect(&self, client: &dyn DataSource) -> Result<CollectionReport>;
}

/// The entity collectors in registration order
pub fn default_collectors() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(DiskCollector::new()),
        Box::new(PoolCollector::new()),
        Box::new(VolumeCollector::new()),
        Box::new(VirtualDiskCollector::new()),
    ]
}

/// Fetch `path` and feed every decodable row to `map_row`
///
/// Wraps the fetch with consistent handling:
/// - absent or envelope-less response: logs a warning, returns [`CollectionStatus::Absent`]
/// - row that fails to decode or to map: logs a warning, counts it as skipped
///
/// # Arguments
///
/// * `name` - Collector name used in log messages
/// * `client` - Data source the document is fetched from
/// * `path` - API path of the entity list
/// * `map_row` - Writes one decoded row into the collector's metric families
///
/// # Returns
///
/// * [`CollectionStatus::Success`] with row and skip counts when a document arrived
/// * [`CollectionStatus::Absent`] when there was nothing usable to map
pub async fn collect_rows<T, F>(
    name: &str,
    client: &dyn DataSource,
    path: &str,
    mut map_row: F,
) -> CollectionReport
where
    T: DeserializeOwned + Send,
    F: FnMut(&T) -> Result<()> + Send,
{
    let Some(document) = client.get(path).await else {
        warn!("No usable response for {} from {}", name, path);
        return CollectionReport::absent();
    };

    let envelope: RowsEnvelope = match serde_json::from_value(document) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Unexpected {} response shape from {}: {}", name, path, e);
            return CollectionReport::absent();
        }
    };

    let mut report = CollectionReport::success();
    for (index, raw) in envelope.rows.into_iter().enumerate() {
        let row: T = match serde_json::from_value(raw) {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping malformed {} row {}: {}", name, index, e);
                report.skipped += 1;
                continue;
            }
        };

        match map_row(&row) {
            Ok(()) => report.rows += 1,
            Err(e) => {
                warn!("Skipping {} row {}: {}", name, index, e);
                report.skipped += 1;
            }
        }
    }

    debug!(
        "Updated {} metrics ({} rows, {} skipped)",
        name, report.rows, report.skipped
    );
    report
}

/// Set an enum state, logging and skipping states the family does not declare
///
/// # Returns
///
/// * `Ok(())` - The state was set, or it was undeclared and skipped
/// * `Err(ExporterError::LabelMismatch)` - Wrong number of label values
pub fn set_state_or_warn(family: &EnumFamily, values: &[&str], state: &str) -> Result<()> {
    match family.set_state(values, state) {
        Err(ExporterError::UnknownState { metric, state }) => {
            warn!(
                "Ignoring undeclared state '{}' for {} {:?}",
                state, metric, values
            );
            Ok(())
        }
        other => other,
    }
}
