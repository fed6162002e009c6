//! Disk Metrics Collector
//!
//! Collects usage, hot-spare flag and size of physical disks.
//!
//! # Metrics Produced
//! - `vsa_disk_used` - Disk used
//! - `vsa_disk_hot_spare` - Disk hot spare (1=hot spare, 0=not)
//! - `vsa_disk_size_bytes` - Disk size
//!
//! All labeled with the common labels plus `disk_id`.

use super::{collect_rows, CollectionReport, Collector, CommonLabels, LabelSchema};
use crate::error::{ExporterError, Result};
use crate::metrics::{GaugeFamily, MetricsRegistry};
use crate::vsa::types::DiskRow;
use crate::vsa::{DataSource, DISKS_PATH};
use async_trait::async_trait;

const IDENTITY_LABELS: &[&str] = &["disk_id"];

struct DiskMetrics {
    schema: LabelSchema,
    used: GaugeFamily,
    hot_spare: GaugeFamily,
    size_bytes: GaugeFamily,
}

impl DiskMetrics {
    fn update(&self, disk: &DiskRow) -> Result<()> {
        let labels = self.schema.values(&disk.node, &[&disk.id])?;

        self.used.set(&labels, disk.used)?;
        self.hot_spare.set(&labels, disk.hot_spare)?;
        self.size_bytes.set(&labels, disk.size_bytes)?;
        Ok(())
    }
}

/// Collector for `api/v1/disks`
#[derive(Default)]
pub struct DiskCollector {
    metrics: Option<DiskMetrics>,
}

impl DiskCollector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Collector for DiskCollector {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn path(&self) -> &'static str {
        DISKS_PATH
    }

    fn define(&mut self, common: &CommonLabels, sink: &MetricsRegistry) -> Result<()> {
        if self.metrics.is_some() {
            return Err(ExporterError::AlreadyDefined(self.name()));
        }

        let schema = LabelSchema::new(common, IDENTITY_LABELS);
        let labels = schema.names();

        self.metrics = Some(DiskMetrics {
            used: sink.define_gauge("vsa_disk_used", "Disk used", &labels)?,
            hot_spare: sink.define_gauge("vsa_disk_hot_spare", "Disk hot spare", &labels)?,
            size_bytes: sink.define_gauge("vsa_disk_size_bytes", "Disk size", &labels)?,
            schema,
        });
        Ok(())
    }

    async fn collect(&self, client: &dyn DataSource) -> Result<CollectionReport> {
        let metrics = self
            .metrics
            .as_ref()
            .ok_or(ExporterError::NotDefined(self.name()))?;

        Ok(collect_rows(self.name(), client, self.path(), |disk: &DiskRow| {
            metrics.update(disk)
        })
        .await)
    }
}
