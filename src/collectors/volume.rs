//! Volume Metrics Collector
//!
//! # Metrics Produced
//! - `vsa_volume_usable_capacity` - Volume usable capacity
//! - `vsa_volume_size` - Volume size
//! - `vsa_volume_free_space` - Volume free space
//! - `vsa_volume_type` - Volume type (enum: standard)
//!
//! All labeled with the common labels plus `volume_name` and `pool_name`.

use super::{
    collect_rows, set_state_or_warn, CollectionReport, Collector, CommonLabels, LabelSchema,
};
use crate::error::{ExporterError, Result};
use crate::metrics::{EnumFamily, GaugeFamily, MetricsRegistry};
use crate::vsa::types::VolumeRow;
use crate::vsa::{DataSource, VOLUMES_PATH};
use async_trait::async_trait;

const IDENTITY_LABELS: &[&str] = &["volume_name", "pool_name"];

pub const VOLUME_TYPES: &[&str] = &["standard"];

struct VolumeMetrics {
    schema: LabelSchema,
    usable_capacity: GaugeFamily,
    size: GaugeFamily,
    free_space: GaugeFamily,
    kind: EnumFamily,
}

impl VolumeMetrics {
    fn update(&self, volume: &VolumeRow) -> Result<()> {
        let labels = self
            .schema
            .values(&volume.node, &[&volume.volume_name, &volume.pool])?;

        self.usable_capacity
            .set(&labels, volume.usable_capacity_bytes)?;
        self.size.set(&labels, volume.size_bytes)?;
        self.free_space.set(&labels, volume.free_space_bytes)?;
        set_state_or_warn(&self.kind, &labels, &volume.kind)
    }
}

/// Collector for `api/v1/volumes`
#[derive(Default)]
pub struct VolumeCollector {
    metrics: Option<VolumeMetrics>,
}

impl VolumeCollector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Collector for VolumeCollector {
    fn name(&self) -> &'static str {
        "volume"
    }

    fn path(&self) -> &'static str {
        VOLUMES_PATH
    }

    fn define(&mut self, common: &CommonLabels, sink: &MetricsRegistry) -> Result<()> {
        if self.metrics.is_some() {
            return Err(ExporterError::AlreadyDefined(self.name()));
        }

        let schema = LabelSchema::new(common, IDENTITY_LABELS);
        let labels = schema.names();

        self.metrics = Some(VolumeMetrics {
            usable_capacity: sink.define_gauge(
                "vsa_volume_usable_capacity",
                "Volume usable capacity",
                &labels,
            )?,
            size: sink.define_gauge("vsa_volume_size", "Volume size", &labels)?,
            free_space: sink.define_gauge("vsa_volume_free_space", "Volume free space", &labels)?,
            kind: sink.define_enum("vsa_volume_type", "Volume type", &labels, VOLUME_TYPES)?,
            schema,
        });
        Ok(())
    }

    async fn collect(&self, client: &dyn DataSource) -> Result<CollectionReport> {
        let metrics = self
            .metrics
            .as_ref()
            .ok_or(ExporterError::NotDefined(self.name()))?;

        Ok(collect_rows(self.name(), client, self.path(), |volume: &VolumeRow| {
            metrics.update(volume)
        })
        .await)
    }
}
