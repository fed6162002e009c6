//! Pool Metrics Collector
//!
//! Collects capacity, layout and state of storage pools.
//!
//! # Metrics Produced
//! - `vsa_pool_raw_capacity` - Pool raw capacity
//! - `vsa_pool_usable_capacity` - Pool usable capacity
//! - `vsa_pool_free_space` - Pool free space
//! - `vsa_pool_type` - Pool type (enum: zfs)
//! - `vsa_pool_pool_type` - Pool pooling type (enum: zfs_stripped_raid_z2)
//! - `vsa_pool_state` - Pool state (enum: online, offline, degraded)
//!
//! All labeled with the common labels plus `pool_name`.

use super::{
    collect_rows, set_state_or_warn, CollectionReport, Collector, CommonLabels, LabelSchema,
};
use crate::error::{ExporterError, Result};
use crate::metrics::{EnumFamily, GaugeFamily, MetricsRegistry};
use crate::vsa::types::PoolRow;
use crate::vsa::{DataSource, POOLS_PATH};
use async_trait::async_trait;

const IDENTITY_LABELS: &[&str] = &["pool_name"];

pub const POOL_TYPES: &[&str] = &["zfs"];
pub const POOL_LAYOUTS: &[&str] = &["zfs_stripped_raid_z2"];
pub const POOL_STATES: &[&str] = &["online", "offline", "degraded"];

struct PoolMetrics {
    schema: LabelSchema,
    raw_capacity: GaugeFamily,
    usable_capacity: GaugeFamily,
    free_space: GaugeFamily,
    kind: EnumFamily,
    pool_type: EnumFamily,
    state: EnumFamily,
}

impl PoolMetrics {
    fn update(&self, pool: &PoolRow) -> Result<()> {
        let labels = self.schema.values(&pool.node, &[&pool.pool_name])?;

        self.raw_capacity.set(&labels, pool.raw_capacity_bytes)?;
        self.usable_capacity
            .set(&labels, pool.usable_capacity_bytes)?;
        self.free_space.set(&labels, pool.free_space_bytes)?;

        set_state_or_warn(&self.kind, &labels, &pool.kind)?;
        set_state_or_warn(&self.pool_type, &labels, &pool.pool_type)?;
        set_state_or_warn(&self.state, &labels, &pool.state)?;
        Ok(())
    }
}

/// Collector for `api/v1/pools`
#[derive(Default)]
pub struct PoolCollector {
    metrics: Option<PoolMetrics>,
}

impl PoolCollector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Collector for PoolCollector {
    fn name(&self) -> &'static str {
        "pool"
    }

    fn path(&self) -> &'static str {
        POOLS_PATH
    }

    fn define(&mut self, common: &CommonLabels, sink: &MetricsRegistry) -> Result<()> {
        if self.metrics.is_some() {
            return Err(ExporterError::AlreadyDefined(self.name()));
        }

        let schema = LabelSchema::new(common, IDENTITY_LABELS);
        let labels = schema.names();

        self.metrics = Some(PoolMetrics {
            raw_capacity: sink.define_gauge("vsa_pool_raw_capacity", "Pool raw capacity", &labels)?,
            usable_capacity: sink.define_gauge(
                "vsa_pool_usable_capacity",
                "Pool usable capacity",
                &labels,
            )?,
            free_space: sink.define_gauge("vsa_pool_free_space", "Pool free space", &labels)?,
            kind: sink.define_enum("vsa_pool_type", "Pool type", &labels, POOL_TYPES)?,
            pool_type: sink.define_enum(
                "vsa_pool_pool_type",
                "Pool pooling type",
                &labels,
                POOL_LAYOUTS,
            )?,
            state: sink.define_enum("vsa_pool_state", "Pool state", &labels, POOL_STATES)?,
            schema,
        });
        Ok(())
    }

    async fn collect(&self, client: &dyn DataSource) -> Result<CollectionReport> {
        let metrics = self
            .metrics
            .as_ref()
            .ok_or(ExporterError::NotDefined(self.name()))?;

        Ok(collect_rows(self.name(), client, self.path(), |pool: &PoolRow| {
            metrics.update(pool)
        })
        .await)
    }
}
