//! Virtual Disk Metrics Collector
//!
//! Collects availability and synchronization progress of virtual disks, plus one
//! info series per session/ACL record of every appliance serving the disk.
//!
//! # Metrics Produced
//! - `vsa_virtual_disk_availability` - enum: simple, limited_availability, highly_available
//! - `vsa_virtual_disk_synchronization_state` - enum: notApplicable, synchronizing, synchronized
//! - `vsa_virtual_disk_synchronized_bytes`
//! - `vsa_virtual_disk_not_synchronized_bytes`
//! - `vsa_virtual_disk_synchronized_percent`
//! - `vsa_virtual_disk_synchronization_estimated_time`
//!   - Labels: common labels, serial_id, lun, name
//! - `vsa_virtual_disk_session_info` - Session record fields as labels (value is always 1)
//!   - Labels: common labels, serial_id, lun, name, session_id, record fields
//!
//! Session field values are rendered from JSON: strings verbatim, `null` as an empty
//! string, booleans as `true`/`false`, numbers and nested objects as JSON text. Label
//! values therefore differ from exporters that printed `True`, `None` or dict reprs.

use super::{
    collect_rows, set_state_or_warn, CollectionReport, Collector, CommonLabels, LabelSchema,
};
use crate::error::{ExporterError, Result};
use crate::metrics::{EnumFamily, GaugeFamily, InfoFamily, MetricsRegistry};
use crate::vsa::types::VirtualDiskRow;
use crate::vsa::{DataSource, VIRTUAL_DISKS_PATH};
use async_trait::async_trait;
use tracing::warn;

const IDENTITY_LABELS: &[&str] = &["serial_id", "lun", "name"];

pub const AVAILABILITY_STATES: &[&str] = &["simple", "limited_availability", "highly_available"];
pub const SYNC_STATES: &[&str] = &["notApplicable", "synchronizing", "synchronized"];

struct VirtualDiskMetrics {
    schema: LabelSchema,
    availability: EnumFamily,
    synchronization_state: EnumFamily,
    synchronized_bytes: GaugeFamily,
    not_synchronized_bytes: GaugeFamily,
    synchronized_percent: GaugeFamily,
    synchronization_estimated_time: GaugeFamily,
    sessions: InfoFamily,
}

impl VirtualDiskMetrics {
    fn update(&self, disk: &VirtualDiskRow) -> Result<()> {
        let labels = self
            .schema
            .values(&disk.node, &[&disk.serial_id, &disk.iscsi_lun, &disk.name])?;
        let sync = &disk.synchronization_state;

        set_state_or_warn(&self.availability, &labels, &disk.availability)?;
        set_state_or_warn(&self.synchronization_state, &labels, &sync.sync_status)?;
        self.synchronized_bytes.set(&labels, sync.synchronized_bytes)?;
        self.not_synchronized_bytes
            .set(&labels, sync.not_synchronized_bytes)?;
        self.synchronized_percent
            .set(&labels, sync.synchronized_percents)?;
        self.synchronization_estimated_time
            .set(&labels, sync.estimated_time_second)?;

        for appliance in &disk.appliances {
            for session in &appliance.sessions {
                let Some(session_id) = session.id() else {
                    warn!(
                        "Skipping session without id on virtual disk {} ({})",
                        disk.name, disk.serial_id
                    );
                    continue;
                };

                let mut session_labels = labels.clone();
                session_labels.push(&session_id);
                self.sessions
                    .set_fields(&session_labels, &session.to_fields())?;
            }
        }
        Ok(())
    }
}

/// Collector for `api/v1/virtualdisks`
#[derive(Default)]
pub struct VirtualDiskCollector {
    metrics: Option<VirtualDiskMetrics>,
}

impl VirtualDiskCollector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Collector for VirtualDiskCollector {
    fn name(&self) -> &'static str {
        "virtual_disk"
    }

    fn path(&self) -> &'static str {
        VIRTUAL_DISKS_PATH
    }

    fn define(&mut self, common: &CommonLabels, sink: &MetricsRegistry) -> Result<()> {
        if self.metrics.is_some() {
            return Err(ExporterError::AlreadyDefined(self.name()));
        }

        let schema = LabelSchema::new(common, IDENTITY_LABELS);
        let labels = schema.names();

        self.metrics = Some(VirtualDiskMetrics {
            availability: sink.define_enum(
                "vsa_virtual_disk_availability",
                "Virtual disk availability",
                &labels,
                AVAILABILITY_STATES,
            )?,
            synchronization_state: sink.define_enum(
                "vsa_virtual_disk_synchronization_state",
                "Virtual disk synchronization state",
                &labels,
                SYNC_STATES,
            )?,
            synchronized_bytes: sink.define_gauge(
                "vsa_virtual_disk_synchronized_bytes",
                "Virtual disk synchronized bytes",
                &labels,
            )?,
            not_synchronized_bytes: sink.define_gauge(
                "vsa_virtual_disk_not_synchronized_bytes",
                "Virtual disk not synchronized bytes",
                &labels,
            )?,
            synchronized_percent: sink.define_gauge(
                "vsa_virtual_disk_synchronized_percent",
                "Virtual disk synchronized percentage",
                &labels,
            )?,
            synchronization_estimated_time: sink.define_gauge(
                "vsa_virtual_disk_synchronization_estimated_time",
                "Virtual disk synchronization estimated time",
                &labels,
            )?,
            sessions: sink.define_info(
                "vsa_virtual_disk_session",
                "Virtual disk session",
                &schema.names_with(&["session_id"]),
            )?,
            schema,
        });
        Ok(())
    }

    async fn collect(&self, client: &dyn DataSource) -> Result<CollectionReport> {
        let metrics = self
            .metrics
            .as_ref()
            .ok_or(ExporterError::NotDefined(self.name()))?;

        Ok(
            collect_rows(self.name(), client, self.path(), |disk: &VirtualDiskRow| {
                metrics.update(disk)
            })
            .await,
        )
    }
}
