//! VSA API Type Definitions
//!
//! Every list endpoint answers with a document of the form `{"rows": [...]}`.
//! The envelope is decoded first with the rows left as raw JSON, then each row is
//! decoded on its own into one of the typed structs below. A row that does not
//! match its struct fails alone and is skipped by the collector, the remaining
//! rows are still mapped.
//!
//! # Endpoints Covered
//!
//! - `api/v1/disks` → [`DiskRow`]
//! - `api/v1/pools` → [`PoolRow`]
//! - `api/v1/volumes` → [`VolumeRow`]
//! - `api/v1/virtualdisks` → [`VirtualDiskRow`], [`SynchronizationState`],
//!   [`Appliance`], [`SessionRecord`]
//!
//! # Field Decoding
//!
//! - Fields used as label values accept strings or numbers (LUNs come back as
//!   integers on some firmware).
//! - Fields used as gauge values accept numbers, booleans (`1`/`0`) or numeric strings.

use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Top-level list response
#[derive(Debug, Deserialize)]
pub struct RowsEnvelope {
    pub rows: Vec<Value>,
}

/// Fields every row carries regardless of entity kind
#[derive(Debug, Deserialize, Clone)]
pub struct NodeFields {
    #[serde(rename = "nodeName", deserialize_with = "label_value")]
    pub node_name: String,
}

/// Row from `api/v1/disks`
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DiskRow {
    #[serde(flatten)]
    pub node: NodeFields,
    #[serde(deserialize_with = "label_value")]
    pub id: String,
    #[serde(deserialize_with = "gauge_value")]
    pub used: f64,
    #[serde(deserialize_with = "gauge_value")]
    pub hot_spare: f64,
    #[serde(deserialize_with = "gauge_value")]
    pub size_bytes: f64,
}

/// Row from `api/v1/pools`
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PoolRow {
    #[serde(flatten)]
    pub node: NodeFields,
    #[serde(deserialize_with = "label_value")]
    pub pool_name: String,
    #[serde(deserialize_with = "gauge_value")]
    pub raw_capacity_bytes: f64,
    #[serde(deserialize_with = "gauge_value")]
    pub usable_capacity_bytes: f64,
    #[serde(deserialize_with = "gauge_value")]
    pub free_space_bytes: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub pool_type: String,
    pub state: String,
}

/// Row from `api/v1/volumes`
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VolumeRow {
    #[serde(flatten)]
    pub node: NodeFields,
    #[serde(deserialize_with = "label_value")]
    pub volume_name: String,
    #[serde(deserialize_with = "label_value")]
    pub pool: String,
    #[serde(deserialize_with = "gauge_value")]
    pub usable_capacity_bytes: f64,
    #[serde(deserialize_with = "gauge_value")]
    pub size_bytes: f64,
    #[serde(deserialize_with = "gauge_value")]
    pub free_space_bytes: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Row from `api/v1/virtualdisks`
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VirtualDiskRow {
    #[serde(flatten)]
    pub node: NodeFields,
    #[serde(deserialize_with = "label_value")]
    pub serial_id: String,
    #[serde(deserialize_with = "label_value")]
    pub iscsi_lun: String,
    #[serde(deserialize_with = "label_value")]
    pub name: String,
    pub availability: String,
    pub synchronization_state: SynchronizationState,
    #[serde(default)]
    pub appliances: Vec<Appliance>,
}

/// Nested `synchronizationState` object of a virtual disk
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SynchronizationState {
    pub sync_status: String,
    #[serde(deserialize_with = "gauge_value")]
    pub synchronized_bytes: f64,
    #[serde(deserialize_with = "gauge_value")]
    pub not_synchronized_bytes: f64,
    #[serde(deserialize_with = "gauge_value")]
    pub synchronized_percents: f64,
    #[serde(deserialize_with = "gauge_value")]
    pub estimated_time_second: f64,
}

/// Appliance serving a virtual disk
#[derive(Debug, Deserialize, Clone)]
pub struct Appliance {
    #[serde(rename = "sessionAndACLs", default)]
    pub sessions: Vec<SessionRecord>,
}

/// Session/ACL record of an appliance, kept as the raw object
#[derive(Debug, Deserialize, Clone)]
#[serde(transparent)]
pub struct SessionRecord(pub Map<String, Value>);

impl SessionRecord {
    /// The record's `id` as a label value
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::Null => None,
            value => Some(stringify(value)),
        }
    }

    /// Every field rendered as a string
    pub fn to_fields(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(key, value)| (key.clone(), stringify(value)))
            .collect()
    }
}

/// String form of a JSON value: strings unquoted, null empty, anything else as JSON text
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn label_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string or number label value, got {}",
            other
        ))),
    }
}

fn gauge_value<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("number {} is not representable", n))),
        Value::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("expected a numeric value, got \"{}\"", s))),
        other => Err(D::Error::custom(format!(
            "expected a numeric value, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_disk_row_accepts_boolean_hot_spare() {
        let row: DiskRow = serde_json::from_value(json!({
            "nodeName": "n1", "id": "d1", "used": 100, "hotSpare": true, "sizeBytes": 1000
        }))
        .unwrap();

        assert_eq!(row.node.node_name, "n1");
        assert_eq!(row.hot_spare, 1.0);
        assert_eq!(row.size_bytes, 1000.0);
    }

    #[test]
    fn test_numeric_lun_becomes_label_string() {
        let row: VirtualDiskRow = serde_json::from_value(json!({
            "nodeName": "n1", "serialId": "s1", "iscsiLun": 3, "name": "vd",
            "availability": "simple",
            "synchronizationState": {
                "syncStatus": "synchronized", "synchronizedBytes": 1,
                "notSynchronizedBytes": 0, "synchronizedPercents": 100,
                "estimatedTimeSecond": 0
            }
        }))
        .unwrap();

        assert_eq!(row.iscsi_lun, "3");
        assert!(row.appliances.is_empty());
    }

    #[test]
    fn test_missing_field_is_a_decode_error() {
        let result: Result<PoolRow, _> = serde_json::from_value(json!({
            "nodeName": "n1", "poolName": "p1"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_non_numeric_gauge_string_is_rejected() {
        let result: Result<DiskRow, _> = serde_json::from_value(json!({
            "nodeName": "n1", "id": "d1", "used": "lots", "hotSpare": false, "sizeBytes": 1
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_session_record_fields_are_stringified() {
        let session: SessionRecord = serde_json::from_value(json!({
            "id": 7, "initiator": "iqn.1991-05.com.microsoft:host", "active": true, "note": null
        }))
        .unwrap();

        assert_eq!(session.id().as_deref(), Some("7"));
        let fields = session.to_fields();
        assert_eq!(fields["id"], "7");
        assert_eq!(fields["initiator"], "iqn.1991-05.com.microsoft:host");
        assert_eq!(fields["active"], "true");
        assert_eq!(fields["note"], "");
    }
}
