//! Telemetry records and the batches they arrive in.
//!
//! Records are kept as raw JSON so that any payload fields beyond
//! `vehicleId` and `anomaly` survive verbatim into storage.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{DomainError, DomainResult};
use crate::id::VehicleId;

/// Field carrying the vehicle identifier.
pub const VEHICLE_ID_FIELD: &str = "vehicleId";

/// Field carrying the anomaly flag.
pub const ANOMALY_FIELD: &str = "anomaly";

/// Field of the trigger event holding the list of records.
pub const RECORDS_FIELD: &str = "records";

/// A single unit of vehicle sensor data.
///
/// Fields are read leniently: a missing or unusable `vehicleId` means
/// [`VehicleId::UNKNOWN`], and anything other than a JSON `true` for
/// `anomaly` means "not anomalous".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TelemetryRecord(JsonValue);

impl TelemetryRecord {
    pub fn new(value: JsonValue) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &JsonValue {
        &self.0
    }

    pub fn into_json(self) -> JsonValue {
        self.0
    }

    pub fn vehicle_id(&self) -> VehicleId {
        match self.0.get(VEHICLE_ID_FIELD) {
            Some(JsonValue::String(s)) => VehicleId::new(s.as_str()),
            Some(v @ (JsonValue::Number(_) | JsonValue::Bool(_))) => VehicleId::new(v.to_string()),
            _ => VehicleId::unknown(),
        }
    }

    pub fn is_anomalous(&self) -> bool {
        matches!(self.0.get(ANOMALY_FIELD), Some(JsonValue::Bool(true)))
    }

    /// Compact JSON text of the whole record, keys in their original order.
    pub fn to_data(&self) -> DomainResult<String> {
        serde_json::to_string(&self.0).map_err(|e| DomainError::serialization(e.to_string()))
    }
}

impl From<JsonValue> for TelemetryRecord {
    fn from(value: JsonValue) -> Self {
        Self(value)
    }
}

/// Ordered records extracted from one trigger event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TelemetryBatch(Vec<TelemetryRecord>);

impl TelemetryBatch {
    pub fn new(records: Vec<TelemetryRecord>) -> Self {
        Self(records)
    }

    /// Read the `records` list out of a trigger event.
    ///
    /// An absent or `null` list is an empty batch. A list of the wrong type,
    /// or an event that is not an object, is rejected.
    pub fn from_event(event: &JsonValue) -> DomainResult<Self> {
        let obj = event
            .as_object()
            .ok_or_else(|| DomainError::malformed_event("event must be a JSON object"))?;

        match obj.get(RECORDS_FIELD) {
            None | Some(JsonValue::Null) => Ok(Self::default()),
            Some(JsonValue::Array(items)) => Ok(Self(
                items.iter().cloned().map(TelemetryRecord::new).collect(),
            )),
            Some(other) => Err(DomainError::malformed_event(format!(
                "`{RECORDS_FIELD}` must be an array, got {}",
                json_kind(other)
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn records(&self) -> &[TelemetryRecord] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TelemetryRecord> {
        self.0.iter()
    }
}

impl IntoIterator for TelemetryBatch {
    type Item = TelemetryRecord;
    type IntoIter = std::vec::IntoIter<TelemetryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TelemetryBatch {
    type Item = &'a TelemetryRecord;
    type IntoIter = std::slice::Iter<'a, TelemetryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
