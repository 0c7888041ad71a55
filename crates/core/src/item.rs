//! Persisted form of a telemetry record.

use serde::{Deserialize, Serialize};

use crate::error::DomainResult;
use crate::id::VehicleId;
use crate::telemetry::TelemetryRecord;

/// One row of the vehicle table.
///
/// Keyed by `VehicleId`; `Data` is the record's JSON text. A later put for
/// the same key replaces the item (no versioning).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredItem {
    #[serde(rename = "VehicleId")]
    pub vehicle_id: VehicleId,
    #[serde(rename = "Data")]
    pub data: String,
}

impl StoredItem {
    pub fn new(vehicle_id: VehicleId, data: impl Into<String>) -> Self {
        Self {
            vehicle_id,
            data: data.into(),
        }
    }

    pub fn from_record(record: &TelemetryRecord) -> DomainResult<Self> {
        Ok(Self::new(record.vehicle_id(), record.to_data()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_from_record() {
        let record = TelemetryRecord::new(json!({"vehicleId": "V1", "anomaly": true, "speed": 80}));
        let item = StoredItem::from_record(&record).unwrap();
        assert_eq!(item.vehicle_id.as_str(), "V1");
        assert_eq!(item.data, r#"{"vehicleId":"V1","anomaly":true,"speed":80}"#);
    }

    #[test]
    fn attribute_names_on_the_wire() {
        let item = StoredItem::new(VehicleId::unknown(), "{}");
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value, json!({"VehicleId": "unknown", "Data": "{}"}));
    }
}
