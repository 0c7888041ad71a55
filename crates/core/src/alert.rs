//! Outbound anomaly alerts.

use serde::{Deserialize, Serialize};

use crate::id::VehicleId;

/// Message sent to the alert topic for one anomalous record.
///
/// There is no deduplication: five anomalous records for the same vehicle
/// produce five notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertNotification {
    pub vehicle_id: VehicleId,
    pub message: String,
}

impl AlertNotification {
    pub fn anomaly_detected(vehicle_id: VehicleId) -> Self {
        let message = format!("Alert: Anomaly detected for Vehicle {vehicle_id}");
        Self { vehicle_id, message }
    }
}
