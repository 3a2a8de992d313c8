use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::models::telemetry::{parse_f64, parse_f64_option};

/// Envelope emitted by the simple trackers (DPL units).
#[derive(Debug, Deserialize)]
pub struct TrackerMessage {
    pub data: TrackerPacket,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerPacket {
    /// Epoch milliseconds.
    pub timestamp: i64,
    #[serde(deserialize_with = "parse_f64")]
    pub latitude: f64,
    #[serde(deserialize_with = "parse_f64")]
    pub longitude: f64,
    /// km/h
    #[serde(default, deserialize_with = "parse_f64")]
    pub speed: f64,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub fuel_level: Option<f64>,
    #[serde(default)]
    pub engine_on: bool,
    #[serde(default)]
    pub rfid_id: Option<String>,
    #[serde(rename = "DEVICE_ID", default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Metadata {
    #[serde(rename = "DEVICE_ID")]
    pub device_id: Option<String>,
    #[serde(flatten)]
    pub other: HashMap<String, Value>,
}

impl TrackerMessage {
    pub fn get_device_id(&self) -> Option<&String> {
        self.data.device_id.as_ref().or(self.metadata.device_id.as_ref())
    }
}

/// Running counters for one device, threaded explicitly between calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleState {
    pub last_timestamp: Option<i64>,
    /// Minutes.
    pub total_driving_time: f64,
    /// Liters.
    pub total_fuel_used: f64,
    pub motor_hours: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedVehicleData {
    pub device_id: String,
    pub vehicle_id: String,
    /// Minutes.
    pub driving_time: f64,
    /// Liters consumed since the previous packet.
    pub fuel_consumption: f64,
    pub rpm: u32,
    pub is_driver_authenticated: bool,
    pub connection_status: ConnectionStatus,
    pub motor_hours: f64,
}
