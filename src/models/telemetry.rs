use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One raw sample as delivered by a vehicle's telematics unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    pub vehicle_id: String,
    #[serde(default)]
    pub operator_id: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub location: GpsData,
    #[serde(default)]
    pub movement: Option<MovementData>,
    #[serde(default)]
    pub engine: Option<EngineData>,
    #[serde(default)]
    pub fuel: Option<FuelData>,
    #[serde(default)]
    pub implement: Option<ImplementData>,
    #[serde(default)]
    pub events: Vec<TelemetryEvent>,
    #[serde(default)]
    pub quality: Option<DataQuality>,
    #[serde(default)]
    pub in_maintenance: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsData {
    #[serde(deserialize_with = "parse_f64")]
    pub latitude: f64,
    #[serde(deserialize_with = "parse_f64")]
    pub longitude: f64,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub altitude: Option<f64>,
    /// Meters.
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub satellites: Option<u32>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub hdop: Option<f64>,
    /// km/h from the GPS receiver.
    #[serde(default, deserialize_with = "parse_f64")]
    pub speed: f64,
    /// Degrees, [0, 360).
    #[serde(default, deserialize_with = "parse_f64")]
    pub heading: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementData {
    #[serde(deserialize_with = "parse_f64")]
    pub speed: f64,
    pub is_moving: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineData {
    pub is_running: bool,
    #[serde(default, deserialize_with = "parse_f64")]
    pub rpm: f64,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub load_percentage: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub coolant_temperature: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub engine_hours: Option<f64>,
    /// Liters per hour.
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub fuel_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelData {
    /// Liters in tank.
    #[serde(deserialize_with = "parse_f64")]
    pub level: f64,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub percentage: Option<f64>,
    /// Liters per hour.
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub consumption: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementData {
    pub is_active: bool,
    /// Working width in meters.
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub width: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    /// 0-100.
    #[serde(deserialize_with = "parse_f64")]
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub acknowledged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    EngineStart,
    EngineStop,
    SpeedLimitExceeded,
    GeofenceEntry,
    GeofenceExit,
    FuelTheftDetected,
    LowFuelWarning,
    BatteryLow,
    MaintenanceDue,
    UnauthorizedUse,
    AccidentDetected,
    ImplementMalfunction,
    GpsSignalLost,
    SensorOffline,
    TaskStarted,
    TaskCompleted,
    TaskPaused,
    EmergencyButton,
    DriverAuthenticated,
    DriverLoggedOut,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EngineStart => "engine_start",
            Self::EngineStop => "engine_stop",
            Self::SpeedLimitExceeded => "speed_limit_exceeded",
            Self::GeofenceEntry => "geofence_entry",
            Self::GeofenceExit => "geofence_exit",
            Self::FuelTheftDetected => "fuel_theft_detected",
            Self::LowFuelWarning => "low_fuel_warning",
            Self::BatteryLow => "battery_low",
            Self::MaintenanceDue => "maintenance_due",
            Self::UnauthorizedUse => "unauthorized_use",
            Self::AccidentDetected => "accident_detected",
            Self::ImplementMalfunction => "implement_malfunction",
            Self::GpsSignalLost => "gps_signal_lost",
            Self::SensorOffline => "sensor_offline",
            Self::TaskStarted => "task_started",
            Self::TaskCompleted => "task_completed",
            Self::TaskPaused => "task_paused",
            Self::EmergencyButton => "emergency_button",
            Self::DriverAuthenticated => "driver_authenticated",
            Self::DriverLoggedOut => "driver_logged_out",
        }
    }
}

/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl TelemetryRecord {
    /// Fuel flow in l/h, preferring the engine ECU over the tank sensor.
    pub fn fuel_rate(&self) -> Option<f64> {
        self.engine
            .as_ref()
            .and_then(|e| e.fuel_rate)
            .or_else(|| self.fuel.as_ref().and_then(|f| f.consumption))
    }

    pub fn engine_running(&self) -> bool {
        self.engine.as_ref().map(|e| e.is_running).unwrap_or(false)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrFloat {
    String(String),
    Float(f64),
}

pub(crate) fn parse_f64_option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v: Option<StringOrFloat> = Option::deserialize(deserializer)?;
    match v {
        Some(StringOrFloat::Float(f)) => Ok(Some(f)),
        Some(StringOrFloat::String(s)) => {
            if s.trim().is_empty() {
                Ok(None)
            } else {
                s.trim().parse::<f64>().map(Some).map_err(serde::de::Error::custom)
            }
        }
        None => Ok(None),
    }
}

pub(crate) fn parse_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    parse_f64_option(deserializer)?.ok_or_else(|| serde::de::Error::custom("expected a number"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsing_string_encoded_numbers() {
        let payload = r#"
        {
            "vehicleId": "tractor-07",
            "taskId": "plough-north",
            "timestamp": "2025-11-29T06:15:15Z",
            "location": {
                "latitude": "+50.452494",
                "longitude": "30.391404",
                "accuracy": "4.5",
                "satellites": 9,
                "speed": "12.50",
                "heading": 270
            },
            "engine": { "isRunning": true, "rpm": "1850", "fuelRate": "14.2" },
            "implement": { "isActive": true },
            "events": [
                {
                    "type": "geofence_exit",
                    "timestamp": "2025-11-29T06:15:15Z",
                    "severity": "warning",
                    "description": "Left field boundary"
                }
            ]
        }
        "#;

        let record: TelemetryRecord = serde_json::from_str(payload).unwrap();
        assert_eq!(record.location.latitude, 50.452494);
        assert_eq!(record.location.longitude, 30.391404);
        assert_eq!(record.location.speed, 12.5);
        assert_eq!(record.location.heading, 270.0);
        assert_eq!(record.location.altitude, None);
        assert_eq!(record.fuel_rate(), Some(14.2));
        assert!(record.engine_running());
        assert!(!record.in_maintenance);
        assert_eq!(record.events[0].event_type, EventType::GeofenceExit);
        assert_eq!(record.events[0].severity, Severity::Warning);
    }

    #[test]
    fn test_blank_optional_number_is_none() {
        let payload = r#"{
            "vehicleId": "v1",
            "timestamp": "2025-01-01T00:00:00Z",
            "location": { "latitude": 1.0, "longitude": 2.0, "altitude": "  " }
        }"#;
        let record: TelemetryRecord = serde_json::from_str(payload).unwrap();
        assert_eq!(record.location.altitude, None);
        assert_eq!(record.location.speed, 0.0);
        assert_eq!(record.fuel_rate(), None);
    }

    #[test]
    fn test_fuel_rate_falls_back_to_tank_consumption() {
        let payload = r#"{
            "vehicleId": "v1",
            "timestamp": "2025-01-01T00:00:00Z",
            "location": { "latitude": 1.0, "longitude": 2.0 },
            "fuel": { "level": "120.5", "consumption": 9.5 }
        }"#;
        let record: TelemetryRecord = serde_json::from_str(payload).unwrap();
        assert_eq!(record.fuel_rate(), Some(9.5));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Error);
        assert!(Severity::Warning > Severity::Info);
    }
}
