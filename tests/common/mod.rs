//! Synthetic telemetry for integration tests.
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use fleet_paths::models::telemetry::{
    EngineData, FuelData, GpsData, ImplementData, TelemetryEvent, TelemetryRecord,
};
use fleet_paths::{FieldBoundary, Location, TimeRange};

/// Meters per degree of latitude on the haversine sphere.
pub const METERS_PER_DEGREE: f64 = 6_371_000.0 * std::f64::consts::PI / 180.0;

pub const BASE_LAT: f64 = 45.0;
pub const BASE_LON: f64 = 7.0;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 12, 6, 0, 0).unwrap()
}

pub fn range_secs(from: i64, to: i64) -> TimeRange {
    TimeRange::new(t0() + Duration::seconds(from), t0() + Duration::seconds(to)).unwrap()
}

/// Emits records for one vehicle heading due north from the base location.
pub struct TrackBuilder {
    vehicle_id: String,
    elapsed: i64,
    north_m: f64,
    working: Option<bool>,
    task_id: Option<String>,
    fuel_rate: Option<f64>,
    records: Vec<TelemetryRecord>,
}

impl TrackBuilder {
    pub fn new(vehicle_id: &str) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            elapsed: 0,
            north_m: 0.0,
            working: None,
            task_id: None,
            fuel_rate: Some(12.0),
            records: Vec::new(),
        }
    }

    pub fn working(mut self, active: bool) -> Self {
        self.working = Some(active);
        self
    }

    pub fn task(mut self, task_id: &str) -> Self {
        self.task_id = Some(task_id.to_string());
        self
    }

    /// `samples` records `every_secs` apart at a constant speed.
    pub fn drive(mut self, samples: usize, every_secs: i64, speed_kmh: f64) -> Self {
        for _ in 0..samples {
            self.push(speed_kmh);
            self.elapsed += every_secs;
            self.north_m += speed_kmh / 3.6 * every_secs as f64;
        }
        self
    }

    /// Halts, stays silent for `dwell_secs`, then reports once more having drifted 10 m.
    pub fn park(mut self, dwell_secs: i64) -> Self {
        self.push(0.0);
        self.elapsed += dwell_secs;
        self.north_m += 10.0;
        self.push(0.0);
        self.elapsed += 60;
        self
    }

    /// Attaches an event to the most recent record.
    pub fn event(mut self, event: TelemetryEvent) -> Self {
        if let Some(last) = self.records.last_mut() {
            last.events.push(event);
        }
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        t0() + Duration::seconds(self.elapsed)
    }

    pub fn build(self) -> Vec<TelemetryRecord> {
        self.records
    }

    fn push(&mut self, speed_kmh: f64) {
        self.records.push(TelemetryRecord {
            vehicle_id: self.vehicle_id.clone(),
            operator_id: Some("op-7".to_string()),
            task_id: self.task_id.clone(),
            timestamp: self.now(),
            location: GpsData {
                latitude: BASE_LAT + self.north_m / METERS_PER_DEGREE,
                longitude: BASE_LON,
                altitude: Some(240.0),
                accuracy: Some(3.0),
                satellites: Some(11),
                hdop: Some(0.9),
                speed: speed_kmh,
                heading: 0.0,
            },
            movement: None,
            engine: Some(EngineData {
                is_running: true,
                rpm: 1500.0,
                load_percentage: Some(40.0),
                coolant_temperature: Some(85.0),
                engine_hours: Some(1200.0),
                fuel_rate: self.fuel_rate,
            }),
            fuel: Some(FuelData {
                level: 180.0,
                percentage: Some(60.0),
                consumption: None,
            }),
            implement: self.working.map(|is_active| ImplementData {
                is_active,
                width: Some(6.0),
            }),
            events: Vec::new(),
            quality: None,
            in_maintenance: false,
        });
    }
}

/// Axis-aligned square around `(lat, lon)`.
pub fn square_field(id: &str, lat: f64, lon: f64, half_side_deg: f64) -> FieldBoundary {
    FieldBoundary {
        id: id.to_string(),
        boundary: vec![
            Location::new(lat - half_side_deg, lon - half_side_deg),
            Location::new(lat - half_side_deg, lon + half_side_deg),
            Location::new(lat + half_side_deg, lon + half_side_deg),
            Location::new(lat + half_side_deg, lon - half_side_deg),
        ],
    }
}
