//! Record and stream checks run before normalization.
//!
//! Hard violations become [`TelemetryError`]s and reject the vehicle's stream.
//! Data-quality concerns are collected as [`ValidationWarning`]s and never block.

use serde::Serialize;

use crate::error::{Result, TelemetryError};
use crate::models::telemetry::{EngineData, FuelData, GpsData, TelemetryRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationWarning {
    pub field: &'static str,
    pub message: &'static str,
    pub suggestion: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<TelemetryError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// First error wins; warnings are handed back on success.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>> {
        match self.errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(self.warnings),
        }
    }

    fn error(&mut self, field: &str, message: String) {
        self.errors.push(TelemetryError::invalid(field, message));
    }

    fn warn(&mut self, field: &'static str, message: &'static str, suggestion: &'static str) {
        self.warnings.push(ValidationWarning {
            field,
            message,
            suggestion,
        });
    }

    fn check_finite(&mut self, field: &str, value: f64) -> bool {
        if value.is_finite() {
            true
        } else {
            self.error(field, format!("{} is not a finite number", value));
            false
        }
    }
}

pub fn validate_record(record: &TelemetryRecord) -> ValidationReport {
    let mut report = ValidationReport::default();

    if record.vehicle_id.trim().is_empty() {
        report.error("vehicleId", "Vehicle ID is required".to_string());
    }

    validate_gps(&record.location, &mut report);
    if let Some(engine) = &record.engine {
        validate_engine(engine, &mut report);
    }
    if let Some(fuel) = &record.fuel {
        validate_fuel(fuel, &mut report);
    }
    validate_cross_fields(record, &mut report);

    if let Some(quality) = &record.quality {
        if quality.score < 50.0 {
            report.warn(
                "quality.score",
                "Low data quality score",
                "Review sensor health and calibration",
            );
        }
    }

    report
}

fn validate_gps(gps: &GpsData, report: &mut ValidationReport) {
    if report.check_finite("location.latitude", gps.latitude)
        && !(-90.0..=90.0).contains(&gps.latitude)
    {
        report.error(
            "location.latitude",
            format!("Latitude must be between -90 and 90, got {}", gps.latitude),
        );
    }
    if report.check_finite("location.longitude", gps.longitude)
        && !(-180.0..=180.0).contains(&gps.longitude)
    {
        report.error(
            "location.longitude",
            format!("Longitude must be between -180 and 180, got {}", gps.longitude),
        );
    }

    if let Some(accuracy) = gps.accuracy {
        if accuracy < 0.0 {
            report.error(
                "location.accuracy",
                format!("GPS accuracy cannot be negative, got {}", accuracy),
            );
        } else if accuracy > 100.0 {
            report.warn(
                "location.accuracy",
                "GPS accuracy is poor (>100m)",
                "Check GPS antenna and satellite visibility",
            );
        }
    }

    if let Some(satellites) = gps.satellites {
        if satellites < 4 {
            report.warn(
                "location.satellites",
                "Low satellite count for reliable positioning",
                "Check GPS antenna position and clear sky view",
            );
        }
    }

    if report.check_finite("location.speed", gps.speed) {
        if gps.speed < 0.0 {
            report.error(
                "location.speed",
                format!("Speed cannot be negative, got {}", gps.speed),
            );
        } else if gps.speed > 100.0 {
            report.warn(
                "location.speed",
                "Very high speed detected",
                "Verify speed sensor calibration",
            );
        }
    }

    if report.check_finite("location.heading", gps.heading)
        && !(0.0..360.0).contains(&gps.heading)
    {
        report.error(
            "location.heading",
            format!("Heading must be in [0, 360), got {}", gps.heading),
        );
    }
}

fn validate_engine(engine: &EngineData, report: &mut ValidationReport) {
    if report.check_finite("engine.rpm", engine.rpm) {
        if engine.rpm < 0.0 {
            report.error("engine.rpm", format!("RPM cannot be negative, got {}", engine.rpm));
        } else if engine.rpm > 5000.0 {
            report.warn(
                "engine.rpm",
                "Very high RPM detected",
                "Check engine operation and load conditions",
            );
        }
    }

    if let Some(temp) = engine.coolant_temperature {
        if temp > 110.0 {
            report.warn(
                "engine.coolantTemperature",
                "High coolant temperature detected",
                "Check cooling system and engine load",
            );
        } else if temp < -40.0 {
            report.warn(
                "engine.coolantTemperature",
                "Very low coolant temperature",
                "Check temperature sensor functionality",
            );
        }
    }

    if let Some(load) = engine.load_percentage {
        if !(0.0..=100.0).contains(&load) {
            report.error(
                "engine.loadPercentage",
                format!("Load percentage must be between 0 and 100, got {}", load),
            );
        }
    }

    if let Some(hours) = engine.engine_hours {
        if hours < 0.0 {
            report.error(
                "engine.engineHours",
                format!("Engine hours cannot be negative, got {}", hours),
            );
        }
    }

    if let Some(rate) = engine.fuel_rate {
        if rate < 0.0 {
            report.error(
                "engine.fuelRate",
                format!("Fuel rate cannot be negative, got {}", rate),
            );
        }
    }
}

fn validate_fuel(fuel: &FuelData, report: &mut ValidationReport) {
    if report.check_finite("fuel.level", fuel.level) && fuel.level < 0.0 {
        report.error("fuel.level", format!("Fuel level cannot be negative, got {}", fuel.level));
    }

    if let Some(pct) = fuel.percentage {
        if !(0.0..=100.0).contains(&pct) {
            report.error(
                "fuel.percentage",
                format!("Fuel percentage must be between 0 and 100, got {}", pct),
            );
        } else if pct < 10.0 {
            report.warn("fuel.percentage", "Low fuel level detected", "Schedule refueling soon");
        }
    }

    if let Some(consumption) = fuel.consumption {
        if consumption < 0.0 {
            report.error(
                "fuel.consumption",
                format!("Fuel consumption cannot be negative, got {}", consumption),
            );
        } else if consumption > 100.0 {
            report.warn(
                "fuel.consumption",
                "Very high fuel consumption detected",
                "Check engine efficiency and operating conditions",
            );
        }
    }
}

fn validate_cross_fields(record: &TelemetryRecord, report: &mut ValidationReport) {
    let engine_off = record.engine.as_ref().map(|e| !e.is_running).unwrap_or(false);

    if engine_off && record.movement.as_ref().map(|m| m.is_moving).unwrap_or(false) {
        report.warn(
            "movement.isMoving",
            "Vehicle appears to be moving with engine off",
            "Check GPS and engine sensors for accuracy",
        );
    }

    if let (Some(engine), Some(movement)) = (&record.engine, &record.movement) {
        if engine.rpm > 2000.0 && movement.speed < 1.0 {
            report.warn(
                "engine.rpm",
                "High RPM with low speed may indicate slipping or implement load",
                "Check transmission and implement operation",
            );
        }
    }

    let consuming = record
        .fuel
        .as_ref()
        .and_then(|f| f.consumption)
        .map(|c| c > 0.0)
        .unwrap_or(false);
    if engine_off && consuming {
        report.warn(
            "fuel.consumption",
            "Fuel consumption detected with engine off",
            "Check fuel sensor calibration",
        );
    }
}

/// Checks one vehicle's ordered stream: ownership, record validity and timestamp order.
///
/// Returns the warnings of every record on success.
pub fn validate_stream(vehicle_id: &str, records: &[TelemetryRecord]) -> Result<Vec<ValidationWarning>> {
    let mut warnings = Vec::new();

    for (index, record) in records.iter().enumerate() {
        if record.vehicle_id != vehicle_id {
            return Err(TelemetryError::VehicleMismatch {
                expected: vehicle_id.to_string(),
                found: record.vehicle_id.clone(),
            });
        }
        if index > 0 {
            let previous = records[index - 1].timestamp;
            if record.timestamp < previous {
                return Err(TelemetryError::NonMonotonicTimestamp {
                    vehicle_id: vehicle_id.to_string(),
                    index,
                    previous,
                    timestamp: record.timestamp,
                });
            }
        }
        warnings.extend(validate_record(record).into_result()?);
    }

    Ok(warnings)
}
