use chrono::Duration;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::path::{Location, PathPoint, PointEvent, PointMetadata};
use crate::models::query::{Resolution, TimeRange};
use crate::models::telemetry::{EventType, TelemetryRecord};
use crate::validation::{self, ValidationWarning};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedStream {
    pub points: Vec<PathPoint>,
    pub warnings: Vec<ValidationWarning>,
}

/// Turns one vehicle's raw records into ordered path points.
///
/// Records outside `range` are dropped, the rest validated as a stream and
/// thinned to the resolution's sampling interval.
pub fn normalize(
    vehicle_id: &str,
    records: &[TelemetryRecord],
    range: &TimeRange,
    resolution: Resolution,
) -> Result<NormalizedStream> {
    let in_range: Vec<TelemetryRecord> = records
        .iter()
        .filter(|r| range.contains(r.timestamp))
        .cloned()
        .collect();

    let warnings = validation::validate_stream(vehicle_id, &in_range)?;
    for w in &warnings {
        warn!("Vehicle {}: {} ({})", vehicle_id, w.message, w.field);
    }

    let sampled = sample_by_interval(&in_range, resolution.interval());
    debug!(
        "Vehicle {}: {} records in range, {} kept at {:?} resolution",
        vehicle_id,
        in_range.len(),
        sampled.len(),
        resolution
    );

    Ok(NormalizedStream {
        points: sampled.into_iter().map(to_path_point).collect(),
        warnings,
    })
}

/// Keeps the first record, then each record at least `interval` after the last kept one.
pub fn sample_by_interval(records: &[TelemetryRecord], interval: Duration) -> Vec<&TelemetryRecord> {
    let mut kept: Vec<&TelemetryRecord> = Vec::with_capacity(records.len());
    for record in records {
        match kept.last() {
            Some(last) if record.timestamp - last.timestamp < interval => {}
            _ => kept.push(record),
        }
    }
    kept
}

pub fn telemetry_to_path_points(records: &[TelemetryRecord]) -> Vec<PathPoint> {
    records.iter().map(to_path_point).collect()
}

fn to_path_point(record: &TelemetryRecord) -> PathPoint {
    let gps = &record.location;
    PathPoint {
        id: format!("{}_{}", record.vehicle_id, record.timestamp.timestamp_millis()),
        vehicle_id: record.vehicle_id.clone(),
        timestamp: record.timestamp,
        location: Location {
            latitude: gps.latitude,
            longitude: gps.longitude,
            altitude: gps.altitude,
            accuracy: gps.accuracy,
        },
        speed: gps.speed,
        heading: gps.heading,
        accuracy: gps.accuracy.unwrap_or(0.0),
        event_type: point_event(record),
        metadata: PointMetadata {
            engine_running: record.engine.as_ref().map(|e| e.is_running),
            is_working: record.implement.as_ref().map(|i| i.is_active),
            task_id: record.task_id.clone(),
            operator_id: record.operator_id.clone(),
        },
    }
}

fn point_event(record: &TelemetryRecord) -> Option<PointEvent> {
    record.events.iter().find_map(|e| match e.event_type {
        EventType::EngineStart | EventType::TaskStarted => Some(PointEvent::Start),
        EventType::EngineStop | EventType::TaskCompleted => Some(PointEvent::Stop),
        EventType::TaskPaused => Some(PointEvent::Pause),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TelemetryError;
    use crate::models::telemetry::{GpsData, ImplementData, Severity, TelemetryEvent};
    use assert_matches::assert_matches;
    use chrono::{DateTime, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    fn record_at(secs: i64) -> TelemetryRecord {
        TelemetryRecord {
            vehicle_id: "v1".to_string(),
            operator_id: Some("op-1".to_string()),
            task_id: Some("task-9".to_string()),
            timestamp: t0() + Duration::seconds(secs),
            location: GpsData {
                latitude: 50.0,
                longitude: 30.0 + secs as f64 * 1e-5,
                altitude: Some(120.0),
                accuracy: Some(2.5),
                satellites: Some(12),
                hdop: None,
                speed: 8.0,
                heading: 90.0,
            },
            movement: None,
            engine: None,
            fuel: None,
            implement: Some(ImplementData {
                is_active: true,
                width: None,
            }),
            events: Vec::new(),
            quality: None,
            in_maintenance: false,
        }
    }

    fn full_range() -> TimeRange {
        TimeRange::new(t0(), t0() + Duration::days(1)).unwrap()
    }

    #[test]
    fn test_point_carries_record_fields() {
        let mut r = record_at(0);
        r.events.push(TelemetryEvent {
            event_type: EventType::EngineStart,
            timestamp: r.timestamp,
            severity: Severity::Info,
            description: String::new(),
            acknowledged: false,
        });
        let points = telemetry_to_path_points(&[r]);
        let p = &points[0];
        assert_eq!(p.id, format!("v1_{}", t0().timestamp_millis()));
        assert_eq!(p.location.altitude, Some(120.0));
        assert_eq!(p.accuracy, 2.5);
        assert_eq!(p.event_type, Some(PointEvent::Start));
        assert_eq!(p.metadata.is_working, Some(true));
        assert_eq!(p.metadata.task_id.as_deref(), Some("task-9"));
        assert_eq!(p.metadata.engine_running, None);
    }

    #[test]
    fn test_sampling_interval_thins_dense_stream() {
        let records: Vec<_> = (0..=120).step_by(10).map(record_at).collect();
        let kept = sample_by_interval(&records, Resolution::Medium.interval());
        let offsets: Vec<i64> = kept.iter().map(|r| (r.timestamp - t0()).num_seconds()).collect();
        assert_eq!(offsets, vec![0, 60, 120]);

        let kept = sample_by_interval(&records, Resolution::High.interval());
        assert_eq!(kept.len(), records.len());
    }

    #[test]
    fn test_normalize_filters_range() {
        let records: Vec<_> = (0..10).map(|i| record_at(i * 60)).collect();
        let range = TimeRange::new(t0() + Duration::seconds(120), t0() + Duration::seconds(300)).unwrap();
        let stream = normalize("v1", &records, &range, Resolution::High).unwrap();
        assert_eq!(stream.points.len(), 3);
        assert_eq!(stream.points[0].timestamp, t0() + Duration::seconds(120));
    }

    #[test]
    fn test_normalize_rejects_invalid_stream() {
        let mut records: Vec<_> = (0..3).map(|i| record_at(i * 60)).collect();
        records[1].location.latitude = 95.0;
        assert_matches!(
            normalize("v1", &records, &full_range(), Resolution::Medium),
            Err(TelemetryError::InvalidInput { .. })
        );
    }

    #[test]
    fn test_normalize_empty_is_ok() {
        let stream = normalize("v1", &[], &full_range(), Resolution::Low).unwrap();
        assert!(stream.points.is_empty());
    }
}
