//! Period rollups of one vehicle's records and segments.
//!
//! Everything here is a pure function of its arguments. Records are expected
//! to be time ordered (the normalizer's stream validation guarantees it).
//! Interval-based metrics attribute each interval to the earlier record.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::geo;
use crate::models::aggregation::{
    AggregatedMetrics, AggregatedTelemetry, AlertImpact, AlertStatus, AlertSummary,
    DistanceMetrics, EfficiencyMetrics, EngineMetrics, EventSummary, EventTypeSummary,
    FieldBoundary, FuelMetrics, ImpactCategory, LoadBucket, LocationMetrics, SeverityDistribution,
    SpeedBucket, TemperatureStats, TimePeriod, Trend, Urgency, UtilizationMetrics,
};
use crate::models::path::{Location, PathPoint, PathSegment, SegmentType};
use crate::models::query::TimeRange;
use crate::models::telemetry::{EventType, Severity, TelemetryEvent, TelemetryRecord};

/// Upper bounds of the speed histogram, km/h. The last bucket is open ended.
const SPEED_BUCKETS: [f64; 4] = [5.0, 10.0, 20.0, 40.0];
const LOAD_BUCKETS: [(f64, f64); 4] = [(0.0, 25.0), (25.0, 50.0), (50.0, 75.0), (75.0, 100.0)];
const OVERHEAT_CELSIUS: f64 = 105.0;
const REFUEL_MIN_LITERS: f64 = 5.0;
const IDLE_SPEED_KMH: f64 = 1.0;

pub fn aggregate(
    vehicle_id: &str,
    period: &TimePeriod,
    records: &[TelemetryRecord],
    segments: &[PathSegment],
    fields: &[FieldBoundary],
) -> AggregatedTelemetry {
    let records: Vec<&TelemetryRecord> = records
        .iter()
        .filter(|r| r.vehicle_id == vehicle_id && period.range.contains(r.timestamp))
        .collect();
    let events: Vec<&TelemetryEvent> = records.iter().copied().flat_map(|r| r.events.iter()).collect();

    let distance = distance_metrics(segments);
    let engine = engine_metrics(&records, &events);
    let fuel = fuel_metrics(&records, distance.total, engine.total_runtime);
    let utilization = utilization_metrics(segments, &records, period);
    let efficiency = efficiency_metrics(&records, &fuel, &utilization);
    let location = location_metrics(&records, segments, fields, &events);

    AggregatedTelemetry {
        vehicle_id: vehicle_id.to_string(),
        period: period.clone(),
        start_time: period.range.start,
        end_time: period.range.end,
        record_count: records.len(),
        metrics: AggregatedMetrics {
            distance,
            fuel,
            engine,
            efficiency,
            utilization,
            location,
        },
        events: event_summary(&events, &period.range),
        alerts: alert_summaries(vehicle_id, period, &events),
    }
}

fn hours_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    (b - a).num_milliseconds() as f64 / 3_600_000.0
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

fn distance_metrics(segments: &[PathSegment]) -> DistanceMetrics {
    let total_m: f64 = segments.iter().map(|s| s.distance).sum();
    let working_m: f64 = segments
        .iter()
        .filter(|s| s.segment_type == SegmentType::Working)
        .map(|s| s.distance)
        .sum();
    let total_hours: f64 = segments.iter().map(|s| s.duration_hours()).sum();
    let max_speed = segments.iter().map(|s| s.max_speed).fold(0.0, f64::max);

    let mut minutes = [0.0; SPEED_BUCKETS.len() + 1];
    let mut kms = [0.0; SPEED_BUCKETS.len() + 1];
    for pair in segments.iter().flat_map(|s| s.points.windows(2)) {
        let idx = SPEED_BUCKETS
            .iter()
            .position(|upper| pair[0].speed < *upper)
            .unwrap_or(SPEED_BUCKETS.len());
        minutes[idx] += hours_between(pair[0].timestamp, pair[1].timestamp) * 60.0;
        kms[idx] += geo::distance(&pair[0], &pair[1]) / 1000.0;
    }
    let total_minutes: f64 = minutes.iter().sum();

    let speed_distribution = (0..minutes.len())
        .map(|i| SpeedBucket {
            min_speed: if i == 0 { 0.0 } else { SPEED_BUCKETS[i - 1] },
            max_speed: SPEED_BUCKETS.get(i).copied(),
            duration: minutes[i],
            distance: kms[i],
            percentage: percent(minutes[i], total_minutes),
        })
        .collect();

    let total = total_m / 1000.0;
    let working = working_m / 1000.0;
    DistanceMetrics {
        total,
        working,
        transport: total - working,
        average_speed: if total_hours > 0.0 { total / total_hours } else { 0.0 },
        max_speed,
        speed_distribution,
    }
}

fn fuel_metrics(records: &[&TelemetryRecord], total_km: f64, runtime_hours: f64) -> FuelMetrics {
    let mut total_consumed = 0.0;
    let mut idle_fuel_waste = 0.0;
    let mut refuel_events = 0;

    for pair in records.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if let Some(rate) = prev.fuel_rate() {
            let liters = rate * hours_between(prev.timestamp, curr.timestamp);
            total_consumed += liters;
            if prev.engine_running() && prev.location.speed <= IDLE_SPEED_KMH {
                idle_fuel_waste += liters;
            }
        }
        if let (Some(a), Some(b)) = (&prev.fuel, &curr.fuel) {
            if b.level - a.level >= REFUEL_MIN_LITERS {
                refuel_events += 1;
            }
        }
    }

    FuelMetrics {
        total_consumed,
        average_consumption: if runtime_hours > 0.0 {
            total_consumed / runtime_hours
        } else {
            0.0
        },
        efficiency: if total_km > 0.0 { total_consumed / total_km } else { 0.0 },
        idle_fuel_waste,
        refuel_events,
    }
}

fn engine_metrics(records: &[&TelemetryRecord], events: &[&TelemetryEvent]) -> EngineMetrics {
    let mut total_runtime = 0.0;
    let mut load_minutes = [0.0; LOAD_BUCKETS.len()];

    for pair in records.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        let hours = hours_between(prev.timestamp, curr.timestamp);
        if prev.engine_running() {
            total_runtime += hours;
        }
        if let Some(load) = prev.engine.as_ref().and_then(|e| e.load_percentage) {
            let idx = LOAD_BUCKETS
                .iter()
                .position(|(_, upper)| load < *upper)
                .unwrap_or(LOAD_BUCKETS.len() - 1);
            load_minutes[idx] += hours * 60.0;
        }
    }
    let total_load_minutes: f64 = load_minutes.iter().sum();

    let rpms: Vec<f64> = records
        .iter()
        .filter_map(|r| r.engine.as_ref().filter(|e| e.is_running).map(|e| e.rpm))
        .collect();
    let average_rpm = if rpms.is_empty() {
        0.0
    } else {
        rpms.iter().sum::<f64>() / rpms.len() as f64
    };
    let max_rpm = rpms.iter().copied().fold(0.0, f64::max);

    let temps: Vec<f64> = records
        .iter()
        .filter_map(|r| r.engine.as_ref().and_then(|e| e.coolant_temperature))
        .collect();

    EngineMetrics {
        total_runtime,
        average_rpm,
        max_rpm,
        load_distribution: LOAD_BUCKETS
            .iter()
            .zip(load_minutes)
            .map(|((min_load, max_load), minutes)| LoadBucket {
                min_load: *min_load,
                max_load: *max_load,
                duration: minutes,
                percentage: percent(minutes, total_load_minutes),
            })
            .collect(),
        temperature_stats: temperature_stats(&temps),
        maintenance_alerts: events
            .iter()
            .filter(|e| e.event_type == EventType::MaintenanceDue)
            .count() as u32,
    }
}

fn temperature_stats(temps: &[f64]) -> TemperatureStats {
    if temps.is_empty() {
        return TemperatureStats::default();
    }
    let mut overheating_events = 0;
    let mut hot = false;
    for &t in temps {
        let now_hot = t > OVERHEAT_CELSIUS;
        if now_hot && !hot {
            overheating_events += 1;
        }
        hot = now_hot;
    }
    TemperatureStats {
        average: temps.iter().sum::<f64>() / temps.len() as f64,
        min: temps.iter().copied().fold(f64::INFINITY, f64::min),
        max: temps.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        overheating_events,
    }
}

fn utilization_metrics(
    segments: &[PathSegment],
    records: &[&TelemetryRecord],
    period: &TimePeriod,
) -> UtilizationMetrics {
    let hours_of = |kind: SegmentType| -> f64 {
        segments
            .iter()
            .filter(|s| s.segment_type == kind)
            .map(|s| s.duration_hours())
            .sum()
    };
    let working_time = hours_of(SegmentType::Working);
    let idle_time = hours_of(SegmentType::Idle);
    let transport_time = hours_of(SegmentType::Transport);
    let maintenance_time: f64 = records
        .windows(2)
        .filter(|pair| pair[0].in_maintenance)
        .map(|pair| hours_between(pair[0].timestamp, pair[1].timestamp))
        .sum();

    let period_hours = period.hours();
    UtilizationMetrics {
        working_time,
        idle_time,
        transport_time,
        maintenance_time,
        utilization_rate: geo::utilization(
            working_time,
            working_time + idle_time + transport_time + maintenance_time,
        ),
        availability_rate: percent((period_hours - maintenance_time).max(0.0), period_hours),
    }
}

fn efficiency_metrics(
    records: &[&TelemetryRecord],
    fuel: &FuelMetrics,
    utilization: &UtilizationMetrics,
) -> EfficiencyMetrics {
    let fuel_efficiency_score = if fuel.total_consumed > 0.0 {
        (100.0 * (1.0 - fuel.idle_fuel_waste / fuel.total_consumed)).clamp(0.0, 100.0)
    } else {
        100.0
    };
    let scores: Vec<f64> = records
        .iter()
        .filter_map(|r| r.quality.as_ref().map(|q| q.score))
        .collect();
    let work_quality_score = if scores.is_empty() {
        100.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };
    let productivity_score = utilization.utilization_rate;

    EfficiencyMetrics {
        productivity_score,
        fuel_efficiency_score,
        work_quality_score,
        overall_score: geo::efficiency_score(
            fuel_efficiency_score,
            productivity_score,
            work_quality_score,
        ),
    }
}

fn location_metrics(
    records: &[&TelemetryRecord],
    segments: &[PathSegment],
    fields: &[FieldBoundary],
    events: &[&TelemetryEvent],
) -> LocationMetrics {
    let locations: Vec<Location> = if segments.is_empty() {
        records
            .iter()
            .map(|r| Location::new(r.location.latitude, r.location.longitude))
            .collect()
    } else {
        let mut points: Vec<&PathPoint> = segments.iter().flat_map(|s| s.points.iter()).collect();
        // neighbouring segments share their boundary point
        points.dedup_by(|a, b| a.id == b.id);
        points.into_iter().map(|p| p.location.clone()).collect()
    };

    let center_point = geo::center_of(&locations).ok();
    let working_radius = center_point
        .as_ref()
        .map(|c| {
            locations
                .iter()
                .map(|l| geo::distance(c, l) / 1000.0)
                .fold(0.0, f64::max)
        })
        .unwrap_or(0.0);

    let fields_visited = fields
        .iter()
        .filter(|f| locations.iter().any(|l| geo::point_in_polygon(l, &f.boundary)))
        .map(|f| f.id.clone())
        .collect();

    let total_m: f64 = segments.iter().map(|s| s.distance).sum();
    let route_efficiency = match (
        segments.first().and_then(|s| s.points.first()),
        segments.last().and_then(|s| s.points.last()),
    ) {
        (Some(first), Some(last)) if total_m > 0.0 => {
            percent(geo::distance(first, last), total_m).min(100.0)
        }
        _ => 0.0,
    };

    LocationMetrics {
        fields_visited,
        geofence_violations: events
            .iter()
            .filter(|e| e.event_type == EventType::GeofenceExit)
            .count() as u32,
        center_point,
        working_radius,
        route_efficiency,
    }
}

/// Compares occurrence counts in the two halves of `range`.
pub fn trend<I>(timestamps: I, range: &TimeRange) -> Trend
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let (earlier, later) = range.halves();
    let (mut before, mut after) = (0usize, 0usize);
    for t in timestamps {
        if earlier.contains(t) {
            before += 1;
        } else if later.contains(t) {
            after += 1;
        }
    }
    match after.cmp(&before) {
        std::cmp::Ordering::Greater => Trend::Increasing,
        std::cmp::Ordering::Less => Trend::Decreasing,
        std::cmp::Ordering::Equal => Trend::Stable,
    }
}

fn first_last(events: &[&TelemetryEvent]) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = events.iter().map(|e| e.timestamp).min();
    let last = events.iter().map(|e| e.timestamp).max();
    // callers only pass non-empty groups
    (first.unwrap_or_default(), last.unwrap_or_default())
}

fn event_summary(events: &[&TelemetryEvent], range: &TimeRange) -> EventSummary {
    let mut by_type: BTreeMap<EventType, Vec<&TelemetryEvent>> = BTreeMap::new();
    let mut severity_distribution = SeverityDistribution::default();
    for &e in events {
        by_type.entry(e.event_type).or_default().push(e);
        severity_distribution.record(e.severity);
    }

    let events_by_type = by_type
        .into_iter()
        .map(|(event_type, group)| {
            let (first_occurrence, last_occurrence) = first_last(&group);
            EventTypeSummary {
                event_type: event_type.as_str().to_string(),
                count: group.len(),
                severity: group.iter().map(|e| e.severity).max().unwrap_or(Severity::Info),
                first_occurrence,
                last_occurrence,
                trend: trend(group.iter().map(|e| e.timestamp), range),
            }
        })
        .collect();

    let acknowledged_count = events.iter().filter(|e| e.acknowledged).count();
    EventSummary {
        total_events: events.len(),
        events_by_type,
        severity_distribution,
        acknowledged_count,
        unresolved_count: events.len() - acknowledged_count,
    }
}

fn alert_summaries(vehicle_id: &str, period: &TimePeriod, events: &[&TelemetryEvent]) -> Vec<AlertSummary> {
    let mut groups: BTreeMap<(Reverse<Severity>, EventType), Vec<&TelemetryEvent>> = BTreeMap::new();
    for e in events.iter().copied().filter(|e| e.severity >= Severity::Warning) {
        groups.entry((Reverse(e.severity), e.event_type)).or_default().push(e);
    }

    groups
        .into_iter()
        .map(|((Reverse(severity), event_type), group)| {
            let (first_triggered, last_triggered) = first_last(&group);
            let latest = group.iter().max_by_key(|e| e.timestamp);
            let message = match latest {
                Some(e) if !e.description.is_empty() => e.description.clone(),
                _ => format!("{} ({} occurrences)", event_type.as_str(), group.len()),
            };
            let key = format!(
                "{}:{}:{}:{:?}",
                vehicle_id,
                period.label,
                event_type.as_str(),
                severity
            );

            AlertSummary {
                id: Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()),
                alert_type: event_type.as_str().to_string(),
                message,
                severity,
                first_triggered,
                last_triggered,
                occurrence_count: group.len(),
                status: if group.iter().all(|e| e.acknowledged) {
                    AlertStatus::Acknowledged
                } else {
                    AlertStatus::Active
                },
                impact: impact_of(event_type, severity),
                trend: trend(group.iter().map(|e| e.timestamp), &period.range),
            }
        })
        .collect()
}

fn impact_of(event_type: EventType, severity: Severity) -> AlertImpact {
    let category = match event_type {
        EventType::AccidentDetected
        | EventType::EmergencyButton
        | EventType::SpeedLimitExceeded => ImpactCategory::Safety,
        EventType::FuelTheftDetected | EventType::LowFuelWarning | EventType::MaintenanceDue => {
            ImpactCategory::Cost
        }
        EventType::GeofenceEntry
        | EventType::GeofenceExit
        | EventType::UnauthorizedUse
        | EventType::DriverAuthenticated
        | EventType::DriverLoggedOut => ImpactCategory::Compliance,
        _ => ImpactCategory::Efficiency,
    };
    let urgency = match severity {
        Severity::Info => Urgency::Low,
        Severity::Warning => Urgency::Medium,
        Severity::Error => Urgency::High,
        Severity::Critical => Urgency::Critical,
    };
    let recommended_action = match category {
        ImpactCategory::Safety => "Contact the operator and inspect the vehicle",
        ImpactCategory::Cost => "Review fuel and maintenance records",
        ImpactCategory::Compliance => "Verify authorization and assigned boundaries",
        ImpactCategory::Efficiency => "Check equipment and sensor health",
    };
    AlertImpact {
        category,
        urgency,
        recommended_action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::aggregation::PeriodKind;
    use crate::models::path::{PathPoint, PointMetadata};
    use crate::models::telemetry::{DataQuality, EngineData, FuelData, GpsData};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 3, 0, 0, 0).unwrap()
    }

    fn day() -> TimePeriod {
        TimePeriod::starting_at(PeriodKind::Day, t0())
    }

    fn record(minutes: i64, speed: f64) -> TelemetryRecord {
        TelemetryRecord {
            vehicle_id: "v1".to_string(),
            operator_id: None,
            task_id: None,
            timestamp: t0() + Duration::minutes(minutes),
            location: GpsData {
                latitude: 49.0,
                longitude: 8.0,
                altitude: None,
                accuracy: None,
                satellites: None,
                hdop: None,
                speed,
                heading: 0.0,
            },
            movement: None,
            engine: Some(EngineData {
                is_running: true,
                rpm: 1500.0,
                load_percentage: Some(40.0),
                coolant_temperature: Some(90.0),
                engine_hours: None,
                fuel_rate: Some(12.0),
            }),
            fuel: None,
            implement: None,
            events: Vec::new(),
            quality: None,
            in_maintenance: false,
        }
    }

    fn event(minutes: i64, event_type: EventType, severity: Severity) -> TelemetryEvent {
        TelemetryEvent {
            event_type,
            timestamp: t0() + Duration::minutes(minutes),
            severity,
            description: String::new(),
            acknowledged: false,
        }
    }

    fn segment(start_min: i64, minutes: i64, km: f64, kind: SegmentType) -> PathSegment {
        let start = t0() + Duration::minutes(start_min);
        let end = start + Duration::minutes(minutes);
        let mk = |t: DateTime<Utc>, lon: f64| PathPoint {
            id: format!("v1_{}", t.timestamp_millis()),
            vehicle_id: "v1".to_string(),
            timestamp: t,
            location: Location::new(49.0, lon),
            speed: 12.0,
            heading: 90.0,
            accuracy: 0.0,
            event_type: None,
            metadata: PointMetadata::default(),
        };
        PathSegment {
            id: format!("segment_v1_{}", start.timestamp_millis()),
            vehicle_id: "v1".to_string(),
            start_time: start,
            end_time: end,
            points: vec![mk(start, 8.0), mk(end, 8.01)],
            distance: km * 1000.0,
            duration: (minutes * 60) as f64,
            average_speed: km / (minutes as f64 / 60.0),
            max_speed: 12.0,
            segment_type: kind,
        }
    }

    #[test]
    fn test_distance_split_by_segment_type() {
        let segments = vec![
            segment(0, 60, 8.0, SegmentType::Transport),
            segment(60, 120, 10.0, SegmentType::Working),
            segment(180, 60, 0.0, SegmentType::Idle),
        ];
        let agg = aggregate("v1", &day(), &[], &segments, &[]);
        let d = &agg.metrics.distance;
        assert!((d.total - 18.0).abs() < 1e-9);
        assert!((d.working - 10.0).abs() < 1e-9);
        assert!((d.transport - 8.0).abs() < 1e-9);
        assert!((d.average_speed - 4.5).abs() < 1e-9);
        assert_eq!(d.speed_distribution.len(), 5);
        // all pairs sampled at 12 km/h
        assert!((d.speed_distribution[2].percentage - 100.0).abs() < 1e-9);
        assert_eq!(d.speed_distribution[4].max_speed, None);

        let u = &agg.metrics.utilization;
        assert!((u.working_time - 2.0).abs() < 1e-9);
        assert!((u.utilization_rate - 50.0).abs() < 1e-9);
        assert_eq!(u.availability_rate, 100.0);
    }

    #[test]
    fn test_fuel_and_engine_integration() {
        let mut records: Vec<_> = (0..=4).map(|i| record(i * 30, 10.0)).collect();
        // idle for the second half hour
        records[1].location.speed = 0.0;
        records[3].engine.as_mut().unwrap().coolant_temperature = Some(108.0);
        records[3].fuel = Some(FuelData { level: 40.0, percentage: None, consumption: None });
        records[4].fuel = Some(FuelData { level: 90.0, percentage: None, consumption: None });
        records[4].engine.as_mut().unwrap().rpm = 2100.0;

        let segments = vec![segment(0, 120, 24.0, SegmentType::Transport)];
        let agg = aggregate("v1", &day(), &records, &segments, &[]);

        let fuel = &agg.metrics.fuel;
        assert!((fuel.total_consumed - 24.0).abs() < 1e-9);
        assert!((fuel.idle_fuel_waste - 6.0).abs() < 1e-9);
        assert!((fuel.average_consumption - 12.0).abs() < 1e-9);
        assert!((fuel.efficiency - 1.0).abs() < 1e-9);
        assert_eq!(fuel.refuel_events, 1);

        let engine = &agg.metrics.engine;
        assert!((engine.total_runtime - 2.0).abs() < 1e-9);
        assert_eq!(engine.max_rpm, 2100.0);
        assert!((engine.average_rpm - 1620.0).abs() < 1e-9);
        assert_eq!(engine.temperature_stats.overheating_events, 1);
        assert_eq!(engine.temperature_stats.max, 108.0);
        assert!((engine.load_distribution[1].percentage - 100.0).abs() < 1e-9);

        let eff = &agg.metrics.efficiency;
        assert!((eff.fuel_efficiency_score - 75.0).abs() < 1e-9);
        assert_eq!(eff.work_quality_score, 100.0);
        // transport only, so no productive time
        assert_eq!(eff.productivity_score, 0.0);
        assert!((eff.overall_score - (0.4 * 75.0 + 0.2 * 100.0)).abs() < 1e-9);
        assert_eq!(agg.record_count, 5);
    }

    #[test]
    fn test_maintenance_reduces_availability() {
        let mut records: Vec<_> = (0..3).map(|i| record(i * 360, 0.0)).collect();
        records[0].in_maintenance = true;
        records[1].quality = Some(DataQuality { score: 40.0 });
        let agg = aggregate("v1", &day(), &records, &[], &[]);
        let u = &agg.metrics.utilization;
        assert!((u.maintenance_time - 6.0).abs() < 1e-9);
        assert!((u.availability_rate - 75.0).abs() < 1e-9);
        assert_eq!(u.utilization_rate, 0.0);
        assert_eq!(agg.metrics.efficiency.work_quality_score, 40.0);
    }

    #[test]
    fn test_records_outside_period_are_ignored() {
        let records = vec![record(-30, 5.0), record(30, 5.0), record(25 * 60, 5.0)];
        let agg = aggregate("v1", &day(), &records, &[], &[]);
        assert_eq!(agg.record_count, 1);
        assert_eq!(agg.start_time, t0());
        assert_eq!(agg.end_time, t0() + Duration::days(1));
    }

    #[test]
    fn test_location_metrics() {
        let segments = vec![segment(0, 60, 0.727, SegmentType::Transport)];
        let fields = vec![
            FieldBoundary {
                id: "north-40".to_string(),
                boundary: vec![
                    Location::new(48.9, 7.9),
                    Location::new(48.9, 8.1),
                    Location::new(49.1, 8.1),
                    Location::new(49.1, 7.9),
                ],
            },
            FieldBoundary {
                id: "far".to_string(),
                boundary: vec![
                    Location::new(10.0, 10.0),
                    Location::new(10.0, 11.0),
                    Location::new(11.0, 11.0),
                ],
            },
        ];
        let mut r = record(10, 5.0);
        r.events.push(event(10, EventType::GeofenceExit, Severity::Warning));

        let agg = aggregate("v1", &day(), &[r], &segments, &fields);
        let loc = &agg.metrics.location;
        assert_eq!(loc.fields_visited, vec!["north-40".to_string()]);
        assert_eq!(loc.geofence_violations, 1);
        let center = loc.center_point.as_ref().unwrap();
        assert!((center.longitude - 8.005).abs() < 1e-9);
        assert!(loc.working_radius > 0.3 && loc.working_radius < 0.4);
        assert!(loc.route_efficiency > 99.0 && loc.route_efficiency <= 100.0);
    }

    #[test]
    fn test_shared_boundary_point_counted_once() {
        let first = segment(0, 60, 0.7, SegmentType::Working);
        let mut second = segment(60, 60, 2.2, SegmentType::Transport);
        second.points[0] = first.points[1].clone();
        second.points[1].location = Location::new(49.0, 8.04);

        let agg = aggregate("v1", &day(), &[], &[first, second], &[]);
        let center = agg.metrics.location.center_point.unwrap();
        assert!((center.longitude - (8.0 + 8.01 + 8.04) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_trend_compares_halves() {
        let range = day().range;
        let early = t0() + Duration::hours(1);
        let late = t0() + Duration::hours(20);
        assert_eq!(trend(vec![early, late, late], &range), Trend::Increasing);
        assert_eq!(trend(vec![early, early, late], &range), Trend::Decreasing);
        assert_eq!(trend(vec![early, late], &range), Trend::Stable);
        assert_eq!(trend(Vec::new(), &range), Trend::Stable);
    }

    #[test]
    fn test_events_and_alerts() {
        let mut r1 = record(60, 5.0);
        r1.events = vec![
            event(60, EventType::SpeedLimitExceeded, Severity::Warning),
            event(61, EventType::EngineStart, Severity::Info),
        ];
        let mut r2 = record(20 * 60, 5.0);
        let mut acked = event(20 * 60, EventType::SpeedLimitExceeded, Severity::Warning);
        acked.acknowledged = true;
        let mut crash = event(20 * 60 + 1, EventType::AccidentDetected, Severity::Critical);
        crash.description = "Impact sensor triggered".to_string();
        r2.events = vec![
            acked,
            crash,
            event(20 * 60 + 2, EventType::SpeedLimitExceeded, Severity::Warning),
        ];

        let agg = aggregate("v1", &day(), &[r1, r2], &[], &[]);

        let ev = &agg.events;
        assert_eq!(ev.total_events, 5);
        assert_eq!(ev.acknowledged_count, 1);
        assert_eq!(ev.unresolved_count, 4);
        assert_eq!(ev.severity_distribution.warning, 3);
        assert_eq!(ev.severity_distribution.critical, 1);
        let speeding = ev
            .events_by_type
            .iter()
            .find(|s| s.event_type == "speed_limit_exceeded")
            .unwrap();
        assert_eq!(speeding.count, 3);
        assert_eq!(speeding.trend, Trend::Increasing);
        assert_eq!(speeding.first_occurrence, t0() + Duration::minutes(60));

        assert_eq!(agg.alerts.len(), 2);
        let crash = &agg.alerts[0];
        assert_eq!(crash.severity, Severity::Critical);
        assert_eq!(crash.message, "Impact sensor triggered");
        assert_eq!(crash.impact.category, ImpactCategory::Safety);
        assert_eq!(crash.impact.urgency, Urgency::Critical);

        let speeding = &agg.alerts[1];
        assert_eq!(speeding.occurrence_count, 3);
        assert_eq!(speeding.status, AlertStatus::Active);
        assert_eq!(speeding.trend, Trend::Increasing);
        assert_eq!(speeding.last_triggered, t0() + Duration::minutes(20 * 60 + 2));

        let again = aggregate("v1", &day(), &[], &[], &[]);
        assert!(again.alerts.is_empty());
    }

    #[test]
    fn test_alert_ids_are_stable() {
        let mut r = record(60, 5.0);
        r.events = vec![event(60, EventType::BatteryLow, Severity::Error)];
        let a = aggregate("v1", &day(), std::slice::from_ref(&r), &[], &[]);
        let b = aggregate("v1", &day(), &[r], &[], &[]);
        assert_eq!(a.alerts[0].id, b.alerts[0].id);
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let agg = aggregate("v1", &day(), &[], &[], &[]);
        assert_eq!(agg.record_count, 0);
        assert_eq!(agg.metrics.distance.total, 0.0);
        assert_eq!(agg.metrics.fuel.total_consumed, 0.0);
        assert_eq!(agg.metrics.location.center_point, None);
        assert_eq!(agg.metrics.efficiency.fuel_efficiency_score, 100.0);
    }
}
