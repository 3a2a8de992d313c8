use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TelemetryError;
use crate::models::path::Location;
use crate::models::query::TimeRange;
use crate::models::telemetry::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl FromStr for PeriodKind {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(TelemetryError::invalid(
                "period",
                format!("unknown period '{}'", other),
            )),
        }
    }
}

/// A reporting window of one calendar unit starting at `range.start`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePeriod {
    pub kind: PeriodKind,
    pub label: String,
    pub range: TimeRange,
}

impl TimePeriod {
    pub fn starting_at(kind: PeriodKind, start: DateTime<Utc>) -> Self {
        let end = match kind {
            PeriodKind::Hour => start + Duration::hours(1),
            PeriodKind::Day => start + Duration::days(1),
            PeriodKind::Week => start + Duration::weeks(1),
            PeriodKind::Month => start
                .checked_add_months(Months::new(1))
                .unwrap_or(start + Duration::days(30)),
            PeriodKind::Year => start
                .checked_add_months(Months::new(12))
                .unwrap_or(start + Duration::days(365)),
        };
        let label = match kind {
            PeriodKind::Hour => start.format("%Y-%m-%d %H:00").to_string(),
            PeriodKind::Day => start.format("%Y-%m-%d").to_string(),
            PeriodKind::Week => format!("{}-W{:02}", start.iso_week().year(), start.iso_week().week()),
            PeriodKind::Month => start.format("%Y-%m").to_string(),
            PeriodKind::Year => start.format("%Y").to_string(),
        };
        Self {
            kind,
            label,
            range: TimeRange { start, end },
        }
    }

    pub fn hours(&self) -> f64 {
        self.range.duration().num_milliseconds() as f64 / 3_600_000.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedTelemetry {
    pub vehicle_id: String,
    pub period: TimePeriod,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub record_count: usize,
    pub metrics: AggregatedMetrics,
    pub events: EventSummary,
    pub alerts: Vec<AlertSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMetrics {
    pub distance: DistanceMetrics,
    pub fuel: FuelMetrics,
    pub engine: EngineMetrics,
    pub efficiency: EfficiencyMetrics,
    pub utilization: UtilizationMetrics,
    pub location: LocationMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceMetrics {
    /// km
    pub total: f64,
    pub working: f64,
    pub transport: f64,
    /// km/h
    pub average_speed: f64,
    pub max_speed: f64,
    pub speed_distribution: Vec<SpeedBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedBucket {
    pub min_speed: f64,
    /// `None` for the open-ended top bucket.
    pub max_speed: Option<f64>,
    /// Minutes.
    pub duration: f64,
    /// km
    pub distance: f64,
    /// Share of total time, percent.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelMetrics {
    /// Liters.
    pub total_consumed: f64,
    /// l/h of engine runtime.
    pub average_consumption: f64,
    /// l/km
    pub efficiency: f64,
    pub idle_fuel_waste: f64,
    pub refuel_events: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineMetrics {
    /// Hours.
    pub total_runtime: f64,
    pub average_rpm: f64,
    pub max_rpm: f64,
    pub load_distribution: Vec<LoadBucket>,
    pub temperature_stats: TemperatureStats,
    pub maintenance_alerts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBucket {
    pub min_load: f64,
    pub max_load: f64,
    /// Minutes.
    pub duration: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub overheating_events: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyMetrics {
    pub productivity_score: f64,
    pub fuel_efficiency_score: f64,
    pub work_quality_score: f64,
    pub overall_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationMetrics {
    /// Hours.
    pub working_time: f64,
    pub idle_time: f64,
    pub transport_time: f64,
    pub maintenance_time: f64,
    /// Percent.
    pub utilization_rate: f64,
    pub availability_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationMetrics {
    pub fields_visited: Vec<String>,
    pub geofence_violations: u32,
    pub center_point: Option<Location>,
    /// km
    pub working_radius: f64,
    /// Percent.
    pub route_efficiency: f64,
}

/// A named field boundary used for visit detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldBoundary {
    pub id: String,
    pub boundary: Vec<Location>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub total_events: usize,
    pub events_by_type: Vec<EventTypeSummary>,
    pub severity_distribution: SeverityDistribution,
    pub acknowledged_count: usize,
    pub unresolved_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeSummary {
    #[serde(rename = "type")]
    pub event_type: String,
    pub count: usize,
    pub severity: Severity,
    pub first_occurrence: DateTime<Utc>,
    pub last_occurrence: DateTime<Utc>,
    pub trend: Trend,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeverityDistribution {
    pub info: usize,
    pub warning: usize,
    pub error: usize,
    pub critical: usize,
}

impl SeverityDistribution {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Info => self.info += 1,
            Severity::Warning => self.warning += 1,
            Severity::Error => self.error += 1,
            Severity::Critical => self.critical += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Acknowledged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactCategory {
    Safety,
    Efficiency,
    Cost,
    Compliance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertImpact {
    pub category: ImpactCategory,
    pub urgency: Urgency,
    pub recommended_action: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSummary {
    pub id: uuid::Uuid,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub message: String,
    pub severity: Severity,
    pub first_triggered: DateTime<Utc>,
    pub last_triggered: DateTime<Utc>,
    pub occurrence_count: usize,
    pub status: AlertStatus,
    pub impact: AlertImpact,
    pub trend: Trend,
}
