use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            accuracy: None,
        }
    }
}

/// Anything that sits at a geographic position.
pub trait Positioned {
    fn location(&self) -> &Location;
}

impl Positioned for Location {
    fn location(&self) -> &Location {
        self
    }
}

impl Positioned for PathPoint {
    fn location(&self) -> &Location {
        &self.location
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointEvent {
    Start,
    Stop,
    Pause,
    Resume,
    Waypoint,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointMetadata {
    pub engine_running: Option<bool>,
    pub is_working: Option<bool>,
    pub task_id: Option<String>,
    pub operator_id: Option<String>,
}

/// One normalized sample of a vehicle's track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathPoint {
    pub id: String,
    pub vehicle_id: String,
    pub timestamp: DateTime<Utc>,
    pub location: Location,
    /// km/h
    pub speed: f64,
    pub heading: f64,
    pub accuracy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<PointEvent>,
    #[serde(default)]
    pub metadata: PointMetadata,
}

impl PathPoint {
    pub fn is_working(&self) -> bool {
        self.metadata.is_working.unwrap_or(false)
    }

    pub fn is_moving(&self) -> bool {
        self.speed > 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentType {
    Transport,
    Working,
    Idle,
    Unknown,
}

/// A contiguous, classified run of points. Derived entirely from `points`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSegment {
    pub id: String,
    pub vehicle_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub points: Vec<PathPoint>,
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
    /// km/h
    pub average_speed: f64,
    /// km/h
    pub max_speed: f64,
    #[serde(rename = "type")]
    pub segment_type: SegmentType,
}

impl PathSegment {
    pub fn duration_hours(&self) -> f64 {
        self.duration / 3600.0
    }
}
