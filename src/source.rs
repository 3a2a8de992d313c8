use std::collections::HashMap;
use std::path::Path;

use chrono::Duration;

use crate::error::{Result, TelemetryError};
use crate::models::query::TimeRange;
use crate::models::telemetry::TelemetryRecord;

/// Supplies raw records per vehicle. Storage and transport live behind this seam.
pub trait TelemetrySource: Send + Sync {
    /// Records of `vehicle_id` inside `range`, in the order they were received.
    fn records(&self, vehicle_id: &str, range: &TimeRange) -> Result<Vec<TelemetryRecord>>;

    fn vehicle_ids(&self) -> Vec<String>;
}

/// Records held in memory, grouped by vehicle in arrival order.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    by_vehicle: HashMap<String, Vec<TelemetryRecord>>,
}

impl InMemorySource {
    pub fn new(records: Vec<TelemetryRecord>) -> Self {
        let mut by_vehicle: HashMap<String, Vec<TelemetryRecord>> = HashMap::new();
        for record in records {
            by_vehicle.entry(record.vehicle_id.clone()).or_default().push(record);
        }
        Self { by_vehicle }
    }

    /// Loads a JSON array of records.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path)
            .map_err(|e| TelemetryError::Source(format!("reading {}: {}", path.display(), e)))?;
        let records: Vec<TelemetryRecord> = serde_json::from_slice(&raw)
            .map_err(|e| TelemetryError::Source(format!("parsing {}: {}", path.display(), e)))?;
        Ok(Self::new(records))
    }

    pub fn record_count(&self) -> usize {
        self.by_vehicle.values().map(Vec::len).sum()
    }

    /// Smallest half-open range covering every record.
    pub fn span(&self) -> Option<TimeRange> {
        let all = self.by_vehicle.values().flatten();
        let start = all.clone().map(|r| r.timestamp).min()?;
        let end = all.map(|r| r.timestamp).max()?;
        Some(TimeRange {
            start,
            end: end + Duration::milliseconds(1),
        })
    }
}

impl TelemetrySource for InMemorySource {
    fn records(&self, vehicle_id: &str, range: &TimeRange) -> Result<Vec<TelemetryRecord>> {
        Ok(self
            .by_vehicle
            .get(vehicle_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| range.contains(r.timestamp))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn vehicle_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.by_vehicle.keys().cloned().collect();
        ids.sort();
        ids
    }
}
