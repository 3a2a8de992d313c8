//! Query entry points: per-vehicle path retrieval and period aggregation.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::{Result, TelemetryError};
use crate::models::aggregation::{AggregatedTelemetry, FieldBoundary, TimePeriod};
use crate::models::path::PathSegment;
use crate::models::query::{PathQuery, Resolution, TimeRange};
use crate::processor::{aggregator, normalizer, segmenter};
use crate::source::TelemetrySource;

/// Outcome of a multi-vehicle query. One vehicle's failure never fails the batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathBatch {
    pub paths: BTreeMap<String, Vec<PathSegment>>,
    #[serde(serialize_with = "serialize_errors")]
    pub rejected: BTreeMap<String, TelemetryError>,
    /// Vehicles whose work did not finish before the deadline.
    pub unfinished: Vec<String>,
}

impl PathBatch {
    fn record(&mut self, vehicle_id: String, result: Result<Vec<PathSegment>>) {
        match result {
            Ok(segments) => {
                self.paths.insert(vehicle_id, segments);
            }
            Err(e) => {
                warn!("Rejected telemetry for vehicle {}: {}", vehicle_id, e);
                self.rejected.insert(vehicle_id, e);
            }
        }
    }

    pub fn segment_count(&self) -> usize {
        self.paths.values().map(Vec::len).sum()
    }
}

fn serialize_errors<S>(errors: &BTreeMap<String, TelemetryError>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_map(errors.iter().map(|(k, v)| (k, v.to_string())))
}

/// Fetches, normalizes and segments one vehicle's telemetry.
pub fn vehicle_paths<S: TelemetrySource + ?Sized>(
    source: &S,
    vehicle_id: &str,
    range: &TimeRange,
    resolution: Resolution,
) -> Result<Vec<PathSegment>> {
    let records = source.records(vehicle_id, range)?;
    let stream = normalizer::normalize(vehicle_id, &records, range, resolution)?;
    let segments = segmenter::segment_path(&stream.points);
    debug!(
        "Vehicle {}: {} points -> {} segments",
        vehicle_id,
        stream.points.len(),
        segments.len()
    );
    Ok(segments)
}

pub struct PathTrackingService<S> {
    source: Arc<S>,
    fields: Vec<FieldBoundary>,
}

impl<S: TelemetrySource + 'static> PathTrackingService<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            fields: Vec::new(),
        }
    }

    /// Field boundaries used for visit detection in aggregates.
    pub fn with_fields(mut self, fields: Vec<FieldBoundary>) -> Self {
        self.fields = fields;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn get_vehicle_paths(&self, query: &PathQuery) -> PathBatch {
        info!(
            "Path query for {} vehicles, {} to {}, {:?} resolution",
            query.vehicle_ids.len(),
            query.range.start,
            query.range.end,
            query.resolution
        );
        let mut batch = PathBatch::default();
        for vehicle_id in &query.vehicle_ids {
            let result = vehicle_paths(self.source.as_ref(), vehicle_id, &query.range, query.resolution);
            batch.record(vehicle_id.clone(), result);
        }
        batch
    }

    /// Runs each vehicle on the blocking pool. With a deadline, vehicles still
    /// running when it expires are abandoned and listed in `unfinished`.
    pub async fn get_vehicle_paths_concurrent(&self, query: &PathQuery, deadline: Option<Duration>) -> PathBatch {
        let mut tasks = JoinSet::new();
        for vehicle_id in &query.vehicle_ids {
            let source = Arc::clone(&self.source);
            let vehicle_id = vehicle_id.clone();
            let range = query.range;
            let resolution = query.resolution;
            tasks.spawn_blocking(move || {
                let result = vehicle_paths(source.as_ref(), &vehicle_id, &range, resolution);
                (vehicle_id, result)
            });
        }

        let expires_at = deadline.map(|d| tokio::time::Instant::now() + d);
        let mut batch = PathBatch::default();
        loop {
            let next = match expires_at {
                Some(at) => tokio::time::timeout_at(at, tasks.join_next()).await,
                None => Ok(tasks.join_next().await),
            };
            let Ok(next) = next else {
                warn!("Batch deadline reached with {} vehicles pending", tasks.len());
                break;
            };
            match next {
                Some(Ok((vehicle_id, result))) => batch.record(vehicle_id, result),
                Some(Err(e)) => error!("Vehicle task failed: {}", e),
                None => break,
            }
        }
        tasks.abort_all();

        batch.unfinished = query
            .vehicle_ids
            .iter()
            .filter(|id| !batch.paths.contains_key(*id) && !batch.rejected.contains_key(*id))
            .cloned()
            .collect();
        batch
    }

    /// Rolls up one vehicle's period at full sampling density.
    pub fn aggregate(&self, vehicle_id: &str, period: &TimePeriod) -> Result<AggregatedTelemetry> {
        let records = self.source.records(vehicle_id, &period.range)?;
        let segments = vehicle_paths(self.source.as_ref(), vehicle_id, &period.range, Resolution::High)?;
        info!(
            "Aggregating {} records and {} segments for vehicle {} over {}",
            records.len(),
            segments.len(),
            vehicle_id,
            period.label
        );
        Ok(aggregator::aggregate(vehicle_id, period, &records, &segments, &self.fields))
    }
}
