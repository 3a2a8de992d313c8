use std::collections::BTreeMap;

use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};

use fleet_paths::config::AppConfig;
use fleet_paths::{
    optimize_path_for_display, AggregatedTelemetry, InMemorySource, PathBatch, PathPoint,
    PathQuery, PathTrackingService, TelemetrySource, TimePeriod, TimeRange,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    range: TimeRange,
    batch: PathBatch,
    display_paths: BTreeMap<String, Vec<PathPoint>>,
    aggregates: BTreeMap<String, AggregatedTelemetry>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .init();

    info!("Starting fleet path report...");

    let source = InMemorySource::from_json_file(&config.telemetry_file)
        .with_context(|| format!("loading {}", config.telemetry_file))?;
    info!(
        "Loaded {} records from {}",
        source.record_count(),
        config.telemetry_file
    );

    let Some(span) = source.span() else {
        warn!("No telemetry records in {}", config.telemetry_file);
        return Ok(());
    };
    let range = TimeRange::new(
        config.query_start.unwrap_or(span.start),
        config.query_end.unwrap_or(span.end),
    )?;

    let vehicle_ids = if config.vehicle_ids.is_empty() {
        source.vehicle_ids()
    } else {
        config.vehicle_ids.clone()
    };
    let query = PathQuery::new(vehicle_ids, range, config.resolution);

    let service = PathTrackingService::new(source);
    let batch = service
        .get_vehicle_paths_concurrent(&query, config.batch_deadline)
        .await;
    info!(
        "{} vehicles segmented into {} segments, {} rejected, {} unfinished",
        batch.paths.len(),
        batch.segment_count(),
        batch.rejected.len(),
        batch.unfinished.len()
    );

    let display_paths = batch
        .paths
        .iter()
        .map(|(vehicle_id, segments)| {
            let mut points: Vec<PathPoint> =
                segments.iter().flat_map(|s| s.points.iter().cloned()).collect();
            // neighbouring segments share their boundary point
            points.dedup_by(|a, b| a.id == b.id);
            (
                vehicle_id.clone(),
                optimize_path_for_display(&points, config.max_display_points),
            )
        })
        .collect();

    let period = TimePeriod::starting_at(config.aggregation_period, range.start);
    let mut aggregates = BTreeMap::new();
    for vehicle_id in batch.paths.keys() {
        match service.aggregate(vehicle_id, &period) {
            Ok(aggregated) => {
                aggregates.insert(vehicle_id.clone(), aggregated);
            }
            Err(e) => warn!("Skipping aggregate for vehicle {}: {}", vehicle_id, e),
        }
    }

    let report = Report {
        range,
        batch,
        display_paths,
        aggregates,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
