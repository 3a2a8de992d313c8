use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use crate::models::aggregation::PeriodKind;
use crate::models::query::Resolution;
use crate::processor::optimizer::DEFAULT_MAX_DISPLAY_POINTS;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telemetry_file: String,
    /// Empty means every vehicle found in the telemetry file.
    pub vehicle_ids: Vec<String>,
    pub query_start: Option<DateTime<Utc>>,
    pub query_end: Option<DateTime<Utc>>,
    pub resolution: Resolution,
    pub max_display_points: usize,
    pub batch_deadline: Option<Duration>,
    pub aggregation_period: PeriodKind,
    pub log_level: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let telemetry_file =
            env::var("TELEMETRY_FILE").unwrap_or_else(|_| "telemetry.json".to_string());
        let vehicle_ids = env::var("VEHICLE_IDS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect();

        let query_start = optional_timestamp("QUERY_START")?;
        let query_end = optional_timestamp("QUERY_END")?;

        let resolution = env::var("PATH_RESOLUTION")
            .unwrap_or_else(|_| "medium".to_string())
            .parse::<Resolution>()
            .context("PATH_RESOLUTION")?;
        let max_display_points = env::var("MAX_DISPLAY_POINTS")
            .unwrap_or_else(|_| DEFAULT_MAX_DISPLAY_POINTS.to_string())
            .parse()
            .unwrap_or(DEFAULT_MAX_DISPLAY_POINTS);
        let batch_deadline = env::var("BATCH_DEADLINE_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);
        let aggregation_period = env::var("AGGREGATION_PERIOD")
            .unwrap_or_else(|_| "day".to_string())
            .parse::<PeriodKind>()
            .context("AGGREGATION_PERIOD")?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            telemetry_file,
            vehicle_ids,
            query_start,
            query_end,
            resolution,
            max_display_points,
            batch_deadline,
            aggregation_period,
            log_level,
        })
    }
}

fn optional_timestamp(key: &str) -> Result<Option<DateTime<Utc>>> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            let parsed = DateTime::parse_from_rfc3339(raw.trim())
                .with_context(|| format!("{} is not an RFC 3339 timestamp: {}", key, raw))?;
            Ok(Some(parsed.with_timezone(&Utc)))
        }
        _ => Ok(None),
    }
}
