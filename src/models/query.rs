use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TelemetryError;

/// Sampling-density tier applied before segmentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    High,
    #[default]
    Medium,
    Low,
}

impl Resolution {
    pub fn interval_seconds(&self) -> i64 {
        match self {
            Self::High => 10,
            Self::Medium => 60,
            Self::Low => 300,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::seconds(self.interval_seconds())
    }
}

impl FromStr for Resolution {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(TelemetryError::invalid(
                "resolution",
                format!("unknown resolution '{}'", other),
            )),
        }
    }
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> crate::error::Result<Self> {
        if end < start {
            return Err(TelemetryError::invalid(
                "timeRange",
                format!("end {} precedes start {}", end, start),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Splits into two adjacent halves of equal length.
    pub fn halves(&self) -> (TimeRange, TimeRange) {
        let mid = self.start + self.duration() / 2;
        (
            TimeRange {
                start: self.start,
                end: mid,
            },
            TimeRange {
                start: mid,
                end: self.end,
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathQuery {
    pub vehicle_ids: BTreeSet<String>,
    pub range: TimeRange,
    #[serde(default)]
    pub resolution: Resolution,
}

impl PathQuery {
    pub fn new<I, S>(vehicle_ids: I, range: TimeRange, resolution: Resolution) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vehicle_ids: vehicle_ids.into_iter().map(Into::into).collect(),
            range,
            resolution,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRangePreset {
    pub label: &'static str,
    pub range: TimeRange,
    pub resolution: Resolution,
}

impl TimeRangePreset {
    /// Standard dashboard ranges relative to `now`, days starting at UTC midnight.
    pub fn presets(now: DateTime<Utc>) -> Vec<TimeRangePreset> {
        let today = Utc
            .from_utc_datetime(&now.date_naive().and_hms_opt(0, 0, 0).unwrap_or_default());
        let yesterday = today - Duration::days(1);
        let week_ago = today - Duration::days(7);
        let month_ago = today - Duration::days(30);

        vec![
            TimeRangePreset {
                label: "Last Hour",
                range: TimeRange {
                    start: now - Duration::hours(1),
                    end: now,
                },
                resolution: Resolution::High,
            },
            TimeRangePreset {
                label: "Today",
                range: TimeRange { start: today, end: now },
                resolution: Resolution::Medium,
            },
            TimeRangePreset {
                label: "Yesterday",
                range: TimeRange {
                    start: yesterday,
                    end: today,
                },
                resolution: Resolution::Medium,
            },
            TimeRangePreset {
                label: "Last 7 Days",
                range: TimeRange {
                    start: week_ago,
                    end: now,
                },
                resolution: Resolution::Low,
            },
            TimeRangePreset {
                label: "Last 30 Days",
                range: TimeRange {
                    start: month_ago,
                    end: now,
                },
                resolution: Resolution::Low,
            },
        ]
    }
}
