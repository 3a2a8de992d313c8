pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod processor;
pub mod service;
pub mod source;
pub mod validation;

pub use error::{Result, TelemetryError};
pub use models::aggregation::{AggregatedTelemetry, FieldBoundary, PeriodKind, TimePeriod};
pub use models::path::{Location, PathPoint, PathSegment, SegmentType};
pub use models::query::{PathQuery, Resolution, TimeRange};
pub use models::telemetry::TelemetryRecord;
pub use processor::aggregator::aggregate;
pub use processor::optimizer::optimize_path_for_display;
pub use service::{PathBatch, PathTrackingService};
pub use source::{InMemorySource, TelemetrySource};
