pub mod aggregation;
pub mod path;
pub mod query;
pub mod telemetry;
pub mod tracker;
