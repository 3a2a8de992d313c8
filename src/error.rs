use chrono::{DateTime, Utc};

/// Failures raised at the validation boundary or on precondition violations.
///
/// Data-quality concerns are never errors; see [`crate::validation::ValidationWarning`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TelemetryError {
    #[error("Invalid input for {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("Non-monotonic timestamp for vehicle {vehicle_id} at record {index}: {timestamp} precedes {previous}")]
    NonMonotonicTimestamp {
        vehicle_id: String,
        index: usize,
        previous: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    #[error("Record belongs to vehicle {found}, expected {expected}")]
    VehicleMismatch { expected: String, found: String },

    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    #[error("Telemetry source error: {0}")]
    Source(String),
}

impl TelemetryError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
