use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepcamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unknown exercise label: {label}")]
    UnknownExercise { label: String },

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[cfg(feature = "service")]
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Session plan and dispatcher configuration errors. All of these are
/// detected at session setup, before any frame is processed.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Frame rate must be positive and finite, got {fps}")]
    InvalidFrameRate { fps: f64 },

    #[error("Interval {index} is malformed: start {start}s must be earlier than end {end}s")]
    InvalidInterval { index: usize, start: f64, end: f64 },

    #[error("Interval {index} is out of order: starts at {start}s, before the preceding interval")]
    UnorderedInterval { index: usize, start: f64 },
}

/// Errors at the landmark-stream ingest boundary.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read landmark stream at line {line}: {source}")]
    StreamRead {
        line: u64,
        source: std::io::Error,
    },

    #[error("Malformed landmark frame at line {line}: {source}")]
    MalformedFrame {
        line: u64,
        source: serde_json::Error,
    },

    #[error("Unsupported session plan format: {path} (expected .toml or .json)")]
    UnsupportedPlanFormat { path: String },
}

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Unknown workout plan: {name}")]
    UnknownPlan { name: String },
}

#[cfg(feature = "service")]
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Failed to bind to {address}: {source}")]
    BindFailed {
        address: String,
        source: std::io::Error,
    },

    #[error("Server error: {details}")]
    Startup { details: String },
}

pub type Result<T> = std::result::Result<T, RepcamError>;
