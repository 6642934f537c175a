//! Error types for threadpool-metrics.

use thiserror::Error;

/// Errors that can occur when configuring a binder or registering its gauges.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// The Prometheus registry rejected a gauge (invalid name, duplicate, ...).
    #[error("prometheus registry error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// A gauge with the same name and tags is already registered.
    #[error("gauge {name} with tags {tags} is already registered")]
    DuplicateGauge { name: String, tags: String },

    /// A tag could not be parsed from `key=value` form.
    #[error("invalid tag {0:?}, expected key=value")]
    InvalidTag(String),

    /// Two tag keys map to the same exported label name.
    #[error("tag keys {first:?} and {second:?} both map to label {label:?}")]
    LabelCollision {
        label: String,
        first: String,
        second: String,
    },

    /// Error extracting configuration from figment.
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

/// Result type alias for metrics operations.
pub type Result<T> = std::result::Result<T, MetricsError>;
