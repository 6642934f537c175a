//! Configuration types for thread-pool metrics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tags::Tags;

/// Configuration for a [`ThreadPoolMetrics`](crate::ThreadPoolMetrics) binder.
///
/// Gauge names are fixed; only the tags and the reference strength are
/// configurable. Deserializable from TOML, YAML, JSON, or environment
/// variables using figment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThreadPoolMetricsConfig {
    /// Tags attached to every gauge (default: none)
    #[serde(default, deserialize_with = "crate::tags::deserialize_tag_map")]
    pub tags: BTreeMap<String, String>,

    /// Keep the pool alive from its gauges (default: false, weak reference)
    #[serde(default)]
    pub strong_reference: bool,
}

impl ThreadPoolMetricsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configured tags as a [`Tags`] set.
    pub fn tag_set(&self) -> Tags {
        Tags::from(self.tags.clone())
    }
}
