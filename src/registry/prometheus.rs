//! Prometheus adapter for live gauges.
//!
//! Each registration becomes a collector wrapping a [`Gauge`]. The wrapped
//! gauge is refreshed from the accessor inside `collect()`, so every
//! `Registry::gather()` reads the pool's state at that moment.
//!
//! Dotted names are not valid Prometheus identifiers; `pool.threads.idle` is
//! exposed as `pool_threads_idle`. Tags become const labels.

use std::collections::HashMap;

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Gauge, Opts, Registry};
use tracing::warn;

use super::{Accessor, GaugeRegistration, MeterRegistry};
use crate::error::{MetricsError, Result};

/// Convert a dotted gauge name into a valid Prometheus metric name.
///
/// Valid chars: `[a-zA-Z_:]` for the first char, `[a-zA-Z0-9_:]` for the rest.
/// Anything else is replaced with an underscore.
pub fn prometheus_name(name: &str) -> String {
    sanitize(name, true)
}

fn label_name(key: &str) -> String {
    sanitize(key, false)
}

fn sanitize(raw: &str, allow_colon: bool) -> String {
    raw.chars()
        .enumerate()
        .map(|(i, c)| {
            let allowed = c == '_' || (allow_colon && c == ':');
            if i == 0 {
                if c.is_ascii_alphabetic() || allowed {
                    c
                } else {
                    '_'
                }
            } else if c.is_ascii_alphanumeric() || allowed {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// A gauge whose value is pulled from an accessor at collection time.
struct LiveGauge {
    gauge: Gauge,
    accessor: Accessor,
}

impl LiveGauge {
    fn new(registration: &GaugeRegistration) -> Result<Self> {
        let mut labels: HashMap<String, String> = HashMap::with_capacity(registration.tags.len());
        let mut sources: HashMap<String, &str> = HashMap::with_capacity(registration.tags.len());
        for (key, value) in registration.tags.iter() {
            let label = label_name(key);
            if let Some(first) = sources.get(&label) {
                return Err(MetricsError::LabelCollision {
                    label,
                    first: first.to_string(),
                    second: key.to_string(),
                });
            }
            sources.insert(label.clone(), key);
            labels.insert(label, value.to_string());
        }
        let gauge = Gauge::with_opts(
            Opts::new(prometheus_name(registration.name), registration.description)
                .const_labels(labels),
        )?;
        Ok(Self {
            gauge,
            accessor: registration.accessor.clone(),
        })
    }
}

impl Collector for LiveGauge {
    fn desc(&self) -> Vec<&Desc> {
        self.gauge.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.gauge.set((self.accessor)());
        self.gauge.collect()
    }
}

impl MeterRegistry for Registry {
    fn register_gauge(&self, registration: GaugeRegistration) -> Result<()> {
        let gauge = LiveGauge::new(&registration)?;
        if let Err(e) = self.register(Box::new(gauge)) {
            warn!(
                %e,
                name = registration.name,
                tags = %registration.tags,
                "prometheus rejected gauge"
            );
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::Tags;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn value_of(registry: &Registry, name: &str) -> Option<f64> {
        registry
            .gather()
            .iter()
            .find(|f| f.get_name() == name)
            .map(|f| f.get_metric()[0].get_gauge().get_value())
    }

    #[test]
    fn test_prometheus_name() {
        assert_eq!(prometheus_name("pool.threads.config.min"), "pool_threads_config_min");
        assert_eq!(prometheus_name("my-app:threads"), "my_app:threads");
        assert_eq!(prometheus_name("1pool"), "_pool");
    }

    #[test]
    fn test_label_name_rejects_colon() {
        assert_eq!(label_name("pool:kind"), "pool_kind");
        assert_eq!(label_name("pool.name"), "pool_name");
    }

    #[test]
    fn test_value_is_read_on_every_gather() {
        let registry = Registry::new();
        let value = Arc::new(AtomicUsize::new(3));
        let reader = value.clone();
        registry
            .register_gauge(GaugeRegistration::new(
                "pool.threads.idle",
                "The number of idle threads in the pool",
                Tags::empty(),
                move || reader.load(Ordering::Relaxed) as f64,
            ))
            .unwrap();

        assert_eq!(value_of(&registry, "pool_threads_idle"), Some(3.0));
        value.store(9, Ordering::Relaxed);
        assert_eq!(value_of(&registry, "pool_threads_idle"), Some(9.0));
    }

    #[test]
    fn test_tags_become_const_labels() {
        let registry = Registry::new();
        registry
            .register_gauge(GaugeRegistration::new(
                "pool.threads.current",
                "The total number of threads in the pool",
                Tags::of("pool.name", "server"),
                || 1.0,
            ))
            .unwrap();

        let families = registry.gather();
        let family = families
            .iter()
            .find(|f| f.get_name() == "pool_threads_current")
            .expect("family should be gathered");
        let labels = family.get_metric()[0].get_label();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].get_name(), "pool_name");
        assert_eq!(labels[0].get_value(), "server");
    }

    #[test]
    fn test_colliding_tag_keys_rejected() {
        let registry = Registry::new();
        let err = registry
            .register_gauge(GaugeRegistration::new(
                "pool.threads.current",
                "The total number of threads in the pool",
                Tags::of("pool.name", "a").and("pool_name", "b"),
                || 1.0,
            ))
            .unwrap_err();

        match err {
            MetricsError::LabelCollision {
                label,
                first,
                second,
            } => {
                assert_eq!(label, "pool_name");
                assert_eq!(first, "pool.name");
                assert_eq!(second, "pool_name");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(registry.gather().is_empty());
    }

    #[test]
    fn test_duplicate_propagates_registry_error() {
        let registry = Registry::new();
        let make =
            || GaugeRegistration::new("pool.threads.idle", "Idle", Tags::of("pool", "a"), || 0.0);
        registry.register_gauge(make()).unwrap();

        let err = registry.register_gauge(make()).unwrap_err();
        assert!(matches!(
            err,
            MetricsError::Prometheus(prometheus::Error::AlreadyReg)
        ));
    }
}
