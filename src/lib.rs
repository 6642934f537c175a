//! # threadpool-metrics
//!
//! Capability-aware gauges for thread pools.
//!
//! A [`ThreadPoolMetrics`] binder inspects a pool, works out which optional
//! monitoring capabilities it exposes, and registers a fixed set of live
//! gauges into a metrics registry. Each gauge re-reads the pool whenever the
//! registry samples it.
//!
//! ## Capabilities
//!
//! | Capability | Trait | Gauges |
//! |------------|-------|--------|
//! | Base | [`ThreadPool`] | `pool.threads.current`, `pool.threads.idle` |
//! | Bounded | [`SizedThreadPool`] | `pool.threads.config.min`, `pool.threads.config.max` |
//! | Queue-backed | [`QueuedThreadPool`] | `pool.threads.busy` |
//!
//! Queue-backed gauges are only considered for bounded pools.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use threadpool_metrics::{MeterBinder, Tags, ThreadPool, ThreadPoolMetrics};
//!
//! struct MyPool { /* atomics updated by workers */ }
//!
//! impl ThreadPool for MyPool {
//!     fn threads(&self) -> usize { /* ... */ }
//!     fn idle_threads(&self) -> usize { /* ... */ }
//! }
//!
//! let pool = Arc::new(MyPool { /* ... */ });
//! let registry = prometheus::Registry::new();
//!
//! ThreadPoolMetrics::new(&pool, Tags::of("pool", "server")).bind_to(&registry)?;
//!
//! // Later, on every scrape: pool_threads_current{pool="server"} reflects
//! // the pool's state at that moment.
//! let families = registry.gather();
//! ```
//!
//! ## Configuration
//!
//! Tags and reference strength can come from files, environment variables,
//! code, or CLI arguments through [`ThreadPoolMetricsBuilder`]:
//!
//! ```toml
//! strong_reference = false
//!
//! [tags]
//! pool = "server"
//! ```

pub mod binder;
pub mod builder;
pub mod capability;
pub mod config;
pub mod error;
pub mod pool;
pub mod registry;
pub mod tags;

pub use binder::{MeterBinder, ThreadPoolMetrics};
pub use builder::{MetricsArgs, ThreadPoolMetricsBuilder};
pub use capability::Capabilities;
pub use config::ThreadPoolMetricsConfig;
pub use error::{MetricsError, Result};
pub use pool::{QueuedThreadPool, SizedThreadPool, ThreadPool};
pub use registry::{
    prometheus_name, Accessor, GaugeRegistration, MeterRegistry, SimpleMeterRegistry,
};
pub use tags::{Tag, Tags};
