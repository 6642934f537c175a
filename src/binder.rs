//! Binding thread-pool gauges into a registry.
//!
//! [`ThreadPoolMetrics`] probes a pool once per [`MeterBinder::bind_to`] call
//! and registers only the gauges its capabilities can back:
//!
//! | Gauge | Registered when |
//! |-------|-----------------|
//! | `pool.threads.config.min` | bounded |
//! | `pool.threads.config.max` | bounded |
//! | `pool.threads.busy` | bounded and queue-backed |
//! | `pool.threads.current` | always |
//! | `pool.threads.idle` | always |
//!
//! Every gauge carries the binder's tag set, and every accessor reads the
//! pool when sampled. Nothing is captured at bind time.

use std::fmt;
use std::sync::{Arc, Weak};

use tracing::debug;

use crate::capability::Capabilities;
use crate::error::Result;
use crate::pool::ThreadPool;
use crate::registry::{GaugeRegistration, MeterRegistry};
use crate::tags::Tags;

/// Configured minimum thread count (bounded pools).
pub const CONFIG_MIN: &str = "pool.threads.config.min";
/// Configured maximum thread count (bounded pools).
pub const CONFIG_MAX: &str = "pool.threads.config.max";
/// Threads running a job (bounded, queue-backed pools).
pub const BUSY: &str = "pool.threads.busy";
/// Total threads in the pool.
pub const CURRENT: &str = "pool.threads.current";
/// Idle threads in the pool.
pub const IDLE: &str = "pool.threads.idle";

/// Something that registers measurement points into a registry.
pub trait MeterBinder {
    /// Register this binder's gauges.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by the registry. Gauges registered
    /// before the failure stay registered.
    fn bind_to(&self, registry: &dyn MeterRegistry) -> Result<()>;
}

type Reader = fn(&dyn ThreadPool) -> Option<usize>;

/// How accessors hold on to the pool.
#[derive(Clone)]
enum PoolRef {
    Weak(Weak<dyn ThreadPool>),
    Strong(Arc<dyn ThreadPool>),
}

impl PoolRef {
    fn upgrade(&self) -> Option<Arc<dyn ThreadPool>> {
        match self {
            PoolRef::Weak(pool) => pool.upgrade(),
            PoolRef::Strong(pool) => Some(pool.clone()),
        }
    }

    /// Read a value, or NaN if the pool is gone or no longer exposes it.
    fn sample(&self, read: Reader) -> f64 {
        self.upgrade()
            .and_then(|pool| read(pool.as_ref()))
            .map_or(f64::NAN, |v| v as f64)
    }
}

/// Gauges for a thread pool's size and utilisation.
///
/// By default accessors hold a weak reference, so binding never keeps a pool
/// alive; once the pool is dropped its gauges sample as NaN. Use
/// [`strong_reference`](Self::strong_reference) to keep it alive instead.
///
/// # Example
///
/// ```ignore
/// use threadpool_metrics::{MeterBinder, Tags, ThreadPoolMetrics};
///
/// let registry = prometheus::Registry::new();
/// ThreadPoolMetrics::new(&server_pool, Tags::of("pool", "server")).bind_to(&registry)?;
/// ThreadPoolMetrics::new(&client_pool, Tags::of("pool", "client")).bind_to(&registry)?;
/// ```
#[derive(Clone)]
pub struct ThreadPoolMetrics {
    pool: PoolRef,
    tags: Tags,
}

impl ThreadPoolMetrics {
    /// Create a binder for `pool` that attaches `tags` to every gauge.
    pub fn new<P: ThreadPool + 'static>(pool: &Arc<P>, tags: Tags) -> Self {
        let pool: Arc<dyn ThreadPool> = pool.clone();
        Self::from_dyn(&pool, tags)
    }

    /// Like [`new`](Self::new), for an already type-erased pool.
    pub fn from_dyn(pool: &Arc<dyn ThreadPool>, tags: Tags) -> Self {
        Self {
            pool: PoolRef::Weak(Arc::downgrade(pool)),
            tags,
        }
    }

    /// Bind gauges for `pool` in one step.
    pub fn monitor<P: ThreadPool + 'static>(
        registry: &dyn MeterRegistry,
        pool: &Arc<P>,
        tags: Tags,
    ) -> Result<()> {
        Self::new(pool, tags).bind_to(registry)
    }

    /// Choose whether accessors keep the pool alive.
    ///
    /// Switching to a strong reference after the pool was dropped has no
    /// effect.
    pub fn strong_reference(mut self, strong: bool) -> Self {
        self.pool = match (self.pool, strong) {
            (PoolRef::Weak(pool), true) => match pool.upgrade() {
                Some(pool) => PoolRef::Strong(pool),
                None => PoolRef::Weak(pool),
            },
            (PoolRef::Strong(pool), false) => PoolRef::Weak(Arc::downgrade(&pool)),
            (pool, _) => pool,
        };
        self
    }

    /// The tags attached to every gauge this binder registers.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Probe the pool's capabilities right now.
    ///
    /// A dropped pool has no optional capabilities.
    pub fn capabilities(&self) -> Capabilities {
        self.pool
            .upgrade()
            .map(|pool| Capabilities::probe(pool.as_ref()))
            .unwrap_or_default()
    }

    fn gauge(
        &self,
        name: &'static str,
        description: &'static str,
        read: Reader,
    ) -> GaugeRegistration {
        let pool = self.pool.clone();
        GaugeRegistration::new(name, description, self.tags.clone(), move || pool.sample(read))
    }

    fn register(
        &self,
        registry: &dyn MeterRegistry,
        name: &'static str,
        description: &'static str,
        read: Reader,
    ) -> Result<()> {
        registry.register_gauge(self.gauge(name, description, read))?;
        debug!(name, tags = %self.tags, "registered gauge");
        Ok(())
    }
}

impl MeterBinder for ThreadPoolMetrics {
    fn bind_to(&self, registry: &dyn MeterRegistry) -> Result<()> {
        let caps = self.capabilities();
        debug!(
            bounded = caps.bounded,
            queued = caps.queued,
            tags = %self.tags,
            "probed thread pool"
        );

        if caps.bounded {
            self.register(
                registry,
                CONFIG_MIN,
                "The minimum number of threads in the pool",
                |pool| pool.as_sized().map(|p| p.min_threads()),
            )?;
            self.register(
                registry,
                CONFIG_MAX,
                "The maximum number of threads in the pool",
                |pool| pool.as_sized().map(|p| p.max_threads()),
            )?;
            if caps.queued {
                self.register(
                    registry,
                    BUSY,
                    "The number of busy threads in the pool",
                    |pool| pool.as_sized()?.as_queued().map(|p| p.busy_threads()),
                )?;
            }
        }
        self.register(
            registry,
            CURRENT,
            "The total number of threads in the pool",
            |pool| Some(pool.threads()),
        )?;
        self.register(
            registry,
            IDLE,
            "The number of idle threads in the pool",
            |pool| Some(pool.idle_threads()),
        )?;
        Ok(())
    }
}

impl fmt::Debug for ThreadPoolMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reference = match self.pool {
            PoolRef::Weak(_) => "weak",
            PoolRef::Strong(_) => "strong",
        };
        f.debug_struct("ThreadPoolMetrics")
            .field("pool", &reference)
            .field("tags", &self.tags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{QueuedThreadPool, SizedThreadPool};
    use crate::registry::SimpleMeterRegistry;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Bounded {
        idle: AtomicUsize,
    }

    impl ThreadPool for Bounded {
        fn threads(&self) -> usize {
            5
        }

        fn idle_threads(&self) -> usize {
            self.idle.load(Ordering::Relaxed)
        }

        fn as_sized(&self) -> Option<&dyn SizedThreadPool> {
            Some(self)
        }
    }

    impl SizedThreadPool for Bounded {
        fn min_threads(&self) -> usize {
            2
        }

        fn max_threads(&self) -> usize {
            10
        }
    }

    struct Base;

    impl ThreadPool for Base {
        fn threads(&self) -> usize {
            1
        }

        fn idle_threads(&self) -> usize {
            1
        }
    }

    struct Queued;

    impl ThreadPool for Queued {
        fn threads(&self) -> usize {
            5
        }

        fn idle_threads(&self) -> usize {
            3
        }

        fn as_sized(&self) -> Option<&dyn SizedThreadPool> {
            Some(self)
        }
    }

    impl SizedThreadPool for Queued {
        fn min_threads(&self) -> usize {
            2
        }

        fn max_threads(&self) -> usize {
            10
        }

        fn as_queued(&self) -> Option<&dyn QueuedThreadPool> {
            Some(self)
        }
    }

    impl QueuedThreadPool for Queued {
        fn busy_threads(&self) -> usize {
            4
        }
    }

    /// Bind `pool` and return (registered names, names its capabilities predict).
    fn bound_names<P: ThreadPool + 'static>(
        pool: &Arc<P>,
    ) -> (Vec<&'static str>, Vec<&'static str>) {
        let metrics = ThreadPoolMetrics::new(pool, Tags::of("pool", "test"));
        let registry = SimpleMeterRegistry::new();
        metrics.bind_to(&registry).unwrap();
        (registry.names(), metrics.capabilities().gauge_names())
    }

    fn bounded() -> Arc<Bounded> {
        Arc::new(Bounded {
            idle: AtomicUsize::new(3),
        })
    }

    #[test]
    fn test_registration_order() {
        let pool = bounded();
        let registry = SimpleMeterRegistry::new();
        ThreadPoolMetrics::new(&pool, Tags::empty())
            .bind_to(&registry)
            .unwrap();

        assert_eq!(registry.names(), vec![CONFIG_MIN, CONFIG_MAX, CURRENT, IDLE]);
    }

    #[test]
    fn test_registered_names_match_capabilities() {
        let (registered, expected) = bound_names(&Arc::new(Base));
        assert_eq!(registered, expected);
        assert_eq!(registered, vec![CURRENT, IDLE]);

        let (registered, expected) = bound_names(&bounded());
        assert_eq!(registered, expected);
        assert_eq!(registered, vec![CONFIG_MIN, CONFIG_MAX, CURRENT, IDLE]);

        let (registered, expected) = bound_names(&Arc::new(Queued));
        assert_eq!(registered, expected);
        assert_eq!(registered, vec![CONFIG_MIN, CONFIG_MAX, BUSY, CURRENT, IDLE]);
    }

    #[test]
    fn test_weak_reference_samples_nan_after_drop() {
        let pool = bounded();
        let registry = SimpleMeterRegistry::new();
        ThreadPoolMetrics::new(&pool, Tags::empty())
            .bind_to(&registry)
            .unwrap();
        assert_eq!(registry.sample(IDLE, &Tags::empty()), Some(3.0));

        drop(pool);
        let idle = registry.sample(IDLE, &Tags::empty()).unwrap();
        assert!(idle.is_nan());
    }

    #[test]
    fn test_strong_reference_keeps_pool_alive() {
        let pool = bounded();
        let weak = Arc::downgrade(&pool);
        let registry = SimpleMeterRegistry::new();
        ThreadPoolMetrics::new(&pool, Tags::empty())
            .strong_reference(true)
            .bind_to(&registry)
            .unwrap();

        drop(pool);
        assert!(weak.upgrade().is_some());
        assert_eq!(registry.sample(CONFIG_MAX, &Tags::empty()), Some(10.0));
    }

    #[test]
    fn test_strong_then_weak_releases_pool() {
        let pool = bounded();
        let weak = Arc::downgrade(&pool);
        let metrics = ThreadPoolMetrics::new(&pool, Tags::empty())
            .strong_reference(true)
            .strong_reference(false);

        drop(pool);
        assert!(weak.upgrade().is_none());
        assert_eq!(metrics.capabilities(), Capabilities::default());
    }

    #[test]
    fn test_dropped_pool_binds_base_gauges_only() {
        let pool = bounded();
        let metrics = ThreadPoolMetrics::new(&pool, Tags::empty());
        drop(pool);

        let registry = SimpleMeterRegistry::new();
        metrics.bind_to(&registry).unwrap();
        assert_eq!(registry.names(), vec![CURRENT, IDLE]);
    }

    #[test]
    fn test_debug() {
        let pool = bounded();
        let metrics = ThreadPoolMetrics::new(&pool, Tags::of("pool", "server"));
        let debug = format!("{:?}", metrics);
        assert!(debug.contains("weak"));
        assert!(debug.contains("server"));
    }
}
