//! The registry seam gauges are handed to.
//!
//! A binder never stores or samples gauges itself: it builds one
//! [`GaugeRegistration`] per applicable gauge and passes it to a
//! [`MeterRegistry`]. The registry owns the gauge from then on, including
//! deduplication and export.
//!
//! Two registries are provided:
//!
//! - [`SimpleMeterRegistry`]: in-memory, sampled on demand
//! - `prometheus::Registry`: each gauge becomes a collector that re-reads its
//!   accessor on every `gather()`

mod prometheus;
mod simple;

pub use self::prometheus::prometheus_name;
pub use simple::SimpleMeterRegistry;

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::tags::Tags;

/// A zero-argument value reader, invoked on every sample.
pub type Accessor = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Everything a registry needs to expose one live gauge.
#[derive(Clone)]
pub struct GaugeRegistration {
    /// Canonical dotted name, e.g. `pool.threads.idle`.
    pub name: &'static str,
    pub description: &'static str,
    pub tags: Tags,
    pub accessor: Accessor,
}

impl GaugeRegistration {
    pub fn new(
        name: &'static str,
        description: &'static str,
        tags: Tags,
        accessor: impl Fn() -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            description,
            tags,
            accessor: Arc::new(accessor),
        }
    }

    /// Read the current value.
    #[inline]
    pub fn sample(&self) -> f64 {
        (self.accessor)()
    }
}

impl fmt::Debug for GaugeRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GaugeRegistration")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// A metrics registry accepting live gauges.
///
/// Implementations must be usable from several threads: gauges may be
/// registered from one thread and sampled from a collection thread.
pub trait MeterRegistry: Send + Sync {
    /// Register a gauge.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry refuses the gauge, for instance
    /// because the same name and tags are already registered.
    fn register_gauge(&self, registration: GaugeRegistration) -> Result<()>;
}

impl<R: MeterRegistry + ?Sized> MeterRegistry for Arc<R> {
    fn register_gauge(&self, registration: GaugeRegistration) -> Result<()> {
        (**self).register_gauge(registration)
    }
}
