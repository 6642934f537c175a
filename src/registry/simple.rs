//! In-memory registry, mostly useful for tests and ad-hoc inspection.

use parking_lot::RwLock;

use super::{GaugeRegistration, MeterRegistry};
use crate::error::{MetricsError, Result};
use crate::tags::Tags;

/// A registry that keeps registrations in memory and samples them on demand.
#[derive(Debug, Default)]
pub struct SimpleMeterRegistry {
    gauges: RwLock<Vec<GaugeRegistration>>,
}

impl SimpleMeterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered gauges.
    pub fn len(&self) -> usize {
        self.gauges.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.read().is_empty()
    }

    /// Distinct gauge names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for gauge in self.gauges.read().iter() {
            if !names.contains(&gauge.name) {
                names.push(gauge.name);
            }
        }
        names
    }

    /// All registrations with the given name, across tag sets.
    pub fn find(&self, name: &str) -> Vec<GaugeRegistration> {
        self.gauges
            .read()
            .iter()
            .filter(|g| g.name == name)
            .cloned()
            .collect()
    }

    /// Sample the gauge with exactly this name and tag set.
    ///
    /// The accessor runs outside the registry lock.
    pub fn sample(&self, name: &str, tags: &Tags) -> Option<f64> {
        let accessor = self
            .gauges
            .read()
            .iter()
            .find(|g| g.name == name && &g.tags == tags)
            .map(|g| g.accessor.clone())?;
        Some(accessor())
    }

    /// Sample every registered gauge.
    pub fn snapshot(&self) -> Vec<(&'static str, Tags, f64)> {
        let gauges = self.gauges.read().clone();
        gauges
            .into_iter()
            .map(|g| {
                let value = g.sample();
                (g.name, g.tags, value)
            })
            .collect()
    }
}

impl MeterRegistry for SimpleMeterRegistry {
    fn register_gauge(&self, registration: GaugeRegistration) -> Result<()> {
        let mut gauges = self.gauges.write();
        if gauges
            .iter()
            .any(|g| g.name == registration.name && g.tags == registration.tags)
        {
            return Err(MetricsError::DuplicateGauge {
                name: registration.name.to_string(),
                tags: registration.tags.to_string(),
            });
        }
        gauges.push(registration);
        Ok(())
    }
}
