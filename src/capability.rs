//! Capability probing for thread pools.

use crate::binder::{BUSY, CONFIG_MAX, CONFIG_MIN, CURRENT, IDLE};
use crate::pool::ThreadPool;

/// Which optional monitoring capabilities a pool exposes.
///
/// The base capability (total and idle threads) is always present and is not
/// tracked here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// The pool has configured minimum and maximum thread counts.
    pub bounded: bool,
    /// The pool tracks busy threads. Only ever set together with `bounded`.
    pub queued: bool,
}

impl Capabilities {
    /// Probe a pool.
    ///
    /// Bounded is checked first; queue-backing is only queried on the bounded
    /// view. The probe has no side effects and nothing is cached.
    pub fn probe(pool: &dyn ThreadPool) -> Self {
        match pool.as_sized() {
            Some(sized) => Self {
                bounded: true,
                queued: sized.as_queued().is_some(),
            },
            None => Self::default(),
        }
    }

    /// Gauge names a binder registers for these capabilities, in
    /// registration order.
    pub fn gauge_names(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(5);
        if self.bounded {
            names.push(CONFIG_MIN);
            names.push(CONFIG_MAX);
            if self.queued {
                names.push(BUSY);
            }
        }
        names.push(CURRENT);
        names.push(IDLE);
        names
    }
}
