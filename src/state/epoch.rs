//! Request epochs for superseding in-flight lookups
//!
//! One [`RequestEpoch`] is shared by every lookup spawned for the same logical
//! slot (for example "the linked-page lookup for the hovered thumbnail"). Whoever
//! owns the slot calls [`RequestEpoch::advance`] when a newer request replaces the
//! older ones; pipelines holding an older [`EpochToken`] then find themselves
//! stale at their next suspension point and vanish.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared, monotonically advancing marker of the current request
#[derive(Debug, Clone, Default)]
pub struct RequestEpoch {
    current: Arc<AtomicU64>,
}

impl RequestEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the present epoch value
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Captures a token for the present epoch without superseding anything
    pub fn token(&self) -> EpochToken {
        EpochToken {
            epoch: self.clone(),
            value: self.current(),
        }
    }

    /// Supersedes every outstanding token and returns the token of the new epoch
    pub fn advance(&self) -> EpochToken {
        let value = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        EpochToken {
            epoch: self.clone(),
            value,
        }
    }
}

/// An epoch value captured when a request was made
///
/// The token is current while the epoch it came from still holds the captured
/// value. Comparison is by value, never by identity.
#[derive(Debug, Clone)]
pub struct EpochToken {
    epoch: RequestEpoch,
    value: u64,
}

impl EpochToken {
    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn is_current(&self) -> bool {
        self.epoch.current() == self.value
    }
}

impl fmt::Display for EpochToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value, self.epoch.current())
    }
}
