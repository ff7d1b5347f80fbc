//! crates/finance_assistant_core/src/ports.rs
//!
//! Defines the service contracts (traits) at the boundary of the core.
//! The engine's only external dependency is a source of randomness, kept
//! behind a trait so tests can pin both the greeting choice and the
//! simulated thinking delay deterministically.

use std::time::Duration;

/// Provides the two randomized decisions the engine makes: which greeting
/// alternative to use, and how long to "think" before replying.
pub trait RandomSource: Send + Sync {
    /// Returns a uniformly distributed index in `[0, bound)`.
    ///
    /// `bound` is always at least 1; implementations may panic on 0.
    fn pick_index(&self, bound: usize) -> usize;

    /// Returns a delay uniformly distributed in `[min, max)`.
    fn thinking_delay(&self, min: Duration, max: Duration) -> Duration;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::RandomSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// A deterministic source: always picks a fixed index and hands out
    /// delays from a queue (repeating the last entry once exhausted).
    pub struct FixedSource {
        pub index: usize,
        delays: Vec<Duration>,
        cursor: AtomicUsize,
    }

    impl FixedSource {
        pub fn new(index: usize, delays: Vec<Duration>) -> Self {
            Self {
                index,
                delays,
                cursor: AtomicUsize::new(0),
            }
        }
    }

    impl RandomSource for FixedSource {
        fn pick_index(&self, bound: usize) -> usize {
            self.index.min(bound - 1)
        }

        fn thinking_delay(&self, min: Duration, _max: Duration) -> Duration {
            let i = self.cursor.fetch_add(1, Ordering::SeqCst);
            self.delays
                .get(i)
                .or_else(|| self.delays.last())
                .copied()
                .unwrap_or(min)
        }
    }
}
