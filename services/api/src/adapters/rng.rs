//! services/api/src/adapters/rng.rs
//!
//! The production implementation of the core's `RandomSource` port, backed
//! by `rand`'s thread-local generator.

use finance_assistant_core::RandomSource;
use rand::Rng;
use std::time::Duration;

/// Draws from `rand::thread_rng` on every call; holds no state of its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn pick_index(&self, bound: usize) -> usize {
        rand::thread_rng().gen_range(0..bound)
    }

    fn thinking_delay(&self, min: Duration, max: Duration) -> Duration {
        rand::thread_rng().gen_range(min..max)
    }
}
