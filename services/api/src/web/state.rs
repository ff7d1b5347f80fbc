//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use finance_assistant_core::{RandomSource, Taxonomy};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers. The taxonomy is read-only at runtime, so connections share one
/// copy without locking; each WebSocket connection builds its own engine
/// (and therefore its own conversation) from these parts.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub taxonomy: Arc<Taxonomy>,
    pub random: Arc<dyn RandomSource>,
}
