use std::sync::Arc;

use medina_events::EventBus;
use medina_market::Market;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: medina_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// The assembled marketplace engine.
    pub market: Arc<Market>,
    /// Centralized event bus for publishing marketplace events.
    pub event_bus: Arc<EventBus>,
}
