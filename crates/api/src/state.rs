use std::sync::Arc;

use slotbook_messenger::Messenger;

use crate::auth::login_tokens::LoginTokenStore;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: slotbook_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Event bus carrying committed booking transitions to the dispatcher.
    pub event_bus: Arc<slotbook_events::EventBus>,
    /// External messaging collaborator (best-effort pushes).
    pub messenger: Arc<dyn Messenger>,
    /// Ephemeral login credentials keyed by messaging identity.
    pub login_tokens: Arc<LoginTokenStore>,
}
