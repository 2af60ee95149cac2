//! Periodic eviction of expired login credentials.
//!
//! Correctness never depends on this: every access to the token store
//! checks the TTL itself. The sweep only keeps abandoned entries from
//! accumulating.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::auth::login_tokens::LoginTokenStore;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(600); // 10 minutes

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(store: Arc<LoginTokenStore>, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Login token sweep started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Login token sweep stopping");
                break;
            }
            _ = interval.tick() => {
                let evicted = store.purge_expired();
                if evicted > 0 {
                    tracing::info!(evicted, "Login token sweep: evicted expired credentials");
                }
            }
        }
    }
}
