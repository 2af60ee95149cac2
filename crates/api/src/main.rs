use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slotbook_api::auth::login_tokens::LoginTokenStore;
use slotbook_api::config::ServerConfig;
use slotbook_api::notifications::Dispatcher;
use slotbook_api::router::build_app_router;
use slotbook_api::state::AppState;
use slotbook_api::background;
use slotbook_messenger::{HttpMessenger, Messenger};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slotbook_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = slotbook_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    slotbook_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    slotbook_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Collaborators ---
    let messenger: Arc<dyn Messenger> = Arc::new(HttpMessenger::new(
        config.messenger_base_url.clone(),
        config.internal_token.clone(),
    ));
    let login_tokens = Arc::new(LoginTokenStore::new(config.login_token_ttl));
    let event_bus = Arc::new(slotbook_events::EventBus::default());
    tracing::info!("Event bus created");

    // --- Notification dispatcher ---
    let dispatcher = Dispatcher::new(pool.clone(), Arc::clone(&messenger));
    tokio::spawn(dispatcher.run(event_bus.subscribe()));

    // --- Background jobs ---
    let cancel = CancellationToken::new();
    tokio::spawn(background::reminders::run(
        pool.clone(),
        Arc::clone(&event_bus),
        cancel.clone(),
    ));
    tokio::spawn(background::notification_retention::run(
        pool.clone(),
        cancel.clone(),
    ));
    tokio::spawn(background::login_token_sweep::run(
        Arc::clone(&login_tokens),
        cancel.clone(),
    ));
    tracing::info!("Background jobs started (reminders, retention, token sweep)");

    // --- App state & router ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus,
        messenger,
        login_tokens,
    };
    let app = build_app_router(state, &config);

    // --- Serve ---
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid HOST/PORT combination");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await
        .expect("Server error");
}

/// Resolve on Ctrl-C / SIGTERM, cancelling the background jobs first.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    cancel.cancel();
    // Give the jobs a moment to observe cancellation before the runtime drops.
    tokio::time::sleep(Duration::from_millis(100)).await;
}
