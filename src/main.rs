//! Presence Engine
//!
//! Tracks which users are online and keeps a capped activity log:
//! - Presence marks from every identified request, with a sliding threshold
//! - Newest-first activity log with search and statistics
//! - Admin dashboard reads cached in Redis
//! - Background pruning and metrics reporting

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use api::{router, AppState};
use presence_core::{Clock, SystemClock};
use store::{StoreBackend, StoreConfig};
use telemetry::{init_tracing, LoggingConfig};
use tracker::{ActivityLogConfig, InMemoryUserDirectory, PresenceConfig, UserDirectory};
use worker::{WorkerConfig, WorkerScheduler};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    store: StoreConfig,

    #[serde(default)]
    presence: PresenceConfig,

    #[serde(default)]
    activity: ActivityLogConfig,

    #[serde(default)]
    workers: WorkerConfig,

    #[serde(default)]
    logging: LoggingConfig,

    /// JSON array of user records for the admin views
    #[serde(default)]
    users_file: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            store: StoreConfig::default(),
            presence: PresenceConfig::default(),
            activity: ActivityLogConfig::default(),
            workers: WorkerConfig::default(),
            logging: LoggingConfig::default(),
            users_file: None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = load_config()?;

    init_tracing(&config.logging);

    info!("Starting Presence Engine v{}", env!("CARGO_PKG_VERSION"));

    info!(
        backend = ?config.store.backend,
        threshold_secs = config.presence.threshold_secs,
        max_logs = config.activity.max_logs,
        "Loaded config"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store = store::connect(&config.store, clock.clone())
        .await
        .context("Failed to connect to store")?;

    if store::health::report_health(store.as_ref()).await {
        info!("Store connection: healthy");
    } else {
        error!("Store connection: unhealthy");
    }

    let users: Arc<dyn UserDirectory> = match &config.users_file {
        Some(path) => {
            let directory = InMemoryUserDirectory::load_json(path)
                .with_context(|| format!("Failed to load users from {}", path))?;
            info!(users = directory.len(), path = %path, "Loaded user directory");
            Arc::new(directory)
        }
        None => {
            warn!("No users file configured, admin user views will be empty");
            Arc::new(InMemoryUserDirectory::new())
        }
    };

    let state = AppState::new(
        store.clone(),
        clock,
        users,
        config.presence.clone(),
        config.activity.clone(),
    );

    let worker_scheduler = Arc::new(WorkerScheduler::new(
        config.workers.clone(),
        store.clone(),
        state.presence.clone(),
    ));
    let worker_handles = worker_scheduler.start();

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");
    for handle in worker_handles {
        handle.abort();
    }

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("PRESENCE")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // The config crate's nested parsing doesn't work reliably with underscored field names
    if let Ok(url) = std::env::var("PRESENCE_REDIS_URL") {
        config.store.redis_url = url;
    }
    if let Ok(backend) = std::env::var("PRESENCE_STORE_BACKEND") {
        config.store.backend = backend
            .parse::<StoreBackend>()
            .map_err(anyhow::Error::msg)
            .context("Invalid PRESENCE_STORE_BACKEND")?;
    }
    if let Ok(threshold) = std::env::var("PRESENCE_ONLINE_THRESHOLD_SECS") {
        config.presence.threshold_secs = threshold
            .parse()
            .context("Invalid PRESENCE_ONLINE_THRESHOLD_SECS")?;
    }
    if let Ok(path) = std::env::var("PRESENCE_USERS_FILE") {
        config.users_file = Some(path);
    }

    config
        .presence
        .validate()
        .context("Invalid presence configuration")?;

    Ok(config)
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
