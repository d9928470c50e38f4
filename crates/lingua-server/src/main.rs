//! Lingua server binary.
//!
//! Wires the pieces together: configuration, tracing, the SQLite pool and
//! migrations, the AI gateway client, the push channel, and an axum server
//! with graceful shutdown on SIGINT/SIGTERM.

use lingua_server::{app, config, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Buffered events on the push channel before slow subscribers start
/// dropping.
const PUSH_CHANNEL_CAPACITY: usize = 100;

/// Config file location: first CLI argument, then `LINGUA_CONFIG_PATH`,
/// then `config.toml` in the working directory.
fn locate_config() -> String {
    std::env::args()
        .nth(1)
        .filter(|arg| !arg.trim().is_empty())
        .or_else(|| {
            std::env::var("LINGUA_CONFIG_PATH")
                .ok()
                .filter(|value| !value.trim().is_empty())
        })
        .unwrap_or_else(|| "config.toml".to_string())
}

fn init_tracing(config: &config::Config) {
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn open_database(config: &config::Config) -> lingua_db::DbPool {
    let pool = lingua_db::open_pool(
        &config.database.path,
        lingua_db::PoolSettings {
            busy_timeout_ms: config.database.busy_timeout_ms,
            max_connections: config.database.pool_max_size,
        },
    )
    .expect("could not open the database; check database.path");

    let conn = pool
        .get()
        .expect("no database connection available for migrations");
    match lingua_db::run_migrations(&conn).expect("schema migration failed") {
        0 => tracing::debug!("schema already current"),
        n => tracing::info!(applied = n, "migrated schema"),
    }

    pool
}

#[tokio::main]
async fn main() {
    let config_path = locate_config();
    let config = config::load_config(Some(config_path.as_str()))
        .expect("cannot start without a readable configuration");

    init_tracing(&config);
    tracing::info!(path = %config_path, "configuration resolved");

    if config.gateway.api_key.is_empty() {
        tracing::warn!(
            "no gateway API key configured; transcription, completion, and synthesis will fail \
             (set OPENAI_API_KEY or gateway.api_key)"
        );
    }

    let pool = open_database(&config);

    let gateway = lingua_gateway::OpenAiGateway::new(config.gateway.clone())
        .expect("AI gateway client construction failed");
    let (message_tx, _) = tokio::sync::broadcast::channel(PUSH_CHANNEL_CAPACITY);

    let state = AppState {
        pool,
        jwt_secret: config.auth.jwt_secret.clone(),
        gateway: Arc::new(gateway),
        message_tx,
        client_dir: config.client.dir.clone(),
    };

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let listener = TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("cannot bind {addr}: {e}"));

    tracing::info!(%addr, "lingua server listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("shutdown complete");
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("SIGINT received, shutting down"),
            _ = term.recv() => tracing::info!("SIGTERM received, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("ctrl-c handler");
        tracing::info!("ctrl-c received, shutting down");
    }
}
