//! Redigo Server
//!
//! Entry point: load configuration from the environment, recover the
//! database from disk, start the three background tasks, and accept
//! client connections until Ctrl+C. Shutdown flushes the log buffer so a
//! clean exit loses nothing.

use redigo::commands::CommandHandler;
use redigo::config::Config;
use redigo::connection::{handle_connection, ConnectionStats};
use redigo::persist::{AofFlusher, DataPaths, SnapshotTimer};
use redigo::storage::{Database, ExpirationSweeper};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

fn print_banner(config: &Config) {
    println!(
        r#"
        ██████╗ ███████╗██████╗ ██╗ ██████╗  ██████╗
        ██╔══██╗██╔════╝██╔══██╗██║██╔════╝ ██╔═══██╗
        ██████╔╝█████╗  ██║  ██║██║██║  ███╗██║   ██║
        ██╔══██╗██╔══╝  ██║  ██║██║██║   ██║██║   ██║
        ██║  ██║███████╗██████╔╝██║╚██████╔╝╚██████╔╝
        ╚═╝  ╚═╝╚══════╝╚═════╝ ╚═╝ ╚═════╝  ╚═════╝

Redigo v{} - Crash-Recoverable In-Memory Key-Value Store
──────────────────────────────────────────────────────────
Listening on 127.0.0.1:{} (hybrid persistence: log + snapshots)

Use Ctrl+C to shutdown gracefully.
"#,
        redigo::VERSION,
        config.port
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let config = Config::from_env();
    print_banner(&config);

    let paths = DataPaths::resolve(config.root_dir.as_deref())?;
    info!(dir = %paths.dir.display(), "Using data directory");

    // Recover state from the snapshot and the append-only log.
    let db = Arc::new(Database::open(paths)?);

    // Background timers: log flushing, snapshotting, expiration sweeping.
    let _flusher = AofFlusher::start(Arc::clone(&db), config.flush_interval);
    let _snapshots = SnapshotTimer::start(Arc::clone(&db), config.snapshot_interval);
    let _sweeper = ExpirationSweeper::start(Arc::clone(&db), config.expiration_interval);

    let stats = Arc::new(ConnectionStats::new());

    let listener = TcpListener::bind(("127.0.0.1", config.port)).await?;
    info!(port = config.port, "Listening for connections");

    let shutdown = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received, stopping server...");
    };

    tokio::select! {
        _ = accept_loop(listener, Arc::clone(&db), config.default_ttl, stats) => {}
        _ = shutdown => {}
    }

    // Flush the tail of the log before exit.
    if let Err(e) = db.shutdown() {
        error!(error = %e, "Failed to flush log on shutdown");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Accepts connections and spawns a handler task for each.
async fn accept_loop(
    listener: TcpListener,
    db: Arc<Database>,
    default_ttl: i64,
    stats: Arc<ConnectionStats>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler = CommandHandler::new(Arc::clone(&db), default_ttl);
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    handle_connection(stream, addr, handler, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
