//! # Redigo - A Crash-Recoverable In-Memory Key-Value Store
//!
//! Redigo holds its entire dataset in memory, journals every mutation to an
//! append-only log, and periodically compacts that log into a
//! whole-database snapshot. Keys can carry an expiration and are searchable
//! by exact value, key prefix, key suffix, and key substring through three
//! reverse indexes kept in lockstep with the store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            Redigo                               │
//! │                                                                 │
//! │  ┌────────────┐   ┌─────────────┐   ┌─────────────┐             │
//! │  │ TCP Server │──>│ Connection  │──>│  Command    │             │
//! │  │ (Listener) │   │  Handler    │   │  Handler    │             │
//! │  └────────────┘   └─────────────┘   └──────┬──────┘             │
//! │                                            ▼                    │
//! │  ┌──────────────────────────────────────────────────────────┐   │
//! │  │                        Database                          │   │
//! │  │   store + deadlines     reverse indexes      log buffer  │   │
//! │  └──────┬──────────────────────┬────────────────────┬──────┘    │
//! │         │                      │                    │           │
//! │  ┌──────▼──────┐      ┌────────▼────────┐   ┌───────▼───────┐   │
//! │  │  Snapshot   │      │   Expiration    │   │  Log Flusher  │   │
//! │  │   Timer     │      │    Sweeper      │   │               │   │
//! │  └─────────────┘      └─────────────────┘   └───────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persistence
//!
//! Mutations are buffered in memory and flushed to `appendonly.aof` on a
//! timer; the durability window is one flush interval. On a timer (or on
//! SAVE) the whole store is written to `snapshot.redigo.json` via an
//! atomic temp-file rename, after which the log is truncated. Startup
//! loads the snapshot and replays the log on top of it, recomputing TTL
//! deadlines from record timestamps.
//!
//! ## Quick Start
//!
//! ```ignore
//! use redigo::commands::CommandHandler;
//! use redigo::connection::{handle_connection, ConnectionStats};
//! use redigo::persist::DataPaths;
//! use redigo::storage::Database;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let paths = DataPaths::resolve(None).unwrap();
//!     let db = Arc::new(Database::open(paths).unwrap());
//!     let stats = Arc::new(ConnectionStats::new());
//!
//!     let listener = TcpListener::bind("127.0.0.1:6380").await.unwrap();
//!     loop {
//!         let (stream, addr) = listener.accept().await.unwrap();
//!         let handler = CommandHandler::new(Arc::clone(&db), 0);
//!         tokio::spawn(handle_connection(stream, addr, handler, Arc::clone(&stats)));
//!     }
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - `SET key value [ttl]` / `GET key` / `DELETE key`
//! - `TTL key` / `EXPIRE key seconds`
//! - `SAVE` / `BGSAVE`
//! - `SEARCHVALUE value` / `SEARCHPREFIX prefix` / `SEARCHSUFFIX suffix` /
//!   `SEARCHCONTAINS substring`
//!
//! ## Module Overview
//!
//! - [`storage`]: the store, tagged values, reverse indexes, command API,
//!   and the expiration sweeper
//! - [`persist`]: data paths, command records, the append-only log, and
//!   the snapshot engine
//! - [`protocol`]: line protocol parsing and reply rendering
//! - [`commands`]: command dispatch against the engine
//! - [`connection`]: per-client connection tasks
//! - [`config`]: environment-variable configuration

pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod persist;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::CommandHandler;
pub use config::Config;
pub use connection::{handle_connection, ConnectionStats};
pub use error::DbError;
pub use persist::{AofFlusher, DataPaths, SnapshotTimer};
pub use storage::{Database, ExpirationSweeper, Value};

/// The default port Redigo listens on
pub const DEFAULT_PORT: u16 = 6380;

/// Version of Redigo
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
