//! Persistence Layer
//!
//! Hybrid durability: every mutation is journaled to an append-only log
//! through an in-memory buffer, and a periodic snapshot compacts the log
//! into a whole-database baseline.
//!
//! ```text
//! Command API ──append──> [ buffer ] ──flush (timer)──> appendonly.aof
//!                                                            │
//!      store ──walk (timer / SAVE)──> snapshot.redigo.json ──┤ truncate
//!                                     indexes.redigo.json <──┘ dump
//! ```
//!
//! Recovery at startup runs the same pipeline backwards: load the
//! snapshot, then replay the log on top of it.
//!
//! ## Modules
//!
//! - `paths`: data directory resolution and file naming
//! - `record`: the on-disk command record type
//! - `aof`: buffered log writer, replay, and the background flusher
//! - `snapshot`: snapshot write/load, index dump, and the snapshot timer

pub mod aof;
pub mod paths;
pub mod record;
pub mod snapshot;

pub use aof::{AofFlusher, AofWriter, ReplayStats};
pub use paths::DataPaths;
pub use record::{unix_now, CommandName, CommandRecord};
pub use snapshot::SnapshotTimer;
