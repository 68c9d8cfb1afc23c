//! Snapshot Engine
//!
//! A snapshot is a point-in-time JSON serialization of the whole store.
//! Once a snapshot lands on disk the command log that preceded it is
//! redundant, so materializing one also truncates the log. The sequence is
//! crash-safe:
//!
//! 1. write the new snapshot to `snapshot.redigo.json.tmp`
//! 2. rename it over `snapshot.redigo.json` (the atomic cut)
//! 3. truncate the append-only log
//! 4. dump the reverse indexes (best effort)
//!
//! A crash between 2 and 3 leaves a correct snapshot plus a stale log;
//! replay simply overwrites the snapshot's values with identical ones. A
//! crash before 2 leaves the previous snapshot untouched.
//!
//! Expired keys are evicted while the snapshot walks the store, so a
//! snapshot never contains a key that is already past its deadline.
//!
//! The loader is the other half: it restores the store from the snapshot
//! file (creating an empty one on first start) and tolerates entry-level
//! corruption. Deadlines never live in snapshots; they are reconstructed
//! from the log.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::DbError;
use crate::storage::{Database, IndexSet, ReverseIndex, Store, Value};

use super::paths::DataPaths;

/// Serializes the live store contents and atomically swaps the snapshot
/// file. Must be called with the store lock held; the caller truncates the
/// log afterwards.
pub fn write_snapshot(paths: &DataPaths, store: &Store) -> std::io::Result<()> {
    let mut entries: BTreeMap<&str, serde_json::Value> = BTreeMap::new();
    for (key, value) in store.iter() {
        entries.insert(
            key,
            serde_json::json!({ "value": serde_json::to_value(value).unwrap_or_default() }),
        );
    }

    let bytes = serde_json::to_vec_pretty(&entries)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let tmp = paths.snapshot_tmp();
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, &paths.snapshot)?;
    Ok(())
}

/// Loads the snapshot file into a list of `(key, value)` pairs.
///
/// A missing file is created empty (`{}`) and yields no entries. An entry
/// that cannot be decoded is logged and skipped; an unparseable outer
/// document is an error, because it means the whole baseline is gone.
pub fn load_snapshot(path: &Path) -> Result<Vec<(String, Value)>, DbError> {
    if !path.exists() {
        fs::write(path, b"{}")?;
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)?;
    let document: BTreeMap<String, serde_json::Value> = serde_json::from_str(&content)
        .map_err(|e| DbError::MalformedRecord(format!("unreadable snapshot: {e}")))?;

    let mut entries = Vec::with_capacity(document.len());
    for (key, raw) in document {
        match decode_entry(&raw) {
            Ok(value) => entries.push((key, value)),
            Err(e) => warn!(key = %key, error = %e, "Skipping malformed snapshot entry"),
        }
    }
    Ok(entries)
}

/// Decodes one snapshot entry. The canonical form is
/// `{"value": <tagged object>}`; the payload may also be a bare JSON
/// primitive, and an entry without the wrapper is accepted too.
fn decode_entry(raw: &serde_json::Value) -> Result<Value, DbError> {
    if let Some(obj) = raw.as_object() {
        if let Some(inner) = obj.get("value") {
            if !obj.contains_key("type") {
                return Value::from_json(inner);
            }
        }
    }
    Value::from_json(raw)
}

/// Writes the reverse indexes to `indexes.redigo.json`.
///
/// The dump is informational: startup rebuilds the indexes from the
/// recovered store, so a failure here only costs the on-disk copy.
pub fn dump_indexes(paths: &DataPaths, indexes: &IndexSet) -> std::io::Result<()> {
    let document = serde_json::json!({
        "value": dump_one(indexes.value_index()),
        "prefix": dump_one(indexes.prefix_index()),
        "suffix": dump_one(indexes.suffix_index()),
    });
    let bytes = serde_json::to_vec_pretty(&document)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    fs::write(&paths.indexes, bytes)
}

fn dump_one(index: &ReverseIndex) -> serde_json::Value {
    let mut entries: BTreeMap<&str, serde_json::Value> = BTreeMap::new();
    for (index_key, members) in index.entries() {
        let keys: BTreeMap<&str, bool> = members.iter().map(|k| (k.as_str(), true)).collect();
        entries.insert(index_key, serde_json::json!({ "keys": keys }));
    }
    serde_json::json!({ "type": index.kind().label(), "entries": entries })
}

/// Handle to the periodic snapshot task. Dropping it stops the task.
#[derive(Debug)]
pub struct SnapshotTimer {
    shutdown_tx: watch::Sender<bool>,
}

impl SnapshotTimer {
    /// Starts the snapshot timer as a background task.
    pub fn start(db: Arc<Database>, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(snapshot_loop(db, interval, shutdown_rx));
        info!(interval_secs = interval.as_secs(), "Snapshot timer started");
        Self { shutdown_tx }
    }

    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for SnapshotTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn snapshot_loop(db: Arc<Database>, interval: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Snapshot timer received shutdown signal");
                    return;
                }
            }
        }

        match db.update_snapshot() {
            Ok(()) => debug!("Snapshot updated"),
            Err(e) => error!(error = %e, "Failed to update snapshot"),
        }
    }
}
