//! Database Engine
//!
//! [`Database`] composes the store, the reverse indexes, and the persistence
//! layer behind one public command surface. Every mutating call follows the
//! same shape:
//!
//! 1. take the store lock
//! 2. mutate the store (and, under the index lock, the indexes)
//! 3. append one command record to the log buffer
//! 4. release
//!
//! Because the record is buffered while the store lock is held, buffer
//! order always matches apply order, and the flusher preserves that order
//! on disk. No command performs file I/O on the hot path.
//!
//! ## Locks
//!
//! | Lock | Covers | Held during |
//! |---|---|---|
//! | store mutex | store + deadline maps | one command; the whole snapshot |
//! | index rwlock | three reverse indexes | writes exclusive, searches shared |
//! | buffer mutex | log buffer | one push; the flush swap |
//! | file mutex | log file handle | a flush batch; truncate |
//!
//! Acquisition order is store, then index, then buffer, then file. The
//! flusher takes only buffer and file, so it never blocks commands for
//! longer than the buffer swap.
//!
//! ## Recovery
//!
//! [`Database::open`] loads the snapshot (the baseline), rebuilds the
//! reverse indexes from it, then replays the append-only log on top.
//! Replay recomputes absolute deadlines from record timestamps, so TTL
//! semantics survive restarts.

use std::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::DbError;
use crate::persist::record::unix_now;
use crate::persist::{aof, snapshot, AofWriter, CommandRecord, DataPaths};

use super::index::IndexSet;
use super::store::Store;
use super::value::Value;

/// The authoritative in-memory database with hybrid persistence.
///
/// Designed to be wrapped in an `Arc` and shared across connection tasks
/// and the background timers. All methods take `&self`.
///
/// # Example
///
/// ```no_run
/// use redigo::persist::DataPaths;
/// use redigo::storage::{Database, Value};
///
/// let paths = DataPaths::resolve(None).unwrap();
/// let db = Database::open(paths).unwrap();
///
/// db.set("name", Value::String("john".into()), 0).unwrap();
/// assert_eq!(db.get("name").unwrap(), Value::String("john".into()));
/// ```
#[derive(Debug)]
pub struct Database {
    store: Mutex<Store>,
    indexes: RwLock<IndexSet>,
    aof: AofWriter,
    paths: DataPaths,
}

impl Database {
    /// Opens the database at the given paths, recovering state from the
    /// snapshot and the append-only log.
    pub fn open(paths: DataPaths) -> Result<Self, DbError> {
        let mut store = Store::new();
        let mut indexes = IndexSet::new();

        let entries = snapshot::load_snapshot(&paths.snapshot)?;
        let snapshot_keys = entries.len();
        for (key, value) in entries {
            store.insert(key, value);
        }
        // The index dump on disk is not trusted; the store is the truth.
        indexes.rebuild(store.iter());

        let aof = AofWriter::open(&paths.aof)?;
        let stats = aof::replay(&paths.aof, &mut store, &mut indexes)?;

        info!(
            snapshot_keys,
            replayed = stats.applied,
            skipped = stats.skipped,
            live_keys = store.len(),
            "Database recovered"
        );

        Ok(Self {
            store: Mutex::new(store),
            indexes: RwLock::new(indexes),
            aof,
            paths,
        })
    }

    // ========================================================================
    // Command API
    // ========================================================================

    /// Stores a new key-value pair, with `ttl > 0` setting an expiry that
    /// many seconds from now.
    ///
    /// # Errors
    ///
    /// [`DbError::KeyAlreadyExists`] if the key is present. Overwrites are
    /// refused; delete first.
    pub fn set(&self, key: &str, value: Value, ttl: i64) -> Result<(), DbError> {
        let now = unix_now();
        let mut store = self.store.lock().unwrap();

        if store.contains(key) {
            return Err(DbError::KeyAlreadyExists);
        }

        store.insert(key.to_string(), value.clone());
        if ttl > 0 {
            store.set_deadline(key, now + ttl);
        } else {
            store.clear_deadline(key);
        }
        self.indexes.write().unwrap().add(key, &value);
        self.aof.append(CommandRecord::set(key, value, ttl, now));
        Ok(())
    }

    /// Retrieves a value by key.
    ///
    /// A key whose deadline has passed is evicted on the spot (with a
    /// DELETE journaled) and reported as [`DbError::KeyExpired`].
    pub fn get(&self, key: &str) -> Result<Value, DbError> {
        let now = unix_now();
        let mut store = self.store.lock().unwrap();

        if let Some(value) = store.remove_if_expired(key, now) {
            self.indexes.write().unwrap().remove(key, &value);
            self.aof.append(CommandRecord::delete(key, now));
            return Err(DbError::KeyExpired);
        }

        store.get(key).cloned().ok_or(DbError::KeyNotFound)
    }

    /// Removes a key.
    ///
    /// # Returns
    ///
    /// `true` if the key existed. A delete of an absent key journals
    /// nothing.
    pub fn delete(&self, key: &str) -> bool {
        let now = unix_now();
        let mut store = self.store.lock().unwrap();

        match store.remove(key) {
            Some(value) => {
                self.indexes.write().unwrap().remove(key, &value);
                self.aof.append(CommandRecord::delete(key, now));
                true
            }
            None => false,
        }
    }

    /// Remaining time to live for a key.
    ///
    /// # Returns
    ///
    /// - `(-1, false)` if the key is absent (an expired key is evicted and
    ///   reported absent)
    /// - `(0, true)` if the key has no expiry
    /// - `(seconds, true)` with `seconds > 0` otherwise
    pub fn get_ttl(&self, key: &str) -> (i64, bool) {
        let now = unix_now();
        let mut store = self.store.lock().unwrap();

        if !store.contains(key) {
            return (-1, false);
        }
        match store.deadline(key) {
            None => (0, true),
            Some(deadline) => {
                let remaining = deadline - now;
                if remaining > 0 {
                    (remaining, true)
                } else {
                    if let Some(value) = store.remove(key) {
                        self.indexes.write().unwrap().remove(key, &value);
                    }
                    (-1, false)
                }
            }
        }
    }

    /// Sets, replaces, or clears the expiry of an existing key.
    ///
    /// `seconds > 0` sets a deadline that far in the future, `seconds == 0`
    /// makes the key persistent, `seconds < 0` is refused.
    ///
    /// # Returns
    ///
    /// `true` if the expiry was applied.
    pub fn set_expiry(&self, key: &str, seconds: i64) -> bool {
        if seconds < 0 {
            return false;
        }
        let now = unix_now();
        let mut store = self.store.lock().unwrap();

        if !store.contains(key) {
            return false;
        }
        if seconds > 0 {
            store.set_deadline(key, now + seconds);
        } else {
            store.clear_deadline(key);
        }
        self.aof.append(CommandRecord::expire(key, seconds, now));
        true
    }

    /// Keys whose value stringifies to `value`. Unordered.
    pub fn search_by_value(&self, value: &str) -> Vec<String> {
        self.indexes.read().unwrap().search_value(value)
    }

    /// Keys starting with `prefix`. Unordered.
    pub fn search_by_key_prefix(&self, prefix: &str) -> Vec<String> {
        self.indexes.read().unwrap().search_prefix(prefix)
    }

    /// Keys ending with `suffix`. Unordered.
    pub fn search_by_key_suffix(&self, suffix: &str) -> Vec<String> {
        self.indexes.read().unwrap().search_suffix(suffix)
    }

    /// Keys containing `substring`. This one is a linear scan of the live
    /// key set, not an index lookup. Unordered.
    pub fn search_by_key_contains(&self, substring: &str) -> Vec<String> {
        let store = self.store.lock().unwrap();
        store
            .keys()
            .filter(|key| key.contains(substring))
            .cloned()
            .collect()
    }

    /// Synchronously materializes a snapshot and truncates the log.
    pub fn force_save(&self) -> Result<(), DbError> {
        self.update_snapshot()
    }

    // ========================================================================
    // Persistence entry points (called by the background tasks)
    // ========================================================================

    /// Materializes a consistent snapshot.
    ///
    /// Holds the store lock for the whole sequence: evict due keys, write
    /// the snapshot to a temp file, rename it into place (the atomic cut),
    /// truncate the log, dump the indexes. The rename precedes the
    /// truncation so a crash in between leaves a correct snapshot plus a
    /// redundant log, never a hole.
    pub fn update_snapshot(&self) -> Result<(), DbError> {
        let mut store = self.store.lock().unwrap();
        let now = unix_now();

        let due = store.due_keys(now);
        if !due.is_empty() {
            let mut indexes = self.indexes.write().unwrap();
            for key in &due {
                if let Some(value) = store.remove(key) {
                    indexes.remove(key, &value);
                }
            }
            debug!(evicted = due.len(), "Evicted due keys during snapshot");
        }

        snapshot::write_snapshot(&self.paths, &store)?;
        self.aof.truncate()?;

        let indexes = self.indexes.read().unwrap();
        if let Err(e) = snapshot::dump_indexes(&self.paths, &indexes) {
            // The dump is rebuilt from the store at startup anyway.
            warn!(error = %e, "Failed to write index dump");
        }
        Ok(())
    }

    /// Flushes the log buffer to disk.
    pub fn flush_aof(&self) -> std::io::Result<usize> {
        self.aof.flush()
    }

    /// Evicts every key whose deadline has passed, journaling a DELETE for
    /// each.
    ///
    /// # Returns
    ///
    /// The number of keys evicted.
    pub fn sweep_expired(&self) -> usize {
        let now = unix_now();
        let mut store = self.store.lock().unwrap();

        let expired = store.expired_keys(now);
        if expired.is_empty() {
            return 0;
        }

        let mut indexes = self.indexes.write().unwrap();
        for key in &expired {
            if let Some(value) = store.remove(key) {
                indexes.remove(key, &value);
            }
            self.aof.append(CommandRecord::delete(key, now));
        }
        expired.len()
    }

    /// Flushes and syncs the log. Call before process exit so the tail of
    /// the buffer is not lost.
    pub fn shutdown(&self) -> std::io::Result<()> {
        let written = self.aof.close()?;
        info!(records = written, "Log flushed on shutdown");
        Ok(())
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Number of keys currently stored (including not-yet-swept expired
    /// keys).
    pub fn len(&self) -> usize {
        self.store.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of log records waiting in the buffer.
    pub fn pending_log_records(&self) -> usize {
        self.aof.pending()
    }

    /// Rewrites a key's deadline directly, bypassing the journal. Test-only
    /// time travel.
    #[cfg(test)]
    pub(crate) fn force_deadline(&self, key: &str, deadline: i64) {
        self.store.lock().unwrap().set_deadline(key, deadline);
    }
}
