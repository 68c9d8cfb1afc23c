//! Append-Only File Writer
//!
//! Mutations are journaled in two stages so the hot path never touches the
//! disk:
//!
//! 1. `append` pushes one record onto an in-memory buffer (called with the
//!    store lock held, so buffer order matches apply order).
//! 2. `flush` moves the whole buffer out and writes it to the file, one
//!    JSON object per line. A background flusher calls this on a timer;
//!    force-save and shutdown call it directly.
//!
//! Buffer and file are guarded by separate mutexes so producers never wait
//! on I/O: an `append` during a slow flush only contends for the brief
//! buffer swap. The durability window is one flush interval plus the write
//! in progress; that trade buys write throughput without per-operation
//! fsync.
//!
//! If a flush fails mid-batch the remaining records of that batch are
//! dropped and the error is reported. Staleness stays bounded and the next
//! tick starts from a clean buffer.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::storage::{Database, IndexSet, Store};

use super::record::{unix_now, CommandName, CommandRecord};

/// Buffered appender for the command log.
#[derive(Debug)]
pub struct AofWriter {
    buffer: Mutex<Vec<CommandRecord>>,
    file: Mutex<File>,
}

impl AofWriter {
    /// Opens (or creates) the log in append mode.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            buffer: Mutex::new(Vec::new()),
            file: Mutex::new(file),
        })
    }

    /// Queues one record. O(1), no file I/O.
    pub fn append(&self, record: CommandRecord) {
        self.buffer.lock().unwrap().push(record);
    }

    /// Number of records waiting to be flushed.
    pub fn pending(&self) -> usize {
        self.buffer.lock().unwrap().len()
    }

    /// Writes all buffered records to the file in order.
    ///
    /// # Returns
    ///
    /// The number of records written.
    pub fn flush(&self) -> io::Result<usize> {
        let batch = {
            let mut buffer = self.buffer.lock().unwrap();
            if buffer.is_empty() {
                return Ok(0);
            }
            std::mem::take(&mut *buffer)
        };

        let mut file = self.file.lock().unwrap();
        for record in &batch {
            let line = serde_json::to_string(record)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            file.write_all(line.as_bytes())?;
            file.write_all(b"\n")?;
        }
        file.flush()?;
        Ok(batch.len())
    }

    /// Truncates the file to zero length. Called by the snapshot engine
    /// once the snapshot rename has succeeded; the snapshot holds the store
    /// lock, so nothing relevant can be appended concurrently.
    pub fn truncate(&self) -> io::Result<()> {
        let file = self.file.lock().unwrap();
        file.set_len(0)
    }

    /// Flushes any buffered records and syncs the file to disk. Called on
    /// clean shutdown so no tail of the log is lost.
    pub fn close(&self) -> io::Result<usize> {
        let written = self.flush()?;
        self.file.lock().unwrap().sync_all()?;
        Ok(written)
    }
}

/// Counters from one replay pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub applied: usize,
    pub skipped: usize,
}

/// Replays the log on top of `store`/`indexes`.
///
/// Replay intentionally bypasses the live overwrite check: after a crash
/// between snapshot rename and log truncation, the log still holds records
/// already covered by the snapshot, and replaying a SET over an existing
/// key must simply win. Absolute deadlines are recomputed from each
/// record's timestamp, so a SET whose TTL has already run out drops the
/// key instead of restoring it.
///
/// Malformed lines are logged and skipped; a single corrupt record never
/// aborts recovery.
pub fn replay(path: &Path, store: &mut Store, indexes: &mut IndexSet) -> io::Result<ReplayStats> {
    if !path.exists() {
        return Ok(ReplayStats::default());
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let now = unix_now();
    let mut stats = ReplayStats::default();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: CommandRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(e) => {
                warn!(line = line_number + 1, error = %e, "Skipping malformed log record");
                stats.skipped += 1;
                continue;
            }
        };

        match record.name {
            CommandName::Set => match apply_set(store, indexes, &record, now) {
                Ok(()) => stats.applied += 1,
                Err(reason) => {
                    warn!(line = line_number + 1, reason, "Skipping unusable SET record");
                    stats.skipped += 1;
                }
            },
            CommandName::Delete => {
                if let Some(old) = store.remove(&record.key) {
                    indexes.remove(&record.key, &old);
                }
                stats.applied += 1;
            }
            CommandName::Expire => {
                apply_expire(store, indexes, &record, now);
                stats.applied += 1;
            }
        }
    }

    Ok(stats)
}

fn apply_set(
    store: &mut Store,
    indexes: &mut IndexSet,
    record: &CommandRecord,
    now: i64,
) -> Result<(), &'static str> {
    let value = record.value.clone().ok_or("SET record without a value")?;

    // Replace any earlier value for this key, keeping the indexes in step.
    if let Some(old) = store.remove(&record.key) {
        indexes.remove(&record.key, &old);
    }

    let deadline = record
        .ttl
        .filter(|&ttl| ttl > 0)
        .map(|ttl| record.timestamp + ttl);
    if let Some(deadline) = deadline {
        if deadline <= now {
            // Already expired in a previous life of the process.
            return Ok(());
        }
    }

    indexes.add(&record.key, &value);
    store.insert(record.key.clone(), value);
    if let Some(deadline) = deadline {
        store.set_deadline(&record.key, deadline);
    }
    Ok(())
}

fn apply_expire(store: &mut Store, indexes: &mut IndexSet, record: &CommandRecord, now: i64) {
    if !store.contains(&record.key) {
        return;
    }
    let Some(seconds) = record.expire_seconds() else {
        return;
    };

    // Zero meant "clear the deadline" when the command ran; restore the
    // key as persistent. Feeding it through the remaining-time arithmetic
    // below would read it as an instant expiry and delete the key.
    if seconds == 0 {
        store.clear_deadline(&record.key);
        return;
    }

    let remaining = seconds - (now - record.timestamp);
    if remaining > 0 {
        store.set_deadline(&record.key, now + remaining);
    } else if let Some(old) = store.remove(&record.key) {
        indexes.remove(&record.key, &old);
    }
}

/// Handle to the background flusher. Dropping it stops the task.
#[derive(Debug)]
pub struct AofFlusher {
    shutdown_tx: watch::Sender<bool>,
}

impl AofFlusher {
    /// Starts the flusher as a background task.
    pub fn start(db: Arc<Database>, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(flusher_loop(db, interval, shutdown_rx));
        info!(interval_secs = interval.as_secs(), "Log flusher started");
        Self { shutdown_tx }
    }

    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for AofFlusher {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn flusher_loop(db: Arc<Database>, interval: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Log flusher received shutdown signal");
                    return;
                }
            }
        }

        match db.flush_aof() {
            Ok(0) => {}
            Ok(written) => debug!(records = written, "Flushed log buffer"),
            Err(e) => error!(error = %e, "Failed to flush log buffer"),
        }
    }
}
