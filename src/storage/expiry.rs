//! Background Expiration Sweeper
//!
//! Keys past their deadline are removed in two ways:
//!
//! 1. **On access**: GET and TTL evict an expired key the moment they see
//!    it.
//! 2. **In bulk**: this sweeper wakes on a fixed interval and evicts every
//!    key whose deadline has passed, whether or not anyone will ever read
//!    it again.
//!
//! Without the sweeper, a key that expires and is never accessed would sit
//! in memory (and in the indexes) forever. Each bulk eviction is journaled
//! as a DELETE, so a log replayed on a later day reaches the same state.
//!
//! The sweeper is a Tokio task driven by a watch channel; dropping the
//! handle stops it.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use super::engine::Database;

/// Handle to the running sweeper. Dropping it stops the task.
#[derive(Debug)]
pub struct ExpirationSweeper {
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirationSweeper {
    /// Starts the sweeper as a background task.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use redigo::storage::ExpirationSweeper;
    /// use std::time::Duration;
    ///
    /// let sweeper = ExpirationSweeper::start(db.clone(), Duration::from_secs(5));
    /// // runs until the handle is dropped
    /// ```
    pub fn start(db: Arc<Database>, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(sweeper_loop(db, interval, shutdown_rx));
        info!(interval_secs = interval.as_secs(), "Expiration sweeper started");
        Self { shutdown_tx }
    }

    /// Stops the sweeper. Also called when the handle is dropped.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for ExpirationSweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweeper_loop(db: Arc<Database>, interval: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiration sweeper received shutdown signal");
                    return;
                }
            }
        }

        let evicted = db.sweep_expired();
        if evicted > 0 {
            debug!(
                evicted,
                keys_remaining = db.len(),
                "Expired keys evicted"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::record::unix_now;
    use crate::persist::DataPaths;
    use crate::storage::Value;

    fn open_in(dir: &tempfile::TempDir) -> Arc<Database> {
        Arc::new(Database::open(DataPaths::resolve(Some(dir.path())).unwrap()).unwrap())
    }

    #[tokio::test]
    async fn test_sweeper_evicts_past_deadlines() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_in(&dir);

        for i in 0..5 {
            db.set(&format!("dead{i}"), Value::Int(i), 100).unwrap();
            db.force_deadline(&format!("dead{i}"), unix_now() - 10);
        }
        db.set("persistent", Value::Int(99), 0).unwrap();
        assert_eq!(db.len(), 6);

        let _sweeper = ExpirationSweeper::start(Arc::clone(&db), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(db.len(), 1);
        assert!(db.get("persistent").is_ok());
        assert!(db.search_by_value("0").is_empty());
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_in(&dir);

        {
            let _sweeper = ExpirationSweeper::start(Arc::clone(&db), Duration::from_millis(10));
            tokio::time::sleep(Duration::from_millis(30)).await;
        }

        // Sweeper is gone; a key expiring now stays until accessed.
        db.set("k", Value::Int(1), 100).unwrap();
        db.force_deadline("k", unix_now() - 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(db.len(), 1);

        // Lazy eviction still works.
        assert!(db.get("k").is_err());
        assert_eq!(db.len(), 0);
    }
}
