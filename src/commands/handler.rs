//! Command Handler
//!
//! Bridges the line protocol and the engine: parse the request line,
//! execute it against [`Database`], render the reply.
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │   parse()   │───>│  dispatch() │───>│  Database   │
//! └─────────────┘    └─────────────┘    └─────────────┘
//! ```
//!
//! Values arriving over the wire are stored as strings; the typed
//! variants enter through the library API. A SET without an explicit TTL
//! gets the configured default.

use std::sync::Arc;
use tracing::{error, info};

use crate::error::DbError;
use crate::protocol::{parse, Reply, Request};
use crate::storage::{Database, Value};

/// Executes client commands against the shared database.
#[derive(Clone)]
pub struct CommandHandler {
    db: Arc<Database>,
    /// TTL in seconds applied when SET carries none. 0 means never.
    default_ttl: i64,
}

impl CommandHandler {
    pub fn new(db: Arc<Database>, default_ttl: i64) -> Self {
        Self { db, default_ttl }
    }

    /// Executes one request line and returns the response line to send.
    pub fn execute(&self, line: &str) -> String {
        match parse(line) {
            Ok(request) => self.dispatch(request).render(),
            Err(e) => format!("{e}\n"),
        }
    }

    /// Renders an engine error as a reply. Client-triggered outcomes (a
    /// missing key, a refused overwrite) are ordinary traffic; only
    /// persistence failures get a server-side log line.
    fn reply_error(&self, error: DbError) -> Reply {
        if !error.is_client_error() {
            error!(error = %error, "Command failed");
        }
        Reply::error(error)
    }

    fn dispatch(&self, request: Request) -> Reply {
        match request {
            Request::Set { key, value, ttl } => {
                let ttl = ttl.unwrap_or(self.default_ttl);
                match self.db.set(&key, Value::String(value), ttl) {
                    Ok(()) => Reply::Ok,
                    Err(e) => self.reply_error(e),
                }
            }
            Request::Get { key } => match self.db.get(&key) {
                Ok(value) => Reply::Value(value),
                Err(e) => self.reply_error(e),
            },
            Request::Delete { key } => Reply::Integer(self.db.delete(&key) as i64),
            Request::Ttl { key } => {
                let (ttl, exists) = self.db.get_ttl(&key);
                if !exists {
                    Reply::Integer(-2)
                } else if ttl == 0 {
                    Reply::Integer(-1)
                } else {
                    Reply::Integer(ttl)
                }
            }
            Request::Expire { key, seconds } => {
                Reply::Integer(self.db.set_expiry(&key, seconds) as i64)
            }
            Request::Save => match self.db.force_save() {
                Ok(()) => Reply::message("Database saved successfully"),
                Err(e) => self.reply_error(e),
            },
            Request::BgSave => {
                let db = Arc::clone(&self.db);
                tokio::spawn(async move {
                    match db.force_save() {
                        Ok(()) => info!("Background save completed"),
                        Err(e) => error!(error = %e, "Background save failed"),
                    }
                });
                Reply::message("Background saving started")
            }
            Request::SearchValue { value } => Reply::Keys(self.db.search_by_value(&value)),
            Request::SearchPrefix { prefix } => Reply::Keys(self.db.search_by_key_prefix(&prefix)),
            Request::SearchSuffix { suffix } => Reply::Keys(self.db.search_by_key_suffix(&suffix)),
            Request::SearchContains { substring } => {
                Reply::Keys(self.db.search_by_key_contains(&substring))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::DataPaths;

    fn handler_in(dir: &tempfile::TempDir) -> CommandHandler {
        let paths = DataPaths::resolve(Some(dir.path())).unwrap();
        CommandHandler::new(Arc::new(Database::open(paths).unwrap()), 0)
    }

    #[test]
    fn test_set_get_delete_flow() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_in(&dir);

        assert_eq!(handler.execute("SET a 1"), "OK\n");
        assert_eq!(handler.execute("GET a"), "1\n");
        assert_eq!(handler.execute("TTL a"), "-1\n");
        assert_eq!(handler.execute("DELETE a"), "1\n");
        assert_eq!(handler.execute("DELETE a"), "0\n");
        assert_eq!(handler.execute("GET a"), "Error: key not found\n");
    }

    #[test]
    fn test_duplicate_set_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_in(&dir);

        assert_eq!(handler.execute("SET a 1"), "OK\n");
        assert_eq!(handler.execute("SET a 2"), "Error: key already exists\n");
    }

    #[test]
    fn test_search_commands() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_in(&dir);

        handler.execute("SET user:1 john");
        assert_eq!(handler.execute("SEARCHVALUE john"), "Found keys: [user:1]\n");
        assert_eq!(handler.execute("SEARCHPREFIX user:"), "Found keys: [user:1]\n");
        assert_eq!(handler.execute("SEARCHSUFFIX :1"), "Found keys: [user:1]\n");
        assert_eq!(handler.execute("SEARCHCONTAINS ser"), "Found keys: [user:1]\n");
        assert_eq!(handler.execute("SEARCHVALUE jane"), "No keys found\n");
    }

    #[test]
    fn test_ttl_and_expire() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_in(&dir);

        assert_eq!(handler.execute("TTL ghost"), "-2\n");

        handler.execute("SET k v 100");
        let ttl: i64 = handler.execute("TTL k").trim().parse().unwrap();
        assert!(ttl > 0 && ttl <= 100);

        assert_eq!(handler.execute("EXPIRE k 0"), "1\n");
        assert_eq!(handler.execute("TTL k"), "-1\n");
        assert_eq!(handler.execute("EXPIRE k -3"), "0\n");
        assert_eq!(handler.execute("EXPIRE ghost 5"), "0\n");
    }

    #[test]
    fn test_default_ttl_applied() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::resolve(Some(dir.path())).unwrap();
        let handler = CommandHandler::new(Arc::new(Database::open(paths).unwrap()), 90);

        handler.execute("SET k v");
        let ttl: i64 = handler.execute("TTL k").trim().parse().unwrap();
        assert!(ttl > 0 && ttl <= 90);

        // An explicit TTL wins over the default.
        handler.execute("SET other v 10");
        let ttl: i64 = handler.execute("TTL other").trim().parse().unwrap();
        assert!(ttl > 0 && ttl <= 10);
    }

    #[test]
    fn test_save_truncates_log() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::resolve(Some(dir.path())).unwrap();
        let handler = CommandHandler::new(Arc::new(Database::open(paths.clone()).unwrap()), 0);

        handler.execute("SET a 1");
        assert_eq!(handler.execute("SAVE"), "Database saved successfully\n");
        assert_eq!(std::fs::metadata(&paths.aof).unwrap().len(), 0);
        assert!(paths.snapshot.exists());
    }

    #[tokio::test]
    async fn test_bgsave_replies_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::resolve(Some(dir.path())).unwrap();
        let handler = CommandHandler::new(Arc::new(Database::open(paths.clone()).unwrap()), 0);

        handler.execute("SET a 1");
        assert_eq!(handler.execute("BGSAVE"), "Background saving started\n");

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let content = std::fs::read_to_string(&paths.snapshot).unwrap();
        assert!(content.contains("\"a\""));
    }

    #[test]
    fn test_parse_errors_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_in(&dir);

        assert_eq!(handler.execute(""), "Invalid command!\n");
        assert_eq!(handler.execute("PING"), "Unknown command 'PING'.\n");
        assert_eq!(handler.execute("GET"), "Usage: GET {key}\n");
        assert_eq!(
            handler.execute("SET k v soon"),
            "Invalid TTL value: soon\n"
        );
    }
}
