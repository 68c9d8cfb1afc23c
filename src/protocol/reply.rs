//! Reply Rendering
//!
//! Replies are plain text, one line each. [`Reply::render`] produces the
//! exact bytes for the socket, trailing newline included.

use crate::storage::Value;

/// A response to one client command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// `OK`
    Ok,
    /// A stored value, in its textual form.
    Value(Value),
    /// A bare integer (DELETE/EXPIRE results, TTL seconds).
    Integer(i64),
    /// A key list from a search.
    Keys(Vec<String>),
    /// A free-form status line.
    Message(String),
    /// An error line (`Error: ...`).
    Error(String),
}

impl Reply {
    pub fn message(text: impl Into<String>) -> Self {
        Reply::Message(text.into())
    }

    pub fn error(text: impl std::fmt::Display) -> Self {
        Reply::Error(text.to_string())
    }

    /// Renders the reply as a protocol line.
    pub fn render(&self) -> String {
        match self {
            Reply::Ok => "OK\n".to_string(),
            Reply::Value(value) => format!("{value}\n"),
            Reply::Integer(n) => format!("{n}\n"),
            Reply::Keys(keys) if keys.is_empty() => "No keys found\n".to_string(),
            Reply::Keys(keys) => format!("Found keys: [{}]\n", keys.join(" ")),
            Reply::Message(text) => format!("{text}\n"),
            Reply::Error(text) => format!("Error: {text}\n"),
        }
    }
}
