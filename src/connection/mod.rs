//! Connection Handling
//!
//! Each accepted TCP connection gets its own async task running a
//! read-execute-respond loop over the line protocol. Incoming bytes are
//! accumulated in a `BytesMut` buffer, so partial lines and several
//! commands in one packet both work.
//!
//! ```text
//! TCP listener (main.rs)
//!        │ accept()
//!        ▼ spawn per client
//! ┌─────────────────────────────────────────────────┐
//! │               ConnectionHandler                 │
//! │  read bytes ─> split lines ─> execute ─> reply  │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
