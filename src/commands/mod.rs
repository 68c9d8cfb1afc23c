//! Command Processing Layer
//!
//! Receives request lines from the connection layer, executes them against
//! the database engine, and produces reply lines.
//!
//! ```text
//! Client line
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ protocol::parse │
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │   dispatch + default TTL
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │    Database     │
//! └─────────────────┘
//! ```

pub mod handler;

pub use handler::CommandHandler;
