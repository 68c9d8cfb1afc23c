//! Storage Module
//!
//! The in-memory half of the engine: the authoritative store, the tagged
//! value type, the three reverse indexes, the command API that composes
//! them with the persistence layer, and the background expiration sweeper.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Database                          │
//! │                                                          │
//! │   Mutex<Store>              RwLock<IndexSet>             │
//! │   ┌──────────────────┐      ┌──────────────────────┐     │
//! │   │ key → Value      │      │ value  → {keys}      │     │
//! │   │ key → deadline   │      │ prefix → {keys}      │     │
//! │   └──────────────────┘      │ suffix → {keys}      │     │
//! │                             └──────────────────────┘     │
//! │                  │                                       │
//! │                  └── AofWriter (persist module)          │
//! └──────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │
//!              ┌─────────────┴─────────────┐
//!              │    ExpirationSweeper      │
//!              │  (background Tokio task)  │
//!              └───────────────────────────┘
//! ```

pub mod engine;
pub mod expiry;
pub mod index;
pub mod store;
pub mod value;

pub use engine::Database;
pub use expiry::ExpirationSweeper;
pub use index::{IndexKind, IndexSet, ReverseIndex};
pub use store::Store;
pub use value::Value;
