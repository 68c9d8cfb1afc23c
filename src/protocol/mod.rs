//! Line Protocol
//!
//! The client protocol is deliberately plain: one whitespace-delimited
//! command per line in, one text line out. It is convenient to drive with
//! `nc` and trivial to log.
//!
//! ```text
//! > SET user:1 john 30
//! < OK
//! > TTL user:1
//! < 30
//! > SEARCHPREFIX user:
//! < Found keys: [user:1]
//! ```
//!
//! ## Modules
//!
//! - `request`: parses a line into a typed [`Request`]
//! - `reply`: renders a [`Reply`] back into a line

pub mod reply;
pub mod request;

pub use reply::Reply;
pub use request::{parse, ParseError, Request};
