//! Group membership
//!
//! `query` holds the read-only helpers, `service` the mutating operations
//! exposed to remote callers.

pub mod query;
pub mod service;

pub use query::{GroupCursor, GroupFilter, GroupLib};
pub use service::{GroupService, ListingOutcome, SaveOutcome};
