//! Groupd - group membership service
//!
//! This crate provides group creation and editing, membership management and
//! the listing of courses and events under groups, exposed over HTTP.

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod group;
pub mod handlers;
pub mod middleware;
pub mod model;
pub mod routes;
pub mod sanitize;
pub mod state;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
