//! Database layer
//!
//! SQLite connection management and schema setup using SQLx.

pub mod connection;
pub mod types;

pub use connection::DatabaseManager;
pub use types::DatabaseType;

/// Current Unix timestamp in seconds
pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
