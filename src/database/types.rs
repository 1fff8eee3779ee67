//! Database types and enums

use std::str::FromStr;

/// Supported database backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DatabaseType {
    /// SQLite file on disk
    #[serde(rename = "sqlite")]
    Sqlite,
    /// Private in-memory SQLite database (tests, demos)
    #[serde(rename = "memory")]
    Memory,
}

impl DatabaseType {
    /// Get database type from connection URL
    pub fn from_url(url: &str) -> Result<Self, String> {
        if url == "sqlite::memory:" || url.contains(":memory:") || url.contains("mode=memory") {
            Ok(DatabaseType::Memory)
        } else if url.starts_with("sqlite:") {
            Ok(DatabaseType::Sqlite)
        } else {
            Err(format!(
                "Unsupported database URL: {}. Expected sqlite:<path> or sqlite::memory:",
                url
            ))
        }
    }

    /// Maximum pool size for this backend
    pub fn max_connections(&self) -> u32 {
        match self {
            // every connection to :memory: opens a separate database
            DatabaseType::Memory => 1,
            DatabaseType::Sqlite => 5,
        }
    }

    pub fn example_url(&self) -> &'static str {
        match self {
            DatabaseType::Sqlite => "sqlite:cyberquest.db",
            DatabaseType::Memory => "sqlite::memory:",
        }
    }
}

impl Default for DatabaseType {
    fn default() -> Self {
        DatabaseType::Sqlite
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseType::Sqlite => write!(f, "sqlite"),
            DatabaseType::Memory => write!(f, "sqlite (in-memory)"),
        }
    }
}

impl FromStr for DatabaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(DatabaseType::Sqlite),
            "memory" => Ok(DatabaseType::Memory),
            _ => Err(format!(
                "Invalid database type: {}. Supported types: sqlite, memory",
                s
            )),
        }
    }
}
