//! Database connection manager
//!
//! Owns the SQLite pool and creates the schema.

use std::str::FromStr;

use anyhow::Result;
use sqlx::query;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use super::types::DatabaseType;

/// Schema statements, applied in order
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS families (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        owner_id TEXT NOT NULL,
        invite_code TEXT UNIQUE NOT NULL,
        max_members INTEGER NOT NULL DEFAULT 8,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT UNIQUE NOT NULL COLLATE NOCASE,
        email TEXT UNIQUE NOT NULL COLLATE NOCASE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('parent', 'child', 'individual', 'employee', 'admin')),
        display_name TEXT,
        age INTEGER CHECK (age IS NULL OR (age >= 5 AND age <= 120)),
        family_id TEXT REFERENCES families(id) ON DELETE SET NULL,
        xp INTEGER NOT NULL DEFAULT 0 CHECK (xp >= 0),
        level INTEGER NOT NULL DEFAULT 1,
        games_played INTEGER NOT NULL DEFAULT 0,
        threats_reported INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS game_sessions (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        game_type TEXT NOT NULL,
        difficulty TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'in_progress',
        score INTEGER NOT NULL DEFAULT 0 CHECK (score >= 0),
        correct_answers INTEGER NOT NULL DEFAULT 0,
        total_questions INTEGER NOT NULL,
        question_ids TEXT NOT NULL,
        answers TEXT NOT NULL DEFAULT '[]',
        current_streak INTEGER NOT NULL DEFAULT 0,
        xp_earned INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        completed_at INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS threats (
        id TEXT PRIMARY KEY,
        reporter_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        category TEXT NOT NULL,
        severity TEXT NOT NULL CHECK (severity IN ('low', 'medium', 'high', 'critical')),
        status TEXT NOT NULL DEFAULT 'reported',
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        source_url TEXT,
        confidence REAL NOT NULL DEFAULT 0 CHECK (confidence >= 0 AND confidence <= 1),
        indicators TEXT NOT NULL DEFAULT '[]',
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_users_family ON users(family_id)",
    "CREATE INDEX IF NOT EXISTS idx_users_xp ON users(xp DESC)",
    "CREATE INDEX IF NOT EXISTS idx_game_sessions_user ON game_sessions(user_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_threats_reporter ON threats(reporter_id, created_at DESC)",
];

/// Database connection manager
#[derive(Debug, Clone)]
pub struct DatabaseManager {
    pub pool: SqlitePool,
    pub database_type: DatabaseType,
}

impl DatabaseManager {
    /// Create a new database manager with the given connection URL
    pub async fn new(database_url: &str) -> Result<Self> {
        let database_type =
            DatabaseType::from_url(database_url).map_err(|e| anyhow::anyhow!(e))?;

        info!("Connecting to database: {}", database_type);

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| anyhow::anyhow!("Invalid database URL: {}", e))?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options =
            SqlitePoolOptions::new().max_connections(database_type.max_connections());
        if database_type == DatabaseType::Memory {
            // closing the only connection would drop the whole database
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

        debug!("Successfully connected to {} database", database_type);

        Ok(Self {
            pool,
            database_type,
        })
    }

    /// Fresh in-memory database with the schema applied
    pub async fn in_memory() -> Result<Self> {
        let manager = Self::new("sqlite::memory:").await?;
        manager.migrate().await?;
        Ok(manager)
    }

    /// Create tables and indexes
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations for {}", self.database_type);

        for statement in SCHEMA {
            query(statement).execute(&self.pool).await?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Test database connection
    pub async fn test_connection(&self) -> Result<()> {
        query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("Database connection test failed: {}", e))?;

        debug!("Database connection test successful");
        Ok(())
    }

    /// Get connection pool size
    pub fn pool_size(&self) -> u32 {
        self.pool.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let manager = DatabaseManager::in_memory().await.unwrap();
        assert_eq!(manager.database_type, DatabaseType::Memory);
        manager.test_connection().await.unwrap();

        // migrations are idempotent
        manager.migrate().await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&manager.pool)
        .await
        .unwrap();
        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert_eq!(names, vec!["families", "game_sessions", "threats", "users"]);
    }

    #[tokio::test]
    async fn test_rejects_unsupported_url() {
        assert!(DatabaseManager::new("postgres://localhost/db").await.is_err());
    }
}
