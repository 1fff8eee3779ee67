//! Configuration management for CyberQuest
//!
//! Handles environment variables and application settings.

use serde::{Deserialize, Serialize};
use std::env;
use tracing::{info, warn};

const DEFAULT_TOKEN_SECRET: &str = "change-me-in-production-cyberquest-secret";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Database URL
    pub database_url: String,

    /// Secret used to sign bearer tokens
    pub token_secret: String,

    /// Bearer token lifetime in hours
    pub token_ttl_hours: u64,

    /// Environment (development, production)
    pub environment: String,

    /// Log level
    pub log_level: String,

    /// CORS origins (empty means allow all)
    pub cors_origins: Vec<String>,

    /// Request timeout in seconds
    pub request_timeout: u64,

    /// Enable request logging
    pub enable_request_logging: bool,

    /// Maximum members per family
    pub max_family_members: u32,

    /// Maximum entries returned by the leaderboard
    pub leaderboard_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            database_url: "sqlite:cyberquest.db".to_string(),
            token_secret: DEFAULT_TOKEN_SECRET.to_string(),
            token_ttl_hours: 24 * 7,
            environment: "development".to_string(),
            log_level: "info".to_string(),
            cors_origins: vec![],
            request_timeout: 30,
            enable_request_logging: true,
            max_family_members: 8,
            leaderboard_limit: 50,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Server configuration
        if let Ok(host) = env::var("CYBERQUEST_HOST") {
            config.host = host;
        }

        if let Ok(port) = env::var("CYBERQUEST_PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }

        // Database configuration
        if let Ok(database_url) = env::var("CYBERQUEST_DATABASE_URL") {
            config.database_url = database_url;
        }

        // Authentication
        if let Ok(token_secret) = env::var("CYBERQUEST_TOKEN_SECRET") {
            config.token_secret = token_secret;
        }

        if let Ok(ttl) = env::var("CYBERQUEST_TOKEN_TTL_HOURS") {
            config.token_ttl_hours = ttl.parse().map_err(|_| ConfigError::InvalidTokenTtl(ttl))?;
        }

        // Environment
        if let Ok(environment) = env::var("CYBERQUEST_ENVIRONMENT") {
            config.environment = environment;
        }

        // Logging
        if let Ok(log_level) = env::var("CYBERQUEST_LOG_LEVEL") {
            config.log_level = log_level;
        }

        // CORS origins
        if let Ok(cors_origins) = env::var("CYBERQUEST_CORS_ORIGINS") {
            config.cors_origins = cors_origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Request timeout
        if let Ok(timeout) = env::var("CYBERQUEST_REQUEST_TIMEOUT") {
            config.request_timeout = timeout
                .parse()
                .map_err(|_| ConfigError::InvalidRequestTimeout(timeout))?;
        }

        // Feature flags
        if let Ok(enable_logging) = env::var("CYBERQUEST_ENABLE_REQUEST_LOGGING") {
            config.enable_request_logging = enable_logging
                .parse()
                .map_err(|_| ConfigError::InvalidBool(enable_logging))?;
        }

        // Game and family limits
        if let Ok(max_members) = env::var("CYBERQUEST_MAX_FAMILY_MEMBERS") {
            config.max_family_members = max_members
                .parse()
                .map_err(|_| ConfigError::InvalidMaxFamilyMembers(max_members))?;
        }

        if let Ok(limit) = env::var("CYBERQUEST_LEADERBOARD_LIMIT") {
            config.leaderboard_limit = limit
                .parse()
                .map_err(|_| ConfigError::InvalidLeaderboardLimit(limit))?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_secret == DEFAULT_TOKEN_SECRET && self.is_production() {
            return Err(ConfigError::InsecureProductionSecret);
        }

        if self.token_secret.len() < 32 {
            return Err(ConfigError::TokenSecretTooShort);
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port.to_string()));
        }

        if self.database_url.is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }

        if self.token_ttl_hours == 0 {
            return Err(ConfigError::InvalidTokenTtl(self.token_ttl_hours.to_string()));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidRequestTimeout(
                self.request_timeout.to_string(),
            ));
        }

        if self.max_family_members < 2 {
            return Err(ConfigError::InvalidMaxFamilyMembers(
                self.max_family_members.to_string(),
            ));
        }

        if self.leaderboard_limit == 0 || self.leaderboard_limit > 500 {
            return Err(ConfigError::InvalidLeaderboardLimit(
                self.leaderboard_limit.to_string(),
            ));
        }

        Ok(())
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Token lifetime in seconds
    pub fn token_ttl_seconds(&self) -> i64 {
        i64::try_from(self.token_ttl_hours.saturating_mul(3600)).unwrap_or(i64::MAX)
    }

    /// Log configuration (excluding sensitive data)
    pub fn log_config(&self) {
        info!("Configuration loaded:");
        info!("  Environment: {}", self.environment);
        info!("  Bind address: {}", self.bind_address());
        info!("  Database URL: {}", self.mask_database_url());
        info!("  Log level: {}", self.log_level);
        info!("  CORS origins: {:?}", self.cors_origins);
        info!("  Token TTL: {}h", self.token_ttl_hours);
        info!("  Request timeout: {}s", self.request_timeout);
        info!("  Request logging: {}", self.enable_request_logging);
        info!("  Max family members: {}", self.max_family_members);

        if self.token_secret == DEFAULT_TOKEN_SECRET {
            warn!("Using default token secret - CHANGE IN PRODUCTION!");
        }
    }

    /// Mask database URL for logging
    fn mask_database_url(&self) -> String {
        if self.database_url.starts_with("sqlite:") {
            self.database_url.clone()
        } else if let Some((scheme, _)) = self.database_url.split_once("://") {
            format!("{}://***", scheme)
        } else {
            "***".to_string()
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Invalid token TTL: {0}")]
    InvalidTokenTtl(String),

    #[error("Invalid request timeout: {0}")]
    InvalidRequestTimeout(String),

    #[error("Invalid boolean value: {0}")]
    InvalidBool(String),

    #[error("Invalid max family members: {0}")]
    InvalidMaxFamilyMembers(String),

    #[error("Invalid leaderboard limit: {0}")]
    InvalidLeaderboardLimit(String),

    #[error("Insecure token secret for production environment")]
    InsecureProductionSecret,

    #[error("Token secret too short (minimum 32 characters)")]
    TokenSecretTooShort,

    #[error("Empty database URL")]
    EmptyDatabaseUrl,
}
