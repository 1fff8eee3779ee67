//! Logging configuration for CyberQuest
//!
//! Structured logging setup with appropriate levels and formatting.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::analysis::AnalysisReport;
use crate::config::Config;

/// Initialize the application logging system
///
/// `RUST_LOG` takes precedence over the configured level. Production uses
/// JSON output; development uses compact console output.
pub fn init_logging(config: &Config) {
    let default_filter = format!(
        "cyberquest={level},tower_http={level},axum::rejection=trace",
        level = config.log_level
    );

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let (json, console) = if config.is_production() {
        (Some(json_layer()), None)
    } else {
        (None, Some(console_layer()))
    };

    // try_init so tests and repeated initialization do not panic
    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(console)
        .try_init();

    if result.is_ok() {
        tracing::info!("Logging system initialized");
    }
}

/// JSON logging layer for production
fn json_layer<S>() -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .boxed()
}

/// Console logging layer for development
fn console_layer<S>() -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_ansi(true)
        .boxed()
}

/// Create a span for request logging
#[macro_export]
macro_rules! request_span {
    ($method:expr, $path:expr) => {
        tracing::info_span!(
            "http_request",
            method = %$method,
            path = %$path,
            status_code = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        )
    };
}

/// Create a span for database operations
#[macro_export]
macro_rules! db_span {
    ($operation:expr, $table:expr) => {
        tracing::debug_span!(
            "database_operation",
            operation = %$operation,
            table = %$table,
            rows_affected = tracing::field::Empty,
        )
    };
}

/// Create a span for content analysis
#[macro_export]
macro_rules! analysis_span {
    ($source:expr, $length:expr) => {
        tracing::debug_span!(
            "threat_analysis",
            source = %$source,
            length = %$length,
            primary_category = tracing::field::Empty,
            risk_score = tracing::field::Empty,
        )
    };
}

/// Log application startup
pub fn log_startup(config: &Config) {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        bind_address = %config.bind_address(),
        "CyberQuest starting up"
    );
}

/// Log authentication event
pub fn log_authentication_event(event: &str, user_id: Option<&str>, success: bool) {
    if success {
        tracing::info!(event = %event, user_id = ?user_id, "Authentication successful");
    } else {
        tracing::warn!(event = %event, user_id = ?user_id, "Authentication failed");
    }
}

/// Log the outcome of a content analysis
pub fn log_threat_analysis(source: &str, report: &AnalysisReport) {
    let primary = report
        .primary_category
        .map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string());

    if report.is_threat {
        tracing::info!(
            source = %source,
            primary_category = %primary,
            risk_score = report.risk_score,
            severity = %report.severity,
            indicators = report.indicators.len(),
            "Threat detected in content"
        );
    } else {
        tracing::debug!(
            source = %source,
            risk_score = report.risk_score,
            "Content analysed, no threat"
        );
    }
}

/// Log game session completion
pub fn log_game_completed(user_id: &str, session_id: &str, game_type: &str, score: i64, xp: i64) {
    tracing::info!(
        user_id = %user_id,
        session_id = %session_id,
        game_type = %game_type,
        score = score,
        xp_earned = xp,
        "Game session completed"
    );
}

/// Log family membership change
pub fn log_family_change(family_id: &str, user_id: &str, change: &str) {
    tracing::info!(
        family_id = %family_id,
        user_id = %user_id,
        change = %change,
        "Family membership changed"
    );
}

/// Log database operation
pub fn log_database_operation(operation: &str, table: &str, rows_affected: Option<u64>) {
    tracing::debug!(
        operation = %operation,
        table = %table,
        rows_affected = ?rows_affected,
        "Database operation completed"
    );
}
