//! CyberQuest backend
//!
//! Gamified online-safety service: training games, threat reports, families
//! and a rule-based content-threat classifier behind a REST API.

pub mod analysis;
pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware,
    response::Response,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn, Span};

use crate::analysis::{AnalysisError, ThreatAnalyzer};
use crate::config::Config;
use crate::database::DatabaseManager;
use crate::services::{AuthService, FamilyService, GameService, ThreatService, UserService};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub database: Arc<DatabaseManager>,
    pub auth: AuthService,
    pub users: UserService,
    pub games: GameService,
    pub threats: ThreatService,
    pub families: FamilyService,
}

impl AppState {
    /// Wire services over an already migrated database
    pub fn new(config: Config, database: Arc<DatabaseManager>) -> Result<Self, AnalysisError> {
        let analyzer = Arc::new(ThreatAnalyzer::new()?);
        let users = UserService::new(database.clone());
        let threats = ThreatService::new(database.clone(), analyzer);

        Ok(Self {
            auth: AuthService::new(users.clone(), &config),
            games: GameService::new(database.clone()),
            families: FamilyService::new(
                database.clone(),
                threats.clone(),
                config.max_family_members,
            ),
            users,
            threats,
            config: Arc::new(config),
            database,
        })
    }
}

/// Build the full application router with middleware
pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut app = api::create_router().layer(
        ServiceBuilder::new()
            .layer(cors_layer(&config))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout)))
            .layer(middleware::from_fn(api::middleware::security_headers)),
    );

    if config.enable_request_logging {
        app = app.layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    crate::request_span!(request.method(), request.uri().path())
                })
                .on_response(|response: &Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    span.record("duration_ms", latency.as_millis() as u64);
                    info!("request completed");
                }),
        );
    }

    app.with_state(state)
}

/// CORS policy; no configured origins or `*` allows any origin
fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if config.cors_origins.is_empty() || config.cors_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    cors.allow_origin(origins)
}
