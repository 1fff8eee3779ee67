//! Error handling for CyberQuest
//!
//! Centralized error types and handling for the application.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::models::game_session::GameSessionError;
use crate::models::threat::ThreatError;
use crate::models::user::UserError;
use crate::models::validation::ValidationErrors;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Game session error: {0}")]
    GameSession(#[from] GameSessionError),

    #[error("Threat report error: {0}")]
    Threat(#[from] ThreatError),

    #[error("User record error: {0}")]
    User(#[from] UserError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl AppError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_)
            | AppError::Internal(_)
            | AppError::Serialization(_)
            | AppError::User(_)
            | AppError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::GameSession(e) => match e {
                GameSessionError::NotInProgress(_) | GameSessionError::AlreadyAnswered(_) => {
                    StatusCode::CONFLICT
                }
                GameSessionError::QuestionNotInSession(_)
                | GameSessionError::InvalidOption { .. } => StatusCode::BAD_REQUEST,
                GameSessionError::CorruptRecord { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Threat(e) => match e {
                ThreatError::InvalidTransition { .. } => StatusCode::CONFLICT,
                ThreatError::CorruptRecord { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Analysis(e) => match e {
                AnalysisError::EmptyInput | AnalysisError::InputTooLong { .. } => {
                    StatusCode::BAD_REQUEST
                }
                AnalysisError::InvalidPattern(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DatabaseError",
            AppError::Validation(_) => "ValidationError",
            AppError::Authentication(_) => "AuthenticationError",
            AppError::Forbidden(_) => "Forbidden",
            AppError::NotFound(_) => "NotFound",
            AppError::Conflict(_) => "Conflict",
            AppError::BadRequest(_) => "BadRequest",
            AppError::Internal(_) => "InternalError",
            AppError::Serialization(_) => "SerializationError",
            AppError::GameSession(_) => "GameSessionError",
            AppError::Threat(_) => "ThreatReportError",
            AppError::User(_) => "UserRecordError",
            AppError::Analysis(_) => "AnalysisError",
            AppError::PasswordHash(_) => "PasswordHashError",
        }
    }

    /// Check if this error should be logged as an error vs warning
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Message safe to show to clients
    fn public_message(&self) -> String {
        if self.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "Request failed");
        } else {
            tracing::debug!(error = %self, code = self.error_code(), "Request rejected");
        }

        let timestamp = chrono::Utc::now().timestamp();
        let mut body = json!({
            "error": self.error_code(),
            "message": self.public_message(),
            "timestamp": timestamp
        });

        if let AppError::Validation(ref errors) = self {
            body["details"] = json!(errors.errors);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn authentication_failed(message: &str) -> Self {
        AppError::Authentication(message.to_string())
    }

    pub fn forbidden(message: &str) -> Self {
        AppError::Forbidden(message.to_string())
    }

    pub fn validation_error(field: &str, message: &str) -> Self {
        AppError::Validation(ValidationErrors::single(field, message))
    }

    pub fn not_found(resource: &str) -> Self {
        AppError::NotFound(format!("{} not found", resource))
    }

    pub fn bad_request(message: &str) -> Self {
        AppError::BadRequest(message.to_string())
    }

    pub fn conflict(message: &str) -> Self {
        AppError::Conflict(message.to_string())
    }

    pub fn internal_error(message: &str) -> Self {
        AppError::Internal(message.to_string())
    }
}
