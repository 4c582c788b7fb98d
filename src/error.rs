// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failures talking to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The provider refused the token (expired or revoked).
    #[error("Session rejected: {0}")]
    Rejected(String),

    /// Transport failure, timeout or provider outage.
    #[error("Auth provider unavailable: {0}")]
    Unavailable(String),

    #[error("Cannot log in: Supabase secrets are missing")]
    Offline,
}

/// Failures talking to the remote data store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    #[error("Data store unavailable: {0}")]
    Unavailable(String),

    #[error("Data store rejected the request: {0}")]
    Rejected(String),

    #[error("Unexpected data store response: {0}")]
    Decode(String),

    #[error("Cannot save in offline mode")]
    Offline,
}

/// Failures fetching a weather reading. Never leaves the weather provider.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WeatherError {
    #[error("Weather request failed: {0}")]
    Request(String),

    #[error("Weather response could not be parsed: {0}")]
    Decode(String),
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Auth(AuthError::Unavailable(msg)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "auth_unavailable",
                Some(msg.clone()),
            ),
            AppError::Auth(AuthError::Offline) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "offline",
                Some(self.to_string()),
            ),
            AppError::Auth(err) => (
                StatusCode::UNAUTHORIZED,
                "auth_failed",
                Some(err.to_string()),
            ),
            AppError::Persistence(PersistenceError::Offline) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "offline",
                Some(self.to_string()),
            ),
            AppError::Persistence(err) => {
                tracing::error!(error = %err, "Data store error");
                (StatusCode::BAD_GATEWAY, "persistence_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers and services
pub type Result<T> = std::result::Result<T, AppError>;
