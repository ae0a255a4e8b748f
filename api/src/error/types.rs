use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use thiserror::Error;

use crate::services::database::DatabaseError;
use crate::services::search::SearchError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Client sent a request the resource refuses, e.g. an id on create
    #[error("Invalid request: {message}")]
    InvalidRequest {
        entity: &'static str,
        key: &'static str,
        message: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid_request(entity: &'static str, key: &'static str, message: impl Into<String>) -> Self {
        AppError::InvalidRequest { entity, key, message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest { .. } | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) | AppError::Server(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::InvalidRequest { .. } | AppError::InvalidInput(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::Server(_) | AppError::Internal(_) => "internal_error",
            AppError::ServiceUnavailable(_) => "service_unavailable",
        }
    }
}

/// JSON error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(rename = "errorKey", skip_serializing_if = "Option::is_none")]
    pub error_key: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Don't expose internal error details
        let message = match &self {
            AppError::Internal(_) | AppError::Server(_) | AppError::Config(_) => {
                tracing::error!(error = %self, details = ?self, "Request failed");
                "Internal error".to_string()
            }
            _ => self.to_string(),
        };

        let alert = match &self {
            AppError::InvalidRequest { entity, key, .. } => Some(FailureAlert { entity: *entity, key: *key }),
            _ => None,
        };
        let (entity, error_key) = match &alert {
            Some(alert) => (Some(alert.entity.to_string()), Some(alert.key.to_string())),
            None => (None, None),
        };

        let body = Json(ErrorResponse {
            error: self.kind().to_string(),
            message,
            entity,
            error_key,
        });

        let mut response = (status, body).into_response();
        if let Some(alert) = alert {
            response.extensions_mut().insert(alert);
        }
        response
    }
}

/// Marker left in the response extensions of a rejected request so the
/// resource layer can emit `X-{app}-error` / `X-{app}-params` headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureAlert {
    pub entity: &'static str,
    pub key: &'static str,
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => AppError::NotFound(msg),
            DatabaseError::ValidationFailed(msg) => AppError::InvalidInput(msg),
            DatabaseError::Timeout(_) | DatabaseError::ConnectionFailed(_) => {
                AppError::ServiceUnavailable(err.to_string())
            }
            _ => AppError::Server(err.to_string()),
        }
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidQuery(msg) => AppError::InvalidInput(msg),
            _ => AppError::Server(err.to_string()),
        }
    }
}
