//! HTTP error response conversion
//!
//! **Preferred handler pattern:** Return `Result<impl IntoResponse, HttpAppError>`.
//! Use `AppError` (or types that implement `Into<HttpAppError>`) for errors so
//! they render consistently (status, body, logging).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use stillcast_core::{AppError, ErrorMetadata, LogLevel};
use stillcast_processing::{EncodeError, FetchError, PolicyError, WorkspaceError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from stillcast-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        let is_production = is_production_env();

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Always hide details in production; elsewhere only for non-sensitive errors.
        let body = if is_production || app_error.is_sensitive() {
            Json(ErrorResponse {
                error: app_error.client_message(),
                details: None,
                error_type: None,
                code: app_error.error_code().to_string(),
                recoverable: app_error.is_recoverable(),
            })
        } else {
            Json(ErrorResponse {
                error: app_error.client_message(),
                details: Some(app_error.detailed_message()),
                error_type: Some(app_error.error_type().to_string()),
                code: app_error.error_code().to_string(),
                recoverable: app_error.is_recoverable(),
            })
        };

        (status, body).into_response()
    }
}

// Convert domain errors to HttpAppError (avoids orphan rule: we impl for local HttpAppError)

impl From<FetchError> for HttpAppError {
    fn from(err: FetchError) -> Self {
        let app = match err {
            FetchError::InvalidUrl(msg) => AppError::InvalidInput(msg),
            FetchError::Timeout => AppError::UpstreamFetch("Download timed out".to_string()),
            FetchError::TooManyRedirects => {
                AppError::UpstreamFetch("Too many redirects".to_string())
            }
            FetchError::Network(e) => AppError::UpstreamFetch(format!("Download failed: {}", e)),
            FetchError::UpstreamStatus(status) => {
                AppError::UpstreamFetch(format!("URL returned status code {}", status))
            }
            FetchError::Policy(e) => AppError::DisallowedMediaType(e.to_string()),
            FetchError::DeclaredTooLarge { declared, limit } => AppError::PayloadTooLarge {
                received: declared,
                limit,
            },
            FetchError::TooLarge { received, limit } => {
                AppError::PayloadTooLarge { received, limit }
            }
            FetchError::Io(e) => AppError::Internal(format!("Failed to stage download: {}", e)),
        };
        HttpAppError(app)
    }
}

impl From<PolicyError> for HttpAppError {
    fn from(err: PolicyError) -> Self {
        HttpAppError(AppError::DisallowedMediaType(err.to_string()))
    }
}

impl From<EncodeError> for HttpAppError {
    fn from(err: EncodeError) -> Self {
        HttpAppError(AppError::Encode(err.to_string()))
    }
}

impl From<WorkspaceError> for HttpAppError {
    fn from(err: WorkspaceError) -> Self {
        HttpAppError(AppError::Internal(err.to_string()))
    }
}
