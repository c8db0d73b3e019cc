use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Message returned to clients for failures whose detail must not leak
pub const GENERIC_ERROR_MESSAGE: &str = "Internal server error";

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream authentication failed: {0}")]
    UpstreamAuth(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("No recommendations generated")]
    EmptyCompletion,

    #[error("Failed to parse AI response as JSON: {0}")]
    MalformedCompletion(String),

    #[error("Invalid AI response: {0}")]
    InvalidModelOutput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamAuth(_) => StatusCode::UNAUTHORIZED,
            AppError::ExternalApi(_) | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::EmptyCompletion
            | AppError::MalformedCompletion(_)
            | AppError::InvalidModelOutput(_)
            | AppError::Cache(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True when the language model answered but its output was unusable
    pub fn is_model_output_error(&self) -> bool {
        matches!(
            self,
            AppError::EmptyCompletion
                | AppError::MalformedCompletion(_)
                | AppError::InvalidModelOutput(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::NotFound(msg)
            | AppError::InvalidInput(msg)
            | AppError::UpstreamAuth(msg)
            | AppError::ExternalApi(msg) => msg.clone(),
            AppError::HttpClient(e) if e.is_timeout() => "Upstream service timed out".to_string(),
            AppError::HttpClient(_) => "Upstream service unavailable".to_string(),
            AppError::EmptyCompletion
            | AppError::MalformedCompletion(_)
            | AppError::InvalidModelOutput(_) => self.to_string(),
            AppError::Cache(_) | AppError::Internal(_) => GENERIC_ERROR_MESSAGE.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "Request failed");
        } else {
            tracing::warn!(error = %self, status = %status, "Request rejected");
        }

        let body = Json(json!({
            "message": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
