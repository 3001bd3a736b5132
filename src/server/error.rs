//! Error types for the completion client and the `/analyze_product`
//! endpoint, with their HTTP status mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Failures of the upstream text-completion service.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Completion request timed out")]
    Timeout,

    #[error("Completion request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Invalid response from completion service: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CompletionError::Timeout
        } else {
            CompletionError::Request(e)
        }
    }
}

/// Errors surfaced by `POST /analyze_product`.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Missing or invalid required fields: product_name (str), product_ingredients (str/list), product_nutrients (dict)")]
    InvalidFields,

    #[error("Invalid input structure")]
    InvalidInput,

    #[error("Invalid response from AI")]
    InvalidUpstreamResponse,

    #[error("{0}")]
    Internal(String),
}

impl From<CompletionError> for AnalyzeError {
    fn from(e: CompletionError) -> Self {
        match e {
            CompletionError::InvalidResponse(_) => AnalyzeError::InvalidUpstreamResponse,
            other => AnalyzeError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let status = match self {
            AnalyzeError::InvalidFields | AnalyzeError::InvalidInput => StatusCode::BAD_REQUEST,
            AnalyzeError::InvalidUpstreamResponse => StatusCode::BAD_GATEWAY,
            AnalyzeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
