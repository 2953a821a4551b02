//! Request-path error types.
//!
//! Startup and loader code propagates `anyhow::Error`; anything that can go
//! wrong while answering a single request is a [`PredictError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::models::family::Target;

/// Failure of a single prediction request.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    /// Missing, malformed, non-numeric or out-of-domain request field.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A regressor failed on an assembled feature vector.
    #[error("{target} model inference failed: {message}")]
    Inference { target: Target, message: String },
}

impl PredictError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Inference { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body returned for any failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
