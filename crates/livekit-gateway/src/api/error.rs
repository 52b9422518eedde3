//! Handler errors and their HTTP mapping

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::error::UpstreamError;

/// Errors a handler can answer with
///
/// Only the fixed `message` ever reaches the caller; upstream detail is
/// logged when the response is built.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed input (400)
    BadRequest(&'static str),

    /// The control-plane call failed (500)
    Upstream {
        message: &'static str,
        source: UpstreamError,
    },

    /// Local failure other than the control plane (500)
    Internal {
        message: &'static str,
        detail: String,
    },

    /// Signature check failed (401, empty body)
    Unauthorized,
}

impl ApiError {
    /// Adapter for `map_err` on control-plane results
    pub fn upstream(message: &'static str) -> impl FnOnce(UpstreamError) -> Self {
        move |source| Self::Upstream { message, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest(message) => message,
            Self::Upstream { message, source } => {
                error!(error = %source, "{}", message);
                message
            }
            Self::Internal { message, detail } => {
                error!(error = %detail, "{}", message);
                message
            }
            Self::Unauthorized => return status.into_response(),
        };

        (status, Json(json!({ "errorMessage": message }))).into_response()
    }
}
