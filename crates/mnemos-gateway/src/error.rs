// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error-to-status mapping for gateway responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mnemos_core::MnemosError;
use serde::Serialize;
use tracing::{error, warn};

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Anything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    /// The request itself was unusable (bad JSON, missing value).
    BadRequest(String),
    /// The service rejected or failed the operation.
    Service(MnemosError),
}

impl From<MnemosError> for ApiError {
    fn from(e: MnemosError) -> Self {
        Self::Service(e)
    }
}

impl ApiError {
    /// Status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Service(e) => status_for(e),
        }
    }
}

/// Maps a service error onto an HTTP status.
pub fn status_for(e: &MnemosError) -> StatusCode {
    if e.is_validation() {
        return StatusCode::BAD_REQUEST;
    }
    match e {
        MnemosError::ContextOverflow { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        MnemosError::NotFound { .. } => StatusCode::NOT_FOUND,
        MnemosError::Provider { .. } => StatusCode::BAD_GATEWAY,
        MnemosError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest(message) => message,
            Self::Service(e) => {
                match &e {
                    MnemosError::RecipientMismatch { .. } => {
                        error!(error = %e, "misrouted message reached the gateway");
                    }
                    _ if status.is_server_error() => warn!(error = %e, %status, "request failed"),
                    _ => {}
                }
                e.to_string()
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
