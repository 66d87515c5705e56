use axum::{
    Json,
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

use crate::api::models::errors::ErrorBody;

/// Upper bound on how much upstream text is echoed back to clients.
pub const MAX_RAW_SNIPPET: usize = 2000;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Malformed or invalid inbound request
    #[error("{message}")]
    BadRequest { message: String },

    /// Request body could not be read, e.g. it exceeded the body limit
    #[error("{message}")]
    RequestBody { status: StatusCode, message: String },

    /// Required configuration is missing or inconsistent
    #[error("{message}")]
    Configuration { message: String },

    /// Upstream answered with a non-success status; `body` is a raw text snippet
    #[error("Upstream API error ({status}): {body}")]
    Upstream { status: StatusCode, body: String },

    /// Upstream could not be reached, timed out, or dropped the connection
    #[error("Upstream request failed: {0}")]
    UpstreamTransport(#[from] reqwest::Error),

    /// Upstream answered successfully but the payload could not be used
    #[error("{message}")]
    InvalidUpstreamBody { message: String, raw: Option<String> },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::RequestBody { status, .. } => *status,
            Error::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Upstream { status, .. } => {
                if status.is_client_error() || status.is_server_error() {
                    *status
                } else {
                    StatusCode::BAD_GATEWAY
                }
            }
            Error::UpstreamTransport(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::InvalidUpstreamBody { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Other(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Diagnostic snippet of whatever the upstream sent, when there is one
    pub fn raw(&self) -> Option<String> {
        match self {
            Error::Upstream { body, .. } => Some(body.clone()),
            Error::InvalidUpstreamBody { raw, .. } => raw.clone(),
            _ => None,
        }
    }
}

/// Truncate upstream text to [`MAX_RAW_SNIPPET`] characters, on a char boundary.
pub fn snippet(text: &str) -> String {
    match text.char_indices().nth(MAX_RAW_SNIPPET) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details - different log levels based on severity
        match &self {
            Error::Configuration { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Upstream { .. } | Error::UpstreamTransport(_) | Error::InvalidUpstreamBody { .. } => {
                tracing::warn!("Upstream generation error: {}", self);
            }
            Error::BadRequest { .. } | Error::RequestBody { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let body = ErrorBody {
            error: self.user_message(),
            raw: self.raw(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

impl From<BytesRejection> for Error {
    fn from(rejection: BytesRejection) -> Self {
        Error::RequestBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
