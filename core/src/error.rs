//! Error types for the InoCore connector.
//!
//! # Design
//! Each failure kind gets its own variant so callers can tell a rejected
//! credential (`Authorization`) from a malformed reply (`InvalidResponse`)
//! without string matching. `InvalidResponse` carries the status line and the
//! last attempted URL for diagnostics.

use thiserror::Error;
use tracing::warn;

use crate::http::HttpResponse;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConnectError>;

/// Errors returned by `Connector` operations.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The base URL or a constructed endpoint URL is not a valid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The connector settings cannot be used, e.g. a zero timeout.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The caller asked for a verb other than GET, POST, PUT or DELETE.
    #[error("method \"{method}\" is not supported, must be one of [{allowed}]")]
    InvalidMethod { method: String, allowed: String },

    /// The server answered 401, at the token endpoint or a resource endpoint.
    #[error("failed to authorize at {url}, check credentials")]
    Authorization { url: String },

    /// The response deviated from the expected status or envelope shape.
    #[error("HTTP {status} {reason}: {url}: {detail}")]
    InvalidResponse {
        status: u16,
        reason: String,
        url: String,
        detail: String,
    },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP round-trip failed before a response was received.
    #[error("transport failed for {url}: {message}")]
    Transport { url: String, message: String },
}

impl ConnectError {
    /// Builds an `InvalidResponse` from the offending response and logs it
    /// under `context`.
    pub(crate) fn invalid_response(
        response: &HttpResponse,
        url: &str,
        detail: impl Into<String>,
        context: &str,
    ) -> Self {
        let detail = detail.into();
        warn!(status = response.status, url = %url, detail = %detail, "{context}");
        ConnectError::InvalidResponse {
            status: response.status,
            reason: response.reason.clone(),
            url: url.to_string(),
            detail,
        }
    }
}
