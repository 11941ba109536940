//! Response envelope validation.
//!
//! Every InoCore resource response is wrapped as
//! `{"statusCode": ..., "data": {...}}`, or carries an `error` object instead
//! of (or inside) `data`. `parse_response` accepts only the first form and
//! hands back the whole envelope untouched.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConnectError, Result};
use crate::http::HttpResponse;

const INVALID: &str = "invalid response";

/// Statuses treated as success by resource calls.
pub const SUCCESS_STATUSES: [u16; 5] = [200, 201, 202, 203, 204];

/// A validated response envelope, exactly as the server sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Envelope(Value);

impl Envelope {
    pub fn status_code(&self) -> &Value {
        &self.0["statusCode"]
    }

    pub fn data(&self) -> &Value {
        &self.0["data"]
    }

    /// Deserializes the `data` payload into a caller type.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(self.data())?)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// What a resource call hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Envelope(Envelope),
    /// Returned when the connector is configured for raw responses.
    Raw(HttpResponse),
}

impl Reply {
    pub fn into_envelope(self) -> Option<Envelope> {
        match self {
            Reply::Envelope(envelope) => Some(envelope),
            Reply::Raw(_) => None,
        }
    }

    pub fn into_raw(self) -> Option<HttpResponse> {
        match self {
            Reply::Raw(response) => Some(response),
            Reply::Envelope(_) => None,
        }
    }
}

/// Checks status, JSON syntax and envelope shape of a resource response.
///
/// `url` is the last requested URL and only feeds error diagnostics.
pub fn parse_response(response: &HttpResponse, url: &str) -> Result<Envelope> {
    let invalid = |detail: String| ConnectError::invalid_response(response, url, detail, INVALID);

    if response.status == 401 {
        return Err(ConnectError::Authorization {
            url: url.to_string(),
        });
    }
    if !SUCCESS_STATUSES.contains(&response.status) {
        return Err(invalid(response.body.clone()));
    }

    let content: Value = serde_json::from_str(&response.body)
        .map_err(|_| invalid(format!("malformed JSON: {}", response.body)))?;

    if content.get("statusCode").is_none() {
        return Err(invalid(content.to_string()));
    }

    let Some(data) = content.get("data") else {
        let detail = content
            .get("error")
            .map(describe_error)
            .unwrap_or_else(|| content.to_string());
        return Err(invalid(detail));
    };

    if let Some(error) = data.get("error") {
        return Err(invalid(describe_error(error)));
    }

    Ok(Envelope(content))
}

/// Prefers `error.description`, then a plain string, then the raw JSON.
fn describe_error(error: &Value) -> String {
    if let Some(description) = error.get("description").and_then(Value::as_str) {
        return description.to_string();
    }
    match error {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
