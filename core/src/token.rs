//! Bearer token state and token-endpoint response handling.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::error::{ConnectError, Result};
use crate::http::HttpResponse;

const FAILED: &str = "token request failed";

/// Cached bearer token. An empty token is never valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TokenState {
    pub token: String,
    /// Epoch seconds after which `token` is stale.
    pub expires_at: i64,
}

impl TokenState {
    pub fn is_stale(&self, now: i64) -> bool {
        self.token.is_empty() || now >= self.expires_at
    }
}

/// Validates a token-endpoint response: 201 with a JSON body carrying
/// `token` and `expires.date`.
pub(crate) fn parse_token_response(response: &HttpResponse, url: &str) -> Result<TokenState> {
    let invalid = |detail: String| ConnectError::invalid_response(response, url, detail, FAILED);

    if response.status == 401 {
        return Err(ConnectError::Authorization {
            url: url.to_string(),
        });
    }
    if response.status != 201 {
        return Err(invalid(format!("could not get token: {}", response.body)));
    }

    let content: Value = serde_json::from_str(&response.body)
        .map_err(|e| invalid(format!("cannot deserialize token: {e}")))?;

    let token = content
        .get("token")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("response has no token".to_string()))?;

    let date = content
        .get("expires")
        .and_then(|e| e.get("date"))
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("token has no expiry date".to_string()))?;

    let expires_at = parse_expiry(date).ok_or_else(|| {
        invalid(format!(
            "expiry date {date:?} is not a valid ISO-8601 timestamp"
        ))
    })?;

    Ok(TokenState {
        token: token.to_string(),
        expires_at,
    })
}

/// Parses an ISO-8601 expiry into epoch seconds.
///
/// Timestamps without an offset are taken as UTC. Accepts `T` or a space
/// between date and time, optional fractional seconds, and a bare date.
pub fn parse_expiry(date: &str) -> Option<i64> {
    let date = date.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.timestamp());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(date, fmt) {
            return Some(dt.timestamp());
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(date, fmt) {
            return Some(naive.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://localhost:8080/token";

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            reason: String::new(),
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn empty_token_is_stale() {
        let state = TokenState {
            token: String::new(),
            expires_at: i64::MAX,
        };
        assert!(state.is_stale(0));
    }

    #[test]
    fn token_is_stale_from_expiry_onwards() {
        let state = TokenState {
            token: "abc".to_string(),
            expires_at: 100,
        };
        assert!(!state.is_stale(99));
        assert!(state.is_stale(100));
        assert!(state.is_stale(101));
    }

    #[test]
    fn parses_valid_token_response() {
        let state = parse_token_response(
            &response(201, r#"{"token":"abc","expires":{"date":"2099-01-01T00:00:00"}}"#),
            URL,
        )
        .unwrap();
        assert_eq!(state.token, "abc");
        assert_eq!(state.expires_at, 4_070_908_800);
    }

    #[test]
    fn unauthorized_maps_to_authorization_error() {
        let err = parse_token_response(&response(401, ""), URL).unwrap_err();
        assert!(matches!(err, ConnectError::Authorization { ref url } if url == URL));
    }

    #[test]
    fn ok_instead_of_created_is_invalid() {
        let err = parse_token_response(
            &response(200, r#"{"token":"abc","expires":{"date":"2099-01-01T00:00:00"}}"#),
            URL,
        )
        .unwrap_err();
        assert!(matches!(err, ConnectError::InvalidResponse { status: 200, .. }));
    }

    #[test]
    fn missing_expiry_date_is_invalid() {
        let err = parse_token_response(&response(201, r#"{"token":"abc","expires":{}}"#), URL)
            .unwrap_err();
        match err {
            ConnectError::InvalidResponse { detail, url, .. } => {
                assert!(detail.contains("expiry"));
                assert_eq!(url, URL);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_token_is_invalid() {
        let err = parse_token_response(
            &response(201, r#"{"expires":{"date":"2099-01-01T00:00:00"}}"#),
            URL,
        )
        .unwrap_err();
        assert!(matches!(err, ConnectError::InvalidResponse { .. }));
    }

    #[test]
    fn non_json_body_is_invalid() {
        let err = parse_token_response(&response(201, "<html>"), URL).unwrap_err();
        assert!(matches!(err, ConnectError::InvalidResponse { .. }));
    }

    #[test]
    fn unparsable_date_is_invalid() {
        let err = parse_token_response(
            &response(201, r#"{"token":"abc","expires":{"date":"next tuesday"}}"#),
            URL,
        )
        .unwrap_err();
        assert!(matches!(err, ConnectError::InvalidResponse { .. }));
    }

    #[test]
    fn expiry_formats() {
        assert_eq!(parse_expiry("1970-01-01T00:01:00Z"), Some(60));
        assert_eq!(parse_expiry("1970-01-01T01:00:00+01:00"), Some(0));
        assert_eq!(parse_expiry("1970-01-01 00:00:10.500000"), Some(10));
        assert_eq!(parse_expiry("1970-01-01T00:00:10.25"), Some(10));
        assert_eq!(parse_expiry("1970-01-02"), Some(86_400));
        assert_eq!(parse_expiry("01/02/1970"), None);
    }
}
