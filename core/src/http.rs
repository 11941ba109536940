//! HTTP request and response values exchanged with a `Transport`.
//!
//! # Design
//! The connector describes every round-trip as plain data: it builds an
//! `HttpRequest`, hands it to its transport, and interprets the returned
//! `HttpResponse`. Keeping the wire types free of any HTTP library lets the
//! token and envelope logic run against a scripted transport in tests.

use std::fmt;
use std::str::FromStr;

use crate::error::ConnectError;

/// HTTP verbs accepted by the InoCore API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
}

impl HttpMethod {
    /// Every supported verb, in the order reported by `InvalidMethod`.
    pub const SUPPORTED: [HttpMethod; 4] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ConnectError;

    /// Matches the verb exactly as spelled; `get` is not `GET`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::SUPPORTED
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ConnectError::InvalidMethod {
                method: s.to_string(),
                allowed: HttpMethod::SUPPORTED
                    .iter()
                    .map(HttpMethod::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Fully-qualified URL, query string included and not yet percent-encoded.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// This is also what callers receive when the connector is configured to
/// return raw responses.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Reason phrase for `status`, empty when unknown.
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_methods() {
        assert_eq!("GET".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("PUT".parse::<HttpMethod>().unwrap(), HttpMethod::Put);
        assert_eq!("POST".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert_eq!("DELETE".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
    }

    #[test]
    fn rejects_unknown_method_and_names_allowed_set() {
        let err = "PATCH".parse::<HttpMethod>().unwrap_err();
        match err {
            ConnectError::InvalidMethod { method, allowed } => {
                assert_eq!(method, "PATCH");
                assert_eq!(allowed, "GET, PUT, POST, DELETE");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn method_names_are_case_sensitive() {
        assert!("get".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let response = HttpResponse {
            status: 200,
            reason: "OK".to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: String::new(),
        };
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("x-missing"), None);
    }
}
