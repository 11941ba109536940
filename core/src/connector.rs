//! Authenticated connector for one InoCore instance.
//!
//! # Design
//! `Connector` owns its bearer token and expiry. Every verb first calls
//! `ensure_token`, which talks to `POST {api_url}/token` only when the cached
//! token is missing or expired, then performs exactly one resource call.
//! Methods that may refresh the token take `&mut self`; sharing a connector
//! between threads needs the caller's own lock.

use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;
use tracing::debug;

use crate::config::ConnectorConfig;
use crate::error::{ConnectError, Result};
use crate::http::{HttpMethod, HttpRequest};
use crate::query::{build_query_string, QueryParams};
use crate::response::{parse_response, Reply};
use crate::token::{parse_token_response, TokenState};
use crate::transport::{Transport, UreqTransport};

/// Sent with every request.
pub const USER_AGENT: &str = concat!("inocore-connect/", env!("CARGO_PKG_VERSION"));

const CONTENT_TYPE_JSON: &str = "application/json";

/// Synchronous client for the InoCore REST API.
pub struct Connector<T = UreqTransport> {
    api_url: String,
    username: String,
    password: String,
    project_id: String,
    token: TokenState,
    verify_peer: bool,
    return_raw_response: bool,
    last_requested_url: String,
    transport: T,
}

impl Connector<UreqTransport> {
    /// Builds a connector backed by a ureq agent honouring `verify_peer` and
    /// the configured timeout.
    pub fn new(config: ConnectorConfig) -> Result<Self> {
        let transport = UreqTransport::new(config.verify_peer, config.timeout());
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Connector<T> {
    /// Builds a connector that sends its requests through `transport`.
    pub fn with_transport(config: ConnectorConfig, transport: T) -> Result<Self> {
        if config.timeout() == Some(Duration::ZERO) {
            return Err(ConnectError::Configuration(
                "timeout must be greater than zero".to_string(),
            ));
        }
        let api_url = validate_url(&config.api_url)?
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_url,
            username: config.username,
            password: config.password,
            project_id: config.project_id,
            token: TokenState::default(),
            verify_peer: config.verify_peer,
            return_raw_response: config.return_raw_response,
            last_requested_url: String::new(),
            transport,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn verify_peer(&self) -> bool {
        self.verify_peer
    }

    pub fn return_raw_response(&self) -> bool {
        self.return_raw_response
    }

    /// The cached bearer token, if one has been acquired.
    pub fn token(&self) -> Option<&str> {
        (!self.token.token.is_empty()).then_some(self.token.token.as_str())
    }

    /// Epoch seconds at which the cached token expires; 0 before the first
    /// acquisition.
    pub fn token_expires_at(&self) -> i64 {
        self.token.expires_at
    }

    /// The URL of the most recent request attempt, empty before the first.
    pub fn last_requested_url(&self) -> &str {
        &self.last_requested_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Acquires a new token if none is cached or the cached one expired.
    pub fn ensure_token(&mut self) -> Result<()> {
        if !self.token.is_stale(chrono::Utc::now().timestamp()) {
            return Ok(());
        }

        let url = format!("{}/token", self.api_url);
        let credentials = STANDARD.encode(format!("{}:{}", self.username, self.password));
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: url.clone(),
            headers: vec![
                ("Authorization".to_string(), format!("Basic {credentials}")),
                ("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string()),
                ("User-Agent".to_string(), USER_AGENT.to_string()),
            ],
            body: None,
        };

        self.last_requested_url = url;
        let response = self.transport.execute(&request)?;
        self.token = parse_token_response(&response, &self.last_requested_url)?;

        debug!(url = %self.last_requested_url, expires_at = self.token.expires_at, "acquired token");
        Ok(())
    }

    /// Sends one request to `{api_url}/{endpoint}`.
    ///
    /// `method` must be `GET`, `POST`, `PUT` or `DELETE`. `data` is sent as a
    /// JSON body unless it is null or an empty object or array.
    pub fn call(
        &mut self,
        endpoint: &str,
        method: &str,
        data: Option<&Value>,
        params: Option<&QueryParams>,
    ) -> Result<Reply> {
        let method: HttpMethod = method.parse()?;
        let mut url = format!("{}/{}", self.api_url, endpoint);
        if endpoint.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ConnectError::InvalidUrl(url));
        }
        validate_url(&url)?;

        self.ensure_token()?;

        if let Some(params) = params.filter(|p| !p.is_empty()) {
            url.push_str(&build_query_string(params));
        }

        let body = match data.filter(|d| has_payload(d)) {
            Some(data) => Some(serde_json::to_string(data)?),
            None => None,
        };

        let request = HttpRequest {
            method,
            url: url.clone(),
            headers: vec![
                ("Authorization".to_string(), format!("Bearer {}", self.token.token)),
                ("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string()),
                ("User-Agent".to_string(), USER_AGENT.to_string()),
            ],
            body,
        };

        self.last_requested_url = url;
        let response = self.transport.execute(&request)?;
        debug!(method = %method, url = %self.last_requested_url, status = response.status, "request completed");

        if self.return_raw_response {
            return Ok(Reply::Raw(response));
        }
        parse_response(&response, &self.last_requested_url).map(Reply::Envelope)
    }

    pub fn get(&mut self, endpoint: &str, params: Option<&QueryParams>) -> Result<Reply> {
        self.call(endpoint, HttpMethod::Get.as_str(), None, params)
    }

    pub fn post(
        &mut self,
        endpoint: &str,
        data: Option<&Value>,
        params: Option<&QueryParams>,
    ) -> Result<Reply> {
        self.call(endpoint, HttpMethod::Post.as_str(), data, params)
    }

    pub fn put(
        &mut self,
        endpoint: &str,
        data: Option<&Value>,
        params: Option<&QueryParams>,
    ) -> Result<Reply> {
        self.call(endpoint, HttpMethod::Put.as_str(), data, params)
    }

    pub fn delete(
        &mut self,
        endpoint: &str,
        data: Option<&Value>,
        params: Option<&QueryParams>,
    ) -> Result<Reply> {
        self.call(endpoint, HttpMethod::Delete.as_str(), data, params)
    }
}

impl<T> fmt::Debug for Connector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("project_id", &self.project_id)
            .field("token_expires_at", &self.token.expires_at)
            .field("verify_peer", &self.verify_peer)
            .field("return_raw_response", &self.return_raw_response)
            .field("last_requested_url", &self.last_requested_url)
            .finish_non_exhaustive()
    }
}

/// Requires a parseable URL with a host.
fn validate_url(raw: &str) -> Result<&str> {
    let parsed =
        url::Url::parse(raw).map_err(|e| ConnectError::InvalidUrl(format!("{raw}: {e}")))?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ConnectError::InvalidUrl(format!("{raw}: missing host")));
    }
    Ok(raw)
}

fn has_payload(data: &Value) -> bool {
    match data {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}
