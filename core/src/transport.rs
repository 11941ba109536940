//! Executes `HttpRequest` values over the network.
//!
//! # Design
//! `Transport` is the only I/O seam of the crate. `UreqTransport` performs a
//! blocking round-trip with a ureq agent configured so that 4xx/5xx statuses
//! come back as data; status interpretation stays with the connector.

use std::time::Duration;

use ureq::tls::TlsConfig;
use ureq::Agent;

use crate::error::{ConnectError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Upper bound on a response body read into memory.
pub const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Performs a single HTTP round-trip.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Blocking transport backed by a ureq agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// `verify_peer = false` accepts any certificate, self-signed included.
    pub fn new(verify_peer: bool, timeout: Option<Duration>) -> Self {
        let tls = TlsConfig::builder()
            .disable_verification(!verify_peer)
            .build();
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .tls_config(tls)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(true, None)
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        // The query string arrives unencoded; let the URL parser escape it.
        let url = url::Url::parse(&request.url)
            .map_err(|e| ConnectError::InvalidUrl(format!("{}: {e}", request.url)))?;
        let url = url.as_str();

        let transport_error = |e: ureq::Error| ConnectError::Transport {
            url: request.url.clone(),
            message: e.to_string(),
        };

        let body = request.body.as_deref();
        let result = match (request.method, body) {
            (HttpMethod::Get, None) => apply_headers(self.agent.get(url), &request.headers).call(),
            (HttpMethod::Get, Some(body)) => {
                apply_headers(self.agent.get(url).force_send_body(), &request.headers)
                    .send(body.as_bytes())
            }
            (HttpMethod::Delete, None) => {
                apply_headers(self.agent.delete(url), &request.headers).call()
            }
            (HttpMethod::Delete, Some(body)) => {
                apply_headers(self.agent.delete(url).force_send_body(), &request.headers)
                    .send(body.as_bytes())
            }
            (HttpMethod::Post, Some(body)) => {
                apply_headers(self.agent.post(url), &request.headers).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => {
                apply_headers(self.agent.post(url), &request.headers).send_empty()
            }
            (HttpMethod::Put, Some(body)) => {
                apply_headers(self.agent.put(url), &request.headers).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => {
                apply_headers(self.agent.put(url), &request.headers).send_empty()
            }
        };
        let mut response = result.map_err(transport_error)?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        // Undecodable bytes are replaced rather than failing the call.
        let bytes = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(transport_error)?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

fn apply_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
