//! Connection settings for a `Connector`.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// Everything needed to talk to one InoCore instance.
///
/// Construct with [`ConnectorConfig::new`] and the `with_*` setters, or
/// deserialize it from the embedding application's own configuration.
#[derive(Clone, Deserialize)]
pub struct ConnectorConfig {
    pub api_url: String,
    /// User name or email address.
    pub username: String,
    pub password: String,
    pub project_id: String,
    /// When false, TLS certificates are not verified. Only meant for
    /// self-signed development instances.
    #[serde(default = "default_verify_peer")]
    pub verify_peer: bool,
    /// Return the unprocessed HTTP response instead of the parsed envelope.
    #[serde(default)]
    pub return_raw_response: bool,
    /// Global timeout for each HTTP round-trip, in milliseconds. Zero is
    /// rejected when the connector is built.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_verify_peer() -> bool {
    true
}

impl ConnectorConfig {
    pub fn new(
        api_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            username: username.into(),
            password: password.into(),
            project_id: project_id.into(),
            verify_peer: default_verify_peer(),
            return_raw_response: false,
            timeout_ms: None,
        }
    }

    pub fn with_verify_peer(mut self, verify_peer: bool) -> Self {
        self.verify_peer = verify_peer;
        self
    }

    pub fn with_raw_response(mut self, return_raw_response: bool) -> Self {
        self.return_raw_response = return_raw_response;
        self
    }

    /// Global timeout for each HTTP round-trip, kept at millisecond
    /// precision.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("project_id", &self.project_id)
            .field("verify_peer", &self.verify_peer)
            .field("return_raw_response", &self.return_raw_response)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}
