//! Blocking client for the InoCore REST API.
//!
//! # Overview
//! `Connector` acquires a bearer token from `POST {api_url}/token` with HTTP
//! Basic credentials, renews it once it expires, and wraps GET/POST/PUT/DELETE
//! calls. Successful responses are checked against the InoCore envelope
//! (`{"statusCode": ..., "data": ...}`) and returned whole.
//!
//! ```no_run
//! use inocore_connect::{Connector, ConnectorConfig, QueryParams};
//!
//! # fn main() -> inocore_connect::Result<()> {
//! let mut core = Connector::new(ConnectorConfig::new(
//!     "https://core.example.com",
//!     "daemon@localhost",
//!     "secret",
//!     "my_project",
//! ))?;
//! let params = QueryParams::new().list("status", ["active", "pending"]);
//! let reply = core.get("v1/daemons", Some(&params))?;
//! println!("{reply:?}");
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - Token state lives in the connector; calls that may refresh it take
//!   `&mut self`.
//! - All network I/O goes through the `Transport` trait. `UreqTransport` is
//!   the default; tests script responses instead.
//! - Failures are typed per kind in `ConnectError`; nothing is retried.

pub mod config;
pub mod connector;
pub mod error;
pub mod http;
pub mod query;
pub mod response;
pub mod token;
pub mod transport;

pub use config::ConnectorConfig;
pub use connector::{Connector, USER_AGENT};
pub use error::{ConnectError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use query::{build_query_string, QueryItem, QueryParams, QueryValue, Scalar};
pub use response::{parse_response, Envelope, Reply, SUCCESS_STATUSES};
pub use token::parse_expiry;
pub use transport::{Transport, UreqTransport};
