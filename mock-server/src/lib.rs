//! In-memory stand-in for an InoCore instance.
//!
//! Issues bearer tokens for one configured user, guards `/v1/*` behind those
//! tokens and wraps every answer in the InoCore envelope. Counters for token
//! and resource requests let tests assert how often a client authenticates.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

/// Expiry handed out when none is configured.
pub const DEFAULT_EXPIRES_DATE: &str = "2099-01-01T00:00:00";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BusConfig {
    pub id: Uuid,
    pub project_id: String,
    pub bus_type: String,
    pub hostname: String,
    pub port: u16,
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateBusConfig {
    pub project_id: String,
    pub bus_type: String,
    pub hostname: String,
    pub port: u16,
    pub name: String,
}

#[derive(Deserialize)]
pub struct UpdateBusConfig {
    pub bus_type: Option<String>,
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub name: Option<String>,
}

/// Server state shared by all handlers.
pub struct MockState {
    username: String,
    password: String,
    expires_date: Option<String>,
    tokens: RwLock<HashSet<String>>,
    bus_configs: RwLock<HashMap<Uuid, BusConfig>>,
    token_requests: AtomicUsize,
    resource_requests: AtomicUsize,
}

pub type SharedState = Arc<MockState>;

impl MockState {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            expires_date: Some(DEFAULT_EXPIRES_DATE.to_string()),
            tokens: RwLock::new(HashSet::new()),
            bus_configs: RwLock::new(HashMap::new()),
            token_requests: AtomicUsize::new(0),
            resource_requests: AtomicUsize::new(0),
        }
    }

    /// Expiry date reported for issued tokens; `None` leaves it out of the
    /// token response altogether.
    pub fn with_expires_date(mut self, date: Option<&str>) -> Self {
        self.expires_date = date.map(str::to_string);
        self
    }

    pub fn token_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }

    pub fn resource_requests(&self) -> usize {
        self.resource_requests.load(Ordering::SeqCst)
    }
}

pub fn app(state: SharedState) -> Router {
    let v1 = Router::new()
        .route("/ping", get(ping))
        .route("/echo", any(echo))
        .route("/bus_config", get(list_bus_configs).post(create_bus_config))
        .route(
            "/bus_config/{id}",
            get(get_bus_config)
                .put(update_bus_config)
                .delete(delete_bus_config),
        )
        .route("/faults/{kind}", get(fault))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/token", post(issue_token))
        .nest("/v1", v1)
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: SharedState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

fn envelope(status: StatusCode, data: Value) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "statusCode": status.as_u16(), "data": data })))
}

fn error_envelope(status: StatusCode, description: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "statusCode": status.as_u16(),
            "error": { "code": status.as_u16(), "description": description },
        })),
    )
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

async fn issue_token(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    state.token_requests.fetch_add(1, Ordering::SeqCst);

    match basic_credentials(&headers) {
        Some((user, pass)) if user == state.username && pass == state.password => {}
        _ => return error_envelope(StatusCode::UNAUTHORIZED, "invalid credentials").into_response(),
    }

    let token = Uuid::new_v4().simple().to_string();
    state.tokens.write().await.insert(token.clone());
    debug!(token_requests = state.token_requests(), "issued token");

    let mut body = json!({ "token": token });
    if let Some(date) = &state.expires_date {
        body["expires"] = json!({ "date": date, "timezone_type": 3, "timezone": "UTC" });
    }
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn require_bearer(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    state.resource_requests.fetch_add(1, Ordering::SeqCst);

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let known = match token {
        Some(token) => state.tokens.read().await.contains(&token),
        None => false,
    };
    if !known {
        return error_envelope(StatusCode::UNAUTHORIZED, "invalid token").into_response();
    }
    next.run(request).await
}

async fn ping() -> (StatusCode, Json<Value>) {
    envelope(StatusCode::OK, json!({ "pong": true }))
}

async fn echo(
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    let body = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => value,
            Err(_) => return error_envelope(StatusCode::BAD_REQUEST, "body is not JSON"),
        }
    };
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    envelope(
        StatusCode::OK,
        json!({
            "method": method.as_str(),
            "query": query,
            "body": body,
            "content_type": header_value(header::CONTENT_TYPE),
            "user_agent": header_value(header::USER_AGENT),
        }),
    )
}

async fn list_bus_configs(State(state): State<SharedState>) -> (StatusCode, Json<Value>) {
    let configs: Vec<BusConfig> = state.bus_configs.read().await.values().cloned().collect();
    envelope(StatusCode::OK, json!(configs))
}

async fn create_bus_config(
    State(state): State<SharedState>,
    Json(input): Json<CreateBusConfig>,
) -> (StatusCode, Json<Value>) {
    let config = BusConfig {
        id: Uuid::new_v4(),
        project_id: input.project_id,
        bus_type: input.bus_type,
        hostname: input.hostname,
        port: input.port,
        name: input.name,
    };
    state.bus_configs.write().await.insert(config.id, config.clone());
    envelope(StatusCode::CREATED, json!(config))
}

async fn get_bus_config(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> (StatusCode, Json<Value>) {
    match state.bus_configs.read().await.get(&id) {
        Some(config) => envelope(StatusCode::OK, json!(config)),
        None => error_envelope(StatusCode::NOT_FOUND, "bus config not found"),
    }
}

async fn update_bus_config(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateBusConfig>,
) -> (StatusCode, Json<Value>) {
    let mut configs = state.bus_configs.write().await;
    let Some(config) = configs.get_mut(&id) else {
        return error_envelope(StatusCode::NOT_FOUND, "bus config not found");
    };
    if let Some(bus_type) = input.bus_type {
        config.bus_type = bus_type;
    }
    if let Some(hostname) = input.hostname {
        config.hostname = hostname;
    }
    if let Some(port) = input.port {
        config.port = port;
    }
    if let Some(name) = input.name {
        config.name = name;
    }
    envelope(StatusCode::OK, json!(config))
}

async fn delete_bus_config(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> (StatusCode, Json<Value>) {
    match state.bus_configs.write().await.remove(&id) {
        Some(_) => envelope(StatusCode::OK, json!({ "deleted": id })),
        None => error_envelope(StatusCode::NOT_FOUND, "bus config not found"),
    }
}

/// Deliberately malformed responses for exercising client validation.
async fn fault(Path(kind): Path<String>) -> Response {
    match kind.as_str() {
        "no-data" => (StatusCode::OK, Json(json!({ "statusCode": 200 }))).into_response(),
        "data-error" => envelope(StatusCode::OK, json!({ "error": "bad input" })).into_response(),
        "error-envelope" => {
            error_envelope(StatusCode::OK, "project does not exist").into_response()
        }
        "not-json" => (StatusCode::OK, "<html>maintenance</html>").into_response(),
        "server-error" => {
            (StatusCode::INTERNAL_SERVER_ERROR, "upstream unavailable").into_response()
        }
        "binary" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            b"\xff\xfe bad bytes".to_vec(),
        )
            .into_response(),
        _ => error_envelope(StatusCode::NOT_FOUND, "unknown fault").into_response(),
    }
}
