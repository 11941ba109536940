//! Ping an InoCore instance and create a bus configuration.
//!
//! Usage:
//!   INOCORE_URL=http://localhost:8080 cargo run -p inocore-connect --example ping
//!
//! Run `cargo run -p mock-server` first to get a local instance.

use inocore_connect::{Connector, ConnectorConfig};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let url = std::env::var("INOCORE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    let user = std::env::var("INOCORE_USERNAME").unwrap_or_else(|_| "daemon@localhost".to_string());
    let pass = std::env::var("INOCORE_PASSWORD").unwrap_or_else(|_| "daemon2k22".to_string());
    let project_id = std::env::var("INOCORE_PROJECT_ID").unwrap_or_else(|_| "nice_project".to_string());

    let mut core = Connector::new(ConnectorConfig::new(url, user, pass, project_id))?;
    println!("{:#?}", core.get("v1/ping", None)?);

    let data = json!({
        "project_id": core.project_id(),
        "bus_type": "MODBUS",
        "hostname": "192.168.1.2",
        "port": 502,
        "name": "high end DDC",
    });
    println!("{:#?}", core.post("v1/bus_config", Some(&data), None)?);
    Ok(())
}
