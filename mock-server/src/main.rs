use std::sync::Arc;

use mock_server::MockState;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let username = std::env::var("INOCORE_USERNAME").unwrap_or_else(|_| "daemon@localhost".to_string());
    let password = std::env::var("INOCORE_PASSWORD").unwrap_or_else(|_| "daemon2k22".to_string());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, %username, "mock InoCore listening");
    mock_server::run(listener, Arc::new(MockState::new(&username, &password))).await
}
