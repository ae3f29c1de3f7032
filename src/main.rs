//! Broadcast WebSocket Chat Relay - Entry Point
//!
//! Starts the TCP listener, wires the directory, delivery registry,
//! broadcaster and session handler together, and accepts connections.

use std::env;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chat_relay::{
    handle_connection, Broadcaster, ChannelRegistry, ConnectionDirectory, MemoryDirectory,
    SessionHandler,
};

/// Default server address
const DEFAULT_ADDR: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    // Get bind address from command line or use default
    let addr = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    // Start TCP listener
    let listener = TcpListener::bind(&addr).await?;
    info!("WebSocket chat relay listening on {}", addr);

    // Wire the collaborators: the directory is the system-of-record for
    // membership, the registry realizes the per-connection push primitive
    let directory: Arc<dyn ConnectionDirectory> = Arc::new(MemoryDirectory::new());
    let registry = Arc::new(ChannelRegistry::new());
    let broadcaster = Broadcaster::new(directory.clone(), registry.clone());
    let session = Arc::new(SessionHandler::new(directory, broadcaster));

    // Connection accept loop
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let session = session.clone();
                let registry = registry.clone();

                // Spawn handler task for each connection
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, session, registry).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
