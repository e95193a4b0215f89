/// Gaterway: low-code API gateway
///
/// Main entry point for the Gaterway server. Initializes configuration and starts
/// the HTTP server with resource management and gateway call handling.

use gaterway::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Resource management API at /api/resources/*
/// - Processor contracts at /api/processors/*
/// - Gateway calls at /call/{appid}/{*path}
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (GATERWAY_* environment variables, defaults otherwise)
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
