/// Configuration management for the Gaterway gateway
///
/// Handles server configuration, resource database location, and gateway
/// runtime parameters.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Request pipeline configuration
    pub gateway: GatewayConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Resource database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file holding every resource (default: "data/gaterway.db")
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Cache process results for resources with a ttl
    pub cache_enabled: bool,
    /// Output format when the request has no usable Accept header
    pub default_format: String,
    /// Largest accepted request body, in bytes
    pub max_body: usize,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("GATERWAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("GATERWAY_PORT")
                    .unwrap_or_else(|_| "3005".to_string())
                    .parse()
                    .unwrap_or(3005),
            },
            database: DatabaseConfig {
                path: std::env::var("GATERWAY_DATABASE")
                    .unwrap_or_else(|_| "data/gaterway.db".to_string()),
            },
            gateway: GatewayConfig {
                cache_enabled: std::env::var("GATERWAY_CACHE")
                    .map(|v| !matches!(v.trim().to_lowercase().as_str(), "0" | "false" | "off" | "no"))
                    .unwrap_or(true),
                default_format: std::env::var("GATERWAY_DEFAULT_FORMAT")
                    .unwrap_or_else(|_| "json".to_string()),
                max_body: 2 * 1024 * 1024,
            },
        }
    }
}
