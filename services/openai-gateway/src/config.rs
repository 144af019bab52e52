//! Configuration types and loading
//!
//! Server settings come from an optional TOML file with env var overlays
//! (`PORT` overrides the listen port, as deployments of the original service
//! expect). Credentials never appear here; they are environment-only and
//! loaded by the pool (`cookie_pool::CookieSources`).

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub stream: StreamConfig,
}

/// HTTP server settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// Cookie pool settings
#[derive(Debug, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_init_timeout")]
    pub session_init_timeout_secs: u64,
    /// Selection policy tag; unrecognized tags fall back to round_robin.
    #[serde(default = "default_policy")]
    pub policy: String,
}

/// Pseudo-streaming settings
#[derive(Debug, Deserialize)]
pub struct StreamConfig {
    /// Pacing delay between word chunks.
    #[serde(default = "default_stream_delay_ms")]
    pub delay_ms: u64,
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:50014".parse().expect("static addr")
}

fn default_max_connections() -> usize {
    1000
}

fn default_init_timeout() -> u64 {
    30
}

fn default_policy() -> String {
    "round_robin".into()
}

fn default_stream_delay_ms() -> u64 {
    50
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            session_init_timeout_secs: default_init_timeout(),
            policy: default_policy(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_stream_delay_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// A missing file is not an error; every field has a default. `PORT`
    /// overrides the listen port regardless of source.
    pub fn load(path: &Path) -> common::Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<Config>(&contents)?
        } else {
            Config::default()
        };

        if config.pool.session_init_timeout_secs == 0 {
            return Err(common::Error::Config(
                "session_init_timeout_secs must be greater than 0".into(),
            ));
        }

        if config.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        if let Ok(port) = std::env::var("PORT") {
            let port: u16 = port
                .parse()
                .map_err(|_| common::Error::Config(format!("PORT must be a port number: {port}")))?;
            config.server.listen_addr.set_port(port);
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("gemini-gateway.toml")
    }
}
