//! Configuration data structures.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files and
//! carry defaults, so an empty file is a valid configuration.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{dispatcher::DEFAULT_MAX_BODY_BYTES, status::StatusTable};

/// Which dispatch path serves requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Per-action axum routes over a [`Service`](crate::ports::Service)
    #[default]
    Dispatcher,
    /// Catch-all axum handler over a hot-swappable router
    Axum,
    /// Raw hyper HTTP/1 accept loop over a hot-swappable router
    Hyper,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportKind::Dispatcher => "dispatcher",
            TransportKind::Axum => "axum",
            TransportKind::Hyper => "hyper",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub transport: TransportKind,
    /// Route prefix the example collection is bound to
    pub prefix: String,
    /// Start with the sample posts
    pub seed: bool,
    pub max_body_bytes: usize,
    pub status: StatusTable,
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            transport: TransportKind::default(),
            prefix: "/posts".to_string(),
            seed: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            status: StatusTable::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Whether moving from `self` to `next` changes anything beyond the
    /// prefix, which is the only setting a running server picks up.
    pub fn requires_restart(&self, next: &ServerConfig) -> bool {
        self.listen_addr != next.listen_addr
            || self.transport != next.transport
            || self.seed != next.seed
            || self.max_body_bytes != next.max_body_bytes
            || self.status != next.status
            || self.logging != next.logging
    }
}
