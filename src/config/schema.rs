//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Default target and table options.
    pub router: RouterConfig,

    /// Route definitions mapping requests to backends, in declaration order.
    pub routes: Vec<RouteConfig>,

    /// Backend service definitions.
    pub backends: Vec<BackendConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Table-wide routing options.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Backend receiving requests no route matches.
    pub default_backend: Option<String>,

    /// Refuse to start without a default backend.
    pub require_default: bool,
}

/// Whether a host route also covers subdomains of its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubdomainPolicy {
    /// Only the host itself.
    #[default]
    Exclude,
    /// Only strict subdomains of the host.
    Include,
    /// The host and all of its subdomains.
    Both,
}

/// Route configuration mapping requests to a backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging.
    pub name: String,

    /// Backend name to forward to.
    pub backend: String,

    /// Host to match. Omitted or `"*"` matches any host.
    #[serde(default)]
    pub host: Option<String>,

    /// Subdomain handling for `host`.
    #[serde(default)]
    pub subdomains: SubdomainPolicy,

    /// Path prefix to match, e.g. `/v1/oauth`.
    #[serde(default)]
    pub path_prefix: Option<String>,
}

impl RouteConfig {
    /// Normalized host, or `None` for a route matching any host.
    pub fn host_pattern(&self) -> Option<String> {
        self.host
            .as_deref()
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| h != "*")
    }

    /// Path prefix split into segments; `/` and empty prefixes yield `None`.
    pub fn path_segments(&self) -> Option<Vec<String>> {
        let segments: Vec<String> = self
            .path_prefix
            .as_deref()?
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        (!segments.is_empty()).then_some(segments)
    }
}

/// Backend service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Unique backend identifier.
    pub name: String,

    /// Backend address (e.g., "127.0.0.1:3000").
    pub address: String,

    /// Socket paths this backend owns. Must be unique across backends.
    #[serde(default)]
    pub sockets: Vec<String>,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
