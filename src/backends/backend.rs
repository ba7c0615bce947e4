//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single named upstream service
//! - Carry the sub-resource keys (socket paths) it owns
//! - Build the upstream URL a resolved request is forwarded to

use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;

use url::Url;

use crate::backends::collision::SubResources;
use crate::config::BackendConfig;

/// A single backend service.
///
/// Identity is the backend name: two backends with the same name are the
/// same routing target.
#[derive(Debug, Clone)]
pub struct Backend {
    /// Unique name referenced by routes.
    pub name: String,
    /// The address of the backend.
    pub addr: SocketAddr,
    /// Pre-calculated base URL for performance.
    pub base_url: Url,
    /// Socket paths owned by this backend.
    pub sockets: Vec<String>,
}

impl Backend {
    /// Create a new backend.
    pub fn new(name: impl Into<String>, addr: SocketAddr, sockets: Vec<String>) -> Result<Self, url::ParseError> {
        let base_url = Url::parse(&format!("http://{}", addr))?;
        Ok(Self {
            name: name.into(),
            addr,
            base_url,
            sockets,
        })
    }

    /// Create a backend from its configuration entry.
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let addr: SocketAddr = config.address.parse().map_err(|_| BackendError::InvalidAddress {
            backend: config.name.clone(),
            address: config.address.clone(),
        })?;
        Self::new(config.name.clone(), addr, config.sockets.clone()).map_err(|e| BackendError::InvalidUrl {
            backend: config.name.clone(),
            reason: e.to_string(),
        })
    }

    /// Upstream URL for a request path and query.
    ///
    /// The path replaces the base path and can never change the authority,
    /// even when it starts with `//`.
    pub fn upstream_url(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url.set_query(query);
        url
    }
}

impl PartialEq for Backend {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Backend {}

impl Hash for Backend {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl SubResources for Backend {
    fn sub_resources(&self) -> Vec<String> {
        self.sockets.clone()
    }
}

/// Errors creating a backend from configuration.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend `{backend}` has an invalid address `{address}`")]
    InvalidAddress { backend: String, address: String },

    #[error("backend `{backend}` has an invalid upstream url: {reason}")]
    InvalidUrl { backend: String, reason: String },
}
