//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing backends)
//! - Validate addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Rule shape and socket collisions are checked when the table is built

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::{ProxyConfig, SubdomainPolicy};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener bind address `{0}` is invalid")]
    InvalidBindAddress(String),

    #[error("route name `{0}` is used more than once")]
    DuplicateRoute(String),

    #[error("backend name `{0}` is used more than once")]
    DuplicateBackend(String),

    #[error("backend `{backend}` has an invalid address `{address}`")]
    InvalidBackendAddress { backend: String, address: String },

    #[error("route `{route}` references unknown backend `{backend}`")]
    UnknownBackend { route: String, backend: String },

    #[error("default backend `{0}` is not declared")]
    UnknownDefaultBackend(String),

    #[error("route `{0}` matches any host and cannot set a subdomain policy")]
    WildcardWithSubdomains(String),

    #[error("route `{0}` matches any host and any path; use router.default_backend instead")]
    CatchAllRoute(String),

    #[error("a default backend is required")]
    MissingDefault,
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.listener.bind_address.clone()));
    }

    let mut backend_names = HashSet::new();
    for backend in &config.backends {
        if !backend_names.insert(backend.name.as_str()) {
            errors.push(ValidationError::DuplicateBackend(backend.name.clone()));
        }
        if backend.address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidBackendAddress {
                backend: backend.name.clone(),
                address: backend.address.clone(),
            });
        }
    }

    let mut route_names = HashSet::new();
    let mut referenced = HashSet::new();
    for route in &config.routes {
        if !route_names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }
        if backend_names.contains(route.backend.as_str()) {
            referenced.insert(route.backend.as_str());
        } else {
            errors.push(ValidationError::UnknownBackend {
                route: route.name.clone(),
                backend: route.backend.clone(),
            });
        }
        if route.host_pattern().is_none() {
            if route.subdomains != SubdomainPolicy::Exclude {
                errors.push(ValidationError::WildcardWithSubdomains(route.name.clone()));
            } else if route.path_segments().is_none() {
                errors.push(ValidationError::CatchAllRoute(route.name.clone()));
            }
        }
    }

    match &config.router.default_backend {
        Some(name) if !backend_names.contains(name.as_str()) => {
            errors.push(ValidationError::UnknownDefaultBackend(name.clone()));
        }
        Some(name) => {
            referenced.insert(name.as_str());
        }
        None if config.router.require_default => errors.push(ValidationError::MissingDefault),
        None => {}
    }

    for backend in &config.backends {
        if !referenced.contains(backend.name.as_str()) {
            tracing::warn!(backend = %backend.name, "Backend is not referenced by any route");
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
