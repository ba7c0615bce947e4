//! Error types for rule compilation and composition.

use thiserror::Error;

use crate::backends::BackendError;

/// Errors raised while compiling or composing the routing table.
///
/// All of these are startup-time failures; resolving a request never fails.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouterError {
    /// A rule violates the domain/mode invariants or is otherwise malformed.
    #[error("invalid rule #{index} `{rule}`: {reason}")]
    Configuration {
        index: usize,
        rule: String,
        reason: String,
    },

    /// Two or more targets declare the same sub-resource.
    #[error(transparent)]
    Collision(#[from] CollisionError),

    /// A default target is required but none was supplied.
    #[error("no default target configured")]
    NoDefault,

    /// A route names a backend that is not declared.
    #[error("route `{route}` references unknown backend `{backend}`")]
    UnknownBackend { route: String, backend: String },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// One sub-resource key claimed by several targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub key: String,
    pub targets: Vec<String>,
}

/// Every duplicate sub-resource found in a single validation pass.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("sub-resource collision: {}", describe(.collisions))]
pub struct CollisionError {
    pub collisions: Vec<Collision>,
}

fn describe(collisions: &[Collision]) -> String {
    collisions
        .iter()
        .map(|c| format!("`{}` claimed by {}", c.key, c.targets.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for routing composition.
pub type RouterResult<T> = Result<T, RouterError>;
