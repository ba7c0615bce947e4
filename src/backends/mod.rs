//! Backend subsystem.
//!
//! # Data Flow
//! ```text
//! BackendConfig[]
//!     → pool.rs (BackendSet, name → Arc<Backend>)
//!     → routes resolved against the set (routing::router)
//!     → collision.rs (every referenced backend's sockets checked once)
//!
//! Per request:
//!     routing table → Arc<Backend> → backend.rs (upstream URL)
//! ```
//!
//! # Design Decisions
//! - Backends are opaque to the routing core; the core only needs their
//!   identity and the `SubResources` capability
//! - Collisions fail composition before the table is published

pub mod backend;
pub mod collision;
pub mod pool;

pub use backend::{Backend, BackendError};
pub use collision::{validate, SubResources};
pub use pool::BackendSet;
