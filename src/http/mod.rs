//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum app, middleware)
//!     → request.rs (request ID)
//!     → routing::Router (host + path → backend)
//!     → forward to backend, stream response back
//! ```

pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::HttpServer;
