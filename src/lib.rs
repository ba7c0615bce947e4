//! Host and path based request router.
//!
//! A declarative rule set (exact domain, subdomains, path prefix) is
//! compiled once into a specificity-ordered table. Each request resolves
//! to exactly one backend, the default backend, or nothing. Backends that
//! share a process are checked for colliding socket paths before the table
//! goes live.
//!
//! ```
//! use vhost_router::routing::{Rule, RuleTable};
//!
//! let table = RuleTable::build(
//!     vec![
//!         Rule::domain("y.com", "Y"),
//!         Rule::domain("y.com", "Y2").with_path(["v1"]),
//!     ],
//!     Some("X"),
//! )
//! .unwrap();
//!
//! assert_eq!(table.resolve("y.com", &["v1"]), Some(&"Y2"));
//! assert_eq!(table.resolve("y.com", &["v2"]), Some(&"Y"));
//! assert_eq!(table.resolve("z.com", &["v1"]), Some(&"X"));
//! ```

pub mod backends;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use error::{Collision, CollisionError, RouterError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Router, Rule, RuleTable, SubdomainMode};
