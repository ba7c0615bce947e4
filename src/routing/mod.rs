//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → router.rs (normalize host, split path)
//!     → matcher.rs (walk compiled entries, first match wins)
//!     → Return: owning backend, default backend, or None
//!
//! Rule Compilation (at startup and on reload):
//!     RouteConfig[]
//!     → rule.rs (domain / subdomains / path-only rules)
//!     → table.rs (validate, order by specificity)
//!     → backends::collision (sockets owned by one backend only)
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (label and segment comparisons only)
//! - Deterministic: declaration order does not change which rule wins
//! - First match wins (ordered by specificity)

pub mod matcher;
pub mod router;
pub mod rule;
pub mod table;

pub use matcher::resolve;
pub use router::{RequestTarget, RouteView, Router};
pub use rule::{MatchClass, Rule, SubdomainMode};
pub use table::{Entry, RuleTable, RuleTableBuilder};
