//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Compile router → Check sockets → Publish → Start listener
//!
//! Reload (reload.rs):
//!     New config → Compile router → Check sockets → Atomic swap
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → Stop accepting → Drain connections → Exit
//! ```
//!
//! # Design Decisions
//! - A failed startup is fatal; a failed reload keeps the live table
//! - Ordered shutdown: stop accept, drain, close

pub mod reload;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{serve, StartupError};
