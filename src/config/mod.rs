//! # Configuration
//!
//! Controller and server settings loaded from environment variables.
//!
//! - `controller.rs` - reconciliation, Vault client and watch settings
//! - `server.rs` - metrics/probe HTTP server settings

mod controller;
mod server;

pub use controller::{ControllerConfig, WatchScope};
pub use server::ServerConfig;
