//! # Controller
//!
//! Core controller modules for the VaultSecret controller.
//!
//! - `backoff`: exponential backoff for write conflicts
//! - `filter`: label filter applied to watched resources
//! - `rate_gate`: minimum interval between writes of one Secret
//! - `reconciler`: core reconciliation logic
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod filter;
pub mod rate_gate;
pub mod reconciler;
pub mod server;
