//! VaultSecret Controller Library
//!
//! Core functionality of the VaultSecret controller, shared by the controller
//! binary, the CRD generator and the integration tests.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod runtime;
