//! # Observability
//!
//! Prometheus counters and histograms for reconcile passes, Secret writes
//! and Vault requests, served by the controller HTTP server on `/metrics`.
//! Tracing is configured once in `runtime::initialization`.

pub mod metrics;
