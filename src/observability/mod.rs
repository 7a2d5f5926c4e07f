//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging through `tracing`; every request carries a
//!   request id on its span
//! - Metrics are cheap facade calls, no-ops until a recorder is installed
//! - No global mutable state beyond the subscriber/recorder the host
//!   chooses to install

pub mod logging;
pub mod metrics;
