// Rust guideline compliant 2026-10-16

//! Adapters for the transfer-watch binary.
//!
//! Each sub-module implements a port trait defined in the `domain` crate.

pub mod log_alert_sink;
