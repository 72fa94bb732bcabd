// Rust guideline compliant 2026-10-16

//! In-memory transfer graph.
//!
//! [`AccountRegistry`] owns account identities and risk scores,
//! [`TransferLog`] keeps the append-only event history, and [`GraphStore`]
//! composes both behind a single ingestion entry point that fans each new
//! transfer out to the subscribed detectors.
//!
//! All three types are `Send + Sync` and lock per substructure; there is no
//! global lock.

mod registry;
mod store;
mod transfer_log;

pub use registry::AccountRegistry;
pub use store::{
    DEFAULT_INGEST_RISK_NUDGE, GraphConfigError, GraphStore, GraphStoreConfig, GraphStoreConfigBuilder,
    SubscriptionId,
};
pub use transfer_log::TransferLog;
