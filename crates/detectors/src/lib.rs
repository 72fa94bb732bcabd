// Rust guideline compliant 2026-10-16

//! Pattern detectors implementing the `domain::Detector` port.
//!
//! Every detector is stateless across calls: all history comes from the
//! windowed view the graph hands it, so a detector can be tested in isolation
//! against any `GraphView`.

mod fan_in;
mod rapid_transfer;

pub use fan_in::{FAN_IN_CATEGORY, FanInConfig, FanInConfigBuilder, FanInDetector};
pub use rapid_transfer::{
    RAPID_PING_PONG_CATEGORY, RapidTransferConfig, RapidTransferConfigBuilder, RapidTransferDetector,
};

use domain::{AccountId, DetectorError, GraphView};

/// Resolve `id` to its external identifier.
///
/// Handles on a transfer always come from the same registry, so a miss means
/// the detector was handed a view of a different graph.
fn account_name(graph: &dyn GraphView, id: AccountId) -> Result<String, DetectorError> {
    graph
        .account(id)
        .map(|account| account.name.to_string())
        .ok_or_else(|| DetectorError::Failed { reason: format!("unknown account handle {id}") })
}
