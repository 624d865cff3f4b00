use chrono::{DateTime, Duration, Utc};

use crate::{PositionSource, PositionUpdate, VesselRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    Accept,
    DiscardSimulated,
}

/// Decides whether `update` may replace the state of `existing`.
///
/// Live updates are always accepted. Simulated updates are only accepted when the vessel has not
/// received a live update within `live_window` of `now`.
pub fn merge_decision(
    existing: Option<&VesselRecord>,
    update: &PositionUpdate,
    now: DateTime<Utc>,
    live_window: Duration,
) -> MergeDecision {
    match update.source() {
        PositionSource::Live => MergeDecision::Accept,
        PositionSource::Simulated => match existing {
            Some(record) if record.has_fresh_live(now, live_window) => {
                MergeDecision::DiscardSimulated
            }
            _ => MergeDecision::Accept,
        },
    }
}
