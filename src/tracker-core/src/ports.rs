use std::time::Duration;

use crate::{ImoNumber, Mmsi, PositionUpdate, VesselRecord, VesselStatic};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    /// A simulated update was rejected because the vessel has fresh live data.
    Discarded,
}

/// Write side of the vessel registry, used by the live feed ingest task and the simulation tick.
pub trait VesselInbound: Send + Sync + 'static {
    fn upsert(&self, update: PositionUpdate) -> UpsertOutcome;
    /// Returns false if the vessel is not tracked, static data never creates a record.
    fn apply_static(&self, vessel: VesselStatic) -> bool;
    fn evict_stale(&self, max_age: Duration) -> usize;
}

/// Read side of the vessel registry, used by the broadcast hub and command handling.
pub trait VesselOutbound: Send + Sync + 'static {
    fn get(&self, mmsi: Mmsi) -> Option<VesselRecord>;
    fn find_by_imo(&self, imo: ImoNumber) -> Option<VesselRecord>;
    fn active_snapshot(&self, max_age: Duration) -> Vec<VesselRecord>;
    /// Records changed after the change with sequence number `since`.
    fn updated_since(&self, since: u64) -> Vec<VesselRecord>;
    /// Sequence number of the most recent change, `0` before the first one.
    fn change_sequence(&self) -> u64;
    fn has_fresh_live(&self, mmsi: Mmsi) -> bool;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Converts a std duration into a chrono duration, saturating on overflow.
pub fn chrono_duration(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}
