#![deny(warnings)]
#![deny(rust_2018_idioms)]

//! In-memory vessel registry keyed on MMSI.
//!
//! Every read-modify-write happens inside the map's per-key entry lock, which makes `upsert`
//! atomic with respect to `evict_stale` and guarantees snapshots never observe a partially applied
//! update.
//!
//! Every accepted change is stamped with a registry wide sequence number, taken inside the same
//! entry lock, so readers can ask for everything changed after a known point regardless of the
//! timestamps carried by the updates.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use serde::Deserialize;
use tracing::{debug, info};
use tracker_core::{
    DEFAULT_HISTORY_CAPACITY, ImoNumber, MergeDecision, Mmsi, PositionUpdate, UpsertOutcome,
    VesselInbound, VesselOutbound, VesselRecord, VesselStatic, chrono_duration, merge_decision,
};

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySettings {
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Records not updated within this window are excluded from snapshots and evicted.
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
    /// Live data takes priority over simulated data for this long after the last live report.
    #[serde(with = "humantime_serde")]
    pub live_stale_after: Duration,
}

#[derive(Debug)]
pub struct VesselRegistry {
    vessels: DashMap<Mmsi, VesselRecord>,
    history_capacity: usize,
    max_age: Duration,
    live_window: chrono::Duration,
    sequence: AtomicU64,
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_age: Duration::from_secs(6 * 60 * 60),
            live_stale_after: Duration::from_secs(60 * 60),
        }
    }
}

impl VesselRegistry {
    pub fn new(settings: &RegistrySettings) -> Self {
        Self {
            vessels: DashMap::new(),
            history_capacity: settings.history_capacity,
            max_age: settings.max_age,
            live_window: chrono_duration(settings.live_stale_after),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Applies the merge rule using the update's receive time as "now".
    pub fn upsert_update(&self, update: PositionUpdate) -> UpsertOutcome {
        match self.vessels.entry(update.mmsi()) {
            Entry::Occupied(mut entry) => {
                let now = update.received_at();
                match merge_decision(Some(entry.get()), &update, now, self.live_window) {
                    MergeDecision::Accept => {
                        let record = entry.get_mut();
                        record.apply(update);
                        record.set_change_sequence(self.next_sequence());
                        UpsertOutcome::Updated
                    }
                    MergeDecision::DiscardSimulated => {
                        debug!(
                            mmsi = %update.mmsi(),
                            "discarded simulated update, vessel has fresh live data"
                        );
                        UpsertOutcome::Discarded
                    }
                }
            }
            Entry::Vacant(entry) => {
                let mut record = VesselRecord::new(update, self.history_capacity);
                record.set_change_sequence(self.next_sequence());
                entry.insert(record);
                UpsertOutcome::Created
            }
        }
    }

    pub fn active_snapshot_at(&self, now: DateTime<Utc>, max_age: Duration) -> Vec<VesselRecord> {
        let max_age = chrono_duration(max_age);
        self.vessels
            .iter()
            .filter(|r| r.is_active(now, max_age))
            .map(|r| r.value().clone())
            .collect()
    }

    /// Removes exactly the records with `now - last_updated > max_age`.
    pub fn evict_stale_at(&self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let max_age = chrono_duration(max_age);
        let before = self.vessels.len();
        let mut evicted = 0;
        self.vessels.retain(|_, record| {
            let keep = record.is_active(now, max_age);
            if !keep {
                evicted += 1;
            }
            keep
        });
        if evicted > 0 {
            info!(evicted, remaining = before.saturating_sub(evicted), "evicted stale vessels");
        }
        evicted
    }

    pub fn has_fresh_live_at(&self, mmsi: Mmsi, now: DateTime<Utc>) -> bool {
        self.vessels
            .get(&mmsi)
            .is_some_and(|r| r.has_fresh_live(now, self.live_window))
    }

    /// The current position of `mmsi` if it comes from live data that is still fresh at `now`.
    pub fn fresh_live_position_at(&self, mmsi: Mmsi, now: DateTime<Utc>) -> Option<PositionUpdate> {
        self.vessels
            .get(&mmsi)
            .filter(|r| r.has_fresh_live(now, self.live_window) && r.current().is_live())
            .map(|r| r.current().clone())
    }
}

impl VesselInbound for VesselRegistry {
    fn upsert(&self, update: PositionUpdate) -> UpsertOutcome {
        self.upsert_update(update)
    }

    fn apply_static(&self, vessel: VesselStatic) -> bool {
        match self.vessels.get_mut(&vessel.mmsi) {
            Some(mut record) => {
                record.apply_static(vessel);
                record.set_change_sequence(self.next_sequence());
                true
            }
            None => false,
        }
    }

    fn evict_stale(&self, max_age: Duration) -> usize {
        self.evict_stale_at(Utc::now(), max_age)
    }
}

impl VesselOutbound for VesselRegistry {
    fn get(&self, mmsi: Mmsi) -> Option<VesselRecord> {
        self.vessels.get(&mmsi).map(|r| r.value().clone())
    }

    fn find_by_imo(&self, imo: ImoNumber) -> Option<VesselRecord> {
        self.vessels
            .iter()
            .find(|r| r.imo() == Some(imo))
            .map(|r| r.value().clone())
    }

    fn active_snapshot(&self, max_age: Duration) -> Vec<VesselRecord> {
        self.active_snapshot_at(Utc::now(), max_age)
    }

    fn updated_since(&self, since: u64) -> Vec<VesselRecord> {
        self.vessels
            .iter()
            .filter(|r| r.change_sequence() > since)
            .map(|r| r.value().clone())
            .collect()
    }

    fn change_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    fn has_fresh_live(&self, mmsi: Mmsi) -> bool {
        self.has_fresh_live_at(mmsi, Utc::now())
    }

    fn len(&self) -> usize {
        self.vessels.len()
    }
}
