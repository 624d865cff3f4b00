use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use crate::{
    ImoNumber, Mmsi, PositionSource, PositionUpdate, VesselIdentity, VesselStatic, VesselType,
};

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// The registry's mutable per-vessel state.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselRecord {
    identity: VesselIdentity,
    name: Option<String>,
    classification: VesselType,
    current: PositionUpdate,
    first_seen: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    last_live_update: Option<DateTime<Utc>>,
    history: VecDeque<PositionUpdate>,
    history_capacity: usize,
    details: VesselDetails,
    change_sequence: u64,
}

/// Static details learned from either feed, never cleared once known.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VesselDetails {
    pub call_sign: Option<String>,
    pub destination: Option<String>,
    pub eta: Option<String>,
    pub draught: Option<f64>,
    pub length: Option<i32>,
    pub width: Option<i32>,
}

impl VesselRecord {
    pub fn new(update: PositionUpdate, history_capacity: usize) -> Self {
        let received_at = update.received_at();
        let mut record = Self {
            identity: *update.identity(),
            name: update.name().map(ToOwned::to_owned),
            classification: update.classification(),
            first_seen: received_at,
            last_updated: received_at,
            last_live_update: update.is_live().then_some(received_at),
            history: VecDeque::with_capacity(history_capacity.min(DEFAULT_HISTORY_CAPACITY)),
            history_capacity,
            details: VesselDetails {
                destination: update.destination().map(ToOwned::to_owned),
                eta: update.eta().map(ToOwned::to_owned),
                ..Default::default()
            },
            current: update.clone(),
            change_sequence: 0,
        };
        record.push_history(update);
        record
    }

    /// Replaces the current position. Whether the update should be applied at all is decided by
    /// [`crate::merge_decision`] before calling this.
    pub fn apply(&mut self, update: PositionUpdate) {
        let received_at = update.received_at();

        if let Some(imo) = update.imo() {
            self.identity.imo = Some(imo);
        }
        if let Some(name) = update.name() {
            self.name = Some(name.to_owned());
        }
        if update.classification().is_known() {
            self.classification = update.classification();
        }
        if let Some(destination) = update.destination() {
            self.details.destination = Some(destination.to_owned());
        }
        if let Some(eta) = update.eta() {
            self.details.eta = Some(eta.to_owned());
        }

        self.last_updated = self.last_updated.max(received_at);
        if update.is_live() {
            self.last_live_update = Some(
                self.last_live_update
                    .map_or(received_at, |prev| prev.max(received_at)),
            );
        }

        self.current = update.clone();
        self.push_history(update);
    }

    pub fn apply_static(&mut self, vessel: VesselStatic) {
        let VesselStatic {
            mmsi: _,
            msgtime: _,
            imo,
            name,
            call_sign,
            classification,
            destination,
            eta,
            draught,
            length,
            width,
        } = vessel;

        if imo.is_some() {
            self.identity.imo = imo;
        }
        if name.is_some() {
            self.name = name;
        }
        if classification.is_known() {
            self.classification = classification;
        }

        let details = &mut self.details;
        details.call_sign = call_sign.or(details.call_sign.take());
        details.destination = destination.or(details.destination.take());
        details.eta = eta.or(details.eta.take());
        details.draught = draught.or(details.draught);
        details.length = length.or(details.length);
        details.width = width.or(details.width);
    }

    fn push_history(&mut self, update: PositionUpdate) {
        if self.history_capacity == 0 {
            return;
        }
        while self.history.len() >= self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(update);
    }

    /// Returns true if a live update has been received within `window` of `now`.
    pub fn has_fresh_live(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.last_live_update
            .is_some_and(|last| now.signed_duration_since(last) <= window)
    }

    pub fn is_active(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now.signed_duration_since(self.last_updated) <= max_age
    }

    pub fn identity(&self) -> &VesselIdentity {
        &self.identity
    }
    pub fn mmsi(&self) -> Mmsi {
        self.identity.mmsi
    }
    pub fn imo(&self) -> Option<ImoNumber> {
        self.identity.imo
    }
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    pub fn classification(&self) -> VesselType {
        self.classification
    }
    pub fn current(&self) -> &PositionUpdate {
        &self.current
    }
    pub fn source(&self) -> PositionSource {
        self.current.source()
    }
    pub fn first_seen(&self) -> DateTime<Utc> {
        self.first_seen
    }
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
    pub fn last_live_update(&self) -> Option<DateTime<Utc>> {
        self.last_live_update
    }
    /// Oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &PositionUpdate> {
        self.history.iter()
    }
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
    pub fn details(&self) -> &VesselDetails {
        &self.details
    }
    /// Position of the last change to this record in its registry's change order.
    pub fn change_sequence(&self) -> u64 {
        self.change_sequence
    }
    pub fn set_change_sequence(&mut self, sequence: u64) {
        self.change_sequence = sequence;
    }
}
