use std::{collections::BTreeMap, time::Duration};

use itertools::Itertools;
use serde::Serialize;
use tracker_core::{PositionSource, VesselRecord, VesselStatus, VesselType};

/// Aggregate counts over the active vessels.
///
/// `total_vessels` is always `live_vessels + simulated_vessels`, a vessel counts as live or
/// simulated by the source of its current position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetSummary {
    pub total_vessels: usize,
    pub live_vessels: usize,
    pub simulated_vessels: usize,
    pub connected_clients: usize,
    pub status_distribution: BTreeMap<VesselStatus, usize>,
    pub type_distribution: BTreeMap<VesselType, usize>,
    #[serde(with = "humantime_serde")]
    pub update_interval: Duration,
}

impl FleetSummary {
    pub fn generate(
        records: &[VesselRecord],
        connected_clients: usize,
        update_interval: Duration,
    ) -> FleetSummary {
        let live_vessels = records
            .iter()
            .filter(|r| r.source() == PositionSource::Live)
            .count();

        let status_distribution = records
            .iter()
            .map(|r| r.current().status().unwrap_or(VesselStatus::UnknownOther))
            .counts()
            .into_iter()
            .collect();

        let type_distribution = records
            .iter()
            .map(|r| r.classification())
            .counts()
            .into_iter()
            .collect();

        FleetSummary {
            total_vessels: records.len(),
            live_vessels,
            simulated_vessels: records.len() - live_vessels,
            connected_clients,
            status_distribution,
            type_distribution,
            update_interval,
        }
    }
}
