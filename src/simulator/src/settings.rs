use std::time::Duration;

use serde::Deserialize;
use tracker_core::{Route, default_routes};

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationSettings {
    pub fleet_size: usize,
    /// Simulated vessels get consecutive MMSIs starting here.
    pub mmsi_base: i64,
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    /// Falls back to the built-in shipping lanes when not set.
    pub routes: Option<Vec<Route>>,
    /// Fixed seed for reproducible fleets, random when not set.
    pub seed: Option<u64>,
    #[serde(default = "default_route_share")]
    pub route_share: f64,
    #[serde(default = "default_perturb_probability")]
    pub perturb_probability: f64,
}

impl SimulationSettings {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.clone().unwrap_or_else(default_routes)
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            fleet_size: 50,
            mmsi_base: 990_000_000,
            tick_interval: Duration::from_secs(15),
            routes: None,
            seed: None,
            route_share: default_route_share(),
            perturb_probability: default_perturb_probability(),
        }
    }
}

fn default_route_share() -> f64 {
    0.7
}

fn default_perturb_probability() -> f64 {
    0.1
}
