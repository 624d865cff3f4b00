use std::sync::Arc;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use snafu::ResultExt;
use tracing::{debug, instrument, warn};
use tracker_core::{
    ImoNumber, Mmsi, PositionUpdate, Route, VesselStatus, VesselType, Waypoint,
};

use crate::{
    error::{Result, error::InvalidMmsiRangeSnafu},
    settings::SimulationSettings,
    vessel::{SimulatedVessel, SimulationMode, position_on_route},
};

const IMO_BASE: i32 = 7_000_000;
/// Relative weights of the generated vessel types.
const TYPE_WEIGHTS: [(VesselType, u32); 4] = [
    (VesselType::Container, 30),
    (VesselType::Bulker, 25),
    (VesselType::Tanker, 25),
    (VesselType::GeneralCargo, 20),
];
const INITIAL_SPEED_KNOTS: std::ops::RangeInclusive<f64> = 8.0..=20.0;
/// Stationary vessels are spread this far (in degrees) around a port.
const PORT_SPREAD_DEG: f64 = 0.05;

/// Moves a generated fleet along routes, in place or on an open ocean random walk.
pub struct RouteMotionSimulator<R: Rng = StdRng> {
    vessels: Vec<SimulatedVessel>,
    perturb_probability: f64,
    rng: R,
}

impl RouteMotionSimulator<StdRng> {
    /// Generates a fleet from `settings`, seeded when `settings.seed` is set.
    pub fn from_settings(
        settings: &SimulationSettings,
        now: DateTime<Utc>,
    ) -> Result<RouteMotionSimulator<StdRng>> {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let routes = settings.routes().into_iter().map(Arc::new).collect_vec();
        RouteMotionSimulator::generate(settings, &routes, rng, now)
    }
}

impl<R: Rng> RouteMotionSimulator<R> {
    pub fn generate(
        settings: &SimulationSettings,
        routes: &[Arc<Route>],
        mut rng: R,
        now: DateTime<Utc>,
    ) -> Result<RouteMotionSimulator<R>> {
        let ports = routes
            .iter()
            .flat_map(|r| r.waypoints().iter().cloned())
            .collect_vec();

        let mut vessels = Vec::with_capacity(settings.fleet_size);
        for i in 0..settings.fleet_size {
            let mmsi = Mmsi::try_from(settings.mmsi_base + i as i64).context(
                InvalidMmsiRangeSnafu {
                    mmsi_base: settings.mmsi_base,
                    fleet_size: settings.fleet_size,
                },
            )?;
            let classification = pick_type(&mut rng);
            let mode = pick_mode(classification, routes, settings.route_share, &mut rng);

            let vessel = new_vessel(i, mmsi, classification, mode, &ports, &mut rng, now);
            vessels.push(vessel);
        }

        debug!(
            num_vessels = vessels.len(),
            num_routes = routes.len(),
            "generated simulated fleet"
        );

        Ok(RouteMotionSimulator {
            vessels,
            perturb_probability: settings.perturb_probability,
            rng,
        })
    }

    pub fn vessels(&self) -> &[SimulatedVessel] {
        &self.vessels
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    /// Advances every vessel to `now` and returns their new positions.
    ///
    /// `fresh_live` returns the current live fix of vessels the live feed covers. Those vessels
    /// are not simulated, they are moved onto the fix instead so simulation resumes from it.
    #[instrument(skip_all, fields(app.num_updates))]
    pub fn tick(
        &mut self,
        now: DateTime<Utc>,
        fresh_live: impl Fn(Mmsi) -> Option<PositionUpdate>,
    ) -> Vec<PositionUpdate> {
        let mut updates = Vec::with_capacity(self.vessels.len());

        for vessel in &mut self.vessels {
            if let Some(live) = fresh_live(vessel.mmsi) {
                vessel.follow_live(&live, now);
                continue;
            }
            match vessel.step(now, self.perturb_probability, &mut self.rng) {
                Ok(update) => updates.push(update),
                Err(e) => warn!(mmsi = %vessel.mmsi, "failed to simulate vessel: {e}"),
            }
        }

        tracing::Span::current().record("app.num_updates", updates.len());
        updates
    }
}

fn pick_type<R: Rng + ?Sized>(rng: &mut R) -> VesselType {
    let total: u32 = TYPE_WEIGHTS.iter().map(|(_, w)| w).sum();
    let mut roll = rng.random_range(0..total);
    for (vessel_type, weight) in TYPE_WEIGHTS {
        if roll < weight {
            return vessel_type;
        }
        roll -= weight;
    }
    VesselType::Container
}

fn pick_mode<R: Rng + ?Sized>(
    classification: VesselType,
    routes: &[Arc<Route>],
    route_share: f64,
    rng: &mut R,
) -> SimulationMode {
    if !routes.is_empty() && rng.random_bool(route_share.clamp(0.0, 1.0)) {
        let preferred = routes
            .iter()
            .filter(|r| r.accepts(classification))
            .collect_vec();
        let route = match preferred.choose(rng) {
            Some(r) => Arc::clone(r),
            None => Arc::clone(&routes[rng.random_range(0..routes.len())]),
        };
        return SimulationMode::Route {
            route,
            progress: rng.random_range(0.0..0.9),
        };
    }

    if rng.random_bool(0.5) {
        SimulationMode::Stationary
    } else {
        SimulationMode::Cruise
    }
}

fn new_vessel<R: Rng + ?Sized>(
    index: usize,
    mmsi: Mmsi,
    classification: VesselType,
    mode: SimulationMode,
    ports: &[Waypoint],
    rng: &mut R,
    now: DateTime<Utc>,
) -> SimulatedVessel {
    let mut speed_knots = rng.random_range(INITIAL_SPEED_KNOTS);
    let mut heading_deg = rng.random_range(0.0..360.0_f64).floor();

    let (latitude, longitude, status) = match &mode {
        SimulationMode::Route { route, progress } => {
            let (lat, lon, heading) = position_on_route(route, *progress);
            heading_deg = heading;
            (lat, lon, VesselStatus::Underway)
        }
        SimulationMode::Stationary => {
            speed_knots = 0.0;
            let status = if rng.random_bool(0.5) {
                VesselStatus::Moored
            } else {
                VesselStatus::Anchored
            };
            match ports.choose(rng) {
                Some(port) => (
                    port.latitude + rng.random_range(-PORT_SPREAD_DEG..=PORT_SPREAD_DEG),
                    port.longitude + rng.random_range(-PORT_SPREAD_DEG..=PORT_SPREAD_DEG),
                    status,
                ),
                None => (random_latitude(rng), random_longitude(rng), status),
            }
        }
        SimulationMode::Cruise => (
            random_latitude(rng),
            random_longitude(rng),
            VesselStatus::Underway,
        ),
    };

    SimulatedVessel {
        mmsi,
        imo: ImoNumber::new(IMO_BASE + index as i32),
        name: format!("SIM {}", index + 1),
        classification,
        mode,
        status,
        latitude: latitude.clamp(-90.0, 90.0),
        longitude: longitude.clamp(-180.0, 180.0),
        speed_knots,
        heading_deg,
        last_tick: now,
    }
}

fn random_latitude<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.random_range(-60.0..70.0)
}

fn random_longitude<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.random_range(-180.0..180.0)
}
