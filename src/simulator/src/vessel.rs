use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracker_core::{
    CoreResult, ImoNumber, Mmsi, NewPositionUpdate, PositionSource, PositionUpdate, Route,
    VesselStatus, VesselType,
    geo::{self, MAX_LATITUDE, MAX_LONGITUDE},
};

/// Progress never reaches the final waypoint, which keeps the segment lookup in bounds.
pub const MAX_ROUTE_PROGRESS: f64 = 0.99;
/// Largest per-axis displacement, in degrees, of a stationary vessel per tick.
pub const STATIONARY_JITTER_DEG: f64 = 0.001;
pub const CRUISE_HEADING_JITTER_DEG: f64 = 10.0;
pub const PERTURB_HEADING_DEG: f64 = 20.0;
pub const PERTURB_SPEED_KNOTS: f64 = 1.0;
pub const MIN_SPEED_KNOTS: f64 = 5.0;
pub const MAX_SPEED_KNOTS: f64 = 25.0;

/// How a simulated vessel moves, chosen once when the vessel is created.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationMode {
    /// Moored or at anchor, only jitters in place.
    Stationary,
    /// Follows `route`, `progress` is the fraction of the route covered in `[0, 0.99]`.
    Route { route: Arc<Route>, progress: f64 },
    /// Open ocean random walk.
    Cruise,
}

#[derive(Debug, Clone)]
pub struct SimulatedVessel {
    pub mmsi: Mmsi,
    pub imo: Option<ImoNumber>,
    pub name: String,
    pub classification: VesselType,
    pub mode: SimulationMode,
    pub status: VesselStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_knots: f64,
    pub heading_deg: f64,
    pub last_tick: DateTime<Utc>,
}

impl SimulatedVessel {
    /// Moves the vessel to where it would be at `now` and returns the resulting update.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        now: DateTime<Utc>,
        perturb_probability: f64,
        rng: &mut R,
    ) -> CoreResult<PositionUpdate> {
        let elapsed_hours =
            (now.signed_duration_since(self.last_tick).num_milliseconds().max(0) as f64)
                / 3_600_000.0;
        self.last_tick = self.last_tick.max(now);

        match &mut self.mode {
            SimulationMode::Stationary => {
                self.speed_knots = 0.0;
                self.latitude = (self.latitude
                    + rng.random_range(-STATIONARY_JITTER_DEG..=STATIONARY_JITTER_DEG))
                .clamp(-MAX_LATITUDE, MAX_LATITUDE);
                self.longitude = (self.longitude
                    + rng.random_range(-STATIONARY_JITTER_DEG..=STATIONARY_JITTER_DEG))
                .clamp(-MAX_LONGITUDE, MAX_LONGITUDE);
            }
            SimulationMode::Route { route, progress } => {
                let distance_nm = self.speed_knots * elapsed_hours;
                let (latitude, longitude, heading) = advance_along(route, progress, distance_nm);
                self.latitude = latitude;
                self.longitude = longitude;
                self.heading_deg = heading;
            }
            SimulationMode::Cruise => {
                self.heading_deg = geo::normalize_heading(
                    self.heading_deg
                        + rng.random_range(-CRUISE_HEADING_JITTER_DEG..=CRUISE_HEADING_JITTER_DEG),
                );
                let (latitude, longitude) = geo::advance(
                    self.latitude,
                    self.longitude,
                    self.heading_deg,
                    self.speed_knots * elapsed_hours,
                );
                self.latitude = latitude;
                self.longitude = longitude;
            }
        }

        if self.is_moving() && rng.random_bool(perturb_probability.clamp(0.0, 1.0)) {
            self.perturb(rng);
        }

        self.to_update(now)
    }

    fn is_moving(&self) -> bool {
        !matches!(self.mode, SimulationMode::Stationary)
    }

    /// Small random course and speed changes so tracks are not perfectly straight. On a route the
    /// heading is recomputed from the segment on the next tick.
    fn perturb<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.heading_deg = geo::normalize_heading(
            self.heading_deg + rng.random_range(-PERTURB_HEADING_DEG..=PERTURB_HEADING_DEG),
        );
        self.speed_knots = (self.speed_knots
            + rng.random_range(-PERTURB_SPEED_KNOTS..=PERTURB_SPEED_KNOTS))
        .clamp(MIN_SPEED_KNOTS, MAX_SPEED_KNOTS);
    }

    pub fn to_update(&self, now: DateTime<Utc>) -> CoreResult<PositionUpdate> {
        let destination = match &self.mode {
            SimulationMode::Route { route, .. } => {
                route.waypoints().last().and_then(|w| w.name.clone())
            }
            SimulationMode::Stationary | SimulationMode::Cruise => None,
        };

        PositionUpdate::new(NewPositionUpdate {
            mmsi: self.mmsi,
            imo: self.imo,
            name: Some(self.name.clone()),
            msgtime: now,
            received_at: now,
            latitude: self.latitude,
            longitude: self.longitude,
            speed_over_ground: Some(self.speed_knots),
            course_over_ground: Some(self.heading_deg),
            true_heading: Some(self.heading_deg.round()),
            status: Some(self.status),
            destination,
            eta: None,
            classification: self.classification,
            source: PositionSource::Simulated,
        })
    }

    /// Moves the vessel onto a live fix so simulation resumes from there once the live data goes
    /// stale. A vessel seen live no longer follows its generated route.
    pub fn follow_live(&mut self, live: &PositionUpdate, now: DateTime<Utc>) {
        self.latitude = live.latitude();
        self.longitude = live.longitude();
        if let Some(heading) = live.true_heading().or(live.course_over_ground()) {
            self.heading_deg = geo::normalize_heading(heading);
        }
        if let Some(status) = live.status() {
            self.status = status;
        }
        if let SimulationMode::Route { .. } = self.mode {
            self.mode = SimulationMode::Cruise;
        }
        if self.is_moving() {
            if let Some(speed) = live.speed_over_ground() {
                self.speed_knots = speed.clamp(MIN_SPEED_KNOTS, MAX_SPEED_KNOTS);
            }
        }
        self.last_tick = self.last_tick.max(now);
    }

    pub fn route_progress(&self) -> Option<f64> {
        match self.mode {
            SimulationMode::Route { progress, .. } => Some(progress),
            SimulationMode::Stationary | SimulationMode::Cruise => None,
        }
    }
}

/// Advances `progress` by `distance_nm` along `route` and returns the new position and the
/// heading of the segment the vessel is on.
pub fn advance_along(route: &Route, progress: &mut f64, distance_nm: f64) -> (f64, f64, f64) {
    let segments = route.num_segments() as f64;

    let (from, to) = route.segment(segment_index(route, *progress));
    let segment_nm = geo::distance_nm(from.latitude, from.longitude, to.latitude, to.longitude);

    let increment = if segment_nm > 0.0 {
        distance_nm / segment_nm / segments
    } else {
        // Degenerate segment, skip it.
        1.0 / segments
    };
    *progress = (*progress + increment).clamp(0.0, MAX_ROUTE_PROGRESS);

    let index = segment_index(route, *progress);
    let (from, to) = route.segment(index);
    let fraction = *progress * segments - index as f64;
    let (latitude, longitude) = geo::interpolate(
        from.latitude,
        from.longitude,
        to.latitude,
        to.longitude,
        fraction,
    );
    let heading = geo::bearing_deg(from.latitude, from.longitude, to.latitude, to.longitude);

    (latitude, longitude, heading)
}

pub fn position_on_route(route: &Route, progress: f64) -> (f64, f64, f64) {
    let mut progress = progress.clamp(0.0, MAX_ROUTE_PROGRESS);
    advance_along(route, &mut progress, 0.0)
}

fn segment_index(route: &Route, progress: f64) -> usize {
    let segments = route.num_segments();
    ((progress * segments as f64).floor() as usize).min(segments - 1)
}
