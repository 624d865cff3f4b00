use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::{
    CoreResult, VesselType,
    error::error::{InvalidRouteSnafu, LatitudeOutOfRangeSnafu, LongitudeOutOfRangeSnafu},
    geo,
};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: Option<String>,
}

/// An ordered, immutable sequence of waypoints simulated vessels can follow.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "RawRoute")]
pub struct Route {
    name: String,
    waypoints: Vec<Waypoint>,
    vessel_types: Vec<VesselType>,
}

#[derive(Deserialize)]
struct RawRoute {
    name: String,
    waypoints: Vec<Waypoint>,
    #[serde(default)]
    vessel_types: Vec<VesselType>,
}

impl TryFrom<RawRoute> for Route {
    type Error = crate::Error;

    fn try_from(value: RawRoute) -> Result<Self, Self::Error> {
        Route::new(value.name, value.waypoints, value.vessel_types)
    }
}

impl Waypoint {
    pub fn new(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            name: Some(name.to_string()),
        }
    }
}

impl Route {
    pub fn new(
        name: String,
        waypoints: Vec<Waypoint>,
        vessel_types: Vec<VesselType>,
    ) -> CoreResult<Self> {
        ensure!(
            waypoints.len() >= 2,
            InvalidRouteSnafu {
                name,
                num_waypoints: waypoints.len(),
            }
        );
        for w in &waypoints {
            ensure!(
                (-90.0..=90.0).contains(&w.latitude),
                LatitudeOutOfRangeSnafu {
                    latitude: w.latitude
                }
            );
            ensure!(
                (-180.0..=180.0).contains(&w.longitude),
                LongitudeOutOfRangeSnafu {
                    longitude: w.longitude
                }
            );
        }

        Ok(Self {
            name,
            waypoints,
            vessel_types,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn vessel_types(&self) -> &[VesselType] {
        &self.vessel_types
    }

    pub fn num_segments(&self) -> usize {
        self.waypoints.len() - 1
    }

    /// Start and end waypoint of segment `index`, clamped to the last segment.
    pub fn segment(&self, index: usize) -> (&Waypoint, &Waypoint) {
        let index = index.min(self.num_segments() - 1);
        (&self.waypoints[index], &self.waypoints[index + 1])
    }

    pub fn length_nm(&self) -> f64 {
        self.waypoints
            .windows(2)
            .map(|w| geo::distance_nm(w[0].latitude, w[0].longitude, w[1].latitude, w[1].longitude))
            .sum()
    }

    /// A route without preferred vessel types accepts any vessel.
    pub fn accepts(&self, vessel_type: VesselType) -> bool {
        self.vessel_types.is_empty() || self.vessel_types.contains(&vessel_type)
    }
}

/// The built-in shipping lanes used when no routes are configured.
pub fn default_routes() -> Vec<Route> {
    let singapore = Waypoint::new("Singapore", 1.2966, 103.7764);
    let suez = Waypoint::new("Suez Canal", 30.0444, 31.2357);
    let rotterdam = Waypoint::new("Rotterdam", 51.9225, 4.4792);

    let route = |name: &str, waypoints: Vec<Waypoint>, vessel_types: Vec<VesselType>| Route {
        name: name.to_string(),
        waypoints,
        vessel_types,
    };

    vec![
        route(
            "Asia-Europe (Suez)",
            vec![
                singapore.clone(),
                Waypoint::new("Bab el-Mandeb", 12.7820, 45.0370),
                suez.clone(),
                rotterdam.clone(),
            ],
            vec![VesselType::Container, VesselType::GeneralCargo],
        ),
        route(
            "Trans-Pacific",
            vec![
                Waypoint::new("Hong Kong", 22.3526, 114.1417),
                Waypoint::new("Tokyo", 35.6762, 139.6503),
                Waypoint::new("Los Angeles", 33.7701, -118.1937),
            ],
            vec![VesselType::Container, VesselType::Bulker],
        ),
        route(
            "Trans-Atlantic",
            vec![
                rotterdam,
                Waypoint::new("New York", 40.6892, -74.0445),
                Waypoint::new("Miami", 25.7617, -80.1918),
            ],
            vec![VesselType::Container, VesselType::GeneralCargo],
        ),
        route(
            "Middle East Oil Route",
            vec![
                Waypoint::new("Bahrain", 26.2050, 50.0920),
                Waypoint::new("Abu Dhabi", 24.4539, 54.3773),
                suez,
                Waypoint::new("Marseille", 43.2965, 5.3698),
            ],
            vec![VesselType::Tanker],
        ),
        route(
            "Brazil-China Iron Ore",
            vec![
                Waypoint::new("Vitoria", -20.2976, -40.2958),
                Waypoint::new("Santos", -23.9608, -46.3969),
                singapore,
                Waypoint::new("Qingdao", 36.0986, 120.3719),
            ],
            vec![VesselType::Bulker],
        ),
    ]
}
