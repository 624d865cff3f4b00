use snafu::{Location, Snafu};

pub type CoreResult<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Invalid mmsi '{value}'"))]
    InvalidMmsi {
        #[snafu(implicit)]
        location: Location,
        value: i64,
    },
    #[snafu(display("Could not parse identifier '{value}'"))]
    ParseIdentifier {
        #[snafu(implicit)]
        location: Location,
        value: String,
    },
    #[snafu(display("Latitude '{latitude}' is outside of [-90, 90]"))]
    LatitudeOutOfRange {
        #[snafu(implicit)]
        location: Location,
        latitude: f64,
    },
    #[snafu(display("Longitude '{longitude}' is outside of [-180, 180]"))]
    LongitudeOutOfRange {
        #[snafu(implicit)]
        location: Location,
        longitude: f64,
    },
    #[snafu(display("A route needs at least two waypoints, '{name}' has {num_waypoints}"))]
    InvalidRoute {
        #[snafu(implicit)]
        location: Location,
        name: String,
        num_waypoints: usize,
    },
}
