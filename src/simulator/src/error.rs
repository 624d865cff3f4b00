use snafu::{Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Simulated fleet of {fleet_size} vessels does not fit above mmsi base {mmsi_base}"))]
    InvalidMmsiRange {
        #[snafu(implicit)]
        location: Location,
        mmsi_base: i64,
        fleet_size: usize,
        source: tracker_core::Error,
    },
}
