use snafu::{Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Failed to bind listener on '{address}'"))]
    Bind {
        #[snafu(implicit)]
        location: Location,
        address: String,
        source: std::io::Error,
    },
    #[snafu(display("Server stopped unexpectedly"))]
    Serve {
        #[snafu(implicit)]
        location: Location,
        source: std::io::Error,
    },
    #[snafu(display("Failed to generate the simulated fleet"))]
    Simulation {
        #[snafu(implicit)]
        location: Location,
        source: simulator::Error,
    },
    #[snafu(display("Invalid configuration"))]
    Config {
        #[snafu(implicit)]
        location: Location,
        source: config::ConfigError,
    },
}
