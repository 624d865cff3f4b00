#![deny(warnings)]
#![deny(rust_2018_idioms)]

//! Domain types shared by every part of the vessel tracker: identities, position updates,
//! registry records, routes, the live/simulated merge rule and the geodesic helpers used by the
//! motion model.

mod domain;
pub mod error;
mod merge;
mod ports;
mod settings;
mod telemetry;

pub mod geo;

pub use domain::*;
pub use error::*;
pub use merge::*;
pub use ports::*;
pub use settings::*;
pub use telemetry::*;
