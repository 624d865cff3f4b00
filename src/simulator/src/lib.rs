#![deny(warnings)]
#![deny(rust_2018_idioms)]

pub mod error;
pub mod settings;
mod simulator;
pub mod vessel;

pub use error::{Error, Result};
pub use settings::SimulationSettings;
pub use simulator::RouteMotionSimulator;
pub use vessel::{SimulatedVessel, SimulationMode};
