#![deny(warnings)]
#![deny(rust_2018_idioms)]

//! Hybrid live/simulated vessel tracker: ingests the upstream AIS feed, moves a simulated fleet
//! along shipping routes and streams the merged picture to websocket viewers.

pub mod error;
pub mod hub;
pub mod protocol;
pub mod session;
pub mod settings;
pub mod startup;
pub mod summary;
pub mod ticker;

pub use error::{Error, Result};
