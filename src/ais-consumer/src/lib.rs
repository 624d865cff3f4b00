#![deny(warnings)]
#![deny(rust_2018_idioms)]

//! Consumes the aisstream.io live feed, turns raw messages into position updates and hands them
//! in batches to the vessel registry.

pub mod aisstream;
pub mod consumer;
pub mod error;
pub mod models;
pub mod parser;
pub mod settings;
pub mod startup;

pub use error::{Error, ParseError, Result};
