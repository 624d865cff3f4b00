#![deny(rust_2018_idioms)]

pub mod broadcast;
pub mod helper;
pub mod settings;
pub mod viewer;
