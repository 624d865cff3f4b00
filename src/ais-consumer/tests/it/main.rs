#![deny(rust_2018_idioms)]

pub mod consumer;
pub mod helper;
