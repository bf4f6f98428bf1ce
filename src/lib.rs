// src/lib.rs
#[macro_use]
pub mod macros;
#[macro_use]
pub mod log;

pub mod batch;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod markup;
pub mod pipeline;
pub mod progress;
pub mod runner;
pub mod stats;
pub mod store;
