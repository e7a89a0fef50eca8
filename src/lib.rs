//! `cvm-indicators` library crate.
//!
//! The binary (`cvm`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes or touching the network
//! - the dashboard can reload any table the pipeline wrote

pub mod app;
pub mod calc;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod report;
pub mod tui;
