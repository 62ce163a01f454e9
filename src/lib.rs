//! `ote-dash` library crate.
//!
//! The binary (`ote`) is a thin wrapper around this library so that:
//!
//! - the aggregation engine is testable without spawning processes
//! - modules are reusable (e.g., future web front-end, notebooks, etc.)
//! - code stays easy to navigate as the project grows

pub mod analytics;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod report;
pub mod tui;
