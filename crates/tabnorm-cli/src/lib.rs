//! Command-line front end for tabnorm.
//!
//! Reads CSV files, runs the engine with the built-in detectors and an
//! optional field schema, and writes normalized CSV files plus
//! `diagnostics.json`.

pub mod cli;
pub mod commands;
pub mod io;
pub mod logging;
pub mod report;
pub mod summary;
