//! Detection and mapping for tabnorm.
//!
//! - [`RowClassifier`] labels sheet rows and selects the header row
//! - [`ColumnMapper`] scores columns against fields and resolves a 1:1 mapping
//! - [`builtin`] is the general-purpose detector package

#![deny(unsafe_code)]

pub mod builtin;
mod columns;
mod resolve;
mod rows;
pub mod summary;
pub mod text;

pub use columns::{ColumnMapper, sample_values};
pub use resolve::{ColumnScores, Conflict, Resolution, resolve};
pub use rows::RowClassifier;
pub use summary::{ColumnSummary, MappingSummary};
