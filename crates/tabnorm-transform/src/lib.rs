//! Field-scoped transforms and validators.
//!
//! [`TransformStage`] seeds [`FieldValues`] from the mapped input columns,
//! runs each mapped field's transforms (which may also set sibling fields)
//! and then its validators. Validators only report; they cannot change data.

#![deny(unsafe_code)]

mod stage;
mod values;

pub use stage::TransformStage;
pub use values::FieldValues;
