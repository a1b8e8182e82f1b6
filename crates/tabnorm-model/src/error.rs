use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid value '{value}' for {name}")]
    InvalidSetting { name: String, value: String },
    #[error("column index {index} out of range (table has {len} columns)")]
    ColumnOutOfRange { index: usize, len: usize },
    #[error("field name must not be empty")]
    EmptyFieldName,
}

pub type Result<T> = std::result::Result<T, ModelError>;
