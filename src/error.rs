//! Validation errors raised while collecting form input

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} expects a number, got '{input}'")]
    NotANumber { field: &'static str, input: String },

    #[error("{field} expects one of No/Yes, got '{input}'")]
    InvalidChoice { field: &'static str, input: String },
}
