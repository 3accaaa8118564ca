//! Error types for the `onramp-models` crate.
//!
//! Building an onramp URL is the only fallible operation in this crate;
//! address validation reports its outcome as data instead.

/// Errors produced when constructing model values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A required field was missing or empty.
    #[error("missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },

    /// A fiat amount did not parse to a finite number.
    #[error("invalid amount \"{value}\": {reason}")]
    InvalidAmount {
        /// The value that failed validation.
        value: String,
        /// Human-readable explanation.
        reason: String,
    },
}
