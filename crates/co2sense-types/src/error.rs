//! Error types for co2sense-types.

use thiserror::Error;

/// Errors that can occur when parsing CO2sense values.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The string is not a canonical hyphenated UUID.
    #[error("Invalid device identifier: '{0}'")]
    InvalidDeviceId(String),

    /// A field value is out of range.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Result type alias using co2sense-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
