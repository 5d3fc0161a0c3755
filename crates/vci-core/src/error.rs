//! # Shared Validation Error
//!
//! The validation error used by constructors and parsers across the
//! workspace. Lifecycle, store, registry, and codec failures have their own
//! error enums in their owning crates; this type only covers malformed
//! inputs caught at the type boundary.

use thiserror::Error;

/// Error for inputs rejected at construction or parse time.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A timestamp string could not be parsed or used a non-UTC offset.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// An identifier string was not a valid UUID.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A duration was zero, negative, or out of range.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
}
