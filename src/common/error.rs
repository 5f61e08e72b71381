//! Error types for sketch configuration

use std::fmt;

/// Errors that can occur when constructing or configuring a [`crate::Sketch`].
///
/// These are configuration errors only (see the crate-level docs): once a
/// sketch is built, `update` and the query methods cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub enum SketchError {
    /// Invalid parameter provided to the sketch constructor
    InvalidParameter {
        /// Parameter name
        param: String,
        /// Invalid value provided
        value: String,
        /// Constraint that was violated
        constraint: String,
    },
}

impl fmt::Display for SketchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SketchError::InvalidParameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "invalid parameter '{}': value '{}' {}",
                    param, value, constraint
                )
            }
        }
    }
}

impl std::error::Error for SketchError {}

/// Result type alias for sketch configuration
pub type Result<T> = std::result::Result<T, SketchError>;
