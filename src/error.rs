//! Central error handling for the symbology core.
//!
//! Provides a unified SymbologyError enum with consistent categorization.
//! Degenerate statistical input is never an error; see `classify`.

/// Centralized error type for all symbology operations
#[derive(thiserror::Error, Debug)]
pub enum SymbologyError {
    /// A caller-supplied value was rejected before any state changed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is not valid in the current state (e.g. a symbolizer
    /// kind that does not match its category).
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A filter expression could not be parsed or evaluated.
    #[error("Expression error: {0}")]
    Expression(String),
}

impl SymbologyError {
    /// Convenience constructors for common error types
    pub fn invalid_argument<T: ToString>(msg: T) -> Self {
        SymbologyError::InvalidArgument(msg.to_string())
    }

    pub fn invalid_operation<T: ToString>(msg: T) -> Self {
        SymbologyError::InvalidOperation(msg.to_string())
    }

    pub fn expression<T: ToString>(msg: T) -> Self {
        SymbologyError::Expression(msg.to_string())
    }
}

/// Result type alias for symbology operations
pub type SymbologyResult<T> = Result<T, SymbologyError>;
