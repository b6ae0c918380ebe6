//! Error types for mathematical operations.

use thiserror::Error;

/// A specialized Result type for mathematical operations.
pub type MathResult<T> = Result<T, MathError>;

/// Errors that can occur during mathematical operations.
///
/// Failing to converge is not an error here: optimizers report it through
/// [`OptimizationResult::converged`](crate::optimization::OptimizationResult).
#[derive(Error, Debug, Clone)]
pub enum MathError {
    /// Vector or matrix dimensions are incompatible.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Matrix is not square.
    #[error("Matrix must be square, got ({rows}x{cols})")]
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Lower bound exceeds upper bound, or a bound is NaN.
    #[error("Invalid bound at index {index}: [{lower}, {upper}]")]
    InvalidBound {
        /// Index of the offending variable.
        index: usize,
        /// Lower bound.
        lower: f64,
        /// Upper bound.
        upper: f64,
    },

    /// Objective or constraint produced a non-finite value at the start point.
    #[error("Non-finite value in {context}")]
    NonFinite {
        /// Where the value was produced.
        context: String,
    },

    /// Invalid input parameter.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },
}

impl MathError {
    /// Creates a dimension mismatch error.
    #[must_use]
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates a non-finite value error.
    #[must_use]
    pub fn non_finite(context: impl Into<String>) -> Self {
        Self::NonFinite {
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MathError::dimension_mismatch(3, 2);
        assert!(err.to_string().contains("expected 3"));

        let err = MathError::InvalidBound {
            index: 1,
            lower: 1.0,
            upper: 0.0,
        };
        assert!(err.to_string().contains("index 1"));
    }
}
