//! Error types for allocation analytics.
//!
//! Structural problems with the inputs (`InsufficientData`,
//! `InvalidArgument`) abort the requested computation. `DegenerateRisk` is
//! raised only where a computation divides by volatility. Solver
//! non-convergence is never an error; it travels as a `converged` flag on the
//! result.

use frontier_math::MathError;
use thiserror::Error;

/// Result type for portfolio operations.
pub type PortfolioResult<T> = Result<T, PortfolioError>;

/// Errors that can occur during portfolio operations.
#[derive(Error, Debug, Clone)]
pub enum PortfolioError {
    /// Too few price rows, assets or valid observations.
    #[error("Insufficient data: {reason}")]
    InsufficientData {
        /// What was missing.
        reason: String,
    },

    /// Bad counts, ranges, dimensions or configuration values.
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// The reason the argument is invalid.
        reason: String,
    },

    /// A computation needed to divide by a zero volatility.
    #[error("Degenerate risk: zero volatility in {operation}")]
    DegenerateRisk {
        /// The operation that divided by volatility.
        operation: String,
    },

    /// Error raised by the numerical layer.
    #[error("Numerical error: {0}")]
    Math(#[from] MathError),
}

impl PortfolioError {
    /// Create an insufficient data error.
    #[must_use]
    pub fn insufficient_data(reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            reason: reason.into(),
        }
    }

    /// Create an invalid argument error.
    #[must_use]
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create a degenerate risk error.
    #[must_use]
    pub fn degenerate_risk(operation: impl Into<String>) -> Self {
        Self::DegenerateRisk {
            operation: operation.into(),
        }
    }
}
