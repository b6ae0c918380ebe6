//! # Frontier
//!
//! Portfolio allocation analytics from price history.
//!
//! This crate re-exports the public API of:
//!
//! - [`math`] (`frontier-math`): linear algebra helpers and the constrained solver
//! - [`portfolio`] (`frontier-portfolio`): estimation, sampling, optimization,
//!   efficient frontier and the memoized closest-allocation finder
//!
//! ```rust,ignore
//! use frontier::prelude::*;
//!
//! let engine = AllocationEngine::new(EngineConfig::default())?;
//! let analysis = engine.analyze(&prices)?;
//! ```

#![warn(missing_docs)]

pub use frontier_math as math;
pub use frontier_portfolio as portfolio;

pub use frontier_math::{MathError, MathResult};
pub use frontier_portfolio::*;

/// Prelude for convenient imports.
pub mod prelude {
    pub use frontier_portfolio::prelude::*;
}
