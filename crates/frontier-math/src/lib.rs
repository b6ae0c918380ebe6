//! # Frontier Math
//!
//! Numerical primitives for the Frontier allocation engine.
//!
//! This crate provides:
//!
//! - **Linear Algebra**: Dot products, quadratic forms, symmetry and
//!   positive semi-definiteness checks
//! - **Optimization**: Bound- and equality-constrained minimization
//!   (augmented Lagrangian over a spectral projected gradient inner solver)
//!
//! ## Design Philosophy
//!
//! - **No domain knowledge**: Objectives and constraints are plain closures
//! - **Numerical Stability**: Non-finite evaluations never poison a search
//! - **Bounded work**: Every iterative routine has an explicit iteration cap

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::needless_pass_by_value)]

pub mod error;
pub mod linear_algebra;
pub mod optimization;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{MathError, MathResult};
    pub use crate::linear_algebra::{dot, quadratic_form};
    pub use crate::optimization::{
        minimize, EqualityConstraint, OptimizationConfig, OptimizationResult,
    };
}

pub use error::{MathError, MathResult};
