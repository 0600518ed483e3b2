//! # ql-math
//!
//! Mathematical utilities: array/matrix newtypes (over nalgebra), matrix
//! decompositions, the normal distribution (via statrs), 1D solvers,
//! numerical integration and least-squares optimisation.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Dense vector newtype.
pub mod array;

/// Floating-point comparison utilities.
pub mod comparison;

/// Probability distributions.
pub mod distributions;

/// Numerical integration.
pub mod integrals;

/// Dense matrix newtype.
pub mod matrix;

/// Symmetric eigen-decomposition, Cholesky and pseudo square roots.
pub mod matrix_utilities;

/// Cost functions, constraints and optimizers.
pub mod optimization;

/// 1D root-finding solvers.
pub mod solvers1d;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use array::Array;
pub use comparison::{close, close_enough};
pub use distributions::{normal_cdf, normal_cdf_inverse, normal_pdf};
pub use integrals::{Integrator, PiecewiseIntegral, SimpsonIntegral};
pub use matrix::Matrix;
pub use solvers1d::Brent;
