//! Calibratable model parameters (translates `ql/models/parameter.hpp`).
//!
//! A [`Parameter`] stores **raw** values: the optimizer moves raw values and
//! the owning parametrization maps them to real values through its
//! `direct`/`inverse` transform.

use ql_core::{ensure, errors::Result, Real};
use ql_math::optimization::{Constraint, NoConstraint};
use ql_math::Array;
use std::sync::Arc;

/// A model parameter that can be calibrated.
///
/// Corresponds to `QuantLib::Parameter`.
#[derive(Debug, Clone)]
pub struct Parameter {
    values: Array,
    constraint: Arc<dyn Constraint>,
}

impl Parameter {
    /// Create a parameter from raw values and a constraint on them.
    pub fn new(values: Array, constraint: Arc<dyn Constraint>) -> Self {
        Self { values, constraint }
    }

    /// Create a parameter whose raw values are unconstrained.
    pub fn unconstrained(values: Array) -> Self {
        Self::new(values, Arc::new(NoConstraint))
    }

    /// Number of raw values.
    pub fn size(&self) -> usize {
        self.values.size()
    }

    /// The raw values.
    pub fn params(&self) -> &Array {
        &self.values
    }

    /// Set raw value `i`.
    pub fn set_param(&mut self, i: usize, x: Real) -> Result<()> {
        ensure!(
            i < self.values.size(),
            "parameter index ({i}) out of range [0, {})",
            self.values.size()
        );
        self.values[i] = x;
        Ok(())
    }

    /// Overwrite all raw values.
    pub fn set_params(&mut self, values: &[Real]) -> Result<()> {
        ensure!(
            values.len() == self.values.size(),
            "parameter size mismatch: got {}, expected {}",
            values.len(),
            self.values.size()
        );
        self.values = Array::from_slice(values);
        Ok(())
    }

    /// Whether `values` satisfy this parameter's constraint.
    pub fn test_params(&self, values: &Array) -> bool {
        self.constraint.test(values)
    }

    /// The constraint on raw values.
    pub fn constraint(&self) -> &Arc<dyn Constraint> {
        &self.constraint
    }
}
