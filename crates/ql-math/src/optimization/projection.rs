//! Parameter projection (translates `ql/math/optimization/projection.hpp`,
//! `projectedcostfunction.hpp` and `projectedconstraint.hpp`).
//!
//! A [`Projection`] splits a full parameter vector into free and fixed
//! entries.  Optimizers only see the free ones; [`Projection::include`]
//! rebuilds the full vector with the fixed entries at their original values.

use super::{Constraint, CostFunction};
use crate::array::Array;
use ql_core::{ensure, errors::Result, Real};

/// Free/fixed split of a parameter vector.
#[derive(Debug, Clone)]
pub struct Projection {
    actual: Vec<Real>,
    fixed: Vec<bool>,
    free_count: usize,
}

impl Projection {
    /// Create a projection of `parameters` where `fix[i] == true` keeps
    /// entry `i` frozen.  An empty mask frees everything.
    pub fn new(parameters: &Array, fix: &[bool]) -> Result<Self> {
        let fixed = if fix.is_empty() {
            vec![false; parameters.size()]
        } else {
            fix.to_vec()
        };
        ensure!(
            fixed.len() == parameters.size(),
            "fix parameters mask size ({}) does not match number of parameters ({})",
            fixed.len(),
            parameters.size()
        );
        let free_count = fixed.iter().filter(|f| !**f).count();
        ensure!(free_count > 0, "number of free parameters must be positive");
        Ok(Self {
            actual: parameters.as_slice().to_vec(),
            fixed,
            free_count,
        })
    }

    /// Number of free parameters.
    pub fn free_count(&self) -> usize {
        self.free_count
    }

    /// Free entries of a full parameter vector.
    pub fn project(&self, parameters: &Array) -> Array {
        parameters
            .iter()
            .zip(&self.fixed)
            .filter(|(_, fixed)| !**fixed)
            .map(|(v, _)| *v)
            .collect()
    }

    /// Full parameter vector from free entries.
    pub fn include(&self, projected: &Array) -> Array {
        let mut free = projected.iter();
        self.actual
            .iter()
            .zip(&self.fixed)
            .map(|(&v, &fixed)| if fixed { v } else { *free.next().unwrap_or(&v) })
            .collect()
    }
}

/// Cost function seen through a [`Projection`].
pub struct ProjectedCostFunction<'a> {
    cost: &'a dyn CostFunction,
    projection: &'a Projection,
}

impl<'a> ProjectedCostFunction<'a> {
    /// Wrap `cost`.
    pub fn new(cost: &'a dyn CostFunction, projection: &'a Projection) -> Self {
        Self { cost, projection }
    }
}

impl CostFunction for ProjectedCostFunction<'_> {
    fn values(&self, x: &Array) -> Result<Array> {
        self.cost.values(&self.projection.include(x))
    }
}

/// Constraint seen through a [`Projection`].
#[derive(Debug)]
pub struct ProjectedConstraint<'a> {
    constraint: &'a dyn Constraint,
    projection: &'a Projection,
}

impl<'a> ProjectedConstraint<'a> {
    /// Wrap `constraint`.
    pub fn new(constraint: &'a dyn Constraint, projection: &'a Projection) -> Self {
        Self {
            constraint,
            projection,
        }
    }
}

impl Constraint for ProjectedConstraint<'_> {
    fn test(&self, x: &Array) -> bool {
        self.constraint.test(&self.projection.include(x))
    }
}
