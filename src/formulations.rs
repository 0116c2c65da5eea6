//! Formulations
//!
//! Each [`Variant`] maps to a [`Formulation`] that turns validated [`Inputs`] into a
//! [`Problem`] and reads a solved [`Assignment`] back into an [`Allocation`]. All three
//! share the same pipeline: add variables, then the objective, then constraints.

use num_traits::ToPrimitive;

use crate::{
    allocation::Allocation,
    formulations::model::{ModelBuilder, Problem, VarId},
    solvers::{Assignment, SolverError},
    validation::Inputs,
    variants::Variant,
};

pub mod discount;
pub mod market;
pub mod model;
pub mod quantity;

/// Distance from a whole number tolerated in solved integer variables.
pub const INTEGRALITY_TOLERANCE: f64 = 1e-6;

/// Formulation strategy for a single [`Variant`].
pub trait Formulation {
    /// Decision variables created for one problem instance.
    type Vars;

    /// Variant this formulation implements.
    fn variant(&self) -> Variant;

    /// Create the decision variables.
    fn add_variables(&self, inputs: &Inputs<'_>, model: &mut ModelBuilder) -> Self::Vars;

    /// Add the objective terms.
    fn add_objective(&self, inputs: &Inputs<'_>, vars: &Self::Vars, model: &mut ModelBuilder);

    /// Add the constraints.
    fn add_constraints(&self, inputs: &Inputs<'_>, vars: &Self::Vars, model: &mut ModelBuilder);

    /// Read the solved values back into an allocation matrix.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvariantViolation`] if the assignment does not describe a
    /// valid integer allocation for these variables.
    fn extract(&self, vars: &Self::Vars, assignment: &Assignment)
    -> Result<Allocation, SolverError>;

    /// Run the build pipeline and freeze the resulting problem.
    fn formulate(&self, inputs: &Inputs<'_>) -> (Problem, Self::Vars) {
        let mut model = ModelBuilder::new(format!("{}_allocation", self.variant()));

        let vars = self.add_variables(inputs, &mut model);
        self.add_objective(inputs, &vars, &mut model);
        self.add_constraints(inputs, &vars, &mut model);

        (model.finish(), vars)
    }
}

/// Row-major matrix of decision variables, one per (market, product).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarMatrix {
    rows: usize,
    cols: usize,
    ids: Vec<VarId>,
}

impl VarMatrix {
    /// Create one variable per cell, visiting cells in row-major order.
    pub fn new(rows: usize, cols: usize, mut create: impl FnMut(usize, usize) -> VarId) -> Self {
        let mut ids = Vec::with_capacity(rows * cols);

        for row in 0..rows {
            for col in 0..cols {
                ids.push(create(row, col));
            }
        }

        Self { rows, cols, ids }
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Variable at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<VarId> {
        if row >= self.rows || col >= self.cols {
            return None;
        }

        self.ids.get(row * self.cols + col).copied()
    }

    /// All variables in row-major order.
    pub fn ids(&self) -> &[VarId] {
        &self.ids
    }

    /// Variables of one row (market).
    pub fn row(&self, row: usize) -> impl Iterator<Item = VarId> + '_ {
        self.ids
            .iter()
            .copied()
            .skip(row * self.cols)
            .take(if row < self.rows { self.cols } else { 0 })
    }

    /// Variables of one column (product).
    pub fn column(&self, col: usize) -> impl Iterator<Item = VarId> + '_ {
        self.ids
            .iter()
            .copied()
            .skip(col)
            .step_by(self.cols.max(1))
            .take(if col < self.cols { self.rows } else { 0 })
    }
}

/// Read a solved integer variable as a unit count.
pub(crate) fn solved_units(assignment: &Assignment, var: VarId) -> Result<u64, SolverError> {
    let value = assignment
        .value(var)
        .ok_or_else(|| SolverError::invariant(format!("no value for variable {}", var.index())))?;

    let rounded = value.round();

    if (value - rounded).abs() > INTEGRALITY_TOLERANCE {
        return Err(SolverError::invariant(format!(
            "variable {} has non-integral value {value}",
            var.index()
        )));
    }

    rounded
        .to_u64()
        .ok_or_else(|| SolverError::invariant(format!("variable {} is negative", var.index())))
}

/// Read a whole variable matrix as unit counts.
pub(crate) fn solved_matrix(
    assignment: &Assignment,
    vars: &VarMatrix,
) -> Result<Vec<u64>, SolverError> {
    vars.ids()
        .iter()
        .map(|&var| solved_units(assignment, var))
        .collect()
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn grid(rows: usize, cols: usize) -> VarMatrix {
        let mut model = ModelBuilder::new("grid");

        VarMatrix::new(rows, cols, |i, j| model.add_integer(format!("x_{i}_{j}")))
    }

    #[test]
    fn rows_and_columns_select_the_right_cells() {
        let vars = grid(2, 3);

        let row: Vec<usize> = vars.row(1).map(VarId::index).collect();
        let column: Vec<usize> = vars.column(2).map(VarId::index).collect();

        assert_eq!(row, vec![3, 4, 5]);
        assert_eq!(column, vec![2, 5]);
        assert_eq!(vars.get(1, 2).map(VarId::index), Some(5));
        assert_eq!(vars.row(2).count(), 0);
        assert_eq!(vars.column(3).count(), 0);
    }

    #[test]
    fn solved_units_tolerates_numerical_noise() -> TestResult {
        let vars = grid(1, 2);
        let assignment = Assignment::new(vec![2.000_000_000_1, -0.000_000_000_1]);

        assert_eq!(solved_matrix(&assignment, &vars)?, vec![2, 0]);

        Ok(())
    }

    #[test]
    fn solved_units_rejects_fractional_values() {
        let vars = grid(1, 1);
        let assignment = Assignment::new(vec![0.5]);

        assert!(matches!(
            solved_matrix(&assignment, &vars),
            Err(SolverError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn solved_units_rejects_missing_values() {
        let vars = grid(1, 2);
        let assignment = Assignment::new(vec![1.0]);

        assert!(solved_matrix(&assignment, &vars).is_err());
    }
}
