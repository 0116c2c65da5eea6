//! MILP backend over `good_lp`

use good_lp::{
    Expression, ProblemVariables, Solution, SolutionStatus, SolverModel, Variable,
    VariableDefinition, variable,
};
use tracing::debug;

#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as default_solver;
#[cfg(all(not(feature = "solver-highs"), feature = "solver-microlp"))]
use good_lp::solvers::microlp::microlp as default_solver;

/// microlp clamps integer variables to `i32::MAX` instead of reporting unboundedness.
const INTEGER_CEILING: f64 = 2_147_483_647.0;

use crate::{
    formulations::model::{LinearExpr, Problem, Relation, VariableKind},
    solvers::{Assignment, SolveStatus, SolverBackend, SolverError},
};

/// Solver backend using Mixed Integer Linear Programming (MILP) through `good_lp`.
///
/// The concrete solver is chosen at compile time: HiGHS with the `solver-highs` feature,
/// otherwise the bundled `microlp`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MilpBackend;

impl SolverBackend for MilpBackend {
    #[tracing::instrument(
        name = "milp.solve",
        skip_all,
        fields(
            problem = problem.name(),
            variables = problem.variables().len(),
            constraints = problem.constraints().len()
        )
    )]
    fn solve(&self, problem: &Problem) -> Result<Assignment, SolverError> {
        let mut pb = ProblemVariables::new();

        let vars: Vec<Variable> = problem
            .variables()
            .iter()
            .map(|def| pb.add(definition(def.kind())))
            .collect();

        let objective = expression(&vars, problem.objective())?;

        let mut model = pb.minimise(objective).using(default_solver);

        for constraint in problem.constraints() {
            let lhs = expression(&vars, constraint.lhs())?;
            let rhs = constraint.rhs();

            model = match constraint.relation() {
                Relation::Eq => model.with(lhs.eq(rhs)),
                Relation::Leq => model.with(lhs.leq(rhs)),
                Relation::Geq => model.with(lhs.geq(rhs)),
            };
        }

        let solution = model.solve()?;

        // Time or gap limits leave a feasible but unproven solution; treat it as a failure
        // rather than reporting its values.
        let status = solution.status();

        if !matches!(status, SolutionStatus::Optimal) {
            return Err(SolverError::SolveFailure {
                status: SolveStatus::SolverError,
                reason: format!("solver stopped before optimality: {status:?}"),
            });
        }

        let values: Vec<f64> = vars.iter().map(|&var| solution.value(var)).collect();

        let ceiling = problem
            .variables()
            .iter()
            .zip(&values)
            .find(|(def, value)| {
                def.kind() == VariableKind::Integer && value.round() >= INTEGER_CEILING
            });

        if let Some((def, value)) = ceiling {
            return Err(SolverError::SolveFailure {
                status: SolveStatus::Unbounded,
                reason: format!("{} reached the integer ceiling ({value})", def.name()),
            });
        }

        debug!(values = values.len(), "read solved variable values");

        Ok(Assignment::new(values))
    }
}

fn definition(kind: VariableKind) -> VariableDefinition {
    match kind {
        VariableKind::Integer => variable().integer().min(0),
        VariableKind::Binary => variable().binary(),
    }
}

/// Translate a [`LinearExpr`] into a `good_lp` expression over `vars`.
fn expression(vars: &[Variable], expr: &LinearExpr) -> Result<Expression, SolverError> {
    let mut out = Expression::default();

    for &(var, coefficient) in expr.terms() {
        let variable = vars
            .get(var.index())
            .ok_or_else(|| SolverError::invariant("expression references an unknown variable"))?;

        out += *variable * coefficient;
    }

    Ok(out)
}
