//! Allocator
//!
//! Runs one allocation end to end: validate the dataset, formulate the chosen variant,
//! solve it with the injected [`SolverBackend`] and extract the result.

use thiserror::Error;
use tracing::{debug, info};

use crate::{
    allocation::Allocation,
    dataset::Dataset,
    formulations::{
        Formulation,
        discount::DiscountFormulation,
        market::MarketFormulation,
        model::{Problem, render_number},
        quantity::QuantityFormulation,
    },
    report::Report,
    solvers::{Assignment, SolverBackend, SolverError},
    validation::{ValidationError, validate},
    variants::{OutputStyle, Variant},
};

/// Allocation Errors
#[derive(Debug, Error)]
pub enum AllocError {
    /// Wrapped validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Wrapped solver error
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Observer notified as an allocation progresses.
pub trait AllocationObserver {
    /// Called once the problem is built, before it is handed to the solver.
    fn on_problem(&mut self, problem: &Problem);

    /// Called once the solution has been extracted.
    fn on_solved(&mut self, _solved: &Solved) {}
}

/// Observer that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl AllocationObserver for NoopObserver {
    fn on_problem(&mut self, _problem: &Problem) {}
}

/// Outcome of a successful allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Solved {
    variant: Variant,
    problem: Problem,
    assignment: Assignment,
    allocation: Allocation,
    objective: f64,
}

impl Solved {
    /// Variant that was solved
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// The problem handed to the solver
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// Solved value of every variable
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Units bought per (market, product)
    pub fn allocation(&self) -> &Allocation {
        &self.allocation
    }

    /// Objective evaluated on the solved values
    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// `(name, value)` for every decision variable, in creation order.
    pub fn named_values(&self) -> Vec<(String, f64)> {
        self.problem
            .variables()
            .iter()
            .zip(self.assignment.values())
            .map(|(variable, &value)| (variable.name().to_string(), value))
            .collect()
    }

    /// Text shown to the user: `name = value` lines for market allocation, the unit grid
    /// otherwise.
    pub fn render(&self) -> String {
        match self.variant.output_style() {
            OutputStyle::NamedValues => {
                self.named_values()
                    .into_iter()
                    .map(|(name, value)| format!("{name} = {}\n", render_number(value)))
                    .collect()
            }
            OutputStyle::Grid => format!("{}\n", self.allocation),
        }
    }

    /// Serialisable `{Problem, Solution}` dump.
    pub fn report(&self) -> Report {
        Report {
            problem: self.problem.to_string(),
            solution: self.named_values(),
        }
    }
}

/// Runs allocations against a solver backend.
#[derive(Debug, Clone)]
pub struct Allocator<B> {
    backend: B,
}

impl<B: SolverBackend> Allocator<B> {
    /// Create an allocator over `backend`.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The injected backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Validate, formulate, solve and extract.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::Validation`] before anything is built if the dataset does not
    /// fit the variant, and [`AllocError::Solver`] if the solve is not optimal.
    pub fn solve(&self, variant: Variant, dataset: &Dataset) -> Result<Solved, AllocError> {
        self.solve_with_observer(variant, dataset, &mut NoopObserver)
    }

    /// [`Allocator::solve`] with an observer receiving the built problem and the result.
    ///
    /// # Errors
    ///
    /// See [`Allocator::solve`].
    pub fn solve_with_observer(
        &self,
        variant: Variant,
        dataset: &Dataset,
        observer: &mut dyn AllocationObserver,
    ) -> Result<Solved, AllocError> {
        let solved = match variant {
            Variant::Market => self.run(&MarketFormulation, dataset, observer),
            Variant::Quantity => self.run(&QuantityFormulation, dataset, observer),
            Variant::Discount => self.run(&DiscountFormulation, dataset, observer),
        }?;

        observer.on_solved(&solved);

        Ok(solved)
    }

    /// Validate and formulate without solving.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::Validation`] if the dataset does not fit the variant.
    pub fn formulate(&self, variant: Variant, dataset: &Dataset) -> Result<Problem, AllocError> {
        let problem = match variant {
            Variant::Market => build(&MarketFormulation, dataset)?.0,
            Variant::Quantity => build(&QuantityFormulation, dataset)?.0,
            Variant::Discount => build(&DiscountFormulation, dataset)?.0,
        };

        Ok(problem)
    }

    #[tracing::instrument(name = "allocate", skip_all, fields(variant = %formulation.variant()))]
    fn run<F: Formulation>(
        &self,
        formulation: &F,
        dataset: &Dataset,
        observer: &mut dyn AllocationObserver,
    ) -> Result<Solved, AllocError> {
        let (problem, vars) = build(formulation, dataset)?;

        observer.on_problem(&problem);

        let assignment = self.backend.solve(&problem)?;
        assignment.ensure_covers(&problem)?;

        let allocation = formulation.extract(&vars, &assignment)?;
        let objective = problem.objective().eval(|var| assignment.value(var));

        info!(objective, "allocation solved");

        Ok(Solved {
            variant: formulation.variant(),
            problem,
            assignment,
            allocation,
            objective,
        })
    }
}

fn build<F: Formulation>(
    formulation: &F,
    dataset: &Dataset,
) -> Result<(Problem, F::Vars), ValidationError> {
    let inputs = validate(dataset, formulation.variant())?;

    debug!(
        markets = inputs.markets(),
        products = inputs.products(),
        "dataset validated"
    );

    let (problem, vars) = formulation.formulate(&inputs);

    debug!(
        variables = problem.variables().len(),
        constraints = problem.constraints().len(),
        "problem formulated"
    );

    Ok((problem, vars))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use testresult::TestResult;

    use crate::{
        dataset::{Attribute, Matrix},
        solvers::SolveStatus,
    };

    use super::*;

    /// Backend returning fixed values and counting how often it was asked to solve.
    #[derive(Debug)]
    struct FixedBackend {
        values: Vec<f64>,
        calls: Cell<usize>,
    }

    impl FixedBackend {
        fn new(values: Vec<f64>) -> Self {
            Self {
                values,
                calls: Cell::new(0),
            }
        }
    }

    impl SolverBackend for FixedBackend {
        fn solve(&self, _problem: &Problem) -> Result<Assignment, SolverError> {
            self.calls.set(self.calls.get() + 1);

            Ok(Assignment::new(self.values.clone()))
        }
    }

    #[derive(Debug)]
    struct FailingBackend;

    impl SolverBackend for FailingBackend {
        fn solve(&self, _problem: &Problem) -> Result<Assignment, SolverError> {
            Err(SolverError::SolveFailure {
                status: SolveStatus::Infeasible,
                reason: "no feasible allocation".to_string(),
            })
        }
    }

    #[derive(Debug, Default)]
    struct RecordingObserver {
        problems: Vec<String>,
        solved: usize,
    }

    impl AllocationObserver for RecordingObserver {
        fn on_problem(&mut self, problem: &Problem) {
            self.problems.push(problem.name().to_string());
        }

        fn on_solved(&mut self, _solved: &Solved) {
            self.solved += 1;
        }
    }

    fn single_market(limit: Vec<f64>) -> Result<Dataset, Box<dyn std::error::Error>> {
        let mut builder = Dataset::builder();

        builder
            .set(Attribute::Prices, Matrix::from_rows("p", vec![vec![2.0, 3.0]])?)?
            .set(
                Attribute::Quantities,
                Matrix::from_rows("q", vec![vec![1.0, 1.0]])?,
            )?
            .set(Attribute::Demand, vec![1.0, 1.0])?
            .set(Attribute::Limit, limit)?;

        Ok(builder.build())
    }

    #[test]
    fn invalid_dataset_never_reaches_the_backend() -> TestResult {
        let backend = FixedBackend::new(vec![1.0, 1.0]);
        let allocator = Allocator::new(&backend);
        let dataset = single_market(vec![5.0, 5.0])?;

        let err = allocator.solve(Variant::Market, &dataset).err();

        assert!(matches!(
            err,
            Some(AllocError::Validation(ValidationError::LimitLength { .. }))
        ));
        assert_eq!(backend.calls.get(), 0);

        Ok(())
    }

    #[test]
    fn objective_is_evaluated_on_backend_values() -> TestResult {
        let allocator = Allocator::new(FixedBackend::new(vec![1.0, 1.0]));

        let solved = allocator.solve(Variant::Market, &single_market(vec![5.0])?)?;

        assert!((solved.objective() - 5.0).abs() < 1e-9);
        assert_eq!(solved.allocation().to_string(), "1 1");
        assert_eq!(allocator.backend().calls.get(), 1);

        Ok(())
    }

    #[test]
    fn market_renders_named_values_and_quantity_renders_a_grid() -> TestResult {
        let allocator = Allocator::new(FixedBackend::new(vec![1.0, 1.0]));
        let dataset = single_market(vec![5.0])?;

        let market = allocator.solve(Variant::Market, &dataset)?;
        let quantity = allocator.solve(Variant::Quantity, &dataset)?;

        assert_eq!(market.render(), "x_1_1 = 1\nx_1_2 = 1\n");
        assert_eq!(quantity.render(), "1 1\n");

        Ok(())
    }

    #[test]
    fn rendering_and_reporting_are_repeatable() -> TestResult {
        let allocator = Allocator::new(FixedBackend::new(vec![1.0, 1.0]));
        let solved = allocator.solve(Variant::Quantity, &single_market(vec![5.0])?)?;

        assert_eq!(solved.render(), solved.render());
        assert_eq!(solved.report(), solved.report());

        Ok(())
    }

    #[test]
    fn report_pairs_problem_dump_with_named_values() -> TestResult {
        let allocator = Allocator::new(FixedBackend::new(vec![1.0, 0.0]));
        let solved = allocator.solve(Variant::Market, &single_market(vec![5.0])?)?;

        let report = solved.report();

        assert!(report.problem.starts_with("market_allocation:\nMINIMIZE\n2*x_1_1 + 3*x_1_2\n"));
        assert_eq!(
            report.solution,
            vec![("x_1_1".to_string(), 1.0), ("x_1_2".to_string(), 0.0)]
        );

        Ok(())
    }

    #[test]
    fn short_assignment_is_an_invariant_violation() -> TestResult {
        let allocator = Allocator::new(FixedBackend::new(vec![1.0]));

        let err = allocator
            .solve(Variant::Market, &single_market(vec![5.0])?)
            .err();

        assert!(matches!(
            err,
            Some(AllocError::Solver(SolverError::InvariantViolation { .. }))
        ));

        Ok(())
    }

    #[test]
    fn solve_failure_is_propagated_unchanged() -> TestResult {
        let allocator = Allocator::new(FailingBackend);

        let err = allocator
            .solve(Variant::Market, &single_market(vec![5.0])?)
            .err();

        let Some(AllocError::Solver(err)) = err else {
            return Err("expected a solver error".into());
        };

        assert_eq!(err.status(), Some(SolveStatus::Infeasible));

        Ok(())
    }

    #[test]
    fn observer_sees_problem_before_solve_and_result_after() -> TestResult {
        let allocator = Allocator::new(FixedBackend::new(vec![1.0, 1.0]));
        let mut observer = RecordingObserver::default();

        allocator.solve_with_observer(
            Variant::Quantity,
            &single_market(vec![5.0])?,
            &mut observer,
        )?;

        assert_eq!(observer.problems, vec!["quantity_allocation".to_string()]);
        assert_eq!(observer.solved, 1);

        Ok(())
    }

    #[test]
    fn observer_sees_problem_even_when_solve_fails() -> TestResult {
        let allocator = Allocator::new(FailingBackend);
        let mut observer = RecordingObserver::default();

        let result = allocator.solve_with_observer(
            Variant::Market,
            &single_market(vec![5.0])?,
            &mut observer,
        );

        assert!(result.is_err());
        assert_eq!(observer.problems.len(), 1);
        assert_eq!(observer.solved, 0);

        Ok(())
    }

    #[test]
    fn alloc_errors_keep_the_underlying_message() {
        let validation = AllocError::from(ValidationError::LimitLength {
            expected: 2,
            found: 1,
        });
        let solver = AllocError::from(SolverError::invariant("bad cell"));

        assert!(matches!(validation, AllocError::Validation(_)));
        assert_eq!(
            validation.to_string(),
            "limit has 1 entries, expected one per market (2)"
        );
        assert!(matches!(solver, AllocError::Solver(_)));
        assert_eq!(solver.to_string(), "solver invariant violated: bad cell");
    }

    #[test]
    fn formulate_does_not_solve() -> TestResult {
        let backend = FixedBackend::new(Vec::new());
        let allocator = Allocator::new(&backend);

        let problem = allocator.formulate(Variant::Discount, &single_market(vec![0.5])?)?;

        assert_eq!(problem.name(), "discount_allocation");
        assert_eq!(backend.calls.get(), 0);

        Ok(())
    }
}
