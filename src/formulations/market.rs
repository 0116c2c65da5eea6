//! Market allocation
//!
//! ```text
//! minimise   Σ_i Σ_j price[i][j] · x[i][j]
//! subject to Σ_j quantity[i][j] · x[i][j] ≤ limit[i]     for every market i
//!            Σ_i quantity[i][j] · x[i][j] ≥ demand[j]    for every product j
//!            x[i][j] ∈ ℤ, x[i][j] ≥ 0
//! ```

use crate::{
    allocation::Allocation,
    formulations::{
        Formulation, VarMatrix,
        model::{LinearExpr, ModelBuilder},
        solved_matrix,
    },
    solvers::{Assignment, SolverError},
    validation::Inputs,
    variants::Variant,
};

/// Plain market allocation.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarketFormulation;

impl Formulation for MarketFormulation {
    type Vars = VarMatrix;

    fn variant(&self) -> Variant {
        Variant::Market
    }

    fn add_variables(&self, inputs: &Inputs<'_>, model: &mut ModelBuilder) -> VarMatrix {
        add_unit_variables(inputs, model)
    }

    fn add_objective(&self, inputs: &Inputs<'_>, vars: &VarMatrix, model: &mut ModelBuilder) {
        add_cost_objective(inputs, vars, model);
    }

    fn add_constraints(&self, inputs: &Inputs<'_>, vars: &VarMatrix, model: &mut ModelBuilder) {
        add_capacity_constraints(inputs, vars, model);
        add_demand_constraints(inputs, vars, model);
    }

    fn extract(&self, vars: &VarMatrix, assignment: &Assignment) -> Result<Allocation, SolverError> {
        extract_units(vars, assignment)
    }
}

/// `x_{i+1}_{j+1}`: units of product `j` bought at market `i`.
pub(crate) fn add_unit_variables(inputs: &Inputs<'_>, model: &mut ModelBuilder) -> VarMatrix {
    VarMatrix::new(inputs.markets(), inputs.products(), |market, product| {
        model.add_integer(format!("x_{}_{}", market + 1, product + 1))
    })
}

pub(crate) fn add_cost_objective(inputs: &Inputs<'_>, vars: &VarMatrix, model: &mut ModelBuilder) {
    for (&var, &price) in vars.ids().iter().zip(inputs.prices().values()) {
        model.add_to_objective(var, price);
    }
}

/// Quantity bought at each market must fit within its limit.
pub(crate) fn add_capacity_constraints(
    inputs: &Inputs<'_>,
    vars: &VarMatrix,
    model: &mut ModelBuilder,
) {
    let quantities = inputs.quantities();

    for (market, &limit) in inputs.limit().iter().enumerate() {
        let lhs: LinearExpr = vars
            .row(market)
            .enumerate()
            .filter_map(|(product, var)| Some((var, quantities.get(market, product)?)))
            .collect();

        model.add_leq_constraint(format!("capacity_{}", market + 1), lhs, limit);
    }
}

/// Quantity bought of each product must cover its demand; overshooting is allowed.
pub(crate) fn add_demand_constraints(
    inputs: &Inputs<'_>,
    vars: &VarMatrix,
    model: &mut ModelBuilder,
) {
    let quantities = inputs.quantities();

    for (product, &demand) in inputs.demand().iter().enumerate() {
        let lhs: LinearExpr = vars
            .column(product)
            .enumerate()
            .filter_map(|(market, var)| Some((var, quantities.get(market, product)?)))
            .collect();

        model.add_geq_constraint(format!("demand_{}", product + 1), lhs, demand);
    }
}

pub(crate) fn extract_units(
    vars: &VarMatrix,
    assignment: &Assignment,
) -> Result<Allocation, SolverError> {
    let (markets, products) = vars.shape();
    let units = solved_matrix(assignment, vars)?;

    Allocation::new(markets, products, units)
        .ok_or_else(|| SolverError::invariant("allocation shape does not match variables"))
}
