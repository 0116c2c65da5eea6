//! Quantity allocation
//!
//! Same model as [`market`](crate::formulations::market); the variant only differs in
//! requiring strictly positive inputs and in printing its result as a grid.

use crate::{
    allocation::Allocation,
    formulations::{
        Formulation, VarMatrix,
        market::{
            add_capacity_constraints, add_cost_objective, add_demand_constraints,
            add_unit_variables, extract_units,
        },
        model::ModelBuilder,
    },
    solvers::{Assignment, SolverError},
    validation::Inputs,
    variants::Variant,
};

/// Market allocation over strictly positive inputs.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuantityFormulation;

impl Formulation for QuantityFormulation {
    type Vars = VarMatrix;

    fn variant(&self) -> Variant {
        Variant::Quantity
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
