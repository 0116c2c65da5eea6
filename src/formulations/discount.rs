//! Discount-aware allocation
//!
//! Every market either sells at its standard prices or, once switched into discount
//! mode, at `1 - discount[i]` of them. The choice is a binary `y[i]`:
//!
//! ```text
//! minimise   Σ_i Σ_j price[i][j] · (x[i][j] + (1 - discount[i]) · x'[i][j])
//! subject to Σ_i (x[i][j] + x'[i][j]) = demand[j]          for every product j
//!            x[i][j]  ≤ (1 - y[i]) · demand[j]             for every market i, product j
//!            x'[i][j] ≤ y[i] · demand[j]
//!            x, x' ∈ ℤ≥0, y ∈ {0, 1}
//! ```
//!
//! Because demand must be met exactly, no cell can ever exceed `demand[j]`, so it is a
//! tight bound for the gating constraints and no big-M constant is needed.

use crate::{
    allocation::Allocation,
    formulations::{
        Formulation, VarMatrix,
        model::{LinearExpr, ModelBuilder, VarId},
        solved_units,
    },
    solvers::{Assignment, SolverError},
    validation::Inputs,
    variants::Variant,
};

/// Discount-aware allocation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscountFormulation;

/// Decision variables of the discount formulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountVars {
    /// `x_{i+1}_{j+1}`: units at standard price
    pub standard: VarMatrix,

    /// `_x_{i+1}_{j+1}`: units at discounted price
    pub discounted: VarMatrix,

    /// `y_{i+1}`: market operates in discount mode
    pub modes: Vec<VarId>,
}

impl Formulation for DiscountFormulation {
    type Vars = DiscountVars;

    fn variant(&self) -> Variant {
        Variant::Discount
    }

    fn add_variables(&self, inputs: &Inputs<'_>, model: &mut ModelBuilder) -> DiscountVars {
        let (markets, products) = (inputs.markets(), inputs.products());

        let standard = VarMatrix::new(markets, products, |market, product| {
            model.add_integer(format!("x_{}_{}", market + 1, product + 1))
        });

        let discounted = VarMatrix::new(markets, products, |market, product| {
            model.add_integer(format!("_x_{}_{}", market + 1, product + 1))
        });

        let modes = (0..markets)
            .map(|market| model.add_binary(format!("y_{}", market + 1)))
            .collect();

        DiscountVars {
            standard,
            discounted,
            modes,
        }
    }

    fn add_objective(&self, inputs: &Inputs<'_>, vars: &DiscountVars, model: &mut ModelBuilder) {
        let prices = inputs.prices();

        for (market, &discount) in inputs.discounts().iter().enumerate() {
            let cells = vars.standard.row(market).zip(vars.discounted.row(market));

            for (product, (standard, discounted)) in cells.enumerate() {
                let Some(price) = prices.get(market, product) else {
                    continue;
                };

                model.add_to_objective(standard, price);
                model.add_to_objective(discounted, price * (1.0 - discount));
            }
        }
    }

    fn add_constraints(&self, inputs: &Inputs<'_>, vars: &DiscountVars, model: &mut ModelBuilder) {
        let demand = inputs.demand();

        // Demand is met exactly, counting both price tiers.
        for (product, &required) in demand.iter().enumerate() {
            let lhs: LinearExpr = vars
                .standard
                .column(product)
                .chain(vars.discounted.column(product))
                .map(|var| (var, 1.0))
                .collect();

            model.add_eq_constraint(format!("demand_{}", product + 1), lhs, required);
        }

        // Gate each tier on the market's mode:
        //   x  ≤ (1 - y) · d   ⇔   x  + d·y ≤ d
        //   x' ≤ y · d         ⇔   x' - d·y ≤ 0
        for (market, &mode) in vars.modes.iter().enumerate() {
            let cells = vars.standard.row(market).zip(vars.discounted.row(market));

            for (product, ((standard, discounted), &required)) in cells.zip(demand).enumerate() {
                let suffix = format!("{}_{}", market + 1, product + 1);

                model.add_leq_constraint(
                    format!("standard_{suffix}"),
                    LinearExpr::new()
                        .with_term(standard, 1.0)
                        .with_term(mode, required),
                    required,
                );

                model.add_leq_constraint(
                    format!("discounted_{suffix}"),
                    LinearExpr::new()
                        .with_term(discounted, 1.0)
                        .with_term(mode, -required),
                    0.0,
                );
            }
        }
    }

    fn extract(
        &self,
        vars: &DiscountVars,
        assignment: &Assignment,
    ) -> Result<Allocation, SolverError> {
        let (markets, products) = vars.standard.shape();

        let modes = vars
            .modes
            .iter()
            .enumerate()
            .map(|(market, &var)| match solved_units(assignment, var)? {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(SolverError::invariant(format!(
                    "discount mode of market {} is {other}, expected 0 or 1",
                    market + 1
                ))),
            })
            .collect::<Result<Vec<bool>, SolverError>>()?;

        let mut units = Vec::with_capacity(markets * products);

        for (market, &discounted_mode) in modes.iter().enumerate() {
            let cells = vars.standard.row(market).zip(vars.discounted.row(market));

            for (product, (standard, discounted)) in cells.enumerate() {
                let standard = solved_units(assignment, standard)?;
                let discounted = solved_units(assignment, discounted)?;

                let gated = if discounted_mode {
                    standard == 0
                } else {
                    discounted == 0
                };

                if !gated {
                    return Err(SolverError::invariant(format!(
                        "market {} buys product {} at both price tiers ({standard} standard, {discounted} discounted, discount mode {discounted_mode})",
                        market + 1,
                        product + 1
                    )));
                }

                // At most one tier is non-zero, so the larger one is the purchase.
                units.push(standard.max(discounted));
            }
        }

        Allocation::new(markets, products, units)
            .map(|allocation| allocation.with_discount_modes(modes))
            .ok_or_else(|| SolverError::invariant("allocation shape does not match variables"))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        dataset::{Attribute, Dataset, Matrix},
        formulations::model::{Problem, Relation, VariableDef},
        validation::validate,
    };

    use super::*;

    /// One market, two products, demand `[4, 4]`, 50% discount.
    fn single_market() -> Result<Dataset, Box<dyn std::error::Error>> {
        let mut builder = Dataset::builder();

        builder
            .set(
                Attribute::Prices,
                Matrix::from_rows("p", vec![vec![2.0, 6.0]])?,
            )?
            .set(
                Attribute::Quantities,
                Matrix::from_rows("q", vec![vec![1.0, 1.0]])?,
            )?
            .set(Attribute::Demand, vec![4.0, 4.0])?
            .set(Attribute::Limit, vec![0.5])?;

        Ok(builder.build())
    }

    fn formulate() -> Result<(Problem, DiscountVars), Box<dyn std::error::Error>> {
        let dataset = single_market()?;
        let inputs = validate(&dataset, Variant::Discount)?;

        Ok(DiscountFormulation.formulate(&inputs))
    }

    #[test]
    fn names_standard_discounted_and_mode_variables() -> TestResult {
        let (problem, vars) = formulate()?;

        let names: Vec<&str> = problem.variables().iter().map(VariableDef::name).collect();

        assert_eq!(names, vec!["x_1_1", "x_1_2", "_x_1_1", "_x_1_2", "y_1"]);
        assert_eq!(vars.modes.len(), 1);

        Ok(())
    }

    #[test]
    fn discounted_units_cost_less_in_the_objective() -> TestResult {
        let (problem, _vars) = formulate()?;

        let coefficients: Vec<f64> = problem.objective().terms().iter().map(|t| t.1).collect();

        assert_eq!(coefficients, vec![2.0, 1.0, 6.0, 3.0]);

        Ok(())
    }

    #[test]
    fn demand_is_an_equality_over_both_tiers() -> TestResult {
        let (problem, vars) = formulate()?;

        let demand_1 = problem
            .constraints()
            .iter()
            .find(|c| c.name() == "demand_1")
            .ok_or("demand_1 missing")?;

        assert_eq!(demand_1.relation(), Relation::Eq);
        assert!((demand_1.rhs() - 4.0).abs() < f64::EPSILON);
        assert_eq!(
            demand_1.lhs().terms(),
            &[
                (vars.standard.get(0, 0).ok_or("x_1_1")?, 1.0),
                (vars.discounted.get(0, 0).ok_or("_x_1_1")?, 1.0),
            ]
        );

        Ok(())
    }

    #[test]
    fn gates_use_demand_as_the_bound() -> TestResult {
        let (problem, vars) = formulate()?;
        let y = *vars.modes.first().ok_or("y_1")?;

        let standard = problem
            .constraints()
            .iter()
            .find(|c| c.name() == "standard_1_2")
            .ok_or("standard_1_2 missing")?;

        let discounted = problem
            .constraints()
            .iter()
            .find(|c| c.name() == "discounted_1_2")
            .ok_or("discounted_1_2 missing")?;

        assert_eq!(standard.relation(), Relation::Leq);
        assert!((standard.rhs() - 4.0).abs() < f64::EPSILON);
        assert!(standard.lhs().terms().contains(&(y, 4.0)));

        assert_eq!(discounted.relation(), Relation::Leq);
        assert!(discounted.rhs().abs() < f64::EPSILON);
        assert!(discounted.lhs().terms().contains(&(y, -4.0)));

        // 1 demand + 2 gates per cell
        assert_eq!(problem.constraints().len(), 2 + 2 * 2);

        Ok(())
    }

    #[test]
    fn extraction_takes_the_active_tier() -> TestResult {
        let (_problem, vars) = formulate()?;

        // x_1_1, x_1_2, _x_1_1, _x_1_2, y_1
        let assignment = Assignment::new(vec![0.0, 0.0, 4.0, 4.0, 1.0]);

        let allocation = DiscountFormulation.extract(&vars, &assignment)?;

        assert_eq!(allocation.to_string(), "4 4");
        assert_eq!(allocation.discount_modes(), Some(&[true][..]));

        Ok(())
    }

    #[test]
    fn extraction_rejects_both_tiers_in_one_cell() -> TestResult {
        let (_problem, vars) = formulate()?;
        let assignment = Assignment::new(vec![2.0, 0.0, 2.0, 4.0, 1.0]);

        let result = DiscountFormulation.extract(&vars, &assignment);

        assert!(matches!(result, Err(SolverError::InvariantViolation { .. })));

        Ok(())
    }

    #[test]
    fn extraction_rejects_fractional_mode() -> TestResult {
        let (_problem, vars) = formulate()?;
        let assignment = Assignment::new(vec![2.0, 2.0, 2.0, 2.0, 0.5]);

        let result = DiscountFormulation.extract(&vars, &assignment);

        assert!(matches!(result, Err(SolverError::InvariantViolation { .. })));

        Ok(())
    }
}
