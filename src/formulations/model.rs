//! Backend-neutral linear model

use std::fmt;

use smallvec::SmallVec;

/// Index of a decision variable within its [`Problem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    /// Position in [`Problem::variables`].
    pub fn index(self) -> usize {
        self.0
    }
}

/// Domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// Non-negative integer
    Integer,

    /// Zero or one
    Binary,
}

/// A named decision variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDef {
    name: String,
    kind: VariableKind,
}

impl VariableDef {
    /// Variable name (e.g. `x_1_2`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variable domain
    pub fn kind(&self) -> VariableKind {
        self.kind
    }
}

/// Linear combination of decision variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: SmallVec<[(VarId, f64); 8]>,
}

impl LinearExpr {
    /// Empty expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `coefficient * var`.
    pub fn add_term(&mut self, var: VarId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    /// Builder-style [`LinearExpr::add_term`].
    #[must_use]
    pub fn with_term(mut self, var: VarId, coefficient: f64) -> Self {
        self.add_term(var, coefficient);
        self
    }

    /// `(variable, coefficient)` pairs in insertion order.
    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    /// Evaluate against per-variable values; a missing value counts as zero.
    pub fn eval(&self, value: impl Fn(VarId) -> Option<f64>) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coefficient)| coefficient * value(var).unwrap_or(0.0))
            .sum()
    }
}

impl FromIterator<(VarId, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}

/// Relation operator for a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Less than or equal (`lhs <= rhs`)
    Leq,

    /// Equality (`lhs == rhs`)
    Eq,

    /// Greater than or equal (`lhs >= rhs`)
    Geq,
}

impl Relation {
    /// Whether `lhs relation rhs` holds within `tolerance`.
    pub fn holds(self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            Relation::Leq => lhs <= rhs + tolerance,
            Relation::Eq => (lhs - rhs).abs() <= tolerance,
            Relation::Geq => lhs + tolerance >= rhs,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::Leq => "<=",
            Relation::Eq => "=",
            Relation::Geq => ">=",
        })
    }
}

/// Named linear constraint `lhs relation rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    name: String,
    lhs: LinearExpr,
    relation: Relation,
    rhs: f64,
}

impl Constraint {
    /// Constraint name (e.g. `demand_2`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Left-hand side
    pub fn lhs(&self) -> &LinearExpr {
        &self.lhs
    }

    /// Relation operator
    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Right-hand side scalar
    pub fn rhs(&self) -> f64 {
        self.rhs
    }
}

/// Records variables, objective and constraints while a formulation is built.
#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    variables: Vec<VariableDef>,
    objective: LinearExpr,
    constraints: Vec<Constraint>,
}

impl ModelBuilder {
    /// Start an empty minimisation problem.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            objective: LinearExpr::new(),
            constraints: Vec::new(),
        }
    }

    /// Add a decision variable.
    pub fn add_variable(&mut self, name: impl Into<String>, kind: VariableKind) -> VarId {
        let id = VarId(self.variables.len());

        self.variables.push(VariableDef {
            name: name.into(),
            kind,
        });

        id
    }

    /// Add a non-negative integer variable.
    pub fn add_integer(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(name, VariableKind::Integer)
    }

    /// Add a binary variable.
    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(name, VariableKind::Binary)
    }

    /// Add `coefficient * var` to the minimised objective.
    pub fn add_to_objective(&mut self, var: VarId, coefficient: f64) {
        self.objective.add_term(var, coefficient);
    }

    /// Record a constraint.
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        lhs: LinearExpr,
        relation: Relation,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name: name.into(),
            lhs,
            relation,
            rhs,
        });
    }

    /// Record a less-than-or-equal constraint.
    pub fn add_leq_constraint(&mut self, name: impl Into<String>, lhs: LinearExpr, rhs: f64) {
        self.add_constraint(name, lhs, Relation::Leq, rhs);
    }

    /// Record an equality constraint.
    pub fn add_eq_constraint(&mut self, name: impl Into<String>, lhs: LinearExpr, rhs: f64) {
        self.add_constraint(name, lhs, Relation::Eq, rhs);
    }

    /// Record a greater-than-or-equal constraint.
    pub fn add_geq_constraint(&mut self, name: impl Into<String>, lhs: LinearExpr, rhs: f64) {
        self.add_constraint(name, lhs, Relation::Geq, rhs);
    }

    /// Freeze into a [`Problem`].
    pub fn finish(self) -> Problem {
        Problem {
            name: self.name,
            variables: self.variables,
            objective: self.objective,
            constraints: self.constraints,
        }
    }
}

/// A complete minimisation MILP. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    name: String,
    variables: Vec<VariableDef>,
    objective: LinearExpr,
    constraints: Vec<Constraint>,
}

impl Problem {
    /// Problem name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decision variables, indexed by [`VarId::index`]
    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    /// Look up a variable definition.
    pub fn variable(&self, var: VarId) -> Option<&VariableDef> {
        self.variables.get(var.index())
    }

    /// Minimised objective
    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// Constraints in the order they were recorded
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    fn write_expression(&self, f: &mut fmt::Formatter<'_>, expr: &LinearExpr) -> fmt::Result {
        let mut first = true;

        for &(var, coefficient) in expr.terms() {
            if coefficient.abs() < f64::EPSILON {
                continue;
            }

            let name = self.variable(var).map_or("?", VariableDef::name);

            if first {
                if coefficient < 0.0 {
                    f.write_str("-")?;
                }

                first = false;
            } else if coefficient < 0.0 {
                f.write_str(" - ")?;
            } else {
                f.write_str(" + ")?;
            }

            let magnitude = coefficient.abs();

            if (magnitude - 1.0).abs() < f64::EPSILON {
                f.write_str(name)?;
            } else {
                write!(f, "{}*{name}", render_number(magnitude))?;
            }
        }

        if first {
            f.write_str("0")?;
        }

        Ok(())
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        writeln!(f, "MINIMIZE")?;
        self.write_expression(f, &self.objective)?;
        writeln!(f)?;
        writeln!(f, "SUBJECT TO")?;

        for constraint in &self.constraints {
            write!(f, "{}: ", constraint.name)?;
            self.write_expression(f, &constraint.lhs)?;
            writeln!(
                f,
                " {} {}",
                constraint.relation,
                render_number(constraint.rhs)
            )?;
        }

        writeln!(f)?;
        writeln!(f, "VARIABLES")?;

        for variable in &self.variables {
            match variable.kind {
                VariableKind::Integer => writeln!(f, "0 <= {} Integer", variable.name)?,
                VariableKind::Binary => writeln!(f, "0 <= {} <= 1 Integer", variable.name)?,
            }
        }

        Ok(())
    }
}

/// Render whole numbers without a fractional part.
pub(crate) fn render_number(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}
