//! Allot prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    allocation::Allocation,
    allocator::{AllocError, AllocationObserver, Allocator, NoopObserver, Solved},
    dataset::{Array, Attribute, Dataset, DatasetBuilder, DatasetError, Matrix, loader, random},
    formulations::{
        Formulation,
        discount::{DiscountFormulation, DiscountVars},
        market::MarketFormulation,
        model::{LinearExpr, ModelBuilder, Problem, Relation, VarId, VariableKind},
        quantity::QuantityFormulation,
    },
    report::{OutputFormat, Report, ReportError},
    solvers::{Assignment, SolveStatus, SolverBackend, SolverError, milp::MilpBackend},
    validation::{Inputs, ValidationError, validate},
    variants::{OutputStyle, Variant},
};
