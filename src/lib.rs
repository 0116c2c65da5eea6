//! Allot
//!
//! Allot decides how many units of each product to buy from each market by formulating
//! the choice as a mixed-integer linear program and handing it to a MILP solver.
//!
//! Three variants share one pipeline: a [`dataset`](crate::dataset) is checked by
//! [`validation`](crate::validation), turned into a backend-neutral
//! [`Problem`](crate::formulations::model::Problem) by one of the
//! [`formulations`](crate::formulations), solved through a
//! [`SolverBackend`](crate::solvers::SolverBackend) and read back as an
//! [`Allocation`](crate::allocation::Allocation).

pub mod allocation;
pub mod allocator;
pub mod config;
pub mod dataset;
pub mod formulations;
pub mod prelude;
pub mod report;
pub mod solvers;
pub mod validation;
pub mod variants;
