//! A solver-agnostic representation of mixed-integer linear programs.

pub mod assignment;
pub mod expr;
pub mod lp_format;
pub mod model;

pub use assignment::{Assignment, Violation};
pub use expr::{Comparison, LinExpr, LinSum, Relation, Sense, VarId};
pub use model::{
    BuildError, Constraint, Model, ModelBuilder, ModelInterface, Objective, ObjectiveSense,
    VarKind, Variable,
};
