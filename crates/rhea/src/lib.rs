//! An incremental linear constraint solver based on the Cassowary algorithm.
//!
//! The solver maintains a set of weighted linear equalities and inequalities
//! over real-valued variables. Required constraints must hold exactly; weaker
//! constraints are satisfied as well as their strengths allow. The simplex
//! tableau is kept optimal and feasible across mutations, so constraints can
//! be added, removed, and re-suggested many times per second, which is what
//! interactive layout needs.
//!
//! Constraints are built from [`Variable`]s with ordinary arithmetic:
//!
//! ```
//! use rhea::{Relation, Solver, Strength, Variable};
//!
//! let left = Variable::named("left");
//! let width = Variable::named("width");
//! let right = Variable::named("right");
//!
//! let mut solver = Solver::new();
//! solver
//!     .create_constraint(
//!         right.clone(),
//!         Relation::Equal,
//!         left.clone() + width.clone(),
//!         Strength::REQUIRED,
//!     )
//!     .unwrap();
//! solver
//!     .create_constraint(width.clone(), Relation::Equal, 200.0, Strength::STRONG)
//!     .unwrap();
//! solver
//!     .create_constraint(left.clone(), Relation::Equal, 0.0, Strength::WEAK)
//!     .unwrap();
//!
//! solver.update_variables();
//! assert!((right.value() - 200.0).abs() < 1e-6);
//! ```
//!
//! For values that change every frame, register an edit variable and drive
//! it with [`Solver::suggest_value`]; the solver re-solves incrementally
//! through a dual optimization instead of from scratch.

mod constraint;
mod errors;
mod expression;
mod row;
mod solver;
mod strength;
mod symbol;
mod variable;

pub use constraint::{Constraint, Relation};
pub use errors::{
    AddConstraintError, AddEditVariableError, InternalSolverError, RemoveConstraintError,
    RemoveEditVariableError, SolverError, SuggestValueError,
};
pub use expression::Expression;
pub use solver::Solver;
pub use strength::Strength;
pub use variable::Variable;
