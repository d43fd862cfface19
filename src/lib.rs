//! Constraint-based scheduling modeler for the U-Engine ecosystem.
//!
//! Describes scheduling problems (tasks, resources, temporal and resource
//! constraints, logical combinations of constraints) and compiles them to a
//! flat conjunction of boolean formulas over integer and boolean decision
//! variables. Solving is left to an external engine behind the [`Solver`]
//! trait.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `Resource`, `Constraint`,
//!   `Formula`, `LinearExpr`, `Assignment`, `SolvedSchedule`
//! - **`context`**: `SchedulingContext`, the per-problem registry that owns
//!   variables, entities and assertions
//! - **`logic`**: `Assertion` trees and the `not`/`and`/`or`/`xor`/
//!   `implies`/`if_then_else` combinators
//! - **`solver`**: `SatProblem`, `SolveOutcome` and the `Solver` seam
//! - **`validation`**: Pre-solve lint (unused resources, precedence cycles)
//! - **`error`**: `ModelError` and its categories
//!
//! # Example
//!
//! ```
//! use u_procsched::{Constraint, PrecedenceKind, SchedulingContext};
//!
//! let mut ctx = SchedulingContext::new("assembly");
//! let cut = ctx.add_fixed_duration_task("cut", 3).unwrap();
//! let glue = ctx.add_fixed_duration_task("glue", 2).unwrap();
//! let w1 = ctx.add_worker("W1").unwrap();
//! ctx.add_required_resources(cut, [w1]).unwrap();
//! ctx.add_constraint(Constraint::task_precedence(cut, glue, 0, PrecedenceKind::Lax))
//!     .unwrap();
//!
//! let problem = ctx.problem();
//! assert!(!problem.assertions.is_empty());
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Baptiste, Le Pape, Nuijten (2001), "Constraint-Based Scheduling"

pub mod context;
pub mod error;
pub mod logic;
pub mod models;
pub mod solver;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use context::{ConstraintOrigin, ContextConfig, PostedConstraint, SchedulingContext};
pub use error::{ErrorKind, ModelError, ModelResult};
pub use logic::Assertion;
pub use models::{
    Assignment, BoolVar, Constraint, Formula, IntVar, LinearExpr, PrecedenceKind, ResourceId,
    ResourceSpec, SelectionKind, SolvedSchedule, TaskId, TaskSpec,
};
pub use solver::{SatProblem, SolveOutcome, Solver};
pub use validation::{validate_context, ValidationError, ValidationErrorKind};
