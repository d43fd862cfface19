//! Scheduling domain models.
//!
//! Provides the data types a scheduling problem is built from and the
//! formula language it compiles to:
//!
//! - Decision variables and their store
//! - Linear expressions and boolean formulas
//! - Tasks, resources and the constraint library
//! - Assignments and the schedules read back from them
//!
//! # Domain Mappings
//!
//! | u-procsched | Manufacturing | Healthcare | Logistics |
//! |-------------|--------------|------------|-----------|
//! | Task | Operation | Procedure | Transport Leg |
//! | Resource | Machine/Worker | Room/Doctor | Truck/Driver |
//! | Constraint | Routing rule | Protocol | Delivery window |
//! | SolvedSchedule | Production Plan | OR Schedule | Route Plan |

mod constraint;
mod formula;
mod resource;
mod solution;
mod task;
mod variables;

pub use constraint::{Constraint, PrecedenceKind};
pub use formula::{CmpOp, Formula, FormulaDisplay, LinearExpr};
pub use resource::{Resource, ResourceId, ResourceSpec, SelectionKind};
pub use solution::{Assignment, SolvedSchedule, TaskSlot};
pub use task::{RequiredResource, Task, TaskId, TaskKind, TaskLength, TaskSpec};
pub use variables::{BoolVar, BoolVarInfo, IntVar, IntVarInfo, VariableStore};
