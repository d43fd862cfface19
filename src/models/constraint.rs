//! Scheduling constraints.
//!
//! A [`Constraint`] is an immutable value describing a scheduling rule.
//! Building one never touches a context: it is asserted explicitly with
//! [`SchedulingContext::add_constraint`] or composed inside a logical
//! combinator, which translates it to a [`Formula`] over the tasks'
//! decision variables.
//!
//! [`SchedulingContext::add_constraint`]: crate::SchedulingContext::add_constraint

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{CmpOp, Formula, LinearExpr, TaskId};
use crate::context::SchedulingContext;
use crate::error::{ModelError, ModelResult};

/// How strictly a successor must follow its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrecedenceKind {
    /// `after.start >= before.end + offset`
    Lax,
    /// `after.start == before.end + offset`
    Tight,
    /// `after.start > before.end + offset`
    Strict,
}

impl FromStr for PrecedenceKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lax" => Ok(PrecedenceKind::Lax),
            "tight" => Ok(PrecedenceKind::Tight),
            "strict" => Ok(PrecedenceKind::Strict),
            other => Err(ModelError::UnknownPrecedenceKind(other.to_string())),
        }
    }
}

impl fmt::Display for PrecedenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let literal = match self {
            PrecedenceKind::Lax => "lax",
            PrecedenceKind::Tight => "tight",
            PrecedenceKind::Strict => "strict",
        };
        f.write_str(literal)
    }
}

/// A scheduling constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    /// `task.start == value`
    TaskStartAt { task: TaskId, value: i64 },
    /// `task.start > value`
    TaskStartAfterStrict { task: TaskId, value: i64 },
    /// `task.start >= value`
    TaskStartAfterLax { task: TaskId, value: i64 },
    /// `task.end == value`
    TaskEndAt { task: TaskId, value: i64 },
    /// `task.end < value`
    TaskEndBeforeStrict { task: TaskId, value: i64 },
    /// `task.end <= value`
    TaskEndBeforeLax { task: TaskId, value: i64 },

    /// `after` follows `before` with an `offset`, see [`PrecedenceKind`].
    TaskPrecedence {
        before: TaskId,
        after: TaskId,
        offset: i64,
        kind: PrecedenceKind,
    },

    /// One task ends before the other starts, in either order.
    TasksDontOverlap { first: TaskId, second: TaskId },

    /// Both tasks start at the same time.
    TasksStartSynced { first: TaskId, second: TaskId },

    /// Both tasks end at the same time.
    TasksEndSynced { first: TaskId, second: TaskId },

    /// At least `count` of `tasks` fit entirely in one of `intervals`.
    ScheduleNTasksInTimeIntervals {
        tasks: Vec<TaskId>,
        count: usize,
        intervals: Vec<(i64, i64)>,
    },

    /// The mandatory workers of `task` deliver its work amount:
    /// `Σ productivity · duration >= work_amount`.
    WorkAmountCovered { task: TaskId },
}

impl Constraint {
    /// Fixes the start of `task` at `value`.
    pub fn task_start_at(task: TaskId, value: i64) -> Self {
        Self::TaskStartAt { task, value }
    }

    /// `start > value`.
    pub fn task_start_after_strict(task: TaskId, value: i64) -> Self {
        Self::TaskStartAfterStrict { task, value }
    }

    /// `start >= value`.
    pub fn task_start_after_lax(task: TaskId, value: i64) -> Self {
        Self::TaskStartAfterLax { task, value }
    }

    /// Fixes the end of `task` at `value`.
    pub fn task_end_at(task: TaskId, value: i64) -> Self {
        Self::TaskEndAt { task, value }
    }

    /// `end < value`.
    pub fn task_end_before_strict(task: TaskId, value: i64) -> Self {
        Self::TaskEndBeforeStrict { task, value }
    }

    /// `end <= value`.
    pub fn task_end_before_lax(task: TaskId, value: i64) -> Self {
        Self::TaskEndBeforeLax { task, value }
    }

    /// Creates a precedence constraint.
    ///
    /// Use `"tight".parse::<PrecedenceKind>()?` when the kind comes from text.
    pub fn task_precedence(before: TaskId, after: TaskId, offset: i64, kind: PrecedenceKind) -> Self {
        Self::TaskPrecedence {
            before,
            after,
            offset,
            kind,
        }
    }

    /// Keeps the two tasks apart in time, in either order.
    pub fn tasks_dont_overlap(first: TaskId, second: TaskId) -> Self {
        Self::TasksDontOverlap { first, second }
    }

    /// Both tasks start together.
    pub fn tasks_start_synced(first: TaskId, second: TaskId) -> Self {
        Self::TasksStartSynced { first, second }
    }

    /// Both tasks end together.
    pub fn tasks_end_synced(first: TaskId, second: TaskId) -> Self {
        Self::TasksEndSynced { first, second }
    }

    /// Creates an interval-scheduling constraint.
    ///
    /// Fails when either collection is empty, when an interval has its
    /// lower bound above its upper bound, or when `count` exceeds the
    /// number of tasks.
    pub fn schedule_n_tasks_in_time_intervals(
        tasks: impl IntoIterator<Item = TaskId>,
        count: usize,
        intervals: impl IntoIterator<Item = (i64, i64)>,
    ) -> ModelResult<Self> {
        let tasks: Vec<TaskId> = tasks.into_iter().collect();
        let intervals: Vec<(i64, i64)> = intervals.into_iter().collect();

        if tasks.is_empty() {
            return Err(ModelError::EmptyCollection("list_of_tasks"));
        }
        if intervals.is_empty() {
            return Err(ModelError::EmptyCollection("list_of_time_intervals"));
        }
        if let Some(&(lower, upper)) = intervals.iter().find(|(lower, upper)| lower > upper) {
            return Err(ModelError::InvalidInterval { lower, upper });
        }
        if count > tasks.len() {
            return Err(ModelError::CountOutOfRange {
                requested: count,
                available: tasks.len(),
            });
        }

        Ok(Self::ScheduleNTasksInTimeIntervals {
            tasks,
            count,
            intervals,
        })
    }

    /// Requires the mandatory workers of `task` to cover its work amount.
    ///
    /// Translation fails with [`ModelError::Overflow`] when the capacity
    /// does not fit in an `i64`.
    pub fn work_amount_covered(task: TaskId) -> Self {
        Self::WorkAmountCovered { task }
    }

    /// Reference value of single-task placement constraints.
    pub fn value(&self) -> Option<i64> {
        match self {
            Constraint::TaskStartAt { value, .. }
            | Constraint::TaskStartAfterStrict { value, .. }
            | Constraint::TaskStartAfterLax { value, .. }
            | Constraint::TaskEndAt { value, .. }
            | Constraint::TaskEndBeforeStrict { value, .. }
            | Constraint::TaskEndBeforeLax { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Tasks referenced by the constraint.
    pub fn tasks(&self) -> Vec<TaskId> {
        match self {
            Constraint::TaskStartAt { task, .. }
            | Constraint::TaskStartAfterStrict { task, .. }
            | Constraint::TaskStartAfterLax { task, .. }
            | Constraint::TaskEndAt { task, .. }
            | Constraint::TaskEndBeforeStrict { task, .. }
            | Constraint::TaskEndBeforeLax { task, .. }
            | Constraint::WorkAmountCovered { task } => vec![*task],
            Constraint::TaskPrecedence { before, after, .. } => vec![*before, *after],
            Constraint::TasksDontOverlap { first, second }
            | Constraint::TasksStartSynced { first, second }
            | Constraint::TasksEndSynced { first, second } => vec![*first, *second],
            Constraint::ScheduleNTasksInTimeIntervals { tasks, .. } => tasks.clone(),
        }
    }

    /// Short name of the constraint type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Constraint::TaskStartAt { .. } => "TaskStartAt",
            Constraint::TaskStartAfterStrict { .. } => "TaskStartAfterStrict",
            Constraint::TaskStartAfterLax { .. } => "TaskStartAfterLax",
            Constraint::TaskEndAt { .. } => "TaskEndAt",
            Constraint::TaskEndBeforeStrict { .. } => "TaskEndBeforeStrict",
            Constraint::TaskEndBeforeLax { .. } => "TaskEndBeforeLax",
            Constraint::TaskPrecedence { .. } => "TaskPrecedence",
            Constraint::TasksDontOverlap { .. } => "TasksDontOverlap",
            Constraint::TasksStartSynced { .. } => "TasksStartSynced",
            Constraint::TasksEndSynced { .. } => "TasksEndSynced",
            Constraint::ScheduleNTasksInTimeIntervals { .. } => "ScheduleNTasksInTimeIntervals",
            Constraint::WorkAmountCovered { .. } => "WorkAmountCovered",
        }
    }

    /// Translates the constraint into a single formula over `ctx`'s variables.
    ///
    /// Fails if a referenced task does not belong to `ctx`.
    pub fn to_formula(&self, ctx: &SchedulingContext) -> ModelResult<Formula> {
        let formula = match self {
            Constraint::TaskStartAt { task, value } => ctx.task(*task)?.start().equal_to(*value),
            Constraint::TaskStartAfterStrict { task, value } => {
                ctx.task(*task)?.start().greater_than(*value)
            }
            Constraint::TaskStartAfterLax { task, value } => {
                ctx.task(*task)?.start().at_least(*value)
            }
            Constraint::TaskEndAt { task, value } => ctx.task(*task)?.end().equal_to(*value),
            Constraint::TaskEndBeforeStrict { task, value } => {
                ctx.task(*task)?.end().less_than(*value)
            }
            Constraint::TaskEndBeforeLax { task, value } => ctx.task(*task)?.end().at_most(*value),
            Constraint::TaskPrecedence {
                before,
                after,
                offset,
                kind,
            } => {
                let lower = ctx.task(*before)?.end() + *offset;
                let start = ctx.task(*after)?.start();
                match kind {
                    PrecedenceKind::Lax => start.at_least(lower),
                    PrecedenceKind::Tight => start.equal_to(lower),
                    PrecedenceKind::Strict => start.greater_than(lower),
                }
            }
            Constraint::TasksDontOverlap { first, second } => {
                let (a, b) = (ctx.task(*first)?, ctx.task(*second)?);
                Formula::or([a.end().at_most(b.start()), b.end().at_most(a.start())])
            }
            Constraint::TasksStartSynced { first, second } => {
                ctx.task(*first)?.start().equal_to(ctx.task(*second)?.start())
            }
            Constraint::TasksEndSynced { first, second } => {
                ctx.task(*first)?.end().equal_to(ctx.task(*second)?.end())
            }
            Constraint::ScheduleNTasksInTimeIntervals {
                tasks,
                count,
                intervals,
            } => {
                let mut scheduled = Vec::with_capacity(tasks.len());
                for id in tasks {
                    let task = ctx.task(*id)?;
                    scheduled.push(Formula::or(intervals.iter().map(|&(lower, upper)| {
                        Formula::And(vec![task.start().at_least(lower), task.end().at_most(upper)])
                    })));
                }
                Formula::count(scheduled, CmpOp::Ge, *count as i64)
            }
            Constraint::WorkAmountCovered { task } => {
                let task = ctx.task(*task)?;
                let overflow = || ModelError::Overflow(format!("work capacity of task '{}'", task.name()));
                let mut productivity: i64 = 0;
                for required in task.requirements().iter().filter(|r| !r.alternative) {
                    productivity = productivity
                        .checked_add(ctx.resource(required.resource)?.productivity())
                        .ok_or_else(overflow)?;
                }
                let capacity = task.duration().checked_mul(productivity).ok_or_else(overflow)?;
                capacity.at_least(LinearExpr::constant(task.work_amount()))
            }
        };
        Ok(formula)
    }
}
