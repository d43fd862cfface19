//! Task model.
//!
//! A task is an interval `[start, end)` with `end = start + duration`.
//! Three shapes exist: zero-duration milestones, fixed-duration tasks and
//! variable-duration tasks whose length is itself a decision variable.
//! Tasks are created through [`SchedulingContext::add_task`], which
//! allocates their variables and emits their base formulas.
//!
//! [`SchedulingContext::add_task`]: crate::SchedulingContext::add_task

use serde::{Deserialize, Serialize};

use super::{BoolVar, IntVar, LinearExpr, ResourceId};
use crate::error::{ensure_non_negative, ensure_positive, ModelError, ModelResult};

/// Handle to a task registered in a context.
///
/// Two handles are equal only if they designate the same registered task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId {
    pub(crate) context: u64,
    pub(crate) index: u32,
}

impl TaskId {
    /// Position of the task in its context's registry.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// Shape of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Milestone: `end = start`.
    ZeroDuration,
    /// Length fixed at creation.
    FixedDuration,
    /// Length is a non-negative decision variable.
    VariableDuration,
}

/// Length of a task: a constant or a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskLength {
    Fixed(i64),
    Variable(IntVar),
}

impl From<TaskLength> for LinearExpr {
    fn from(length: TaskLength) -> Self {
        match length {
            TaskLength::Fixed(value) => LinearExpr::constant(value),
            TaskLength::Variable(var) => LinearExpr::from(var),
        }
    }
}

/// A resource required by a task, with its assignment indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredResource {
    /// The resource.
    pub resource: ResourceId,
    /// True when the resource is assigned to the task.
    pub indicator: BoolVar,
    /// Whether the resource is one of several alternatives
    /// (the indicator is left to the solver).
    pub alternative: bool,
}

/// Description of a task to create.
///
/// # Examples
///
/// ```
/// use u_procsched::{SchedulingContext, TaskSpec};
///
/// let mut ctx = SchedulingContext::new("workshop");
/// let paint = ctx
///     .add_task(TaskSpec::variable_duration("paint").with_length_at_most(4))
///     .unwrap();
/// assert_eq!(ctx.task(paint).unwrap().length_at_most(), Some(4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Unique task name.
    pub name: String,
    /// Task shape.
    pub kind: TaskKind,
    /// Duration for fixed-duration tasks.
    pub duration: i64,
    /// Accumulated effort the task represents.
    pub work_amount: i64,
    /// Upper bound on the duration (variable-duration tasks only).
    pub length_at_most: Option<i64>,
    /// Lower bound on the duration (variable-duration tasks only).
    pub length_at_least: Option<i64>,
}

impl TaskSpec {
    fn new(name: impl Into<String>, kind: TaskKind, duration: i64) -> Self {
        Self {
            name: name.into(),
            kind,
            duration,
            work_amount: 0,
            length_at_most: None,
            length_at_least: None,
        }
    }

    /// A milestone task.
    pub fn zero_duration(name: impl Into<String>) -> Self {
        Self::new(name, TaskKind::ZeroDuration, 0)
    }

    /// A task of fixed, strictly positive duration.
    pub fn fixed_duration(name: impl Into<String>, duration: i64) -> Self {
        Self::new(name, TaskKind::FixedDuration, duration)
    }

    /// A task whose duration is chosen by the solver.
    pub fn variable_duration(name: impl Into<String>) -> Self {
        Self::new(name, TaskKind::VariableDuration, 0)
    }

    /// Sets the work amount.
    pub fn with_work_amount(mut self, work_amount: i64) -> Self {
        self.work_amount = work_amount;
        self
    }

    /// Sets the maximum duration.
    pub fn with_length_at_most(mut self, value: i64) -> Self {
        self.length_at_most = Some(value);
        self
    }

    /// Sets the minimum duration.
    pub fn with_length_at_least(mut self, value: i64) -> Self {
        self.length_at_least = Some(value);
        self
    }

    /// Checks the numeric arguments without touching any context.
    pub(crate) fn validate(&self) -> ModelResult<()> {
        if self.kind == TaskKind::FixedDuration {
            ensure_positive("duration", self.duration)?;
        }
        ensure_non_negative("work_amount", self.work_amount)?;
        if let Some(value) = self.length_at_most {
            ensure_non_negative("length_at_most", value)?;
        }
        if let Some(value) = self.length_at_least {
            ensure_non_negative("length_at_least", value)?;
        }
        let has_bounds = self.length_at_most.is_some() || self.length_at_least.is_some();
        if has_bounds && self.kind != TaskKind::VariableDuration {
            return Err(ModelError::NotVariableDuration(self.name.clone()));
        }
        Ok(())
    }
}

/// A registered task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub(crate) id: TaskId,
    pub(crate) name: String,
    pub(crate) kind: TaskKind,
    pub(crate) start: IntVar,
    pub(crate) end: IntVar,
    pub(crate) length: TaskLength,
    pub(crate) work_amount: i64,
    pub(crate) length_at_most: Option<i64>,
    pub(crate) length_at_least: Option<i64>,
    pub(crate) required: Vec<RequiredResource>,
}

impl Task {
    /// Handle of this task.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Task shape.
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Start time variable.
    pub fn start(&self) -> IntVar {
        self.start
    }

    /// End time variable.
    pub fn end(&self) -> IntVar {
        self.end
    }

    /// Length as a constant or variable.
    pub fn length(&self) -> TaskLength {
        self.length
    }

    /// Duration as a linear expression, usable in formulas.
    pub fn duration(&self) -> LinearExpr {
        self.length.into()
    }

    /// Duration when it is a constant.
    pub fn fixed_duration(&self) -> Option<i64> {
        match self.length {
            TaskLength::Fixed(value) => Some(value),
            TaskLength::Variable(_) => None,
        }
    }

    /// Accumulated effort.
    pub fn work_amount(&self) -> i64 {
        self.work_amount
    }

    /// Upper bound on a variable length, if one was set.
    pub fn length_at_most(&self) -> Option<i64> {
        self.length_at_most
    }

    /// Lower bound on a variable length, if one was set.
    pub fn length_at_least(&self) -> Option<i64> {
        self.length_at_least
    }

    /// Required resources with their indicators, in insertion order.
    pub fn requirements(&self) -> &[RequiredResource] {
        &self.required
    }

    /// Handles of the required resources.
    pub fn required_resources(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.required.iter().map(|r| r.resource)
    }

    /// Whether `resource` is already required.
    pub fn requires(&self, resource: ResourceId) -> bool {
        self.required.iter().any(|r| r.resource == resource)
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Task {}
