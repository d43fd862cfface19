//! Resource model.
//!
//! Resources are the workers that perform tasks. A worker can be busy with
//! at most one task at a time; each (task, worker) pair gets a boolean
//! indicator telling whether the worker is assigned to the task.

use serde::{Deserialize, Serialize};

use super::{BoolVar, CmpOp, TaskId};
use crate::error::{ensure_non_negative, ModelResult};

/// Handle to a resource registered in a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    pub(crate) context: u64,
    pub(crate) index: u32,
}

impl ResourceId {
    /// Position of the resource in its context's registry.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// Description of a worker to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Unique resource name.
    pub name: String,
    /// Work performed per time unit (default: 1).
    pub productivity: i64,
}

impl ResourceSpec {
    /// A worker with productivity 1.
    pub fn worker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            productivity: 1,
        }
    }

    /// Sets the productivity.
    pub fn with_productivity(mut self, productivity: i64) -> Self {
        self.productivity = productivity;
        self
    }

    pub(crate) fn validate(&self) -> ModelResult<()> {
        ensure_non_negative("productivity", self.productivity)?;
        Ok(())
    }
}

/// A registered worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub(crate) id: ResourceId,
    pub(crate) name: String,
    pub(crate) productivity: i64,
    /// Tasks that may occupy this resource, with their indicator.
    pub(crate) busy: Vec<(TaskId, BoolVar)>,
}

impl Resource {
    /// Handle of this resource.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Work performed per time unit.
    pub fn productivity(&self) -> i64 {
        self.productivity
    }

    /// Tasks that require (or may select) this resource.
    pub fn tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.busy.iter().map(|&(task, _)| task)
    }

    /// Indicator variable for `task`, if the task may use this resource.
    pub fn indicator_for(&self, task: TaskId) -> Option<BoolVar> {
        self.busy
            .iter()
            .find(|&&(t, _)| t == task)
            .map(|&(_, indicator)| indicator)
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Resource {}

/// How many workers a selection among alternatives must pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionKind {
    /// Exactly `count` workers.
    Exact,
    /// At least `count` workers.
    AtLeast,
    /// At most `count` workers.
    AtMost,
}

impl SelectionKind {
    pub(crate) fn cmp_op(self) -> CmpOp {
        match self {
            SelectionKind::Exact => CmpOp::Eq,
            SelectionKind::AtLeast => CmpOp::Ge,
            SelectionKind::AtMost => CmpOp::Le,
        }
    }
}
