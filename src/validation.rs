//! Structural checks on a model before it is handed to a solver.
//!
//! None of these findings makes a model invalid to build; they flag models
//! that are almost certainly mistakes. Detects:
//! - Resources no task requires
//! - Work amounts no mandatory worker can cover
//! - Task lengths that cannot fit in the horizon
//! - Circular precedences among directly posted constraints
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use crate::context::{ConstraintOrigin, SchedulingContext};
use crate::models::{Constraint, Task, TaskId};
use std::collections::{HashMap, HashSet};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation finding.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A resource is required by no task.
    UnusedResource,
    /// A task has a work amount but no mandatory worker with productivity.
    UncoverableWorkAmount,
    /// A task's minimal length is longer than the horizon.
    ExceedsHorizon,
    /// Precedence graph contains a cycle.
    CyclicPrecedence,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Runs every check on `ctx`.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_context(ctx: &SchedulingContext) -> ValidationResult {
    let mut errors = Vec::new();

    for resource in ctx.resources() {
        if resource.tasks().next().is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnusedResource,
                format!("Resource '{}' is not required by any task", resource.name()),
            ));
        }
    }

    for task in ctx.tasks() {
        if task.work_amount() > 0 && mandatory_productivity(ctx, task) == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::UncoverableWorkAmount,
                format!(
                    "Task '{}' has work amount {} but no productive mandatory worker",
                    task.name(),
                    task.work_amount()
                ),
            ));
        }

        if let Some(horizon) = ctx.config().horizon {
            let min_length = task.fixed_duration().or(task.length_at_least()).unwrap_or(0);
            if min_length > horizon {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ExceedsHorizon,
                    format!(
                        "Task '{}' needs at least {min_length} but the horizon is {horizon}",
                        task.name()
                    ),
                ));
            }
        }
    }

    if let Some(cycle_err) = detect_cycles(ctx) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn mandatory_productivity(ctx: &SchedulingContext, task: &Task) -> i64 {
    task.requirements()
        .iter()
        .filter(|req| !req.alternative)
        .filter_map(|req| ctx.resource(req.resource).ok())
        .map(|resource| resource.productivity())
        .sum()
}

/// Detects cycles in the graph of directly posted precedences using DFS.
///
/// Precedences nested in combinators are conditional and left out.
fn detect_cycles(ctx: &SchedulingContext) -> Option<ValidationError> {
    // before → afters
    let mut adj: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    for posted in ctx.posted_constraints() {
        if posted.origin != ConstraintOrigin::Direct {
            continue;
        }
        if let Constraint::TaskPrecedence { before, after, .. } = posted.constraint {
            adj.entry(before).or_default().push(after);
        }
    }

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for task in ctx.tasks() {
        let node = task.id();
        if !visited.contains(&node) && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicPrecedence,
                format!("Circular precedence detected involving task '{}'", task.name()),
            ));
        }
    }

    None
}

fn has_cycle_dfs(
    node: TaskId,
    adj: &HashMap<TaskId, Vec<TaskId>>,
    visited: &mut HashSet<TaskId>,
    in_stack: &mut HashSet<TaskId>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(&node) {
        for &next in neighbors {
            if in_stack.contains(&next) {
                return true; // Back edge → cycle
            }
            if !visited.contains(&next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(&node);
    false
}
