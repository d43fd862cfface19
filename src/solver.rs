//! Interface to an external satisfiability solver.
//!
//! The modeler never searches for solutions itself. A [`Solver`] receives
//! the flat [`SatProblem`] of a context (its variables and assertions) and
//! answers with a [`SolveOutcome`]. [`SchedulingContext::solve`] checks a
//! satisfying assignment against every assertion before reading the
//! schedule back.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::context::SchedulingContext;
use crate::error::{ModelError, ModelResult};
use crate::models::{Assignment, Formula, SolvedSchedule, TaskLength, TaskSlot, VariableStore};

/// The problem handed to a solver, borrowed from its context.
///
/// Assertions are an unordered conjunction.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SatProblem<'a> {
    pub name: &'a str,
    pub variables: &'a VariableStore,
    pub assertions: &'a [Formula],
}

impl SatProblem<'_> {
    /// Whether `assignment` satisfies every assertion.
    ///
    /// Returns `None` when an assertion mentions an unassigned variable.
    pub fn check(&self, assignment: &Assignment) -> Option<bool> {
        self.assertions
            .iter()
            .try_fold(true, |all, formula| Some(formula.evaluate(assignment)? && all))
    }

    /// Indices of the assertions `assignment` does not satisfy.
    pub fn violated(&self, assignment: &Assignment) -> Vec<usize> {
        self.assertions
            .iter()
            .enumerate()
            .filter(|(_, formula)| formula.evaluate(assignment) != Some(true))
            .map(|(i, _)| i)
            .collect()
    }

    /// Name of the first variable the assertions use without a value.
    fn first_unassigned(&self, assignment: &Assignment) -> Option<String> {
        let mut ints = Vec::new();
        let mut bools = Vec::new();
        for formula in self.assertions {
            formula.collect_vars(&mut ints, &mut bools);
        }
        if let Some(var) = ints.into_iter().find(|v| assignment.int(*v).is_none()) {
            return Some(self.variables.int_name(var).to_string());
        }
        bools
            .into_iter()
            .find(|v| assignment.bool(*v).is_none())
            .map(|var| self.variables.bool_name(var).to_string())
    }
}

/// Answer of a solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveOutcome {
    /// The assertions hold under this assignment.
    Satisfiable(Assignment),
    /// No assignment exists. `core` lists indices of an unsatisfiable
    /// subset of the assertions, possibly empty.
    Unsatisfiable { core: Vec<usize> },
    /// The solver gave up.
    Unknown,
}

/// A satisfiability backend.
pub trait Solver {
    /// Decides `problem`.
    fn solve(&mut self, problem: &SatProblem<'_>) -> SolveOutcome;
}

impl SchedulingContext {
    /// The current problem: every declared variable and appended assertion.
    pub fn problem(&self) -> SatProblem<'_> {
        SatProblem {
            name: self.name(),
            variables: self.variables(),
            assertions: self.assertions(),
        }
    }

    /// Runs `solver` on the current problem and reads the schedule back.
    ///
    /// Returns `Ok(None)` when the solver reports the problem unsatisfiable
    /// or gives up. An assignment that leaves a variable unset or violates an
    /// assertion is rejected.
    pub fn solve<S: Solver + ?Sized>(&self, solver: &mut S) -> ModelResult<Option<SolvedSchedule>> {
        let problem = self.problem();
        info!(
            "solving '{}': {} int vars, {} bool vars, {} assertions",
            problem.name,
            problem.variables.int_count(),
            problem.variables.bool_count(),
            problem.assertions.len()
        );

        match solver.solve(&problem) {
            SolveOutcome::Satisfiable(assignment) => {
                match problem.check(&assignment) {
                    Some(true) => {}
                    Some(false) => {
                        warn!(
                            "solver assignment violates assertions {:?}",
                            problem.violated(&assignment)
                        );
                        return Err(ModelError::InvalidAssignment);
                    }
                    None => {
                        let name = problem.first_unassigned(&assignment).unwrap_or_default();
                        return Err(ModelError::Unassigned(name));
                    }
                }
                let schedule = self.read_solution(&assignment)?;
                info!("'{}' solved, makespan {}", problem.name, schedule.makespan());
                Ok(Some(schedule))
            }
            SolveOutcome::Unsatisfiable { core } => {
                warn!("'{}' is unsatisfiable (core of {} assertions)", problem.name, core.len());
                Ok(None)
            }
            SolveOutcome::Unknown => {
                warn!("solver gave up on '{}'", problem.name);
                Ok(None)
            }
        }
    }

    /// Reads task placements and resource assignments from `assignment`.
    pub fn read_solution(&self, assignment: &Assignment) -> ModelResult<SolvedSchedule> {
        let vars = self.variables();
        let mut schedule = SolvedSchedule::new();
        for task in self.tasks() {
            let int = |var| {
                assignment
                    .int(var)
                    .ok_or_else(|| ModelError::Unassigned(vars.int_name(var).to_string()))
            };
            let start = int(task.start())?;
            let end = int(task.end())?;
            let duration = match task.length() {
                TaskLength::Fixed(duration) => duration,
                TaskLength::Variable(var) => int(var)?,
            };

            let mut resources = Vec::new();
            for req in task.requirements() {
                let assigned = assignment
                    .bool(req.indicator)
                    .ok_or_else(|| ModelError::Unassigned(vars.bool_name(req.indicator).to_string()))?;
                if assigned {
                    resources.push(self.resource(req.resource)?.name().to_string());
                }
            }

            schedule.add_slot(TaskSlot {
                task: task.name().to_string(),
                start,
                end,
                duration,
                resources,
            });
        }
        Ok(schedule)
    }
}
