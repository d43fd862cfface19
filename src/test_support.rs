//! Seeded random assignments for checking model semantics without a solver.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::context::SchedulingContext;
use crate::models::{Assignment, TaskLength};

/// Draws `attempts` random assignments and keeps the ones satisfying every
/// assertion of `ctx`.
///
/// Integer variables range over `0..=horizon`. Task ends are derived from
/// start and length, and mandatory resource indicators are set, so that
/// samples are not wasted on the structural formulas.
pub(crate) fn satisfying_samples(
    ctx: &SchedulingContext,
    horizon: i64,
    attempts: usize,
    seed: u64,
) -> Vec<Assignment> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let problem = ctx.problem();
    (0..attempts)
        .map(|_| random_assignment(ctx, horizon, &mut rng))
        .filter(|assignment| problem.check(assignment) == Some(true))
        .collect()
}

fn random_assignment(ctx: &SchedulingContext, horizon: i64, rng: &mut SmallRng) -> Assignment {
    let mut assignment = Assignment::new();
    for (var, _) in ctx.variables().int_vars() {
        assignment.set_int(var, rng.random_range(0..=horizon));
    }
    for (var, _) in ctx.variables().bool_vars() {
        assignment.set_bool(var, rng.random_bool(0.5));
    }

    for task in ctx.tasks() {
        let start = rng.random_range(0..=horizon);
        let duration = match task.length() {
            TaskLength::Fixed(duration) => duration,
            TaskLength::Variable(var) => {
                let duration = rng.random_range(0..=horizon);
                assignment.set_int(var, duration);
                duration
            }
        };
        assignment.set_int(task.start(), start);
        assignment.set_int(task.end(), start + duration);
        for req in task.requirements().iter().filter(|r| !r.alternative) {
            assignment.set_bool(req.indicator, true);
        }
    }
    assignment
}
