//! Modeling context.
//!
//! A [`SchedulingContext`] is the live registry of one scheduling problem:
//! tasks, resources, decision variables and the accumulated assertions.
//! It is an explicit value, not a global: every entity and constraint is
//! created through a `&mut SchedulingContext`, and each thread builds its
//! own problem.
//!
//! Assertions are append-only. Nothing leaves the list except through
//! [`SchedulingContext::clear`] or [`SchedulingContext::replace`]. Every
//! fallible operation validates first and commits last, so a failed call
//! leaves the context as it was.

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ensure_non_negative, ModelError, ModelResult};
use crate::models::{
    BoolVar, Constraint, Formula, IntVar, RequiredResource, Resource, ResourceId, ResourceSpec,
    SelectionKind, Task, TaskId, TaskKind, TaskLength, TaskSpec, VariableStore,
};

/// Problem-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Latest allowed end time for every task. `None` = unbounded.
    pub horizon: Option<i64>,
}

impl ContextConfig {
    /// Creates a configuration without horizon.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the scheduling horizon.
    pub fn with_horizon(mut self, horizon: i64) -> Self {
        self.horizon = Some(horizon);
        self
    }
}

/// How a constraint reached the assertion list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintOrigin {
    /// Asserted on its own with [`SchedulingContext::add_constraint`].
    Direct,
    /// Consumed as an operand of a logical combinator.
    Combinator,
}

/// Diagnostic record of a constraint that contributed to the assertions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedConstraint {
    pub constraint: Constraint,
    pub origin: ConstraintOrigin,
}

impl PostedConstraint {
    /// Whether the constraint was used inside a logical expression.
    pub fn created_from_assertion(&self) -> bool {
        self.origin == ConstraintOrigin::Combinator
    }
}

/// Registry and assertion list of one scheduling problem.
///
/// # Examples
///
/// ```
/// use u_procsched::{Constraint, PrecedenceKind, SchedulingContext};
///
/// let mut ctx = SchedulingContext::new("assembly");
/// let cut = ctx.add_fixed_duration_task("cut", 2).unwrap();
/// let weld = ctx.add_fixed_duration_task("weld", 3).unwrap();
/// ctx.add_constraint(Constraint::task_precedence(cut, weld, 1, PrecedenceKind::Lax))
///     .unwrap();
///
/// assert_eq!(ctx.tasks().count(), 2);
/// assert_eq!(ctx.posted_constraints().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SchedulingContext {
    generation: u64,
    name: String,
    config: ContextConfig,
    variables: VariableStore,
    tasks: Vec<Task>,
    task_names: HashMap<String, TaskId>,
    resources: Vec<Resource>,
    resource_names: HashMap<String, ResourceId>,
    assertions: Vec<Formula>,
    posted: Vec<PostedConstraint>,
}

impl SchedulingContext {
    /// Creates an empty context with the default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        debug!("new scheduling context '{name}'");
        let variables = VariableStore::new();
        Self {
            generation: variables.generation(),
            name,
            config: ContextConfig::default(),
            variables,
            tasks: Vec::new(),
            task_names: HashMap::new(),
            resources: Vec::new(),
            resource_names: HashMap::new(),
            assertions: Vec::new(),
            posted: Vec::new(),
        }
    }

    /// Creates an empty context with `config`.
    pub fn with_config(name: impl Into<String>, config: ContextConfig) -> ModelResult<Self> {
        if let Some(horizon) = config.horizon {
            ensure_non_negative("horizon", horizon)?;
        }
        let mut ctx = Self::new(name);
        ctx.config = config;
        Ok(ctx)
    }

    /// Discards the current problem and starts a new one named `name`.
    ///
    /// Handles obtained before the call are rejected afterwards.
    pub fn replace(&mut self, name: impl Into<String>) {
        *self = Self::new(name);
    }

    /// Empties tasks, resources, variables and assertions, keeping the name
    /// and configuration.
    ///
    /// Handles obtained before the call are rejected afterwards.
    pub fn clear(&mut self) {
        debug!(
            "clearing context '{}' ({} tasks, {} resources, {} assertions)",
            self.name,
            self.tasks.len(),
            self.resources.len(),
            self.assertions.len()
        );
        self.variables = VariableStore::new();
        self.generation = self.variables.generation();
        self.tasks.clear();
        self.task_names.clear();
        self.resources.clear();
        self.resource_names.clear();
        self.assertions.clear();
        self.posted.clear();
    }

    /// Name of the problem.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Problem-wide settings.
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Decision variables declared so far.
    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    /// Accumulated assertions, in insertion order.
    pub fn assertions(&self) -> &[Formula] {
        &self.assertions
    }

    /// Constraints that contributed to the assertions.
    pub fn posted_constraints(&self) -> &[PostedConstraint] {
        &self.posted
    }

    /// Registered tasks, in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Registered resources, in registration order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    /// Looks up a task by handle.
    pub fn task(&self, id: TaskId) -> ModelResult<&Task> {
        if id.context != self.generation {
            return Err(ModelError::ForeignHandle(format!("task #{}", id.index)));
        }
        self.tasks
            .get(id.index())
            .ok_or_else(|| ModelError::ForeignHandle(format!("task #{}", id.index)))
    }

    /// Looks up a resource by handle.
    pub fn resource(&self, id: ResourceId) -> ModelResult<&Resource> {
        if id.context != self.generation {
            return Err(ModelError::ForeignHandle(format!("resource #{}", id.index)));
        }
        self.resources
            .get(id.index())
            .ok_or_else(|| ModelError::ForeignHandle(format!("resource #{}", id.index)))
    }

    /// Finds a task by its unique name.
    pub fn task_by_name(&self, name: &str) -> Option<&Task> {
        self.task_names.get(name).map(|id| &self.tasks[id.index()])
    }

    /// Finds a resource by its unique name.
    pub fn resource_by_name(&self, name: &str) -> Option<&Resource> {
        self.resource_names
            .get(name)
            .map(|id| &self.resources[id.index()])
    }

    /// Declares a free integer variable for use in raw formulas.
    ///
    /// Fails if any variable of this context already has the name.
    pub fn new_int_var(&mut self, name: impl Into<String>) -> ModelResult<IntVar> {
        self.variables.new_int(name, None, None)
    }

    /// Declares a boolean variable for use in raw formulas.
    ///
    /// Fails if any variable of this context already has the name.
    pub fn new_bool_var(&mut self, name: impl Into<String>) -> ModelResult<BoolVar> {
        self.variables.new_bool(name)
    }

    /// Appends a formula to the problem.
    ///
    /// Fails if the formula mentions variables this context never declared.
    pub fn append_assertion(&mut self, formula: Formula) -> ModelResult<()> {
        self.append_assertions([formula])
    }

    /// Appends several formulas, all or none.
    pub fn append_assertions(&mut self, formulas: impl IntoIterator<Item = Formula>) -> ModelResult<()> {
        let formulas: Vec<Formula> = formulas.into_iter().collect();
        for formula in &formulas {
            self.check_formula(formula)?;
        }
        self.commit(formulas);
        Ok(())
    }

    /// Checks that every variable of `formula` is declared here.
    pub(crate) fn check_formula(&self, formula: &Formula) -> ModelResult<()> {
        let mut ints = Vec::new();
        let mut bools = Vec::new();
        formula.collect_vars(&mut ints, &mut bools);
        if self.variables.contains(&ints, &bools) {
            Ok(())
        } else {
            let name = ints
                .iter()
                .find(|&&v| self.variables.int_info(v).is_none())
                .map(|v| format!("int variable #{}", v.index()))
                .or_else(|| {
                    bools
                        .iter()
                        .find(|&&v| self.variables.bool_info(v).is_none())
                        .map(|v| format!("bool variable #{}", v.index()))
                })
                .unwrap_or_default();
            Err(ModelError::ForeignHandle(name))
        }
    }

    pub(crate) fn commit(&mut self, formulas: Vec<Formula>) {
        for formula in formulas {
            trace!("assert {}", formula.display(&self.variables));
            self.assertions.push(formula);
        }
    }

    pub(crate) fn record_constraints(&mut self, constraints: Vec<Constraint>, origin: ConstraintOrigin) {
        self.posted.extend(
            constraints
                .into_iter()
                .map(|constraint| PostedConstraint { constraint, origin }),
        );
    }

    /// Creates a task, allocates its variables and emits its base formulas.
    pub fn add_task(&mut self, spec: TaskSpec) -> ModelResult<TaskId> {
        spec.validate()?;
        if self.task_names.contains_key(&spec.name) {
            return Err(ModelError::DuplicateTask(spec.name));
        }

        let horizon = self.config.horizon;
        let start = self
            .variables
            .fresh_int(format!("{}_start", spec.name), Some(0), horizon);
        let end = self
            .variables
            .fresh_int(format!("{}_end", spec.name), Some(0), horizon);
        let length = match spec.kind {
            TaskKind::ZeroDuration => TaskLength::Fixed(0),
            TaskKind::FixedDuration => TaskLength::Fixed(spec.duration),
            TaskKind::VariableDuration => TaskLength::Variable(self.variables.fresh_int(
                format!("{}_duration", spec.name),
                Some(spec.length_at_least.unwrap_or(0)),
                spec.length_at_most,
            )),
        };

        let mut base = vec![start.at_least(0), end.at_least(0), end.equal_to(start + length)];
        if let TaskLength::Variable(duration) = length {
            base.push(duration.at_least(0));
            if let Some(value) = spec.length_at_most {
                base.push(duration.at_most(value));
            }
            if let Some(value) = spec.length_at_least {
                base.push(duration.at_least(value));
            }
        }
        if let Some(horizon) = horizon {
            base.push(end.at_most(horizon));
        }

        let task = Task {
            id: TaskId {
                context: self.generation,
                index: self.tasks.len() as u32,
            },
            name: spec.name,
            kind: spec.kind,
            start,
            end,
            length,
            work_amount: spec.work_amount,
            length_at_most: spec.length_at_most,
            length_at_least: spec.length_at_least,
            required: Vec::new(),
        };
        let id = self.register_task(task);
        self.commit(base);
        Ok(id)
    }

    /// Inserts a fully built task whose name was checked to be free.
    fn register_task(&mut self, task: Task) -> TaskId {
        debug!("register task '{}' ({:?})", task.name, task.kind);
        let id = task.id;
        self.task_names.insert(task.name.clone(), id);
        self.tasks.push(task);
        id
    }

    /// Creates a milestone task.
    pub fn add_zero_duration_task(&mut self, name: impl Into<String>) -> ModelResult<TaskId> {
        self.add_task(TaskSpec::zero_duration(name))
    }

    /// Creates a task of fixed, strictly positive duration.
    pub fn add_fixed_duration_task(&mut self, name: impl Into<String>, duration: i64) -> ModelResult<TaskId> {
        self.add_task(TaskSpec::fixed_duration(name, duration))
    }

    /// Creates a task whose duration is chosen by the solver.
    pub fn add_variable_duration_task(&mut self, name: impl Into<String>) -> ModelResult<TaskId> {
        self.add_task(TaskSpec::variable_duration(name))
    }

    fn duration_var(&self, task: TaskId) -> ModelResult<IntVar> {
        let task = self.task(task)?;
        match task.length {
            TaskLength::Variable(var) => Ok(var),
            TaskLength::Fixed(_) => Err(ModelError::NotVariableDuration(task.name.clone())),
        }
    }

    /// Bounds the duration of a variable-duration task from above.
    ///
    /// Bounds only tighten: the recorded value is the smallest one asserted.
    pub fn set_length_at_most(&mut self, task: TaskId, value: i64) -> ModelResult<()> {
        ensure_non_negative("length_at_most", value)?;
        let duration = self.duration_var(task)?;
        let task = &mut self.tasks[task.index()];
        task.length_at_most = Some(task.length_at_most.map_or(value, |old| old.min(value)));
        self.commit(vec![duration.at_most(value)]);
        Ok(())
    }

    /// Bounds the duration of a variable-duration task from below.
    ///
    /// Bounds only tighten: the recorded value is the largest one asserted.
    pub fn set_length_at_least(&mut self, task: TaskId, value: i64) -> ModelResult<()> {
        ensure_non_negative("length_at_least", value)?;
        let duration = self.duration_var(task)?;
        let task = &mut self.tasks[task.index()];
        task.length_at_least = Some(task.length_at_least.map_or(value, |old| old.max(value)));
        self.commit(vec![duration.at_least(value)]);
        Ok(())
    }

    /// Creates a worker.
    pub fn add_resource(&mut self, spec: ResourceSpec) -> ModelResult<ResourceId> {
        spec.validate()?;
        let resource = Resource {
            id: ResourceId {
                context: self.generation,
                index: self.resources.len() as u32,
            },
            name: spec.name,
            productivity: spec.productivity,
            busy: Vec::new(),
        };
        self.register_resource(resource)
    }

    /// Inserts a fully built resource. Re-registering a name is always an error.
    fn register_resource(&mut self, resource: Resource) -> ModelResult<ResourceId> {
        if self.resource_names.contains_key(&resource.name) {
            return Err(ModelError::DuplicateResource(resource.name));
        }
        debug!("register resource '{}'", resource.name);
        let id = resource.id;
        self.resource_names.insert(resource.name.clone(), id);
        self.resources.push(resource);
        Ok(id)
    }

    /// Creates a worker of productivity 1.
    pub fn add_worker(&mut self, name: impl Into<String>) -> ModelResult<ResourceId> {
        self.add_resource(ResourceSpec::worker(name))
    }

    /// Makes `resource` mandatory for `task`.
    pub fn add_required_resource(&mut self, task: TaskId, resource: ResourceId) -> ModelResult<()> {
        self.add_required_resources(task, [resource])
    }

    /// Makes every resource in `resources` mandatory for `task`, all or none.
    ///
    /// Each resource gets an indicator variable asserted true, and the task
    /// may not overlap any other task using the same resource.
    pub fn add_required_resources(
        &mut self,
        task: TaskId,
        resources: impl IntoIterator<Item = ResourceId>,
    ) -> ModelResult<()> {
        let resources: Vec<ResourceId> = resources.into_iter().collect();
        self.check_new_requirements(task, &resources)?;

        let mut formulas = Vec::new();
        for resource in resources {
            let indicator = self.attach(task, resource, false, &mut formulas);
            formulas.push(Formula::Var(indicator));
        }
        self.commit(formulas);
        Ok(())
    }

    /// Lets the solver pick workers for `task` among `candidates`.
    ///
    /// `kind` and `count` bound how many candidates get assigned.
    pub fn add_select_workers(
        &mut self,
        task: TaskId,
        candidates: impl IntoIterator<Item = ResourceId>,
        count: usize,
        kind: SelectionKind,
    ) -> ModelResult<()> {
        let candidates: Vec<ResourceId> = candidates.into_iter().collect();
        if candidates.is_empty() {
            return Err(ModelError::EmptyCollection("list_of_workers"));
        }
        self.check_new_requirements(task, &candidates)?;
        if count > candidates.len() {
            return Err(ModelError::CountOutOfRange {
                requested: count,
                available: candidates.len(),
            });
        }

        let mut formulas = Vec::new();
        let mut indicators = Vec::with_capacity(candidates.len());
        for resource in candidates {
            indicators.push(Formula::Var(self.attach(task, resource, true, &mut formulas)));
        }
        formulas.push(Formula::count(indicators, kind.cmp_op(), count as i64));
        self.commit(formulas);
        Ok(())
    }

    fn check_new_requirements(&self, task: TaskId, resources: &[ResourceId]) -> ModelResult<()> {
        let task = self.task(task)?;
        for (i, &id) in resources.iter().enumerate() {
            let resource = self.resource(id)?;
            if task.requires(id) || resources[..i].contains(&id) {
                return Err(ModelError::DuplicateRequirement {
                    task: task.name.clone(),
                    resource: resource.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Links a validated (task, resource) pair and returns its indicator.
    ///
    /// Pushes the indicator-guarded non-overlap formulas against every other
    /// task already using the resource.
    fn attach(
        &mut self,
        task_id: TaskId,
        resource_id: ResourceId,
        alternative: bool,
        formulas: &mut Vec<Formula>,
    ) -> BoolVar {
        let (start, end) = {
            let task = &self.tasks[task_id.index()];
            (task.start, task.end)
        };
        let indicator = self.variables.fresh_bool(format!(
            "{}_assigned_{}",
            self.resources[resource_id.index()].name,
            self.tasks[task_id.index()].name
        ));

        for &(other_id, other_indicator) in &self.resources[resource_id.index()].busy {
            let other = &self.tasks[other_id.index()];
            formulas.push(Formula::implies(
                Formula::And(vec![indicator.into(), other_indicator.into()]),
                Formula::Or(vec![end.at_most(other.start), other.end.at_most(start)]),
            ));
        }

        self.resources[resource_id.index()]
            .busy
            .push((task_id, indicator));
        self.tasks[task_id.index()].required.push(RequiredResource {
            resource: resource_id,
            indicator,
            alternative,
        });
        debug!(
            "task '{}' requires resource '{}'{}",
            self.tasks[task_id.index()].name,
            self.resources[resource_id.index()].name,
            if alternative { " (alternative)" } else { "" }
        );
        indicator
    }

    /// Translates `constraint` and asserts it unconditionally.
    pub fn add_constraint(&mut self, constraint: Constraint) -> ModelResult<()> {
        let formula = constraint.to_formula(self)?;
        debug!("post {}", constraint.type_name());
        self.commit(vec![formula]);
        self.record_constraints(vec![constraint], ConstraintOrigin::Direct);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::satisfying_samples;

    #[test]
    fn test_clear_context() {
        let mut ctx = SchedulingContext::new("NewProblem");
        let t = ctx.add_zero_duration_task("zdt").unwrap();
        ctx.clear();

        assert_eq!(ctx.name(), "NewProblem");
        assert_eq!(ctx.tasks().count(), 0);
        assert!(ctx.assertions().is_empty());
        assert_eq!(ctx.variables().int_count(), 0);
        assert_eq!(ctx.task(t).unwrap_err().kind(), ErrorKind::Type);
        // the name is free again
        assert!(ctx.add_zero_duration_task("zdt").is_ok());
    }

    #[test]
    fn test_replace_context() {
        let mut ctx = SchedulingContext::with_config("first", ContextConfig::new().with_horizon(10)).unwrap();
        let w = ctx.add_worker("W1").unwrap();
        ctx.replace("second");

        assert_eq!(ctx.name(), "second");
        assert_eq!(ctx.config().horizon, None);
        assert_eq!(ctx.resources().count(), 0);
        assert!(ctx.resource(w).is_err());
    }

    #[test]
    fn test_negative_horizon() {
        let err = SchedulingContext::with_config("p", ContextConfig::new().with_horizon(-1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_config_json() {
        let config = ContextConfig::new().with_horizon(20);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"horizon":20}"#);
        let back: ContextConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(
            serde_json::from_str::<ContextConfig>(r#"{"horizon":null}"#).unwrap(),
            ContextConfig::default()
        );
    }

    #[test]
    fn test_create_task_kinds() {
        let mut ctx = SchedulingContext::new("ProblemWithoutHorizon");
        let zdt = ctx.add_zero_duration_task("zdt").unwrap();
        let fdt = ctx.add_fixed_duration_task("fdt", 1).unwrap();
        let vdt = ctx.add_variable_duration_task("vdt").unwrap();

        assert_eq!(ctx.task(zdt).unwrap().kind(), TaskKind::ZeroDuration);
        assert_eq!(ctx.task(zdt).unwrap().fixed_duration(), Some(0));
        assert_eq!(ctx.task(fdt).unwrap().fixed_duration(), Some(1));
        assert_eq!(ctx.task(vdt).unwrap().fixed_duration(), None);
        assert_eq!(ctx.task_by_name("vdt").unwrap().id(), vdt);
    }

    #[test]
    fn test_fixed_duration_errors_leave_context_untouched() {
        let mut ctx = SchedulingContext::new("p");
        for duration in [0, -1] {
            let err = ctx.add_fixed_duration_task("bad", duration).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Type);
        }
        let err = ctx
            .add_task(TaskSpec::fixed_duration("NegativeWorkAmount", 2).with_work_amount(-3))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);

        assert_eq!(ctx.tasks().count(), 0);
        assert!(ctx.assertions().is_empty());
        assert_eq!(ctx.variables().int_count(), 0);
    }

    #[test]
    fn test_fixed_duration_semantics() {
        let mut ctx = SchedulingContext::new("p");
        let t = ctx.add_fixed_duration_task("fdt", 3).unwrap();
        let (start, end) = (ctx.task(t).unwrap().start(), ctx.task(t).unwrap().end());

        let samples = satisfying_samples(&ctx, 10, 500, 1);
        assert!(!samples.is_empty());
        for a in samples {
            assert_eq!(a.int(end).unwrap() - a.int(start).unwrap(), 3);
        }
    }

    #[test]
    fn test_variable_duration_bounds() {
        let mut ctx = SchedulingContext::new("p");
        let vdt2 = ctx
            .add_task(TaskSpec::variable_duration("vdt2").with_length_at_most(4))
            .unwrap();
        let vdt3 = ctx
            .add_task(TaskSpec::variable_duration("vdt3").with_length_at_least(5))
            .unwrap();
        ctx.add_task(TaskSpec::variable_duration("vdt4").with_work_amount(10))
            .unwrap();
        assert_eq!(ctx.task(vdt2).unwrap().length_at_most(), Some(4));
        assert_eq!(ctx.task(vdt3).unwrap().length_at_least(), Some(5));

        let d2 = ctx.task(vdt2).unwrap().duration();
        let d3 = ctx.task(vdt3).unwrap().duration();
        let samples = satisfying_samples(&ctx, 10, 4000, 2);
        assert!(!samples.is_empty());
        for a in samples {
            assert!(d2.evaluate(&a).unwrap() <= 4);
            assert!(d3.evaluate(&a).unwrap() >= 5);
        }
    }

    #[test]
    fn test_set_length_bounds_after_creation() {
        let mut ctx = SchedulingContext::new("p");
        let vdt = ctx.add_variable_duration_task("vdt").unwrap();
        let fdt = ctx.add_fixed_duration_task("fdt", 2).unwrap();

        ctx.set_length_at_most(vdt, 6).unwrap();
        ctx.set_length_at_most(vdt, 8).unwrap();
        ctx.set_length_at_least(vdt, 2).unwrap();
        assert_eq!(ctx.task(vdt).unwrap().length_at_most(), Some(6));
        assert_eq!(ctx.task(vdt).unwrap().length_at_least(), Some(2));

        let before = ctx.assertions().len();
        assert_eq!(
            ctx.set_length_at_most(fdt, 3).unwrap_err(),
            ModelError::NotVariableDuration("fdt".into())
        );
        assert!(ctx.set_length_at_least(vdt, -1).is_err());
        assert_eq!(ctx.assertions().len(), before);
    }

    #[test]
    fn test_horizon_bounds_ends() {
        let config = ContextConfig::new().with_horizon(5);
        let mut ctx = SchedulingContext::with_config("p", config).unwrap();
        let t = ctx.add_fixed_duration_task("t", 2).unwrap();
        let end = ctx.task(t).unwrap().end();

        assert_eq!(ctx.variables().int_info(end).unwrap().max, Some(5));
        let samples = satisfying_samples(&ctx, 10, 500, 4);
        assert!(!samples.is_empty());
        for a in samples {
            assert!(a.int(end).unwrap() <= 5);
        }
    }

    #[test]
    fn test_task_same_names() {
        let mut ctx = SchedulingContext::new("p");
        ctx.add_variable_duration_task("t1").unwrap();
        let assertions = ctx.assertions().len();

        let err = ctx.add_variable_duration_task("t1").unwrap_err();
        assert_eq!(err, ModelError::DuplicateTask("t1".into()));
        assert_eq!(err.kind(), ErrorKind::Duplication);
        assert_eq!(ctx.tasks().count(), 1);
        assert_eq!(ctx.assertions().len(), assertions);
    }

    #[test]
    fn test_resource_same_names() {
        let mut ctx = SchedulingContext::new("p");
        ctx.add_worker("W1").unwrap();
        let err = ctx.add_worker("W1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplication);
        assert_eq!(ctx.resources().count(), 1);
    }

    #[test]
    fn test_task_equality() {
        let mut ctx = SchedulingContext::new("p");
        let t1 = ctx.add_zero_duration_task("task1").unwrap();
        let t2 = ctx.add_zero_duration_task("task2").unwrap();

        assert_eq!(ctx.task(t1).unwrap(), ctx.task(t1).unwrap());
        assert_ne!(ctx.task(t1).unwrap(), ctx.task(t2).unwrap());
        assert_ne!(t1, t2);
    }

    #[test]
    fn test_registry_listing_is_stable() {
        let mut ctx = SchedulingContext::new("SameNameTasks");
        let t1 = ctx.add_zero_duration_task("task1").unwrap();
        let w1 = ctx.add_worker("Worker1").unwrap();

        for _ in 0..2 {
            let tasks: Vec<TaskId> = ctx.tasks().map(Task::id).collect();
            assert_eq!(tasks, vec![t1]);
            let resources: Vec<ResourceId> = ctx.resources().map(Resource::id).collect();
            assert_eq!(resources, vec![w1]);
        }
    }

    #[test]
    fn test_resource_requirements() {
        let mut ctx = SchedulingContext::new("p");
        let task = ctx.add_fixed_duration_task("task1", 3).unwrap();
        let workers: Vec<ResourceId> = (1..=4)
            .map(|i| ctx.add_worker(format!("Worker{i}")).unwrap())
            .collect();

        ctx.add_required_resource(task, workers[0]).unwrap();
        ctx.add_required_resource(task, workers[1]).unwrap();
        ctx.add_required_resources(task, [workers[2], workers[3]]).unwrap();

        let required: Vec<ResourceId> = ctx.task(task).unwrap().required_resources().collect();
        assert_eq!(required, workers);
        for &w in &workers {
            assert!(ctx.resource(w).unwrap().indicator_for(task).is_some());
        }
    }

    #[test]
    fn test_wrong_assignment() {
        let mut ctx = SchedulingContext::new("p");
        let task = ctx.add_fixed_duration_task("task1", 3).unwrap();
        let w1 = ctx.add_worker("Worker1").unwrap();
        let w2 = ctx.add_worker("Worker2").unwrap();
        ctx.add_required_resource(task, w1).unwrap();

        let mut other = SchedulingContext::new("other");
        let foreign = other.add_worker("Foreign").unwrap();
        let err = ctx.add_required_resource(task, foreign).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);

        let err = ctx.add_required_resource(task, w1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplication);

        // a duplicate inside the batch rejects the whole batch
        let assertions = ctx.assertions().len();
        let err = ctx.add_required_resources(task, [w2, w2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplication);
        assert_eq!(ctx.task(task).unwrap().requirements().len(), 1);
        assert_eq!(ctx.assertions().len(), assertions);
    }

    #[test]
    fn test_shared_worker_forbids_overlap() {
        let mut ctx = SchedulingContext::new("p");
        let t1 = ctx.add_fixed_duration_task("t1", 3).unwrap();
        let t2 = ctx.add_fixed_duration_task("t2", 2).unwrap();
        let w = ctx.add_worker("W1").unwrap();
        ctx.add_required_resource(t1, w).unwrap();
        ctx.add_required_resource(t2, w).unwrap();

        let (a, b) = (ctx.task(t1).unwrap().clone(), ctx.task(t2).unwrap().clone());
        let samples = satisfying_samples(&ctx, 10, 3000, 9);
        assert!(!samples.is_empty());
        for s in samples {
            let (s1, e1) = (s.int(a.start()).unwrap(), s.int(a.end()).unwrap());
            let (s2, e2) = (s.int(b.start()).unwrap(), s.int(b.end()).unwrap());
            assert!(e1 <= s2 || e2 <= s1);
        }
    }

    #[test]
    fn test_select_workers() {
        let mut ctx = SchedulingContext::new("p");
        let task = ctx.add_fixed_duration_task("t", 2).unwrap();
        let workers: Vec<ResourceId> = ["W1", "W2", "W3"]
            .iter()
            .map(|n| ctx.add_worker(*n).unwrap())
            .collect();
        ctx.add_select_workers(task, workers.clone(), 2, SelectionKind::Exact)
            .unwrap();

        let indicators: Vec<BoolVar> = ctx
            .task(task)
            .unwrap()
            .requirements()
            .iter()
            .inspect(|r| assert!(r.alternative))
            .map(|r| r.indicator)
            .collect();
        let samples = satisfying_samples(&ctx, 8, 1000, 13);
        assert!(!samples.is_empty());
        for s in samples {
            let selected = indicators.iter().filter(|&&i| s.bool(i) == Some(true)).count();
            assert_eq!(selected, 2);
        }

        assert_eq!(
            ctx.add_select_workers(task, Vec::new(), 1, SelectionKind::AtLeast)
                .unwrap_err()
                .kind(),
            ErrorKind::Type
        );
        let extra = ctx.add_worker("W4").unwrap();
        assert_eq!(
            ctx.add_select_workers(task, [extra], 2, SelectionKind::AtMost)
                .unwrap_err()
                .kind(),
            ErrorKind::Validity
        );
        assert_eq!(
            ctx.add_select_workers(task, [workers[0]], 1, SelectionKind::AtMost)
                .unwrap_err()
                .kind(),
            ErrorKind::Duplication
        );
    }

    #[test]
    fn test_append_assertion_checks_variables() {
        let mut ctx = SchedulingContext::new("p");
        let x = ctx.new_int_var("x").unwrap();
        ctx.append_assertion(x.at_least(3)).unwrap();
        assert_eq!(ctx.assertions().last(), Some(&x.at_least(3)));

        let mut other = SchedulingContext::new("other");
        let _ = other.new_int_var("a").unwrap();
        let y = other.new_int_var("b").unwrap();
        let before = ctx.assertions().len();
        let err = ctx
            .append_assertions([x.at_most(5), y.at_most(5)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(ctx.assertions().len(), before);
    }

    #[test]
    fn test_stale_variable_rejected_after_clear() {
        let mut ctx = SchedulingContext::new("p");
        let t1 = ctx.add_fixed_duration_task("t1", 2).unwrap();
        let stale = ctx.task(t1).unwrap().start();

        ctx.clear();
        let t2 = ctx.add_fixed_duration_task("t2", 2).unwrap();
        let fresh = ctx.task(t2).unwrap().start();
        assert_eq!(fresh.index(), stale.index());
        assert_ne!(fresh, stale);

        let before = ctx.assertions().len();
        let err = ctx.append_assertion(stale.equal_to(7)).unwrap_err();
        assert!(matches!(err, ModelError::ForeignHandle(_)));
        assert_eq!(ctx.assertions().len(), before);
        assert!(ctx.implies(stale.equal_to(0), [fresh.at_most(3)]).is_err());
    }

    #[test]
    fn test_foreign_variable_same_index_rejected() {
        let mut ctx = SchedulingContext::new("p");
        let x = ctx.new_int_var("x").unwrap();
        let flag = ctx.new_bool_var("flag").unwrap();

        let mut other = SchedulingContext::new("other");
        let foreign = other.new_int_var("x").unwrap();
        let foreign_flag = other.new_bool_var("flag").unwrap();
        assert_eq!(foreign.index(), x.index());

        assert_eq!(
            ctx.append_assertion(foreign.at_most(0)).unwrap_err().kind(),
            ErrorKind::Type
        );
        assert!(ctx.append_assertion(Formula::Var(foreign_flag)).is_err());
        assert!(ctx.append_assertion(Formula::Var(flag)).is_ok());
    }

    #[test]
    fn test_variable_names_are_unique() {
        let mut ctx = SchedulingContext::new("p");
        let t1 = ctx.add_fixed_duration_task("t1", 2).unwrap();
        let err = ctx.new_int_var("t1_start").unwrap_err();
        assert_eq!(err, ModelError::DuplicateVariable("t1_start".into()));
        assert_eq!(err.kind(), ErrorKind::Duplication);
        assert_eq!(ctx.task(t1).unwrap().name(), "t1");

        // a raw name taken first pushes the generated one aside
        ctx.new_int_var("t2_start").unwrap();
        let t2 = ctx.add_fixed_duration_task("t2", 2).unwrap();
        let start = ctx.task(t2).unwrap().start();
        assert_eq!(ctx.variables().int_info(start).unwrap().name, "t2_start_2");
    }

    #[test]
    fn test_indicator_names_do_not_collide() {
        let mut ctx = SchedulingContext::new("p");
        let t = ctx.add_fixed_duration_task("t", 1).unwrap();
        let assigned_t = ctx.add_fixed_duration_task("assigned_t", 1).unwrap();
        let w = ctx.add_worker("W").unwrap();
        let w_assigned = ctx.add_worker("W_assigned").unwrap();
        ctx.add_required_resource(assigned_t, w).unwrap();
        ctx.add_required_resource(t, w_assigned).unwrap();

        let names: Vec<&str> = ctx
            .variables()
            .bool_vars()
            .map(|(_, info)| info.name.as_str())
            .collect();
        assert_eq!(names, vec!["W_assigned_assigned_t", "W_assigned_assigned_t_2"]);
    }

    #[test]
    fn test_add_constraint_records_origin() {
        let mut ctx = SchedulingContext::new("p");
        let t = ctx.add_fixed_duration_task("t", 2).unwrap();
        let before = ctx.assertions().len();
        ctx.add_constraint(Constraint::task_start_at(t, 1)).unwrap();

        assert_eq!(ctx.assertions().len(), before + 1);
        let posted = &ctx.posted_constraints()[0];
        assert_eq!(posted.origin, ConstraintOrigin::Direct);
        assert!(!posted.created_from_assertion());
    }
}
