//! Solver output: variable assignments and the schedule read back from them.
//!
//! An [`Assignment`] maps decision variables to concrete values, as returned
//! by an external solver. A [`SolvedSchedule`] is the task-level view of an
//! assignment: one [`TaskSlot`] per task with its time window and the
//! resources it was assigned.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{BoolVar, IntVar};

/// Concrete values for decision variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(with = "pairs")]
    ints: BTreeMap<IntVar, i64>,
    #[serde(with = "pairs")]
    bools: BTreeMap<BoolVar, bool>,
}

/// Maps keyed by variable handles, written as `[key, value]` pairs so that
/// formats with string-only map keys can hold them.
mod pairs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<K, V, S>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Ok(Vec::<(K, V)>::deserialize(deserializer)?.into_iter().collect())
    }
}

impl Assignment {
    /// Creates an empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of an integer variable.
    pub fn set_int(&mut self, var: IntVar, value: i64) {
        self.ints.insert(var, value);
    }

    /// Sets the value of a boolean variable.
    pub fn set_bool(&mut self, var: BoolVar, value: bool) {
        self.bools.insert(var, value);
    }

    /// Builder: sets an integer variable.
    pub fn with_int(mut self, var: IntVar, value: i64) -> Self {
        self.set_int(var, value);
        self
    }

    /// Builder: sets a boolean variable.
    pub fn with_bool(mut self, var: BoolVar, value: bool) -> Self {
        self.set_bool(var, value);
        self
    }

    /// Value of an integer variable.
    pub fn int(&self, var: IntVar) -> Option<i64> {
        self.ints.get(&var).copied()
    }

    /// Value of a boolean variable.
    pub fn bool(&self, var: BoolVar) -> Option<bool> {
        self.bools.get(&var).copied()
    }

    /// Number of assigned variables.
    pub fn len(&self) -> usize {
        self.ints.len() + self.bools.len()
    }

    /// Whether no variable is assigned.
    pub fn is_empty(&self) -> bool {
        self.ints.is_empty() && self.bools.is_empty()
    }
}

/// Resolved placement of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSlot {
    /// Task name.
    pub task: String,
    /// Start time.
    pub start: i64,
    /// End time.
    pub end: i64,
    /// Resolved duration (`end - start`).
    pub duration: i64,
    /// Names of the resources assigned to the task.
    pub resources: Vec<String>,
}

/// A solved scheduling problem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvedSchedule {
    /// One slot per task, in task registration order.
    pub slots: Vec<TaskSlot>,
}

impl TaskSlot {
    /// Whether the slot overlaps `[start, end)`.
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        self.start < end && start < self.end
    }
}

impl SolvedSchedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task slot.
    pub fn add_slot(&mut self, slot: TaskSlot) {
        self.slots.push(slot);
    }

    /// Makespan: latest end time across all tasks.
    pub fn makespan(&self) -> i64 {
        self.slots.iter().map(|s| s.end).max().unwrap_or(0)
    }

    /// Finds the slot of a task by name.
    pub fn slot_for_task(&self, task: &str) -> Option<&TaskSlot> {
        self.slots.iter().find(|s| s.task == task)
    }

    /// Returns every slot assigned to a resource, sorted by start time.
    pub fn slots_for_resource(&self, resource: &str) -> Vec<&TaskSlot> {
        let mut slots: Vec<&TaskSlot> = self
            .slots
            .iter()
            .filter(|s| s.resources.iter().any(|r| r == resource))
            .collect();
        slots.sort_by_key(|s| s.start);
        slots
    }

    /// Total time a resource spends on its tasks.
    pub fn busy_time(&self, resource: &str) -> i64 {
        self.slots_for_resource(resource)
            .iter()
            .map(|s| s.duration)
            .sum()
    }

    /// Number of slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VariableStore;

    fn slot(task: &str, start: i64, end: i64, resources: &[&str]) -> TaskSlot {
        TaskSlot {
            task: task.into(),
            start,
            end,
            duration: end - start,
            resources: resources.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_assignment_values() {
        let mut vars = VariableStore::new();
        let x = vars.new_int("x", None, None).unwrap();
        let flag = vars.new_bool("flag").unwrap();

        let mut assignment = Assignment::new().with_int(x, 7);
        assert_eq!(assignment.int(x), Some(7));
        assert_eq!(assignment.bool(flag), None);

        assignment.set_bool(flag, true);
        assert_eq!(assignment.bool(flag), Some(true));
        assert_eq!(assignment.len(), 2);
        assert!(!assignment.is_empty());
    }

    #[test]
    fn test_assignment_json() {
        let mut vars = VariableStore::new();
        let x = vars.new_int("x", None, None).unwrap();
        let flag = vars.new_bool("flag").unwrap();
        let assignment = Assignment::new().with_int(x, -4).with_bool(flag, false);

        let json = serde_json::to_string(&assignment).unwrap();
        let back: Assignment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, assignment);
        assert_eq!(back.int(x), Some(-4));
    }

    #[test]
    fn test_makespan() {
        let mut schedule = SolvedSchedule::new();
        assert_eq!(schedule.makespan(), 0);

        schedule.add_slot(slot("t1", 0, 3, &["W1"]));
        schedule.add_slot(slot("t2", 3, 8, &["W1", "W2"]));
        assert_eq!(schedule.makespan(), 8);
        assert_eq!(schedule.slot_count(), 2);
    }

    #[test]
    fn test_resource_queries() {
        let mut schedule = SolvedSchedule::new();
        schedule.add_slot(slot("t2", 5, 9, &["W1"]));
        schedule.add_slot(slot("t1", 0, 3, &["W1", "W2"]));

        let w1: Vec<&str> = schedule
            .slots_for_resource("W1")
            .iter()
            .map(|s| s.task.as_str())
            .collect();
        assert_eq!(w1, vec!["t1", "t2"]);
        assert_eq!(schedule.busy_time("W1"), 7);
        assert_eq!(schedule.busy_time("W3"), 0);
        assert_eq!(schedule.slot_for_task("t2").unwrap().duration, 4);
    }

    #[test]
    fn test_slot_overlap() {
        let s = slot("t1", 2, 5, &[]);
        assert!(s.overlaps(4, 6));
        assert!(!s.overlaps(5, 6));
        assert!(!s.overlaps(0, 2));
    }
}
