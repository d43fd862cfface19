//! Decision variables.
//!
//! Variables are plain handles into a [`VariableStore`]. The store keeps the
//! name and declared domain of each variable so that a solver bridge can
//! declare them before asserting formulas.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ModelError, ModelResult};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Draws a process-wide unique generation stamp.
pub(crate) fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Handle to an integer decision variable.
///
/// Carries the generation of the store that declared it, so a handle is
/// never mistaken for a variable of another store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntVar {
    pub(crate) context: u64,
    pub(crate) index: u32,
}

/// Handle to a boolean decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoolVar {
    pub(crate) context: u64,
    pub(crate) index: u32,
}

impl IntVar {
    /// Position of this variable in its store.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl BoolVar {
    /// Position of this variable in its store.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// Declared domain of an integer variable.
///
/// Bounds recorded here are also emitted as formulas by whoever creates the
/// variable, so a solver may rely on either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntVarInfo {
    /// Variable name, unique among all variables of the store.
    pub name: String,
    /// Inclusive lower bound, if any.
    pub min: Option<i64>,
    /// Inclusive upper bound, if any.
    pub max: Option<i64>,
}

/// Declared boolean variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoolVarInfo {
    /// Variable name, unique among all variables of the store.
    pub name: String,
}

/// All decision variables of one modeling context.
///
/// Integer and boolean variables share one namespace: a solver bridge may
/// declare them by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableStore {
    generation: u64,
    int_vars: Vec<IntVarInfo>,
    bool_vars: Vec<BoolVarInfo>,
    names: HashSet<String>,
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableStore {
    /// Creates an empty store with a fresh generation.
    pub fn new() -> Self {
        Self {
            generation: next_generation(),
            int_vars: Vec::new(),
            bool_vars: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Generation stamped on every handle of this store.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Declares an integer variable with an inclusive domain.
    ///
    /// Fails if a variable of either kind already has this name.
    pub fn new_int(&mut self, name: impl Into<String>, min: Option<i64>, max: Option<i64>) -> ModelResult<IntVar> {
        let name = self.claim(name.into())?;
        Ok(self.push_int(name, min, max))
    }

    /// Declares a boolean variable.
    ///
    /// Fails if a variable of either kind already has this name.
    pub fn new_bool(&mut self, name: impl Into<String>) -> ModelResult<BoolVar> {
        let name = self.claim(name.into())?;
        Ok(self.push_bool(name))
    }

    /// Declares an integer variable named `base`, or `base_N` for the
    /// smallest `N` that is still free.
    pub(crate) fn fresh_int(&mut self, base: String, min: Option<i64>, max: Option<i64>) -> IntVar {
        let name = self.fresh_name(base);
        self.push_int(name, min, max)
    }

    /// Boolean counterpart of [`VariableStore::fresh_int`].
    pub(crate) fn fresh_bool(&mut self, base: String) -> BoolVar {
        let name = self.fresh_name(base);
        self.push_bool(name)
    }

    fn claim(&mut self, name: String) -> ModelResult<String> {
        if self.names.contains(&name) {
            return Err(ModelError::DuplicateVariable(name));
        }
        self.names.insert(name.clone());
        Ok(name)
    }

    fn fresh_name(&mut self, base: String) -> String {
        let mut name = base.clone();
        let mut suffix = 2;
        while self.names.contains(&name) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        self.names.insert(name.clone());
        name
    }

    fn push_int(&mut self, name: String, min: Option<i64>, max: Option<i64>) -> IntVar {
        let var = IntVar {
            context: self.generation,
            index: self.int_vars.len() as u32,
        };
        self.int_vars.push(IntVarInfo { name, min, max });
        var
    }

    fn push_bool(&mut self, name: String) -> BoolVar {
        let var = BoolVar {
            context: self.generation,
            index: self.bool_vars.len() as u32,
        };
        self.bool_vars.push(BoolVarInfo { name });
        var
    }

    /// Looks up an integer variable. `None` for a handle of another store.
    pub fn int_info(&self, var: IntVar) -> Option<&IntVarInfo> {
        if var.context != self.generation {
            return None;
        }
        self.int_vars.get(var.index())
    }

    /// Looks up a boolean variable. `None` for a handle of another store.
    pub fn bool_info(&self, var: BoolVar) -> Option<&BoolVarInfo> {
        if var.context != self.generation {
            return None;
        }
        self.bool_vars.get(var.index())
    }

    /// Iterates over integer variables in declaration order.
    pub fn int_vars(&self) -> impl Iterator<Item = (IntVar, &IntVarInfo)> {
        let context = self.generation;
        self.int_vars
            .iter()
            .enumerate()
            .map(move |(i, info)| (IntVar { context, index: i as u32 }, info))
    }

    /// Iterates over boolean variables in declaration order.
    pub fn bool_vars(&self) -> impl Iterator<Item = (BoolVar, &BoolVarInfo)> {
        let context = self.generation;
        self.bool_vars
            .iter()
            .enumerate()
            .map(move |(i, info)| (BoolVar { context, index: i as u32 }, info))
    }

    /// Number of integer variables.
    pub fn int_count(&self) -> usize {
        self.int_vars.len()
    }

    /// Number of boolean variables.
    pub fn bool_count(&self) -> usize {
        self.bool_vars.len()
    }

    /// Name of an integer variable, or `"?"` for an unknown handle.
    pub(crate) fn int_name(&self, var: IntVar) -> &str {
        self.int_info(var).map_or("?", |info| info.name.as_str())
    }

    /// Name of a boolean variable, or `"?"` for an unknown handle.
    pub(crate) fn bool_name(&self, var: BoolVar) -> &str {
        self.bool_info(var).map_or("?", |info| info.name.as_str())
    }

    /// Whether every handle was declared by this store.
    pub(crate) fn contains(&self, ints: &[IntVar], bools: &[BoolVar]) -> bool {
        ints.iter().all(|&v| self.int_info(v).is_some())
            && bools.iter().all(|&v| self.bool_info(v).is_some())
    }
}
