//! Logical combinators over constraints and raw formulas.
//!
//! An [`Assertion`] is either a raw [`Formula`], a [`Constraint`] value, or a
//! combinator node over further assertions. Building one is pure; it reaches
//! the problem only through [`SchedulingContext::assert`] or one of the
//! combinator methods, which lower the whole tree to a single formula,
//! append it and return it.
//!
//! Nest [`Assertion`] values to compose. A formula returned by a combinator
//! method is already asserted; nesting it again asserts it twice.
//!
//! # Examples
//!
//! ```
//! use u_procsched::{Assertion, Constraint, SchedulingContext};
//!
//! let mut ctx = SchedulingContext::new("logic");
//! let t1 = ctx.add_fixed_duration_task("t1", 2).unwrap();
//! let t2 = ctx.add_fixed_duration_task("t2", 2).unwrap();
//!
//! // either t1 starts at 0 and t2 at 2, or t2 starts at 0
//! ctx.or([
//!     Assertion::and([
//!         Constraint::task_start_at(t1, 0),
//!         Constraint::task_start_at(t2, 2),
//!     ]),
//!     Constraint::task_start_at(t2, 0).into(),
//! ])
//! .unwrap();
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

use crate::context::{ConstraintOrigin, SchedulingContext};
use crate::error::{ModelError, ModelResult};
use crate::models::{Constraint, Formula};

/// A raw formula, a constraint, or a combinator over assertions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assertion {
    Formula(Formula),
    Constraint(Constraint),
    /// Negation of the operand.
    Not(Box<Assertion>),
    /// All operands hold.
    And(Vec<Assertion>),
    /// At least one operand holds.
    Or(Vec<Assertion>),
    /// Exactly one of the two operands holds.
    Xor(Box<Assertion>, Box<Assertion>),
    /// `condition` forces all `consequences`.
    Implies {
        condition: Formula,
        consequences: Vec<Assertion>,
    },
    /// `then` when `condition` holds, `otherwise` when it does not.
    IfThenElse {
        condition: Formula,
        then: Vec<Assertion>,
        otherwise: Vec<Assertion>,
    },
}

impl From<Formula> for Assertion {
    fn from(formula: Formula) -> Self {
        Assertion::Formula(formula)
    }
}

impl From<Constraint> for Assertion {
    fn from(constraint: Constraint) -> Self {
        Assertion::Constraint(constraint)
    }
}

fn collect(items: impl IntoIterator<Item = impl Into<Assertion>>) -> Vec<Assertion> {
    items.into_iter().map(Into::into).collect()
}

impl Assertion {
    /// Negation of `operand`.
    pub fn not(operand: impl Into<Assertion>) -> Self {
        Assertion::Not(Box::new(operand.into()))
    }

    /// Conjunction. An empty list holds trivially.
    pub fn and(operands: impl IntoIterator<Item = impl Into<Assertion>>) -> Self {
        Assertion::And(collect(operands))
    }

    /// Disjunction. An empty list never holds.
    pub fn or(operands: impl IntoIterator<Item = impl Into<Assertion>>) -> Self {
        Assertion::Or(collect(operands))
    }

    /// Exactly one of `lhs` and `rhs` holds.
    pub fn xor(lhs: impl Into<Assertion>, rhs: impl Into<Assertion>) -> Self {
        Assertion::Xor(Box::new(lhs.into()), Box::new(rhs.into()))
    }

    /// When `condition` holds, every consequence must hold.
    pub fn implies(condition: Formula, consequences: impl IntoIterator<Item = impl Into<Assertion>>) -> Self {
        Assertion::Implies {
            condition,
            consequences: collect(consequences),
        }
    }

    /// Chooses between two branches on `condition`.
    ///
    /// Each branch is lowered as the conjunction of its items.
    pub fn if_then_else(
        condition: Formula,
        then: impl IntoIterator<Item = impl Into<Assertion>>,
        otherwise: impl IntoIterator<Item = impl Into<Assertion>>,
    ) -> Self {
        Assertion::IfThenElse {
            condition,
            then: collect(then),
            otherwise: collect(otherwise),
        }
    }

    /// Lowers the assertion to one formula over `ctx`'s variables.
    ///
    /// Constraints met on the way are pushed onto `consumed`.
    fn lower(&self, ctx: &SchedulingContext, consumed: &mut Vec<Constraint>) -> ModelResult<Formula> {
        let formula = match self {
            Assertion::Formula(formula) => {
                ctx.check_formula(formula)?;
                formula.clone()
            }
            Assertion::Constraint(constraint) => {
                let formula = constraint.to_formula(ctx)?;
                consumed.push(constraint.clone());
                formula
            }
            Assertion::Not(operand) => !operand.lower(ctx, consumed)?,
            Assertion::And(operands) => Formula::And(lower_all(operands, ctx, consumed)?),
            Assertion::Or(operands) => Formula::Or(lower_all(operands, ctx, consumed)?),
            Assertion::Xor(lhs, rhs) => {
                Formula::xor(lhs.lower(ctx, consumed)?, rhs.lower(ctx, consumed)?)
            }
            Assertion::Implies {
                condition,
                consequences,
            } => {
                ctx.check_formula(condition)?;
                Formula::implies(
                    condition.clone(),
                    Formula::and(lower_all(consequences, ctx, consumed)?),
                )
            }
            Assertion::IfThenElse {
                condition,
                then,
                otherwise,
            } => {
                ctx.check_formula(condition)?;
                Formula::if_then_else(
                    condition.clone(),
                    Formula::and(lower_all(then, ctx, consumed)?),
                    Formula::and(lower_all(otherwise, ctx, consumed)?),
                )
            }
        };
        Ok(formula)
    }
}

fn lower_all(
    operands: &[Assertion],
    ctx: &SchedulingContext,
    consumed: &mut Vec<Constraint>,
) -> ModelResult<Vec<Formula>> {
    operands.iter().map(|a| a.lower(ctx, consumed)).collect()
}

impl SchedulingContext {
    /// Lowers `assertion`, appends the resulting formula and returns it.
    ///
    /// Constraints inside the assertion are recorded as created from an
    /// assertion. Nothing is appended if lowering fails.
    pub fn assert(&mut self, assertion: impl Into<Assertion>) -> ModelResult<Formula> {
        let assertion = assertion.into();
        let mut consumed = Vec::new();
        let formula = assertion.lower(self, &mut consumed)?;
        debug!("assert expression over {} constraint(s)", consumed.len());
        self.commit(vec![formula.clone()]);
        self.record_constraints(consumed, ConstraintOrigin::Combinator);
        Ok(formula)
    }

    /// Asserts the negation of `operand`.
    pub fn not(&mut self, operand: impl Into<Assertion>) -> ModelResult<Formula> {
        self.assert(Assertion::not(operand))
    }

    /// Asserts that every operand holds.
    pub fn and(&mut self, operands: impl IntoIterator<Item = impl Into<Assertion>>) -> ModelResult<Formula> {
        self.assert(Assertion::and(operands))
    }

    /// Asserts that at least one operand holds.
    pub fn or(&mut self, operands: impl IntoIterator<Item = impl Into<Assertion>>) -> ModelResult<Formula> {
        self.assert(Assertion::or(operands))
    }

    /// Asserts that exactly one of two operands holds.
    ///
    /// Fails with [`ModelError::XorArity`] unless given exactly two operands.
    pub fn xor(&mut self, operands: impl IntoIterator<Item = impl Into<Assertion>>) -> ModelResult<Formula> {
        let mut operands = collect(operands);
        if operands.len() != 2 {
            return Err(ModelError::XorArity(operands.len()));
        }
        let rhs = operands.remove(1);
        let lhs = operands.remove(0);
        self.assert(Assertion::xor(lhs, rhs))
    }

    /// Asserts `condition → AND(consequences)`.
    pub fn implies(
        &mut self,
        condition: Formula,
        consequences: impl IntoIterator<Item = impl Into<Assertion>>,
    ) -> ModelResult<Formula> {
        self.assert(Assertion::implies(condition, consequences))
    }

    /// Asserts `AND(then)` when `condition` holds and `AND(otherwise)` when not.
    pub fn if_then_else(
        &mut self,
        condition: Formula,
        then: impl IntoIterator<Item = impl Into<Assertion>>,
        otherwise: impl IntoIterator<Item = impl Into<Assertion>>,
    ) -> ModelResult<Formula> {
        self.assert(Assertion::if_then_else(condition, then, otherwise))
    }
}
