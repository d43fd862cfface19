//! Symbolic formulas over decision variables.
//!
//! A [`Formula`] is the only thing the modeling layer hands to a solver.
//! Integer terms are linear ([`LinearExpr`]); the boolean structure mirrors
//! the combinators exposed by the logic layer plus a cardinality node used
//! by counting constraints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Not, Sub};

use super::{Assignment, BoolVar, IntVar, VariableStore};

/// A linear integer expression `Σ coef·var + constant`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearExpr {
    /// `(coefficient, variable)` terms.
    pub terms: Vec<(i64, IntVar)>,
    /// Constant offset.
    pub constant: i64,
}

/// Comparison operator between two linear expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A boolean formula over integer and boolean decision variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Formula {
    /// Constant truth value.
    Const(bool),
    /// A boolean decision variable.
    Var(BoolVar),
    /// `lhs op rhs` over linear expressions.
    Compare {
        lhs: LinearExpr,
        op: CmpOp,
        rhs: LinearExpr,
    },
    Not(Box<Formula>),
    /// Conjunction; empty is true.
    And(Vec<Formula>),
    /// Disjunction; empty is false.
    Or(Vec<Formula>),
    Xor(Box<Formula>, Box<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    /// `then` when `condition` holds, `otherwise` when it does not.
    IfThenElse {
        condition: Box<Formula>,
        then: Box<Formula>,
        otherwise: Box<Formula>,
    },
    /// The number of true operands compared against `bound`.
    Count {
        operands: Vec<Formula>,
        op: CmpOp,
        bound: i64,
    },
}

impl CmpOp {
    /// Applies the comparison to concrete values.
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Ge => lhs >= rhs,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

impl LinearExpr {
    /// A constant expression.
    pub fn constant(value: i64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// A single `coef·var` term.
    pub fn term(coef: i64, var: IntVar) -> Self {
        Self {
            terms: vec![(coef, var)],
            constant: 0,
        }
    }

    /// Evaluates the expression.
    ///
    /// `None` if a variable is unassigned or the value overflows `i64`.
    pub fn evaluate(&self, assignment: &Assignment) -> Option<i64> {
        self.terms.iter().try_fold(self.constant, |acc, &(coef, var)| {
            acc.checked_add(coef.checked_mul(assignment.int(var)?)?)
        })
    }

    /// Whether every variable of the expression has a value.
    pub fn is_assigned(&self, assignment: &Assignment) -> bool {
        self.terms.iter().all(|&(_, var)| assignment.int(var).is_some())
    }

    /// Sum of two expressions, `None` on constant or coefficient overflow.
    pub fn checked_add(mut self, rhs: impl Into<LinearExpr>) -> Option<LinearExpr> {
        let rhs = rhs.into();
        self.constant = self.constant.checked_add(rhs.constant)?;
        self.terms.extend(rhs.terms);
        Some(self)
    }

    /// Scales the expression, `None` on constant or coefficient overflow.
    pub fn checked_mul(mut self, factor: i64) -> Option<LinearExpr> {
        for (coef, _) in &mut self.terms {
            *coef = coef.checked_mul(factor)?;
        }
        self.constant = self.constant.checked_mul(factor)?;
        Some(self)
    }

    fn compare(self, op: CmpOp, rhs: impl Into<LinearExpr>) -> Formula {
        Formula::Compare {
            lhs: self,
            op,
            rhs: rhs.into(),
        }
    }

    /// `self == rhs`
    pub fn equal_to(self, rhs: impl Into<LinearExpr>) -> Formula {
        self.compare(CmpOp::Eq, rhs)
    }

    /// `self != rhs`
    pub fn not_equal_to(self, rhs: impl Into<LinearExpr>) -> Formula {
        self.compare(CmpOp::Ne, rhs)
    }

    /// `self < rhs`
    pub fn less_than(self, rhs: impl Into<LinearExpr>) -> Formula {
        self.compare(CmpOp::Lt, rhs)
    }

    /// `self <= rhs`
    pub fn at_most(self, rhs: impl Into<LinearExpr>) -> Formula {
        self.compare(CmpOp::Le, rhs)
    }

    /// `self > rhs`
    pub fn greater_than(self, rhs: impl Into<LinearExpr>) -> Formula {
        self.compare(CmpOp::Gt, rhs)
    }

    /// `self >= rhs`
    pub fn at_least(self, rhs: impl Into<LinearExpr>) -> Formula {
        self.compare(CmpOp::Ge, rhs)
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, vars: &VariableStore) -> fmt::Result {
        let mut first = true;
        for &(coef, var) in &self.terms {
            let name = vars.int_name(var);
            match (first, coef) {
                (true, 1) => write!(f, "{name}")?,
                (true, -1) => write!(f, "-{name}")?,
                (true, c) => write!(f, "{c}*{name}")?,
                (false, 1) => write!(f, " + {name}")?,
                (false, -1) => write!(f, " - {name}")?,
                (false, c) if c < 0 => write!(f, " - {}*{name}", -c)?,
                (false, c) => write!(f, " + {c}*{name}")?,
            }
            first = false;
        }
        match (first, self.constant) {
            (true, c) => write!(f, "{c}"),
            (false, 0) => Ok(()),
            (false, c) if c < 0 => write!(f, " - {}", -c),
            (false, c) => write!(f, " + {c}"),
        }
    }
}

impl From<i64> for LinearExpr {
    fn from(value: i64) -> Self {
        LinearExpr::constant(value)
    }
}

impl From<IntVar> for LinearExpr {
    fn from(var: IntVar) -> Self {
        LinearExpr::term(1, var)
    }
}

impl<T: Into<LinearExpr>> Add<T> for LinearExpr {
    type Output = LinearExpr;

    /// # Panics
    ///
    /// Panics if the constant overflows. Use [`LinearExpr::checked_add`] to
    /// handle overflow.
    fn add(self, rhs: T) -> LinearExpr {
        self.checked_add(rhs)
            .unwrap_or_else(|| panic!("overflow when adding linear expressions"))
    }
}

impl<T: Into<LinearExpr>> Sub<T> for LinearExpr {
    type Output = LinearExpr;

    fn sub(self, rhs: T) -> LinearExpr {
        self + (-rhs.into())
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;

    fn neg(self) -> LinearExpr {
        self * -1
    }
}

impl Mul<i64> for LinearExpr {
    type Output = LinearExpr;

    /// # Panics
    ///
    /// Panics if a coefficient or the constant overflows. Use
    /// [`LinearExpr::checked_mul`] to handle overflow.
    fn mul(self, factor: i64) -> LinearExpr {
        self.checked_mul(factor)
            .unwrap_or_else(|| panic!("overflow when scaling a linear expression"))
    }
}

impl<T: Into<LinearExpr>> Add<T> for IntVar {
    type Output = LinearExpr;

    fn add(self, rhs: T) -> LinearExpr {
        LinearExpr::from(self) + rhs
    }
}

impl<T: Into<LinearExpr>> Sub<T> for IntVar {
    type Output = LinearExpr;

    fn sub(self, rhs: T) -> LinearExpr {
        LinearExpr::from(self) - rhs
    }
}

impl Mul<i64> for IntVar {
    type Output = LinearExpr;

    fn mul(self, factor: i64) -> LinearExpr {
        LinearExpr::term(factor, self)
    }
}

impl IntVar {
    /// `self == rhs`
    pub fn equal_to(self, rhs: impl Into<LinearExpr>) -> Formula {
        LinearExpr::from(self).equal_to(rhs)
    }

    /// `self != rhs`
    pub fn not_equal_to(self, rhs: impl Into<LinearExpr>) -> Formula {
        LinearExpr::from(self).not_equal_to(rhs)
    }

    /// `self < rhs`
    pub fn less_than(self, rhs: impl Into<LinearExpr>) -> Formula {
        LinearExpr::from(self).less_than(rhs)
    }

    /// `self <= rhs`
    pub fn at_most(self, rhs: impl Into<LinearExpr>) -> Formula {
        LinearExpr::from(self).at_most(rhs)
    }

    /// `self > rhs`
    pub fn greater_than(self, rhs: impl Into<LinearExpr>) -> Formula {
        LinearExpr::from(self).greater_than(rhs)
    }

    /// `self >= rhs`
    pub fn at_least(self, rhs: impl Into<LinearExpr>) -> Formula {
        LinearExpr::from(self).at_least(rhs)
    }
}

impl From<BoolVar> for Formula {
    fn from(var: BoolVar) -> Self {
        Formula::Var(var)
    }
}

impl From<bool> for Formula {
    fn from(value: bool) -> Self {
        Formula::Const(value)
    }
}

impl Not for Formula {
    type Output = Formula;

    fn not(self) -> Formula {
        Formula::Not(Box::new(self))
    }
}

impl Formula {
    /// Conjunction of `operands`. A single operand is returned as is.
    pub fn and(operands: impl IntoIterator<Item = Formula>) -> Formula {
        let mut operands: Vec<Formula> = operands.into_iter().collect();
        if operands.len() == 1 {
            return operands.remove(0);
        }
        Formula::And(operands)
    }

    /// Disjunction of `operands`. A single operand is returned as is.
    pub fn or(operands: impl IntoIterator<Item = Formula>) -> Formula {
        let mut operands: Vec<Formula> = operands.into_iter().collect();
        if operands.len() == 1 {
            return operands.remove(0);
        }
        Formula::Or(operands)
    }

    /// Exclusive or of two formulas.
    pub fn xor(lhs: Formula, rhs: Formula) -> Formula {
        Formula::Xor(Box::new(lhs), Box::new(rhs))
    }

    /// `condition → consequence`
    pub fn implies(condition: Formula, consequence: Formula) -> Formula {
        Formula::Implies(Box::new(condition), Box::new(consequence))
    }

    /// `then` if `condition` holds, `otherwise` if not.
    pub fn if_then_else(condition: Formula, then: Formula, otherwise: Formula) -> Formula {
        Formula::IfThenElse {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// Cardinality: `|{true operands}| op bound`.
    pub fn count(operands: impl IntoIterator<Item = Formula>, op: CmpOp, bound: i64) -> Formula {
        Formula::Count {
            operands: operands.into_iter().collect(),
            op,
            bound,
        }
    }

    /// Evaluates the formula under `assignment`.
    ///
    /// Returns `None` when a referenced variable has no value.
    pub fn evaluate(&self, assignment: &Assignment) -> Option<bool> {
        match self {
            Formula::Const(value) => Some(*value),
            Formula::Var(var) => assignment.bool(*var),
            Formula::Compare { lhs, op, rhs } => {
                if !lhs.is_assigned(assignment) || !rhs.is_assigned(assignment) {
                    return None;
                }
                // a side that overflows i64 has no value to compare
                match (lhs.evaluate(assignment), rhs.evaluate(assignment)) {
                    (Some(l), Some(r)) => Some(op.holds(l, r)),
                    _ => Some(false),
                }
            }
            Formula::Not(inner) => inner.evaluate(assignment).map(|v| !v),
            Formula::And(operands) => operands
                .iter()
                .try_fold(true, |acc, f| f.evaluate(assignment).map(|v| acc && v)),
            Formula::Or(operands) => operands
                .iter()
                .try_fold(false, |acc, f| f.evaluate(assignment).map(|v| acc || v)),
            Formula::Xor(lhs, rhs) => Some(lhs.evaluate(assignment)? != rhs.evaluate(assignment)?),
            Formula::Implies(condition, consequence) => {
                Some(!condition.evaluate(assignment)? || consequence.evaluate(assignment)?)
            }
            Formula::IfThenElse {
                condition,
                then,
                otherwise,
            } => {
                if condition.evaluate(assignment)? {
                    then.evaluate(assignment)
                } else {
                    otherwise.evaluate(assignment)
                }
            }
            Formula::Count {
                operands,
                op,
                bound,
            } => {
                let satisfied = operands.iter().try_fold(0i64, |acc, f| {
                    f.evaluate(assignment).map(|v| acc + i64::from(v))
                })?;
                Some(op.holds(satisfied, *bound))
            }
        }
    }

    /// Collects every variable referenced by this formula.
    pub fn collect_vars(&self, ints: &mut Vec<IntVar>, bools: &mut Vec<BoolVar>) {
        match self {
            Formula::Const(_) => {}
            Formula::Var(var) => bools.push(*var),
            Formula::Compare { lhs, rhs, .. } => {
                ints.extend(lhs.terms.iter().map(|&(_, v)| v));
                ints.extend(rhs.terms.iter().map(|&(_, v)| v));
            }
            Formula::Not(inner) => inner.collect_vars(ints, bools),
            Formula::And(operands) | Formula::Or(operands) => {
                for f in operands {
                    f.collect_vars(ints, bools);
                }
            }
            Formula::Count { operands, .. } => {
                for f in operands {
                    f.collect_vars(ints, bools);
                }
            }
            Formula::Xor(lhs, rhs) | Formula::Implies(lhs, rhs) => {
                lhs.collect_vars(ints, bools);
                rhs.collect_vars(ints, bools);
            }
            Formula::IfThenElse {
                condition,
                then,
                otherwise,
            } => {
                condition.collect_vars(ints, bools);
                then.collect_vars(ints, bools);
                otherwise.collect_vars(ints, bools);
            }
        }
    }

    /// Renders the formula with variable names taken from `vars`.
    pub fn display<'a>(&'a self, vars: &'a VariableStore) -> FormulaDisplay<'a> {
        FormulaDisplay {
            formula: self,
            vars,
        }
    }
}

/// [`fmt::Display`] adapter returned by [`Formula::display`].
#[derive(Debug, Clone, Copy)]
pub struct FormulaDisplay<'a> {
    formula: &'a Formula,
    vars: &'a VariableStore,
}

impl FormulaDisplay<'_> {
    fn nested<'b>(&'b self, formula: &'b Formula) -> FormulaDisplay<'b> {
        FormulaDisplay {
            formula,
            vars: self.vars,
        }
    }

    fn write_list(&self, f: &mut fmt::Formatter<'_>, name: &str, operands: &[Formula]) -> fmt::Result {
        write!(f, "{name}(")?;
        for (i, operand) in operands.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", self.nested(operand))?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for FormulaDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.formula {
            Formula::Const(value) => write!(f, "{value}"),
            Formula::Var(var) => write!(f, "{}", self.vars.bool_name(*var)),
            Formula::Compare { lhs, op, rhs } => {
                lhs.write(f, self.vars)?;
                write!(f, " {} ", op.symbol())?;
                rhs.write(f, self.vars)
            }
            Formula::Not(inner) => write!(f, "Not({})", self.nested(inner)),
            Formula::And(operands) => self.write_list(f, "And", operands),
            Formula::Or(operands) => self.write_list(f, "Or", operands),
            Formula::Xor(lhs, rhs) => {
                write!(f, "Xor({}, {})", self.nested(lhs), self.nested(rhs))
            }
            Formula::Implies(lhs, rhs) => {
                write!(f, "Implies({}, {})", self.nested(lhs), self.nested(rhs))
            }
            Formula::IfThenElse {
                condition,
                then,
                otherwise,
            } => write!(
                f,
                "If({}, {}, {})",
                self.nested(condition),
                self.nested(then),
                self.nested(otherwise)
            ),
            Formula::Count {
                operands,
                op,
                bound,
            } => {
                self.write_list(f, "Count", operands)?;
                write!(f, " {} {bound}", op.symbol())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_xy() -> (VariableStore, IntVar, IntVar) {
        let mut vars = VariableStore::new();
        let x = vars.new_int("x", None, None).unwrap();
        let y = vars.new_int("y", None, None).unwrap();
        (vars, x, y)
    }

    #[test]
    fn test_linear_arithmetic() {
        let (_, x, y) = store_with_xy();
        let expr = x + y * 2 - 3;
        let assignment = Assignment::new().with_int(x, 4).with_int(y, 5);
        assert_eq!(expr.evaluate(&assignment), Some(11));

        let negated = -(LinearExpr::from(x) + 1);
        assert_eq!(negated.evaluate(&assignment), Some(-5));
    }

    #[test]
    fn test_compare_evaluation() {
        let (_, x, y) = store_with_xy();
        let assignment = Assignment::new().with_int(x, 2).with_int(y, 3);

        assert_eq!(y.equal_to(x + 1).evaluate(&assignment), Some(true));
        assert_eq!(y.greater_than(x + 1).evaluate(&assignment), Some(false));
        assert_eq!(y.at_least(x + 1).evaluate(&assignment), Some(true));
        assert_eq!(x.less_than(y).evaluate(&assignment), Some(true));
        assert_eq!(x.not_equal_to(2).evaluate(&assignment), Some(false));
    }

    #[test]
    fn test_overflow_is_unsatisfied() {
        let (_, x, y) = store_with_xy();
        let huge = Assignment::new().with_int(x, i64::MAX).with_int(y, 0);

        assert_eq!((x + 1).evaluate(&huge), None);
        assert_eq!(y.equal_to(x + 1).evaluate(&huge), Some(false));
        assert_eq!(y.less_than(x * 2).evaluate(&huge), Some(false));
        // unassigned still wins over overflow
        assert_eq!(y.at_most(x + 1).evaluate(&Assignment::new().with_int(x, i64::MAX)), None);
    }

    #[test]
    fn test_checked_arithmetic() {
        let (_, x, _) = store_with_xy();
        assert_eq!(LinearExpr::constant(i64::MAX).checked_add(1), None);
        assert_eq!(LinearExpr::from(x).checked_mul(i64::MAX).map(|e| e.terms), Some(vec![(i64::MAX, x)]));
        assert_eq!((LinearExpr::from(x) * 2).checked_mul(i64::MAX), None);
        assert_eq!(LinearExpr::constant(3).checked_mul(4), Some(LinearExpr::constant(12)));
    }

    #[test]
    fn test_unassigned_variable() {
        let (_, x, y) = store_with_xy();
        let assignment = Assignment::new().with_int(x, 2);
        assert_eq!(x.at_most(y).evaluate(&assignment), None);
    }

    #[test]
    fn test_boolean_structure() {
        let mut vars = VariableStore::new();
        let a = vars.new_bool("a").unwrap();
        let b = vars.new_bool("b").unwrap();
        let assignment = Assignment::new().with_bool(a, true).with_bool(b, false);

        let fa = Formula::from(a);
        let fb = Formula::from(b);
        assert_eq!(Formula::xor(fa.clone(), fb.clone()).evaluate(&assignment), Some(true));
        assert_eq!(
            Formula::implies(fa.clone(), fb.clone()).evaluate(&assignment),
            Some(false)
        );
        assert_eq!(
            Formula::if_then_else(fb.clone(), false.into(), fa.clone()).evaluate(&assignment),
            Some(true)
        );
        assert_eq!((!fb.clone()).evaluate(&assignment), Some(true));
        assert_eq!(Formula::And(vec![]).evaluate(&assignment), Some(true));
        assert_eq!(Formula::Or(vec![]).evaluate(&assignment), Some(false));
        assert_eq!(
            Formula::count([fa, fb, true.into()], CmpOp::Ge, 2).evaluate(&assignment),
            Some(true)
        );
    }

    #[test]
    fn test_single_operand_collapses() {
        let f = Formula::and([Formula::Const(true)]);
        assert_eq!(f, Formula::Const(true));
        let g = Formula::or([Formula::Const(false), Formula::Const(true)]);
        assert!(matches!(g, Formula::Or(ref v) if v.len() == 2));
    }

    #[test]
    fn test_collect_vars() {
        let mut vars = VariableStore::new();
        let x = vars.new_int("x", None, None).unwrap();
        let flag = vars.new_bool("flag").unwrap();
        let f = Formula::implies(flag.into(), x.at_least(1));

        let mut ints = Vec::new();
        let mut bools = Vec::new();
        f.collect_vars(&mut ints, &mut bools);
        assert_eq!(ints, vec![x]);
        assert_eq!(bools, vec![flag]);
    }

    #[test]
    fn test_display() {
        let (vars, x, y) = store_with_xy();
        let f = Formula::or([x.at_most(y - 1), y.at_most(x * 2 + 3)]);
        assert_eq!(
            f.display(&vars).to_string(),
            "Or(x <= y - 1, y <= 2*x + 3)"
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let (_, x, y) = store_with_xy();
        let f = Formula::and([x.at_least(0), y.equal_to(x + 2)]);
        let json = serde_json::to_string(&f).unwrap();
        let back: Formula = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
    }
}
