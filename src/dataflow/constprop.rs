//! Constant propagation over the three-point value lattice.
//!
//! Each integer-capable variable is mapped to a [`Value`]: `Undef` (no
//! information yet, the lattice bottom), `Const(c)` (known 32-bit constant)
//! or `Nac` (not a constant, the top). Two distinct constants join to `Nac`.
//! Only variables whose declared type is a narrow integer (boolean, byte,
//! char, short, int) participate; everything else is ignored.
//!
//! Folding uses two's-complement 32-bit semantics throughout: shifts mask the
//! shift amount to 5 bits, comparisons yield 0 or 1, and a division or
//! remainder whose right operand is the constant 0 evaluates to `Undef`:
//! the program traps there, so the result is unreachable rather than a
//! fabricated constant.

use rustc_hash::FxHashMap;

use crate::{
    cfg::{Cfg, CfgNode},
    dataflow::framework::{DataflowAnalysis, Direction},
    ir::{BinaryOp, Exp, Stmt, VarId},
    Program,
};

/// Analysis id under which results are stored.
pub const ID: &str = "constprop";

/// A lattice value of the constant-propagation domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    /// Undefined / unreachable; the bottom element.
    Undef,
    /// A known 32-bit constant.
    Const(i32),
    /// Not-a-constant; the top element.
    Nac,
}

impl Value {
    /// Returns `true` for [`Value::Const`].
    #[must_use]
    pub const fn is_const(self) -> bool {
        matches!(self, Self::Const(_))
    }

    /// Returns `true` for [`Value::Nac`].
    #[must_use]
    pub const fn is_nac(self) -> bool {
        matches!(self, Self::Nac)
    }

    /// Returns `true` for [`Value::Undef`].
    #[must_use]
    pub const fn is_undef(self) -> bool {
        matches!(self, Self::Undef)
    }

    /// The constant behind a [`Value::Const`].
    #[must_use]
    pub const fn as_const(self) -> Option<i32> {
        match self {
            Self::Const(c) => Some(c),
            _ => None,
        }
    }

    /// Joins two lattice values.
    ///
    /// `Undef` is the identity, `Nac` absorbs, and two constants join to
    /// themselves when equal and to `Nac` otherwise.
    #[must_use]
    pub const fn meet(self, other: Self) -> Self {
        match (self, other) {
            (Self::Undef, v) | (v, Self::Undef) => v,
            (Self::Const(a), Self::Const(b)) if a == b => Self::Const(a),
            _ => Self::Nac,
        }
    }
}

/// A map from variables to lattice values; missing keys read as
/// [`Value::Undef`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpFact {
    map: FxHashMap<VarId, Value>,
}

impl CpFact {
    /// Creates an empty fact (every variable `Undef`).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The value of a variable; `Undef` when absent.
    #[must_use]
    pub fn get(&self, var: VarId) -> Value {
        self.map.get(&var).copied().unwrap_or(Value::Undef)
    }

    /// Binds a variable, returning `true` if the fact changed.
    ///
    /// Binding `Undef` removes the key, keeping equality canonical.
    pub fn update(&mut self, var: VarId, value: Value) -> bool {
        match value {
            Value::Undef => self.map.remove(&var).is_some(),
            _ => self.map.insert(var, value) != Some(value),
        }
    }

    /// Removes a binding, returning `true` if it existed.
    pub fn remove(&mut self, var: VarId) -> bool {
        self.map.remove(&var).is_some()
    }

    /// Replaces the contents of `self` with those of `other`, returning
    /// `true` if `self` changed.
    pub fn copy_from(&mut self, other: &Self) -> bool {
        if self == other {
            return false;
        }
        self.map.clone_from(&other.map);
        true
    }

    /// Iterates the explicit (non-`Undef`) bindings.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, Value)> + '_ {
        self.map.iter().map(|(&k, &v)| (k, v))
    }
}

/// Intra-procedural constant propagation.
///
/// Forward analysis; the boundary fact binds every integer-capable parameter
/// to `Nac` because nothing is known about callers on the intra level.
pub struct ConstantPropagation<'a> {
    program: &'a Program,
}

impl<'a> ConstantPropagation<'a> {
    /// Creates the analysis over the given program.
    #[must_use]
    pub const fn new(program: &'a Program) -> Self {
        Self { program }
    }

    /// Computes the out-fact a statement produces from `in_fact`.
    ///
    /// This is the single transfer used by both the intra-procedural analysis
    /// and the interprocedural lift: definitions of integer-capable variables
    /// are bound to the evaluated right-hand side; heap reads and call
    /// results are `Nac`; everything else passes the fact through.
    #[must_use]
    pub fn transfer_stmt(&self, stmt: &Stmt, in_fact: &CpFact) -> CpFact {
        let mut out = in_fact.clone();
        let int_like = |v: VarId| self.program.is_int_like_var(v);
        match stmt {
            Stmt::Assign { lhs, rhs } if int_like(*lhs) => {
                out.update(*lhs, evaluate(rhs, in_fact));
            }
            Stmt::Copy { lhs, rhs } if int_like(*lhs) => {
                out.update(*lhs, in_fact.get(*rhs));
            }
            Stmt::LoadField { lhs, .. } | Stmt::LoadArray { lhs, .. } if int_like(*lhs) => {
                out.update(*lhs, Value::Nac);
            }
            Stmt::Invoke {
                result: Some(r), ..
            } if int_like(*r) => {
                out.update(*r, Value::Nac);
            }
            _ => {}
        }
        out
    }
}

impl DataflowAnalysis for ConstantPropagation<'_> {
    type Fact = CpFact;
    const DIRECTION: Direction = Direction::Forward;

    fn new_boundary_fact(&self, cfg: &Cfg) -> CpFact {
        let mut fact = CpFact::new();
        if let Some(body) = self.program.method(cfg.method()).body() {
            for &param in &body.params {
                if self.program.is_int_like_var(param) {
                    fact.update(param, Value::Nac);
                }
            }
        }
        fact
    }

    fn new_initial_fact(&self) -> CpFact {
        CpFact::new()
    }

    fn meet_into(&self, fact: &CpFact, target: &mut CpFact) {
        for (var, value) in fact.iter() {
            target.update(var, value.meet(target.get(var)));
        }
    }

    fn transfer_node(&self, node: CfgNode, in_fact: &mut CpFact, out_fact: &mut CpFact) -> bool {
        let new_out = match node {
            CfgNode::Entry | CfgNode::Exit => in_fact.clone(),
            CfgNode::Stmt(sid) => self.transfer_stmt(&self.program.stmt(sid).kind, in_fact),
        };
        out_fact.copy_from(&new_out)
    }
}

/// Evaluates an expression under a fact.
///
/// Unknown expression kinds (casts here; heap reads and calls are statements)
/// conservatively evaluate to `Nac`.
#[must_use]
pub fn evaluate(exp: &Exp, fact: &CpFact) -> Value {
    match exp {
        Exp::IntLiteral(c) => Value::Const(*c),
        Exp::Var(v) => fact.get(*v),
        Exp::Binary { op, lhs, rhs } => {
            let v1 = fact.get(*lhs);
            let v2 = fact.get(*rhs);
            // A constant-zero divisor traps regardless of the left operand.
            if op.is_division() && v2 == Value::Const(0) {
                return Value::Undef;
            }
            match (v1, v2) {
                (Value::Const(a), Value::Const(b)) => Value::Const(fold(*op, a, b)),
                (Value::Nac, _) | (_, Value::Nac) => Value::Nac,
                _ => Value::Undef,
            }
        }
        Exp::Cast { .. } => Value::Nac,
    }
}

/// Folds a binary operation over two known constants with 32-bit
/// two's-complement semantics. Division by zero is excluded by the caller.
const fn fold(op: BinaryOp, a: i32, b: i32) -> i32 {
    match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div => a.wrapping_div(b),
        BinaryOp::Rem => a.wrapping_rem(b),
        BinaryOp::Eq => (a == b) as i32,
        BinaryOp::Ne => (a != b) as i32,
        BinaryOp::Lt => (a < b) as i32,
        BinaryOp::Le => (a <= b) as i32,
        BinaryOp::Gt => (a > b) as i32,
        BinaryOp::Ge => (a >= b) as i32,
        BinaryOp::Shl => a.wrapping_shl(b as u32),
        BinaryOp::Shr => a.wrapping_shr(b as u32),
        BinaryOp::Ushr => ((a as u32).wrapping_shr(b as u32)) as i32,
        BinaryOp::And => a & b,
        BinaryOp::Or => a | b,
        BinaryOp::Xor => a ^ b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meet_value_laws() {
        let c = Value::Const(7);
        assert_eq!(c.meet(Value::Undef), c);
        assert_eq!(Value::Undef.meet(c), c);
        assert_eq!(c.meet(Value::Nac), Value::Nac);
        assert_eq!(Value::Nac.meet(c), Value::Nac);
        assert_eq!(c.meet(Value::Const(7)), c);
        assert_eq!(c.meet(Value::Const(8)), Value::Nac);
        assert_eq!(Value::Undef.meet(Value::Undef), Value::Undef);
    }

    #[test]
    fn test_fact_update_and_copy() {
        let v0 = VarId::new(0);
        let v1 = VarId::new(1);
        let mut fact = CpFact::new();
        assert_eq!(fact.get(v0), Value::Undef);
        assert!(fact.update(v0, Value::Const(3)));
        assert!(!fact.update(v0, Value::Const(3)));
        assert!(fact.update(v1, Value::Nac));

        let mut copy = CpFact::new();
        assert!(copy.copy_from(&fact));
        assert!(!copy.copy_from(&fact));
        assert_eq!(copy.get(v0), Value::Const(3));

        // binding Undef removes the key and restores equality with a fresh map
        assert!(copy.update(v0, Value::Undef));
        assert!(copy.update(v1, Value::Undef));
        assert_eq!(copy, CpFact::new());
    }

    #[test]
    fn test_fold_semantics() {
        assert_eq!(fold(BinaryOp::Add, i32::MAX, 1), i32::MIN);
        assert_eq!(fold(BinaryOp::Div, 7, 2), 3);
        assert_eq!(fold(BinaryOp::Rem, 7, 2), 1);
        assert_eq!(fold(BinaryOp::Lt, 1, 2), 1);
        assert_eq!(fold(BinaryOp::Ge, 1, 2), 0);
        // shift amounts are masked to five bits
        assert_eq!(fold(BinaryOp::Shl, 1, 33), 2);
        assert_eq!(fold(BinaryOp::Shr, -8, 1), -4);
        assert_eq!(fold(BinaryOp::Ushr, -1, 28), 0xF);
        assert_eq!(fold(BinaryOp::Xor, 0b1100, 0b1010), 0b0110);
    }

    #[test]
    fn test_division_by_constant_zero_is_undef() {
        let a = VarId::new(0);
        let z = VarId::new(1);
        let mut fact = CpFact::new();
        fact.update(a, Value::Nac);
        fact.update(z, Value::Const(0));
        let div = Exp::Binary {
            op: BinaryOp::Div,
            lhs: a,
            rhs: z,
        };
        let rem = Exp::Binary {
            op: BinaryOp::Rem,
            lhs: a,
            rhs: z,
        };
        assert_eq!(evaluate(&div, &fact), Value::Undef);
        assert_eq!(evaluate(&rem, &fact), Value::Undef);
    }

    #[test]
    fn test_nac_propagation() {
        let a = VarId::new(0);
        let b = VarId::new(1);
        let mut fact = CpFact::new();
        fact.update(a, Value::Const(10));
        fact.update(b, Value::Nac);
        let sum = Exp::Binary {
            op: BinaryOp::Add,
            lhs: a,
            rhs: b,
        };
        assert_eq!(evaluate(&sum, &fact), Value::Nac);

        // both operands undefined stays undefined
        let c = VarId::new(2);
        let d = VarId::new(3);
        let exp = Exp::Binary {
            op: BinaryOp::Add,
            lhs: c,
            rhs: d,
        };
        assert_eq!(evaluate(&exp, &fact), Value::Undef);
    }
}
