use std::marker::PhantomData;

use expr::{BinOp, Evaluator, Expr, UnaOp};
use plonky2::field::types::Field;

use crate::memory::stark::Invariant;

/// Evaluates constraints over concrete field elements.
pub struct FieldEvaluator<F> {
    _marker: PhantomData<F>,
}

impl<F> Default for FieldEvaluator<F> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<F: Field> Evaluator<F> for FieldEvaluator<F> {
    fn bin_op(&mut self, op: BinOp, left: F, right: F) -> F {
        match op {
            BinOp::Add => left + right,
            BinOp::Sub => left - right,
            BinOp::Mul => left * right,
        }
    }

    fn una_op(&mut self, op: UnaOp, expr: F) -> F {
        match op {
            UnaOp::Neg => -expr,
        }
    }

    fn constant(&mut self, value: i64) -> F {
        match u64::try_from(value) {
            Ok(value) => F::from_canonical_u64(value),
            Err(_) => -F::from_canonical_u64(value.unsigned_abs()),
        }
    }
}

/// A row and its successor, plus the first-row selector.
pub struct Vars<'a, V, View> {
    pub first_row: Expr<'a, V>,
    pub local_values: View,
    pub next_values: View,
}

pub struct Constraint<E> {
    invariant: Invariant,
    constraint: E,
}

/// Named polynomial constraints that must all vanish on every row.
pub struct ConstraintBuilder<E> {
    constraints: Vec<Constraint<E>>,
}

impl<E> Default for ConstraintBuilder<E> {
    fn default() -> Self {
        Self {
            constraints: Vec::new(),
        }
    }
}

impl<E> ConstraintBuilder<E> {
    pub fn always(&mut self, invariant: Invariant, constraint: E) {
        self.constraints.push(Constraint {
            invariant,
            constraint,
        });
    }

    #[must_use]
    pub fn invariants(&self) -> Vec<Invariant> {
        self.constraints.iter().map(|c| c.invariant).collect()
    }
}

impl<'a, F: Field> ConstraintBuilder<Expr<'a, F>> {
    /// The first constraint, in the order they were added, that does not
    /// vanish.
    #[must_use]
    pub fn first_violation(self) -> Option<Invariant> {
        let mut evaluator = FieldEvaluator::default();
        self.constraints
            .into_iter()
            .find(|c| !evaluator.eval(c.constraint).is_zero())
            .map(|c| c.invariant)
    }
}
