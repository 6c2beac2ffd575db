//! Simple library for handling ASTs of polynomial constraints in Rust

mod ops;

use bumpalo::Bump;

/// Publicly available struct.  Contains a reference to [`ExprTree`] that is
/// managed by [`ExprBuilder`].
pub struct Expr<'a, V> {
    expr_tree: &'a ExprTree<'a, V>,
    builder: &'a ExprBuilder,
}

// Manual impls, so that `Expr` is `Copy` regardless of `V`.
impl<'a, V> Clone for Expr<'a, V> {
    fn clone(&self) -> Self { *self }
}

impl<'a, V> Copy for Expr<'a, V> {}

impl<'a, V> Expr<'a, V> {
    fn bin_op(op: BinOp, left: Self, right: Self) -> Self { left.builder.bin_op(op, left, right) }

    fn una_op(op: UnaOp, expr: Self) -> Self { expr.builder.una_op(op, expr) }

    /// Lift an integer constant into the same builder as `self`.
    #[must_use]
    pub fn constant(self, value: i64) -> Self { self.builder.constant(value) }

    /// `x * (1 - x)`: vanishes exactly when `x` is 0 or 1.
    #[must_use]
    pub fn is_binary(self) -> Self { self * (1 - self) }
}

/// Expression Builder.  Contains a [`Bump`] memory arena that will allocate
/// and store all the [`ExprTree`]s.
pub struct ExprBuilder {
    arena: Bump,
}

impl Default for ExprBuilder {
    fn default() -> Self { Self { arena: Bump::new() } }
}

impl ExprBuilder {
    /// Internalise an [`ExprTree`] by moving it to memory allocated by the
    /// [`Bump`] arena owned by [`ExprBuilder`].
    fn intern<'a, V>(&'a self, expr_tree: ExprTree<'a, V>) -> Expr<'a, V> {
        let expr_tree = self.arena.alloc(expr_tree);
        Expr {
            expr_tree,
            builder: self,
        }
    }

    /// Convenience method for creating `BinOp` nodes
    fn bin_op<'a, V>(&'a self, op: BinOp, left: Expr<'a, V>, right: Expr<'a, V>) -> Expr<'a, V> {
        let left = left.expr_tree;
        let right = right.expr_tree;
        self.intern(ExprTree::BinOp { op, left, right })
    }

    /// Convenience method for creating `UnaOp` nodes
    fn una_op<'a, V>(&'a self, op: UnaOp, expr: Expr<'a, V>) -> Expr<'a, V> {
        let expr = expr.expr_tree;
        self.intern(ExprTree::UnaOp { op, expr })
    }

    /// Create a `Literal` expression
    pub fn lit<V>(&self, value: V) -> Expr<'_, V> { self.intern(ExprTree::Literal { value }) }

    /// Create a `Constant` expression
    pub fn constant<V>(&self, value: i64) -> Expr<'_, V> {
        self.intern(ExprTree::Constant { value })
    }
}

/// Enum for binary operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
}

/// Unary operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaOp {
    Neg,
}

/// Internal type to represent the expression trees
#[derive(Debug)]
enum ExprTree<'a, V> {
    BinOp {
        op: BinOp,
        left: &'a ExprTree<'a, V>,
        right: &'a ExprTree<'a, V>,
    },
    UnaOp {
        op: UnaOp,
        expr: &'a ExprTree<'a, V>,
    },
    Literal {
        value: V,
    },
    Constant {
        value: i64,
    },
}

impl<V> ExprTree<'_, V>
where
    V: Copy,
{
    fn eval_with<E>(&self, evaluator: &mut E) -> V
    where
        E: Evaluator<V>,
        E: ?Sized, {
        match self {
            ExprTree::BinOp { op, left, right } => {
                let left = left.eval_with(evaluator);
                let right = right.eval_with(evaluator);

                evaluator.bin_op(*op, left, right)
            }
            ExprTree::UnaOp { op, expr } => {
                let expr = expr.eval_with(evaluator);
                evaluator.una_op(*op, expr)
            }
            ExprTree::Literal { value } => *value,
            ExprTree::Constant { value } => evaluator.constant(*value),
        }
    }
}

/// Evaluator that can evaluate [`Expr`] to `V`.
pub trait Evaluator<V>
where
    V: Copy, {
    fn bin_op(&mut self, op: BinOp, left: V, right: V) -> V;
    fn una_op(&mut self, op: UnaOp, expr: V) -> V;
    fn constant(&mut self, value: i64) -> V;
    fn eval(&mut self, expr: Expr<'_, V>) -> V { expr.expr_tree.eval_with(self) }
}
