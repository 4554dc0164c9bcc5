//! Statement execution and expression evaluation

pub mod assign;
pub mod binary;
pub mod call;
pub mod control;
pub mod field;
pub mod function;
pub mod ident;
pub mod if_stmt;
pub mod index;
pub mod literal;
pub mod loops;
pub mod stmt;
pub mod unary;

use crate::ast::{Expr, ExprKind, Stmt};
use crate::error::Result;
use crate::{Interpreter, Item};

pub use control::Completion;
pub use stmt::exec_stmts;

/// Trait for evaluating expression nodes to items.
///
/// This is the core abstraction for the tree-walking interpreter.
pub trait Evaluate {
    /// Evaluate this node against the interpreter's current scope.
    fn eval(&self, interp: &mut Interpreter) -> Result<Item>;
}

/// Trait for executing statement nodes.
///
/// Statements produce a [`Completion`] so `return`, `break` and `continue`
/// travel separately from errors.
pub trait Execute {
    /// Execute this node against the interpreter's current scope.
    fn exec(&self, interp: &mut Interpreter) -> Result<Completion>;
}

// ═══════════════════════════════════════════════════════════════════════
// Main Expression Dispatcher
// ═══════════════════════════════════════════════════════════════════════

impl Evaluate for Expr {
    fn eval(&self, interp: &mut Interpreter) -> Result<Item> {
        let line = self.line;
        let result = match &self.kind {
            ExprKind::Literal(lit) => Ok(literal::eval_literal(lit, interp)),
            ExprKind::Ident(name) => ident::eval_ident(name, interp),
            ExprKind::Array(elements) => literal::eval_array(elements, interp),
            ExprKind::Function(decl) => Ok(function::make_closure(decl, interp)),
            ExprKind::Unary { op, operand } => unary::eval_unary(*op, operand, interp),
            ExprKind::Binary { op, left, right } => binary::eval_binary(*op, left, right, interp),
            ExprKind::Logical { op, left, right } => binary::eval_logical(*op, left, right, interp),
            ExprKind::Assign { target, op, value } => assign::eval_assign(target, *op, value, interp),
            ExprKind::Call { callee, args } => call::eval_call(callee, args, line, interp),
            ExprKind::Member { object, name } => field::eval_member(object, name, interp),
            ExprKind::MethodCall {
                object,
                method,
                args,
            } => call::eval_method_call(object, method, args, line, interp),
            ExprKind::Index { object, index } => index::eval_index(object, index, interp),
        };
        result.map_err(|e| e.at(line))
    }
}

impl Execute for Stmt {
    fn exec(&self, interp: &mut Interpreter) -> Result<Completion> {
        stmt::exec_stmt(self, interp).map_err(|e| e.at(self.line))
    }
}

/// Evaluate arguments left to right in the caller's scope.
pub(crate) fn eval_args(args: &[Expr], interp: &mut Interpreter) -> Result<Vec<Item>> {
    args.iter().map(|arg| arg.eval(interp)).collect()
}

/// Evaluate a condition, which must be Boolean.
pub(crate) fn eval_condition(cond: &Expr, interp: &mut Interpreter) -> Result<bool> {
    cond.eval(interp)?
        .get_boolean_value()
        .map_err(|e| e.at(cond.line))
}

/// Item to store in a script slot.
///
/// Frozen cells (standard library, extensions) are copied so a script slot
/// never aliases them.
pub(crate) fn bindable(item: Item) -> Item {
    if item.is_frozen() {
        item.duplicate()
    } else {
        item
    }
}
