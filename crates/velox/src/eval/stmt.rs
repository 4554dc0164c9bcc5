//! Statement execution

use crate::ast::{Stmt, StmtKind};
use crate::environment::ScopeKind;
use crate::error::Result;
use crate::value::ItemState;
use crate::Interpreter;

use super::{bindable, function, if_stmt, loops, Completion, Evaluate, Execute};

/// Execute statements in order in the current scope.
///
/// Stops at the first non-normal completion. A normal completion carries the
/// value of the last expression statement that produced one, which is what a
/// function body without `return` yields.
pub fn exec_stmts(stmts: &[Stmt], interp: &mut Interpreter) -> Result<Completion> {
    let mut last = None;
    for stmt in stmts {
        match stmt.exec(interp)? {
            Completion::Normal(Some(value)) => last = Some(value),
            Completion::Normal(None) => {}
            other => return Ok(other),
        }
    }
    Ok(Completion::Normal(last))
}

pub(super) fn exec_stmt(stmt: &Stmt, interp: &mut Interpreter) -> Result<Completion> {
    match &stmt.kind {
        StmtKind::Var { name, init } => {
            let value = match init {
                Some(expr) => bindable(expr.eval(interp)?),
                None => interp.alloc(ItemState::Undefined),
            };
            interp.current_scope().define(name.clone(), value);
            Ok(Completion::empty())
        }

        StmtKind::Expr(expr) => Ok(Completion::Normal(Some(expr.eval(interp)?))),

        StmtKind::Block(stmts) => {
            let mut guard = interp.scope_guard(ScopeKind::Block);
            exec_stmts(stmts, &mut guard)
        }

        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => if_stmt::exec_if(cond, then_branch, else_branch.as_deref(), interp),

        StmtKind::While { cond, body } => loops::exec_while(cond, body, interp),

        StmtKind::For {
            init,
            cond,
            step,
            body,
        } => loops::exec_for(init.as_deref(), cond.as_ref(), step.as_ref(), body, interp),

        StmtKind::Return(expr) => {
            let value = match expr {
                Some(expr) => expr.eval(interp)?,
                None => interp.alloc(ItemState::Undefined),
            };
            Ok(Completion::Return(value))
        }

        StmtKind::Break => Ok(Completion::Break { line: stmt.line }),

        StmtKind::Continue => Ok(Completion::Continue { line: stmt.line }),

        StmtKind::Function(decl) => {
            function::declare_function(decl, interp);
            Ok(Completion::empty())
        }

        StmtKind::Object(decl) => {
            function::declare_object(decl, stmt.line, interp)?;
            Ok(Completion::empty())
        }
    }
}
