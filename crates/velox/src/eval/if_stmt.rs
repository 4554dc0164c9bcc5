//! If statement execution

use crate::ast::{Expr, Stmt};
use crate::error::Result;
use crate::Interpreter;

use super::{eval_condition, Completion, Execute};

/// Execute `if (cond) then else other`.
///
/// The condition must be Boolean; there is no truthiness.
pub fn exec_if(
    cond: &Expr,
    then_branch: &Stmt,
    else_branch: Option<&Stmt>,
    interp: &mut Interpreter,
) -> Result<Completion> {
    if eval_condition(cond, interp)? {
        then_branch.exec(interp)
    } else if let Some(else_branch) = else_branch {
        else_branch.exec(interp)
    } else {
        Ok(Completion::empty())
    }
}
