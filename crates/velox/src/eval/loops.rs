//! Loop execution (while, for)

use crate::ast::{Expr, Stmt};
use crate::environment::ScopeKind;
use crate::error::Result;
use crate::Interpreter;

use super::{eval_condition, Completion, Evaluate, Execute};

/// Outcome of one loop body run.
enum Flow {
    Next,
    Exit,
    Propagate(Completion),
}

fn body_flow(completion: Completion) -> Flow {
    match completion {
        Completion::Normal(_) | Completion::Continue { .. } => Flow::Next,
        Completion::Break { .. } => Flow::Exit,
        ret @ Completion::Return(_) => Flow::Propagate(ret),
    }
}

/// Execute `while (cond) body`.
pub fn exec_while(cond: &Expr, body: &Stmt, interp: &mut Interpreter) -> Result<Completion> {
    while eval_condition(cond, interp)? {
        match body_flow(body.exec(interp)?) {
            Flow::Next => {}
            Flow::Exit => break,
            Flow::Propagate(completion) => return Ok(completion),
        }
    }
    Ok(Completion::empty())
}

/// Execute `for (init; cond; step) body`.
///
/// `init` runs once in a scope of its own that lives for the whole loop. A
/// missing condition loops until `break`. `step` also runs after `continue`.
pub fn exec_for(
    init: Option<&Stmt>,
    cond: Option<&Expr>,
    step: Option<&Expr>,
    body: &Stmt,
    interp: &mut Interpreter,
) -> Result<Completion> {
    let mut guard = interp.scope_guard(ScopeKind::Block);
    let interp: &mut Interpreter = &mut guard;

    if let Some(init) = init {
        let completion = init.exec(interp)?;
        if !completion.is_normal() {
            return Ok(completion);
        }
    }

    loop {
        if let Some(cond) = cond {
            if !eval_condition(cond, interp)? {
                break;
            }
        }
        match body_flow(body.exec(interp)?) {
            Flow::Next => {}
            Flow::Exit => break,
            Flow::Propagate(completion) => return Ok(completion),
        }
        if let Some(step) = step {
            step.eval(interp)?;
        }
    }
    Ok(Completion::empty())
}
