//! Assignment evaluation

use crate::ast::{BinaryOp, Expr, ExprKind};
use crate::error::{InterpreterError, Result};
use crate::{Interpreter, Item};

use super::binary::apply_binary;
use super::{bindable, Evaluate};

/// Evaluate `target = value` or `target op= value`.
///
/// Identifier and index targets are updated in place, so every alias of the
/// target cell observes the new state. A plain field assignment defines or
/// replaces the field slot. The expression yields the assigned cell.
///
/// # Errors
///
/// `UnresolvedIdentifier` when assigning to a name that was never declared;
/// `ReadOnly` when the target cell is frozen.
pub fn eval_assign(
    target: &Expr,
    op: Option<BinaryOp>,
    value: &Expr,
    interp: &mut Interpreter,
) -> Result<Item> {
    match &target.kind {
        ExprKind::Ident(name) => {
            let cell = interp
                .current_scope()
                .resolve(name)
                .map_err(|e| e.at(target.line))?;
            let new = compute(op, &cell, value, interp)?;
            store(&cell, &new, name)?;
            Ok(cell)
        }

        ExprKind::Member { object, name } => {
            let instance = object.eval(interp)?.get_object_value()?;
            match op {
                None => {
                    let new = bindable(value.eval(interp)?);
                    instance.set_field(name.clone(), new.clone());
                    Ok(new)
                }
                Some(_) => {
                    let cell = instance
                        .field(name)
                        .ok_or_else(|| InterpreterError::UnknownMember {
                            type_name: instance.type_name().to_string(),
                            member: name.clone(),
                            line: target.line,
                        })?;
                    let new = compute(op, &cell, value, interp)?;
                    store(&cell, &new, name)?;
                    Ok(cell)
                }
            }
        }

        ExprKind::Index { object, index } => {
            let container = object.eval(interp)?;
            let index = index.eval(interp)?.get_integer_value()?;
            let cell = container.element(index)?;
            let new = compute(op, &cell, value, interp)?;
            store(&cell, &new, "array element")?;
            Ok(cell)
        }

        _ => Err(InterpreterError::TypeMismatch {
            expected: "assignable expression".to_string(),
            found: "expression".to_string(),
            line: target.line,
        }),
    }
}

/// The value to store: the right-hand side, or `current op rhs`.
fn compute(op: Option<BinaryOp>, current: &Item, value: &Expr, interp: &mut Interpreter) -> Result<Item> {
    let rhs = value.eval(interp)?;
    match op {
        None => Ok(rhs),
        Some(op) => {
            let state = apply_binary(op, current, &rhs)?;
            Ok(interp.alloc(state))
        }
    }
}

fn store(cell: &Item, new: &Item, name: &str) -> Result<()> {
    cell.assign_from(new).map_err(|e| match e {
        InterpreterError::ReadOnly { line, .. } => InterpreterError::ReadOnly {
            name: name.to_string(),
            line,
        },
        other => other,
    })
}
