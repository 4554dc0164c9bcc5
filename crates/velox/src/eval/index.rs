//! Index expression evaluation

use crate::ast::Expr;
use crate::error::{InterpreterError, Result};
use crate::value::ItemState;
use crate::{Interpreter, Item};

use super::Evaluate;

/// Evaluate `object[index]`.
///
/// Array indexing yields the element cell (shared with the array). String
/// indexing yields a fresh one-character string.
pub fn eval_index(object: &Expr, index: &Expr, interp: &mut Interpreter) -> Result<Item> {
    let container = object.eval(interp)?;
    let index = index.eval(interp)?.get_integer_value()?;

    let text = container.with_state(|state| match state {
        ItemState::String(s) => Some(s.clone()),
        _ => None,
    });
    match text {
        Some(text) => {
            let ch = usize::try_from(index)
                .ok()
                .and_then(|i| text.chars().nth(i))
                .ok_or(InterpreterError::IndexOutOfBounds {
                    index,
                    len: text.chars().count(),
                    line: 0,
                })?;
            Ok(interp.alloc(ItemState::String(ch.to_string().into())))
        }
        None => container.element(index),
    }
}
