//! Field access evaluation

use crate::ast::Expr;
use crate::error::{InterpreterError, Result};
use crate::value::ItemState;
use crate::{Interpreter, Item};

use super::Evaluate;

/// Evaluate `object.name`.
///
/// Returns the field cell itself, so two reads of the same field alias each
/// other. Member functions can be read as values as well.
pub fn eval_member(object: &Expr, name: &str, interp: &mut Interpreter) -> Result<Item> {
    let receiver = object.eval(interp)?;
    receiver.with_state(|state| match state {
        ItemState::Object(obj) => obj
            .field(name)
            .or_else(|| obj.object_type().method(name).cloned())
            .ok_or_else(|| InterpreterError::UnknownMember {
                type_name: obj.type_name().to_string(),
                member: name.to_string(),
                line: 0,
            }),
        other => Err(InterpreterError::UnknownMember {
            type_name: crate::error::type_name(other).to_string(),
            member: name.to_string(),
            line: 0,
        }),
    })
}
