//! Unary operator evaluation

use crate::ast::{Expr, UnaryOp};
use crate::error::{InterpreterError, Result};
use crate::value::ItemState;
use crate::{Interpreter, Item};

use super::Evaluate;

/// Evaluate `-x` or `!x`.
pub fn eval_unary(op: UnaryOp, operand: &Expr, interp: &mut Interpreter) -> Result<Item> {
    let value = operand.eval(interp)?;
    let state = value.with_state(|state| apply_unary(op, state))?;
    Ok(interp.alloc(state))
}

/// Apply a unary operator to a state.
///
/// # Errors
///
/// `TypeMismatch` when `-` is applied to a non-number or `!` to a
/// non-Boolean; `IntegerOverflow` for `-i64::MIN`.
pub fn apply_unary(op: UnaryOp, state: &ItemState) -> Result<ItemState> {
    match (op, state) {
        (UnaryOp::Neg, ItemState::Integer(n)) => n
            .checked_neg()
            .map(ItemState::Integer)
            .ok_or(InterpreterError::IntegerOverflow { line: 0 }),
        (UnaryOp::Neg, ItemState::Real(n)) => Ok(ItemState::Real(-n)),
        (UnaryOp::Neg, other) => Err(InterpreterError::type_mismatch("Number", other)),
        (UnaryOp::Not, ItemState::Boolean(b)) => Ok(ItemState::Boolean(!b)),
        (UnaryOp::Not, other) => Err(InterpreterError::type_mismatch("Boolean", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negation() {
        assert!(matches!(
            apply_unary(UnaryOp::Neg, &ItemState::Integer(5)),
            Ok(ItemState::Integer(-5))
        ));
        assert!(matches!(
            apply_unary(UnaryOp::Neg, &ItemState::Integer(i64::MIN)),
            Err(InterpreterError::IntegerOverflow { .. })
        ));
    }

    #[test]
    fn test_not_requires_boolean() {
        assert!(matches!(
            apply_unary(UnaryOp::Not, &ItemState::Boolean(true)),
            Ok(ItemState::Boolean(false))
        ));
        assert!(matches!(
            apply_unary(UnaryOp::Not, &ItemState::Integer(0)),
            Err(InterpreterError::TypeMismatch { .. })
        ));
    }
}
