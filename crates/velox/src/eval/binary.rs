//! Binary and logical operator evaluation

use std::cmp::Ordering;

use crate::ast::{BinaryOp, Expr, LogicalOp};
use crate::error::{type_name, InterpreterError, Result};
use crate::value::ItemState;
use crate::{Interpreter, Item};

use super::{eval_condition, Evaluate};

/// Evaluate a binary expression. Both operands are always evaluated, left
/// first.
pub fn eval_binary(op: BinaryOp, left: &Expr, right: &Expr, interp: &mut Interpreter) -> Result<Item> {
    let left = left.eval(interp)?;
    let right = right.eval(interp)?;
    let state = apply_binary(op, &left, &right)?;
    Ok(interp.alloc(state))
}

/// Evaluate `&&` / `||` with short-circuiting. Both operands must be Boolean.
pub fn eval_logical(op: LogicalOp, left: &Expr, right: &Expr, interp: &mut Interpreter) -> Result<Item> {
    let lhs = eval_condition(left, interp)?;
    let value = match op {
        LogicalOp::And => lhs && eval_condition(right, interp)?,
        LogicalOp::Or => lhs || eval_condition(right, interp)?,
    };
    Ok(interp.alloc(ItemState::Boolean(value)))
}

/// Apply a binary operator to two items, producing the result state.
pub fn apply_binary(op: BinaryOp, left: &Item, right: &Item) -> Result<ItemState> {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            eval_arithmetic(op, left, right)
        }
        BinaryOp::Eq => Ok(ItemState::Boolean(left == right)),
        BinaryOp::Ne => Ok(ItemState::Boolean(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(op, left, right)?;
            let result = match op {
                BinaryOp::Lt => matches!(ordering, Some(Ordering::Less)),
                BinaryOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                BinaryOp::Gt => matches!(ordering, Some(Ordering::Greater)),
                _ => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            };
            Ok(ItemState::Boolean(result))
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Arithmetic
// ═══════════════════════════════════════════════════════════════════════

fn eval_arithmetic(op: BinaryOp, left: &Item, right: &Item) -> Result<ItemState> {
    let is_string = |item: &Item| item.with_state(|s| matches!(s, ItemState::String(_)));
    if op == BinaryOp::Add && (is_string(left) || is_string(right)) {
        return Ok(ItemState::String(format!("{}{}", left, right).into()));
    }

    left.with_state(|a| {
        right.with_state(|b| match (a, b) {
            (ItemState::Integer(x), ItemState::Integer(y)) => integer_arithmetic(op, *x, *y),
            (ItemState::Integer(_) | ItemState::Real(_), ItemState::Integer(_) | ItemState::Real(_)) => {
                Ok(ItemState::Real(real_arithmetic(op, as_real(a), as_real(b))))
            }
            _ => Err(invalid_operands(op, a, b)),
        })
    })
}

fn integer_arithmetic(op: BinaryOp, x: i64, y: i64) -> Result<ItemState> {
    if y == 0 && matches!(op, BinaryOp::Div | BinaryOp::Rem) {
        return Err(InterpreterError::DivisionByZero { line: 0 });
    }
    let result = match op {
        BinaryOp::Add => x.checked_add(y),
        BinaryOp::Sub => x.checked_sub(y),
        BinaryOp::Mul => x.checked_mul(y),
        BinaryOp::Div => x.checked_div(y),
        BinaryOp::Rem => x.checked_rem(y),
        _ => unreachable!("integer_arithmetic called with comparison operator"),
    };
    result
        .map(ItemState::Integer)
        .ok_or(InterpreterError::IntegerOverflow { line: 0 })
}

fn real_arithmetic(op: BinaryOp, x: f64, y: f64) -> f64 {
    match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => x / y,
        BinaryOp::Rem => x % y,
        _ => unreachable!("real_arithmetic called with comparison operator"),
    }
}

fn as_real(state: &ItemState) -> f64 {
    match state {
        ItemState::Integer(n) => *n as f64,
        ItemState::Real(n) => *n,
        _ => f64::NAN,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Ordering
// ═══════════════════════════════════════════════════════════════════════

/// Position of a kind in the cross-kind total order.
fn kind_rank(state: &ItemState) -> u8 {
    match state {
        ItemState::Undefined => 0,
        ItemState::Boolean(_) => 1,
        ItemState::Integer(_) | ItemState::Real(_) => 2,
        ItemState::String(_) => 3,
        ItemState::Array(_) => 4,
        ItemState::Object(_) => 5,
        ItemState::Function(_) => 6,
    }
}

/// Order two items. `None` means unordered (a NaN was involved).
///
/// Different kinds order by kind. Within a kind, Booleans, numbers and
/// strings order by value; Arrays, Objects and Functions are not orderable.
pub fn compare(op: BinaryOp, left: &Item, right: &Item) -> Result<Option<Ordering>> {
    left.with_state(|a| {
        right.with_state(|b| {
            let (ra, rb) = (kind_rank(a), kind_rank(b));
            if ra != rb {
                return Ok(Some(ra.cmp(&rb)));
            }
            match (a, b) {
                (ItemState::Undefined, ItemState::Undefined) => Ok(Some(Ordering::Equal)),
                (ItemState::Boolean(x), ItemState::Boolean(y)) => Ok(Some(x.cmp(y))),
                (ItemState::Integer(x), ItemState::Integer(y)) => Ok(Some(x.cmp(y))),
                (ItemState::String(x), ItemState::String(y)) => Ok(Some(x.cmp(y))),
                _ if ra == 2 => Ok(as_real(a).partial_cmp(&as_real(b))),
                _ => Err(invalid_operands(op, a, b)),
            }
        })
    })
}

fn invalid_operands(op: BinaryOp, left: &ItemState, right: &ItemState) -> InterpreterError {
    InterpreterError::InvalidOperands {
        op: op.symbol().to_string(),
        left: type_name(left).to_string(),
        right: type_name(right).to_string(),
        line: 0,
    }
}
