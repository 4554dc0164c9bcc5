//! Literal and array literal evaluation

use std::sync::Arc;

use crate::ast::{Expr, Literal};
use crate::error::Result;
use crate::value::ItemState;
use crate::{Interpreter, Item};

use super::{bindable, Evaluate};

/// Evaluate a literal to a fresh cell.
///
/// Each evaluation allocates, so `var x = 0;` inside a loop body binds a new
/// cell on every iteration.
pub fn eval_literal(lit: &Literal, interp: &Interpreter) -> Item {
    let state = match lit {
        Literal::Undefined => ItemState::Undefined,
        Literal::Boolean(b) => ItemState::Boolean(*b),
        Literal::Integer(n) => ItemState::Integer(*n),
        Literal::Real(n) => ItemState::Real(*n),
        Literal::String(s) => ItemState::String(Arc::clone(s)),
    };
    interp.alloc(state)
}

/// Evaluate `[a, b, c]`. Elements are stored by reference, not copied.
pub fn eval_array(elements: &[Expr], interp: &mut Interpreter) -> Result<Item> {
    let items = elements
        .iter()
        .map(|element| element.eval(interp).map(bindable))
        .collect::<Result<Vec<_>>>()?;
    Ok(interp.alloc(ItemState::Array(items)))
}
