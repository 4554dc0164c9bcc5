//! Identifier evaluation

use crate::error::Result;
use crate::{Interpreter, Item};

/// Resolve `name` through the scope chain, returning the bound cell itself.
pub fn eval_ident(name: &str, interp: &Interpreter) -> Result<Item> {
    interp.current_scope().resolve(name)
}
