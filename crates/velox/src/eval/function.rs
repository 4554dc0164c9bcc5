//! Function and object type declarations

use std::sync::Arc;

use crate::ast::{FunctionDecl, ObjectDecl, CONSTRUCTOR};
use crate::error::{InterpreterError, Result};
use crate::value::{Function, ItemState, ObjectType, ScriptFunction};
use crate::{Interpreter, Item};

/// Close `decl` over the current scope.
pub fn make_closure(decl: &Arc<FunctionDecl>, interp: &Interpreter) -> Item {
    let func = ScriptFunction::new(Arc::clone(decl), interp.current_scope().clone());
    interp.alloc(ItemState::Function(Function::Script(Arc::new(func))))
}

/// `function name(...) { ... }`: bind a closure in the current scope.
///
/// The closure captures the scope it is bound in, so a named function can
/// call itself recursively.
pub fn declare_function(decl: &Arc<FunctionDecl>, interp: &Interpreter) {
    let name = decl
        .name
        .clone()
        .unwrap_or_else(|| "<anonymous>".to_string());
    let closure = make_closure(decl, interp);
    interp.current_scope().define(name, closure);
}

/// `object Name { ... }`: register a script-defined object type.
///
/// Members close over the declaring scope. The `constructor` member, if
/// present, initializes new instances; the rest form the member table.
pub fn declare_object(decl: &ObjectDecl, line: u32, interp: &mut Interpreter) -> Result<()> {
    let mut ty = ObjectType::new(decl.name.clone());
    for member in &decl.members {
        let closure = make_closure(member, interp);
        match member.name.as_deref() {
            Some(CONSTRUCTOR) => ty = ty.with_constructor(closure),
            Some(name) => ty = ty.with_method(name, closure),
            None => {}
        }
    }
    interp
        .registry_mut()
        .add(ty)
        .map(|_| ())
        .map_err(|source| InterpreterError::Registration { source, line })
}
