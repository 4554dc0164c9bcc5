//! Function call evaluation

use tracing::trace;

use crate::ast::{Expr, ExprKind};
use crate::environment::{Scope, ScopeKind};
use crate::error::{type_name, InterpreterError, Result};
use crate::value::{Function, ItemState, NativeFunction, ScriptFunction, VARIADIC_ARGS};
use crate::{Interpreter, Item};

use super::{bindable, eval_args, exec_stmts, Completion, Evaluate};

/// Evaluate `callee(args)`.
///
/// An identifier that is unbound in scope but names a registered object type
/// instantiates that type instead.
pub fn eval_call(callee: &Expr, args: &[Expr], line: u32, interp: &mut Interpreter) -> Result<Item> {
    if let ExprKind::Ident(name) = &callee.kind {
        if !interp.current_scope().contains(name) && interp.registry().contains(name) {
            let args = eval_args(args, interp)?;
            return interp.create_object_at(name, args, line);
        }
    }

    let target = callee.eval(interp)?;
    let func = callable(&target)?;
    let args = eval_args(args, interp)?;
    invoke(interp, &func, None, args, line)
}

/// Evaluate `object.method(args)`.
pub fn eval_method_call(
    object: &Expr,
    method: &str,
    args: &[Expr],
    line: u32,
    interp: &mut Interpreter,
) -> Result<Item> {
    let receiver = object.eval(interp)?;
    let args = eval_args(args, interp)?;
    call_method(interp, &receiver, method, args, line)
}

/// Call `method` on `receiver`.
///
/// Objects resolve the name against their type's member table, then against
/// fields holding functions. Arrays and strings have built-in members.
pub fn call_method(
    interp: &mut Interpreter,
    receiver: &Item,
    method: &str,
    args: Vec<Item>,
    line: u32,
) -> Result<Item> {
    let object = receiver.with_state(|state| match state {
        ItemState::Object(obj) => Some(obj.clone()),
        _ => None,
    });

    match object {
        Some(obj) => {
            let member = obj
                .object_type()
                .method(method)
                .cloned()
                .or_else(|| obj.field(method));
            match member {
                Some(member) => {
                    let func = callable(&member)?;
                    invoke(interp, &func, Some(receiver), args, line)
                }
                None => Err(InterpreterError::UnknownMember {
                    type_name: obj.type_name().to_string(),
                    member: method.to_string(),
                    line,
                }),
            }
        }
        None => builtin_method(interp, receiver, method, args, line),
    }
}

/// Extract the function from a callable item.
pub fn callable(item: &Item) -> Result<Function> {
    item.with_state(|state| match state {
        ItemState::Function(f) => Ok(f.clone()),
        other => Err(InterpreterError::NotCallable {
            found: type_name(other).to_string(),
            line: 0,
        }),
    })
}

// ═══════════════════════════════════════════════════════════════════════
// Call Protocol
// ═══════════════════════════════════════════════════════════════════════

/// Invoke `func` with already-evaluated arguments.
///
/// Checks arity, tracks call depth, binds `this` (for members and
/// constructors) and the arguments into a fresh call scope, runs the body and
/// yields its value.
///
/// # Errors
///
/// `Arity` on an argument count mismatch, `StackOverflow` past the configured
/// depth, plus anything the body raises.
pub fn invoke(
    interp: &mut Interpreter,
    func: &Function,
    this: Option<&Item>,
    args: Vec<Item>,
    line: u32,
) -> Result<Item> {
    func.check_arity(args.len()).map_err(|e| e.at(line))?;
    interp.enter_call().map_err(|e| e.at(line))?;

    if interp.context().trace {
        trace!(
            target: "velox",
            function = func.name(),
            depth = interp.call_depth(),
            line,
            "call"
        );
    }

    let result = match func {
        Function::Script(f) => call_script(interp, f, this, args),
        Function::Native(f) => call_native(interp, f, this, args, line),
    };

    interp.exit_call();
    result.map_err(|e| e.at(line))
}

/// Call a script function: the call scope is chained to the closure.
fn call_script(
    interp: &mut Interpreter,
    func: &ScriptFunction,
    this: Option<&Item>,
    args: Vec<Item>,
) -> Result<Item> {
    let scope = Scope::child(ScopeKind::Call, &func.closure);
    if let Some(this) = this {
        scope.define("this", this.clone());
    }
    for (param, arg) in func.decl.params.iter().zip(args) {
        scope.define(param.clone(), bindable(arg));
    }

    let completion = {
        let mut guard = interp.enter_scope(scope);
        exec_stmts(&func.decl.body, &mut guard)?
    };

    match completion {
        Completion::Normal(value) => Ok(value.unwrap_or_else(|| interp.alloc(ItemState::Undefined))),
        Completion::Return(value) => Ok(value),
        Completion::Break { line } => Err(InterpreterError::BreakOutsideLoop { line }),
        Completion::Continue { line } => Err(InterpreterError::ContinueOutsideLoop { line }),
    }
}

/// Call a native function: the call scope is chained to the caller's scope.
///
/// `this` is always bound locally, to Undefined for plain calls.
fn call_native(
    interp: &mut Interpreter,
    func: &NativeFunction,
    this: Option<&Item>,
    args: Vec<Item>,
    line: u32,
) -> Result<Item> {
    let scope = Scope::child(ScopeKind::Call, interp.current_scope());
    // Shadow any `this` of an enclosing method call.
    let this = match this {
        Some(this) => this.clone(),
        None => interp.alloc(ItemState::Undefined),
    };
    scope.define("this", this);

    let mut args = args.into_iter();
    for param in &func.params {
        if let Some(arg) = args.next() {
            scope.define(param.clone(), arg);
        }
    }
    if func.variadic {
        let rest: Vec<Item> = args.collect();
        scope.define(VARIADIC_ARGS, interp.alloc(ItemState::Array(rest)));
    }

    let result = {
        let _guard = interp.enter_scope(scope.clone());
        (func.func)(&scope, line)
    }?;
    Ok(interp.adopt(result))
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Members (Array, String)
// ═══════════════════════════════════════════════════════════════════════

fn builtin_method(
    interp: &mut Interpreter,
    receiver: &Item,
    method: &str,
    args: Vec<Item>,
    line: u32,
) -> Result<Item> {
    let kind = receiver.type_name();
    let unknown = || InterpreterError::UnknownMember {
        type_name: kind.to_string(),
        member: method.to_string(),
        line,
    };

    match kind {
        "Array" => match method {
            "Length" => {
                expect_args(kind, method, &args, 0)?;
                let len = receiver.get_array_value()?.len();
                Ok(interp.alloc(ItemState::Integer(len as i64)))
            }
            "Push" => {
                expect_args(kind, method, &args, 1)?;
                for arg in args {
                    receiver.push_element(bindable(arg))?;
                }
                Ok(interp.alloc(ItemState::Undefined))
            }
            "Pop" => {
                expect_args(kind, method, &args, 0)?;
                Ok(receiver
                    .pop_element()?
                    .unwrap_or_else(|| interp.alloc(ItemState::Undefined)))
            }
            "Get" => {
                expect_args(kind, method, &args, 1)?;
                receiver.element(args[0].get_integer_value()?)
            }
            _ => Err(unknown()),
        },
        "String" => {
            let text = receiver.get_string_value()?;
            match method {
                "Length" => {
                    expect_args(kind, method, &args, 0)?;
                    Ok(interp.alloc(ItemState::Integer(text.chars().count() as i64)))
                }
                "ToUpper" => {
                    expect_args(kind, method, &args, 0)?;
                    Ok(interp.alloc(ItemState::String(text.to_uppercase().into())))
                }
                "ToLower" => {
                    expect_args(kind, method, &args, 0)?;
                    Ok(interp.alloc(ItemState::String(text.to_lowercase().into())))
                }
                "Contains" => {
                    expect_args(kind, method, &args, 1)?;
                    let needle = args[0].get_string_value()?;
                    Ok(interp.alloc(ItemState::Boolean(text.contains(&*needle))))
                }
                _ => Err(unknown()),
            }
        }
        _ => Err(unknown()),
    }
}

fn expect_args(kind: &str, method: &str, args: &[Item], count: usize) -> Result<()> {
    if args.len() == count {
        return Ok(());
    }
    Err(InterpreterError::Arity {
        name: format!("{}.{}", kind, method),
        expected: count.to_string(),
        got: args.len(),
        line: 0,
    })
}
