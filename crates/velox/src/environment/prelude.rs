//! Standard library layer with built-in functions and constants

use super::Scope;
use crate::error::{InterpreterError, Result};
use crate::value::{Item, ItemState, NativeFunction, VARIADIC_ARGS};

/// Populate the standard layer. Every installed item is frozen.
pub(crate) fn install(scope: &Scope) {
    // Printing
    define(scope, NativeFunction::variadic("Print", &[], builtin_print));

    // Type inspection and conversion
    define(scope, NativeFunction::new("TypeOf", &["value"], builtin_type_of));
    define(scope, NativeFunction::new("Clone", &["value"], builtin_clone));
    define(scope, NativeFunction::new("ToString", &["value"], builtin_to_string));
    define(scope, NativeFunction::new("ToInteger", &["value"], builtin_to_integer));
    define(scope, NativeFunction::new("ToReal", &["value"], builtin_to_real));
    define(scope, NativeFunction::new("Length", &["value"], builtin_length));
    define(scope, NativeFunction::new("Array", &["size"], builtin_array));

    // Assertions
    define(scope, NativeFunction::new("Assert", &["condition"], builtin_assert));
    define(scope, NativeFunction::new("AssertEq", &["left", "right"], builtin_assert_eq));

    // Constants
    constant(scope, "PI", Item::real(std::f64::consts::PI));
    constant(scope, "E", Item::real(std::f64::consts::E));
}

fn define(scope: &Scope, func: NativeFunction) {
    let name = func.name.clone();
    constant(scope, &name, Item::native(func));
}

fn constant(scope: &Scope, name: &str, item: Item) {
    item.freeze();
    scope.define(name, item);
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Function Implementations
// ═══════════════════════════════════════════════════════════════════════

fn builtin_print(scope: &Scope, _line: u32) -> Result<Item> {
    let args = scope.resolve(VARIADIC_ARGS)?.get_array_value()?;
    let text = args
        .iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    println!("{}", text);
    Ok(Item::undefined())
}

fn builtin_type_of(scope: &Scope, _line: u32) -> Result<Item> {
    let value = scope.resolve("value")?;
    let name = value.with_state(|state| match state {
        ItemState::Object(obj) => obj.type_name().to_string(),
        other => crate::error::type_name(other).to_string(),
    });
    Ok(Item::string(name))
}

fn builtin_clone(scope: &Scope, _line: u32) -> Result<Item> {
    Ok(scope.resolve("value")?.duplicate())
}

fn builtin_to_string(scope: &Scope, _line: u32) -> Result<Item> {
    Ok(Item::string(scope.resolve("value")?.to_string()))
}

fn builtin_to_integer(scope: &Scope, _line: u32) -> Result<Item> {
    let value = scope.resolve("value")?;
    let n = value.with_state(|state| match state {
        ItemState::Integer(n) => Ok(*n),
        ItemState::Boolean(b) => Ok(i64::from(*b)),
        ItemState::Real(r) if r.is_finite() && r.abs() < i64::MAX as f64 => Ok(r.trunc() as i64),
        ItemState::Real(r) => Err(InterpreterError::native(
            "ToInteger",
            format!("{} cannot be represented as an Integer", r),
        )),
        ItemState::String(s) => s.trim().parse::<i64>().map_err(|_| {
            InterpreterError::native("ToInteger", format!("cannot parse `{}` as an Integer", s))
        }),
        other => Err(InterpreterError::type_mismatch("Number or String", other)),
    })?;
    Ok(Item::integer(n))
}

fn builtin_to_real(scope: &Scope, _line: u32) -> Result<Item> {
    let value = scope.resolve("value")?;
    let n = value.with_state(|state| match state {
        ItemState::Integer(n) => Ok(*n as f64),
        ItemState::Real(r) => Ok(*r),
        ItemState::String(s) => s.trim().parse::<f64>().map_err(|_| {
            InterpreterError::native("ToReal", format!("cannot parse `{}` as a Real", s))
        }),
        other => Err(InterpreterError::type_mismatch("Number or String", other)),
    })?;
    Ok(Item::real(n))
}

fn builtin_length(scope: &Scope, _line: u32) -> Result<Item> {
    let value = scope.resolve("value")?;
    let len = value.with_state(|state| match state {
        ItemState::String(s) => Ok(s.chars().count()),
        ItemState::Array(items) => Ok(items.len()),
        other => Err(InterpreterError::type_mismatch("String or Array", other)),
    })?;
    Ok(Item::integer(len as i64))
}

fn builtin_array(scope: &Scope, _line: u32) -> Result<Item> {
    let size = scope.resolve("size")?.get_integer_value()?;
    let size = usize::try_from(size)
        .map_err(|_| InterpreterError::native("Array", format!("negative size {}", size)))?;
    Ok(Item::array((0..size).map(|_| Item::undefined()).collect()))
}

fn builtin_assert(scope: &Scope, _line: u32) -> Result<Item> {
    if !scope.resolve("condition")?.get_boolean_value()? {
        return Err(InterpreterError::native("Assert", "assertion failed"));
    }
    Ok(Item::undefined())
}

fn builtin_assert_eq(scope: &Scope, _line: u32) -> Result<Item> {
    let left = scope.resolve("left")?;
    let right = scope.resolve("right")?;
    if left != right {
        return Err(InterpreterError::native(
            "AssertEq",
            format!("assertion failed: {:?} != {:?}", left, right),
        ));
    }
    Ok(Item::undefined())
}
