//! Callable values: script functions and native functions

use std::fmt;
use std::sync::Arc;

use super::Item;
use crate::ast::FunctionDecl;
use crate::environment::Scope;
use crate::error::{InterpreterError, Result};

/// Host callable: receives the call scope (arguments bound by name) and the
/// line of the call site.
pub type NativeFnPtr = Arc<dyn Fn(&Scope, u32) -> Result<Item> + Send + Sync>;

/// Name under which a variadic native receives its surplus arguments.
pub const VARIADIC_ARGS: &str = "args";

/// A callable value. Both variants are invoked through the same protocol.
#[derive(Clone)]
pub enum Function {
    /// Defined by a script; closes over its defining scope
    Script(Arc<ScriptFunction>),

    /// Implemented by the host
    Native(Arc<NativeFunction>),
}

impl Function {
    /// Function name (for display/debugging)
    pub fn name(&self) -> &str {
        match self {
            Function::Script(f) => &f.name,
            Function::Native(f) => &f.name,
        }
    }

    /// Formal parameter names in positional order
    pub fn params(&self) -> &[String] {
        match self {
            Function::Script(f) => &f.decl.params,
            Function::Native(f) => &f.params,
        }
    }

    /// Number of formal parameters
    pub fn num_formal_parameters(&self) -> usize {
        self.params().len()
    }

    /// Whether surplus arguments are accepted
    pub fn is_variadic(&self) -> bool {
        matches!(self, Function::Native(f) if f.variadic)
    }

    /// Check the actual argument count against the formal parameters.
    ///
    /// # Errors
    ///
    /// Returns `Arity` when too few, or (for non-variadic callables) too many
    /// arguments are supplied.
    pub fn check_arity(&self, got: usize) -> Result<()> {
        let want = self.num_formal_parameters();
        let ok = if self.is_variadic() {
            got >= want
        } else {
            got == want
        };
        if ok {
            return Ok(());
        }
        let expected = if self.is_variadic() {
            format!("at least {}", want)
        } else {
            want.to_string()
        };
        Err(InterpreterError::Arity {
            name: self.name().to_string(),
            expected,
            got,
            line: 0,
        })
    }

    /// Whether both values are the same function.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        match (self, other) {
            (Function::Script(a), Function::Script(b)) => Arc::ptr_eq(a, b),
            (Function::Native(a), Function::Native(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Script(s) => write!(f, "ScriptFunction({})", s.name),
            Function::Native(n) => write!(f, "NativeFunction({})", n.name),
        }
    }
}

/// A function defined by a script.
///
/// Holding the function keeps its defining scope chain alive.
pub struct ScriptFunction {
    /// Function name (`<anonymous>` for function expressions)
    pub name: String,

    /// Parameters and body
    pub decl: Arc<FunctionDecl>,

    /// Captured defining scope
    pub closure: Scope,
}

impl ScriptFunction {
    /// Close `decl` over `closure`.
    pub fn new(decl: Arc<FunctionDecl>, closure: Scope) -> Self {
        Self {
            name: decl
                .name
                .clone()
                .unwrap_or_else(|| "<anonymous>".to_string()),
            decl,
            closure,
        }
    }
}

/// A host-implemented function.
///
/// One representation covers every arity: fixed natives list their
/// parameter names, variadic ones additionally receive surplus arguments as
/// an Array bound to [`VARIADIC_ARGS`].
#[derive(Clone)]
pub struct NativeFunction {
    /// Function name as seen by scripts
    pub name: String,

    /// Formal parameter names
    pub params: Vec<String>,

    /// Accept surplus arguments
    pub variadic: bool,

    /// The host callable
    pub func: NativeFnPtr,
}

impl NativeFunction {
    /// Create a fixed-arity native.
    pub fn new<F>(name: impl Into<String>, params: &[&str], func: F) -> Self
    where
        F: Fn(&Scope, u32) -> Result<Item> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: params.iter().map(|p| p.to_string()).collect(),
            variadic: false,
            func: Arc::new(func),
        }
    }

    /// Create a native taking `params` followed by any number of arguments.
    pub fn variadic<F>(name: impl Into<String>, params: &[&str], func: F) -> Self
    where
        F: Fn(&Scope, u32) -> Result<Item> + Send + Sync + 'static,
    {
        Self {
            variadic: true,
            ..Self::new(name, params, func)
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({}/{})", self.name, self.params.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str, params: &[&str]) -> Function {
        Function::Native(Arc::new(NativeFunction::new(name, params, |_, _| {
            Ok(Item::undefined())
        })))
    }

    #[test]
    fn test_fixed_arity() {
        let f = noop("pair", &["a", "b"]);
        assert_eq!(f.num_formal_parameters(), 2);
        assert!(f.check_arity(2).is_ok());
        assert!(matches!(
            f.check_arity(1),
            Err(InterpreterError::Arity { got: 1, .. })
        ));
        assert!(f.check_arity(3).is_err());
    }

    #[test]
    fn test_variadic_arity() {
        let f = Function::Native(Arc::new(NativeFunction::variadic(
            "log",
            &["level"],
            |_, _| Ok(Item::undefined()),
        )));
        assert!(f.is_variadic());
        assert!(f.check_arity(1).is_ok());
        assert!(f.check_arity(4).is_ok());
        let err = f.check_arity(0).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_identity() {
        let a = noop("a", &[]);
        let b = noop("a", &[]);
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
    }
}
