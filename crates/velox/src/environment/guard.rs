//! RAII scope guard for automatic scope-stack cleanup

use super::{Scope, ScopeKind};
use crate::Interpreter;

/// RAII guard that pops the interpreter's scope stack when dropped.
///
/// Errors propagated with `?` unwind through the guard, so a failing block or
/// call never leaves its scope on the stack.
///
/// # Example
///
/// ```
/// use velox::{Interpreter, Item, ScopeKind};
///
/// let mut interp = Interpreter::new();
/// let depth = interp.scope_depth();
///
/// {
///     let guard = interp.scope_guard(ScopeKind::Block);
///     guard.current_scope().define("y", Item::integer(2));
///     assert!(guard.current_scope().contains("y"));
/// }
/// // guard dropped, scope popped, y is gone
/// assert_eq!(interp.scope_depth(), depth);
/// assert!(!interp.current_scope().contains("y"));
/// ```
pub struct ScopeGuard<'a> {
    interp: &'a mut Interpreter,
}

impl Interpreter {
    /// Push a child of the current scope now and pop it on drop.
    pub fn scope_guard(&mut self, kind: ScopeKind) -> ScopeGuard<'_> {
        self.push_scope(kind);
        ScopeGuard { interp: self }
    }

    /// Make `scope` current now and pop it on drop.
    ///
    /// `scope` need not descend from the current scope; function calls enter
    /// a scope chained to the callee's closure instead.
    pub fn enter_scope(&mut self, scope: Scope) -> ScopeGuard<'_> {
        self.push_existing(scope);
        ScopeGuard { interp: self }
    }
}

impl<'a> Drop for ScopeGuard<'a> {
    fn drop(&mut self) {
        self.interp.pop_scope();
    }
}

impl<'a> std::ops::Deref for ScopeGuard<'a> {
    type Target = Interpreter;

    fn deref(&self) -> &Self::Target {
        self.interp
    }
}

impl<'a> std::ops::DerefMut for ScopeGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Item;

    #[test]
    fn test_scope_guard_drops_scope() {
        let mut interp = Interpreter::new();
        let initial = interp.scope_depth();
        {
            let guard = interp.scope_guard(ScopeKind::Block);
            assert_eq!(guard.scope_depth(), initial + 1);
        }
        assert_eq!(interp.scope_depth(), initial);
    }

    #[test]
    fn test_nested_guards_isolate_bindings() {
        let mut interp = Interpreter::new();
        let mut outer = interp.scope_guard(ScopeKind::Block);
        outer.current_scope().define("a", Item::integer(1));
        {
            let inner = outer.scope_guard(ScopeKind::Block);
            inner.current_scope().define("b", Item::integer(2));
            assert!(inner.current_scope().contains("a"));
            assert!(inner.current_scope().contains("b"));
        }
        assert!(outer.current_scope().contains("a"));
        assert!(!outer.current_scope().contains("b"));
    }

    #[test]
    fn test_enter_scope_uses_given_chain() {
        let mut interp = Interpreter::new();
        let detached = Scope::new(ScopeKind::Call);
        detached.define("only_here", Item::boolean(true));
        {
            let guard = interp.enter_scope(detached.clone());
            assert!(guard.current_scope().ptr_eq(&detached));
        }
        assert!(!interp.current_scope().contains("only_here"));
    }
}
