//! The execution engine
//!
//! An [`Interpreter`] owns the global layers, the scope stack, the object
//! type registry and the memory tracker. Scripts run inside one extra layer
//! pushed above two persistent ones:
//!
//! ```text
//! standard  ←  extensions  ←  script (per execution)  ←  blocks / calls
//! ```
//!
//! so nothing a script defines at top level can leak into, or corrupt, the
//! layers below it.

use std::sync::Arc;

use crate::ast::Program;
use crate::context::EvalContext;
use crate::environment::{prelude, Scope, ScopeKind};
use crate::error::{InterpreterError, RegistrationError, Result};
use crate::eval::{self, Completion};
use crate::memory::{CountingTracker, MemoryStats, NullTracker, TrackerHandle};
use crate::registry::{Checkpoint, ObjectTypeRegistry};
use crate::value::{Function, Item, ItemState, NativeFunction, ObjectInstance, ObjectType};

/// Tree-walking evaluator for [`Program`]s.
///
/// # Example
///
/// ```
/// use velox::{Frontend, Interpreter, TextSource, VeloxFrontend};
///
/// let program = VeloxFrontend::new()
///     .parse(&TextSource::new("demo", "var x = 20; x + 22;"))
///     .unwrap();
///
/// let mut interp = Interpreter::new();
/// let result = interp.execute(&program).unwrap();
/// assert_eq!(result.get_integer_value().unwrap(), 42);
/// ```
pub struct Interpreter {
    context: EvalContext,
    standard: Scope,
    extensions: Scope,
    stack: Vec<Scope>,
    registry: ObjectTypeRegistry,
    tracker: TrackerHandle,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Create an interpreter with the standard library and default settings.
    pub fn new() -> Self {
        Self::with_context(EvalContext::default())
    }

    /// Create an interpreter with custom settings.
    pub fn with_context(context: EvalContext) -> Self {
        let tracker: TrackerHandle = if context.track_memory {
            Arc::new(CountingTracker::new())
        } else {
            Arc::new(NullTracker)
        };
        let standard = Scope::new(ScopeKind::Standard);
        prelude::install(&standard);
        let extensions = Scope::child(ScopeKind::Extensions, &standard);
        Self {
            context,
            standard,
            extensions,
            stack: Vec::new(),
            registry: ObjectTypeRegistry::new(),
            tracker,
            call_depth: 0,
        }
    }

    /// Settings this interpreter runs with
    pub fn context(&self) -> &EvalContext {
        &self.context
    }

    // ═══════════════════════════════════════════════════════════════════
    // Registration (host side)
    // ═══════════════════════════════════════════════════════════════════

    /// Expose a native function to scripts through the extension layer.
    ///
    /// # Errors
    ///
    /// `DuplicateFunction` if the extension layer already binds the name.
    pub fn add_global_function(&mut self, func: NativeFunction) -> std::result::Result<(), RegistrationError> {
        if self.extensions.contains_local(&func.name) {
            return Err(RegistrationError::DuplicateFunction(func.name));
        }
        let name = func.name.clone();
        let item = Item::native(func);
        item.freeze();
        self.extensions.define(name, item);
        Ok(())
    }

    /// Expose a constant to scripts through the extension layer.
    ///
    /// The item is frozen; an existing constant of the same name is replaced.
    pub fn add_global_constant(&mut self, name: impl Into<String>, item: Item) {
        item.freeze();
        self.extensions.define(name, item);
    }

    /// Register an object type for this session.
    ///
    /// # Errors
    ///
    /// `DuplicateType` if the name is taken; the first registration stays
    /// intact and usable.
    pub fn add_object_type(&mut self, ty: ObjectType) -> std::result::Result<Arc<ObjectType>, RegistrationError> {
        self.registry.add(ty)
    }

    /// Look up a registered object type
    pub fn object_type(&self, name: &str) -> Option<Arc<ObjectType>> {
        self.registry.get(name)
    }

    /// The object type registry
    pub fn registry(&self) -> &ObjectTypeRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ObjectTypeRegistry {
        &mut self.registry
    }

    /// Drop the extension layer and every registered object type.
    ///
    /// Hosts call this before re-injecting extensions so each execution
    /// starts from a freshly built layer.
    pub fn reset_extensions(&mut self) {
        self.extensions = Scope::child(ScopeKind::Extensions, &self.standard);
        self.registry.clear();
    }

    /// The standard library layer
    pub fn standard_scope(&self) -> &Scope {
        &self.standard
    }

    /// The extension layer
    pub fn extensions_scope(&self) -> &Scope {
        &self.extensions
    }

    // ═══════════════════════════════════════════════════════════════════
    // Scope Stack
    // ═══════════════════════════════════════════════════════════════════

    /// The innermost scope; the extension layer when nothing is pushed.
    pub fn current_scope(&self) -> &Scope {
        self.stack.last().unwrap_or(&self.extensions)
    }

    /// Push a child of the current scope and return it.
    pub fn push_scope(&mut self, kind: ScopeKind) -> Scope {
        let scope = Scope::child(kind, self.current_scope());
        self.stack.push(scope.clone());
        scope
    }

    pub(crate) fn push_existing(&mut self, scope: Scope) {
        self.stack.push(scope);
    }

    /// Pop the innermost pushed scope. The global layers are never popped.
    ///
    /// A popped block or call scope that only its own functions still refer
    /// to is cleared, so those closures are freed with it.
    pub fn pop_scope(&mut self) -> Option<Scope> {
        let scope = self.stack.pop()?;
        if matches!(scope.kind(), ScopeKind::Block | ScopeKind::Call) {
            scope.release_if_self_held();
        }
        Some(scope)
    }

    /// Number of pushed scopes
    pub fn scope_depth(&self) -> usize {
        self.stack.len()
    }

    /// A scope for globals that persist across [`Interpreter::execute_in`]
    /// calls, layered over the current extension layer.
    pub fn new_session_scope(&self) -> Scope {
        Scope::child(ScopeKind::Session, &self.extensions)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Call Depth Tracking (Stack Overflow Protection)
    // ═══════════════════════════════════════════════════════════════════

    /// Enter a function call. Returns error if max depth exceeded.
    pub(crate) fn enter_call(&mut self) -> Result<()> {
        if self.call_depth >= self.context.max_call_depth {
            return Err(InterpreterError::StackOverflow {
                depth: self.call_depth,
                max: self.context.max_call_depth,
                line: 0,
            });
        }
        self.call_depth += 1;
        Ok(())
    }

    /// Exit a function call.
    pub(crate) fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    /// Current call depth
    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    // ═══════════════════════════════════════════════════════════════════
    // Memory
    // ═══════════════════════════════════════════════════════════════════

    /// Allocate an item reported to this interpreter's tracker.
    pub fn alloc(&self, state: ItemState) -> Item {
        Item::tracked(state, &self.tracker)
    }

    /// Report a host-built item to this interpreter's tracker.
    pub(crate) fn adopt(&self, item: Item) -> Item {
        item.adopt(&self.tracker);
        item
    }

    /// The tracker items are reported to
    pub fn tracker(&self) -> &TrackerHandle {
        &self.tracker
    }

    /// Current tracker counters
    pub fn memory_stats(&self) -> MemoryStats {
        self.tracker.stats()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Execution
    // ═══════════════════════════════════════════════════════════════════

    /// Run `program` in a fresh script layer.
    ///
    /// Returns the value of the last expression statement (or of a top-level
    /// `return`), Undefined when there is none. Globals and object types the
    /// script defines are discarded afterwards, on success and on failure.
    pub fn execute(&mut self, program: &Program) -> Result<Item> {
        let script = Scope::child(ScopeKind::Script, &self.extensions);
        let checkpoint = self.registry.checkpoint();
        let result = self.execute_in(program, &script);
        // Closures defined at top level capture `script` itself.
        script.clear();
        self.registry.rollback(checkpoint);
        result
    }

    /// Run `program` with `scope` as its global layer.
    ///
    /// Bindings and object types persist in `scope` and the registry, which
    /// is what an interactive session wants.
    pub fn execute_in(&mut self, program: &Program, scope: &Scope) -> Result<Item> {
        let completion = {
            let mut guard = self.enter_scope(scope.clone());
            eval::exec_stmts(&program.stmts, &mut guard)?
        };
        match completion {
            Completion::Normal(value) => Ok(value.unwrap_or_else(|| self.alloc(ItemState::Undefined))),
            Completion::Return(value) => Ok(value),
            Completion::Break { line } => Err(InterpreterError::BreakOutsideLoop { line }),
            Completion::Continue { line } => Err(InterpreterError::ContinueOutsideLoop { line }),
        }
    }

    /// Restore a consistent state after a run unwound by a panic.
    ///
    /// Drops any scopes still pushed, resets the call depth and discards
    /// object types registered after `checkpoint`.
    pub(crate) fn recover(&mut self, checkpoint: Checkpoint) {
        self.stack.clear();
        self.call_depth = 0;
        self.registry.rollback(checkpoint);
    }

    /// Call a callable item from host code.
    ///
    /// # Errors
    ///
    /// `NotCallable` if `callee` is not a function, plus anything the call
    /// itself raises.
    pub fn call_function(&mut self, callee: &Item, args: Vec<Item>) -> Result<Item> {
        let func = callee.with_state(|state| match state {
            ItemState::Function(f) => Ok(f.clone()),
            other => Err(InterpreterError::NotCallable {
                found: crate::error::type_name(other).to_string(),
                line: 0,
            }),
        })?;
        eval::call::invoke(self, &func, None, args, 0)
    }

    /// Instantiate a registered object type, running its constructor.
    ///
    /// # Errors
    ///
    /// `UnknownType` if `name` is not registered, plus anything the
    /// constructor raises.
    pub fn create_object(&mut self, name: &str, args: Vec<Item>) -> Result<Item> {
        self.create_object_at(name, args, 0)
    }

    pub(crate) fn create_object_at(&mut self, name: &str, args: Vec<Item>, line: u32) -> Result<Item> {
        let ty = self
            .registry
            .get(name)
            .ok_or_else(|| InterpreterError::UnknownType {
                name: name.to_string(),
                line,
            })?;
        let instance = self.alloc(ItemState::Object(ObjectInstance::new(Arc::clone(&ty))));
        match ty.constructor() {
            Some(ctor) => {
                let ctor: Function = ctor.get_function_value()?;
                eval::call::invoke(self, &ctor, Some(&instance), args, line)?;
            }
            None if !args.is_empty() => {
                return Err(InterpreterError::Arity {
                    name: ty.name().to_string(),
                    expected: "0".to_string(),
                    got: args.len(),
                    line,
                });
            }
            None => {}
        }
        Ok(instance)
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("context", &self.context)
            .field("extensions", &self.extensions.names())
            .field("types", &self.registry.names().collect::<Vec<_>>())
            .field("scope_depth", &self.stack.len())
            .field("call_depth", &self.call_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_global_function() {
        let mut interp = Interpreter::new();
        let f = || NativeFunction::new("Ping", &[], |_, _| Ok(Item::undefined()));
        interp.add_global_function(f()).unwrap();
        assert_eq!(
            interp.add_global_function(f()),
            Err(RegistrationError::DuplicateFunction("Ping".to_string()))
        );
    }

    #[test]
    fn test_standard_functions_visible_through_extensions() {
        let interp = Interpreter::new();
        assert!(interp.current_scope().contains("Print"));
        assert!(interp.current_scope().contains("PI"));
        assert!(interp.extensions_scope().is_empty());
    }

    #[test]
    fn test_reset_extensions_clears_layer_and_types() {
        let mut interp = Interpreter::new();
        interp.add_global_constant("Answer", Item::integer(42));
        interp.add_object_type(ObjectType::new("Thing")).unwrap();

        interp.reset_extensions();
        assert!(!interp.current_scope().contains("Answer"));
        assert!(interp.object_type("Thing").is_none());
        assert!(interp.current_scope().contains("Print"));
    }

    #[test]
    fn test_create_unknown_type() {
        let mut interp = Interpreter::new();
        let err = interp.create_object("Nope", vec![]).unwrap_err();
        assert!(matches!(err, InterpreterError::UnknownType { .. }));
    }

    #[test]
    fn test_create_object_without_constructor_rejects_args() {
        let mut interp = Interpreter::new();
        interp.add_object_type(ObjectType::new("Bare")).unwrap();
        assert!(interp.create_object("Bare", vec![]).unwrap().is_object());
        assert!(matches!(
            interp.create_object("Bare", vec![Item::integer(1)]),
            Err(InterpreterError::Arity { .. })
        ));
    }

    #[test]
    fn test_stack_overflow_guard() {
        let mut interp = Interpreter::with_context(EvalContext::with_max_call_depth(2));
        interp.enter_call().unwrap();
        interp.enter_call().unwrap();
        assert!(matches!(
            interp.enter_call(),
            Err(InterpreterError::StackOverflow { depth: 2, max: 2, .. })
        ));
        interp.exit_call();
        interp.exit_call();
        assert_eq!(interp.call_depth(), 0);
    }
}
