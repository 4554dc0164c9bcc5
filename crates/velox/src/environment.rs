//! Scopes: chained name → Item environments
//!
//! A [`Scope`] is a shared handle. Closures keep their defining scope (and
//! through it the whole parent chain) alive after the block that created it
//! has finished.

mod guard;
pub(crate) mod prelude;

pub use guard::ScopeGuard;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::{InterpreterError, Result};
use crate::value::{Function, Item, ItemState};

/// What created a scope.
///
/// The global layers are distinguished from nested ones so the engine can
/// rebuild the extension layer and discard a script's layer independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Standard library constants and functions
    Standard,
    /// Host extensions, rebuilt before each execution
    Extensions,
    /// Globals of one script execution
    Script,
    /// Globals that persist across executions (REPL)
    Session,
    /// `{ ... }` block or loop
    Block,
    /// Function call arguments
    Call,
    /// Fields of an object instance
    Fields,
}

impl ScopeKind {
    /// Whether this is one of the module-level layers.
    pub fn is_global(self) -> bool {
        matches!(
            self,
            ScopeKind::Standard | ScopeKind::Extensions | ScopeKind::Script | ScopeKind::Session
        )
    }
}

struct ScopeData {
    kind: ScopeKind,
    bindings: RwLock<IndexMap<String, Item>>,
    parent: Option<Scope>,
}

/// Insertion-ordered mapping from identifier to Item with an optional parent.
///
/// # Example
///
/// ```
/// use velox::{Item, Scope, ScopeKind};
///
/// let global = Scope::new(ScopeKind::Script);
/// global.define("x", Item::integer(1));
///
/// let block = Scope::child(ScopeKind::Block, &global);
/// block.define("y", Item::integer(2));
///
/// assert_eq!(block.resolve("x").unwrap().get_integer_value().unwrap(), 1);
/// assert!(global.resolve("y").is_err());
/// ```
#[derive(Clone)]
pub struct Scope(Arc<ScopeData>);

impl Scope {
    /// Create a root scope.
    pub fn new(kind: ScopeKind) -> Self {
        Scope(Arc::new(ScopeData {
            kind,
            bindings: RwLock::new(IndexMap::new()),
            parent: None,
        }))
    }

    /// Create a scope whose lookups fall back to `parent`.
    pub fn child(kind: ScopeKind, parent: &Scope) -> Self {
        Scope(Arc::new(ScopeData {
            kind,
            bindings: RwLock::new(IndexMap::new()),
            parent: Some(parent.clone()),
        }))
    }

    /// What created this scope
    pub fn kind(&self) -> ScopeKind {
        self.0.kind
    }

    /// Enclosing scope, if any
    pub fn parent(&self) -> Option<&Scope> {
        self.0.parent.as_ref()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Binding Definition
    // ═══════════════════════════════════════════════════════════════════

    /// Bind `name` in this scope only, replacing an existing local slot.
    ///
    /// The slot receives the Item handle itself, so the binding aliases it.
    pub fn define(&self, name: impl Into<String>, item: Item) {
        self.0.bindings.write().insert(name.into(), item);
    }

    /// Remove a local binding.
    pub fn remove(&self, name: &str) -> Option<Item> {
        self.0.bindings.write().shift_remove(name)
    }

    /// Drop every local binding.
    ///
    /// Used when a script ends to release closures that captured the
    /// script's own scope.
    pub fn clear(&self) {
        let drained: Vec<Item> = {
            let mut bindings = self.0.bindings.write();
            bindings.drain(..).map(|(_, item)| item).collect()
        };
        // Items are dropped outside the lock; their drops may touch other scopes.
        drop(drained);
    }

    /// Clear this scope when the only other handles to it come from
    /// functions bound in it that capture it.
    ///
    /// A named function declared in a block or call closes over the scope
    /// it is bound in. Once that scope is left, the pair only keeps itself
    /// alive. Functions that escaped (their cell or body is shared) and
    /// nested scopes still pointing here keep the scope intact.
    pub(crate) fn release_if_self_held(&self) {
        let self_held = {
            let bindings = self.0.bindings.read();
            bindings
                .values()
                .filter(|item| item.ref_count() == 1 && self.is_closure_of(item))
                .count()
        };
        // One handle is the caller's own.
        if self.ref_count() == 1 + self_held && self_held > 0 {
            self.clear();
        }
    }

    fn is_closure_of(&self, item: &Item) -> bool {
        item.with_state(|state| match state {
            ItemState::Function(Function::Script(func)) => {
                Arc::strong_count(func) == 1 && func.closure.ptr_eq(self)
            }
            _ => false,
        })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Lookup
    // ═══════════════════════════════════════════════════════════════════

    /// Resolve `name` through the chain.
    ///
    /// # Errors
    ///
    /// `UnresolvedIdentifier` if no scope in the chain binds it.
    pub fn resolve(&self, name: &str) -> Result<Item> {
        self.lookup(name)
            .ok_or_else(|| InterpreterError::UnresolvedIdentifier {
                name: name.to_string(),
                line: 0,
            })
    }

    /// Look `name` up through the chain.
    pub fn lookup(&self, name: &str) -> Option<Item> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(item) = current.lookup_local(name) {
                return Some(item);
            }
            scope = current.parent();
        }
        None
    }

    /// Look `name` up in this scope only.
    pub fn lookup_local(&self, name: &str) -> Option<Item> {
        self.0.bindings.read().get(name).cloned()
    }

    /// Whether `name` is bound anywhere in the chain
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Whether `name` is bound in this scope
    pub fn contains_local(&self, name: &str) -> bool {
        self.0.bindings.read().contains_key(name)
    }

    /// Local names in definition order
    pub fn names(&self) -> Vec<String> {
        self.0.bindings.read().keys().cloned().collect()
    }

    /// Number of local bindings
    pub fn len(&self) -> usize {
        self.0.bindings.read().len()
    }

    /// Whether there are no local bindings
    pub fn is_empty(&self) -> bool {
        self.0.bindings.read().is_empty()
    }

    /// Number of scopes in the chain, this one included.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut scope = self.parent();
        while let Some(current) = scope {
            depth += 1;
            scope = current.parent();
        }
        depth
    }

    /// Whether both handles refer to the same scope
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Whether `ancestor` is this scope or one of its parents
    pub fn descends_from(&self, ancestor: &Scope) -> bool {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if current.ptr_eq(ancestor) {
                return true;
            }
            scope = current.parent();
        }
        false
    }

    /// Number of handles sharing this scope
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("kind", &self.0.kind)
            .field("names", &self.names())
            .field("depth", &self.depth())
            .finish()
    }
}
