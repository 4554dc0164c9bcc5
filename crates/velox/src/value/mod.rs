//! Runtime value model
//!
//! An [`Item`] is a shared, mutable cell. Cloning an `Item` shares the cell:
//! every scope slot, array element and object field holding the same `Item`
//! observes assignments made through any of them. [`Item::duplicate`] is the
//! only way to obtain an independent copy.

mod callable;
mod display;
mod impls;
mod object;

pub use callable::{Function, NativeFnPtr, NativeFunction, ScriptFunction, VARIADIC_ARGS};
pub use object::{ObjectInstance, ObjectType};

use std::any::Any;
use std::mem;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{InterpreterError, Result};
use crate::memory::TrackerHandle;

/// Opaque host payload attached to an item (e.g. a native image buffer).
///
/// Hosts store their own interior-mutable type (typically behind a `Mutex`)
/// and recover it with [`Item::foreign`].
pub type ForeignData = Arc<dyn Any + Send + Sync>;

/// The tagged state held by an item cell.
#[derive(Clone, Debug)]
pub enum ItemState {
    /// No value
    Undefined,

    /// `true` / `false`
    Boolean(bool),

    /// 64-bit signed integer
    Integer(i64),

    /// 64-bit float
    Real(f64),

    /// Immutable text (replaced, never edited in place)
    String(Arc<str>),

    /// Script or native callable
    Function(Function),

    /// Instance of a registered object type
    Object(ObjectInstance),

    /// Element cells, shared by reference
    Array(Vec<Item>),
}

/// A reference-counted runtime value cell.
///
/// `Clone` shares the cell; see the module docs for the aliasing rules.
#[derive(Clone)]
pub struct Item(Arc<RwLock<ItemCell>>);

pub(crate) struct ItemCell {
    state: ItemState,
    foreign: Option<ForeignData>,
    frozen: bool,
    tracker: Option<TrackerHandle>,
    bytes: usize,
}

impl Drop for ItemCell {
    fn drop(&mut self) {
        if let Some(tracker) = &self.tracker {
            tracker.on_free(self.bytes);
        }
    }
}

/// Estimated footprint of a cell in `state`.
fn footprint(state: &ItemState) -> usize {
    let payload = match state {
        ItemState::String(s) => s.len(),
        ItemState::Array(items) => items.len() * mem::size_of::<Item>(),
        _ => 0,
    };
    mem::size_of::<ItemCell>() + payload
}

impl Item {
    /// Create an untracked cell.
    pub fn new(state: ItemState) -> Self {
        Item(Arc::new(RwLock::new(ItemCell {
            bytes: footprint(&state),
            state,
            foreign: None,
            frozen: false,
            tracker: None,
        })))
    }

    /// Create a cell whose lifetime is reported to `tracker`.
    pub fn tracked(state: ItemState, tracker: &TrackerHandle) -> Self {
        let item = Item::new(state);
        item.adopt(tracker);
        item
    }

    /// Attach `tracker` to an untracked cell (e.g. one built by a native).
    ///
    /// Cells that already report to a tracker are left alone.
    pub fn adopt(&self, tracker: &TrackerHandle) {
        let mut cell = self.0.write();
        if cell.tracker.is_none() {
            tracker.on_alloc(cell.bytes);
            cell.tracker = Some(Arc::clone(tracker));
        }
    }

    /// Clone of the current state.
    pub fn state(&self) -> ItemState {
        self.0.read().state.clone()
    }

    /// Run `f` against the current state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&ItemState) -> R) -> R {
        f(&self.0.read_recursive().state)
    }

    /// Replace the state in place. Every holder of this cell sees the change.
    ///
    /// # Errors
    ///
    /// Returns `ReadOnly` if the cell is frozen.
    pub fn set(&self, state: ItemState) -> Result<()> {
        let mut cell = self.0.write();
        if cell.frozen {
            return Err(InterpreterError::ReadOnly {
                name: "frozen item".to_string(),
                line: 0,
            });
        }
        let bytes = footprint(&state);
        if let Some(tracker) = &cell.tracker {
            tracker.on_resize(cell.bytes, bytes);
        }
        cell.bytes = bytes;
        cell.state = state;
        Ok(())
    }

    /// Copy the state and foreign payload of `source` into this cell.
    ///
    /// This is what script assignment does. `source` may be this very cell.
    pub fn assign_from(&self, source: &Item) -> Result<()> {
        if self.ptr_eq(source) {
            return if self.is_frozen() {
                Err(InterpreterError::ReadOnly {
                    name: "frozen item".to_string(),
                    line: 0,
                })
            } else {
                Ok(())
            };
        }
        let (state, foreign) = {
            let cell = source.0.read();
            (cell.state.clone(), cell.foreign.clone())
        };
        self.set(state)?;
        self.0.write().foreign = foreign;
        Ok(())
    }

    /// Produce an independent cell with the same state and payload.
    ///
    /// The copy is shallow: array elements and object fields stay shared.
    /// The copy reports to the same tracker and is never frozen.
    pub fn duplicate(&self) -> Item {
        let cell = self.0.read();
        let copy = Item::new(cell.state.clone());
        copy.0.write().foreign = cell.foreign.clone();
        if let Some(tracker) = &cell.tracker {
            copy.adopt(tracker);
        }
        copy
    }

    /// Make the cell immutable for scripts.
    pub fn freeze(&self) {
        self.0.write().frozen = true;
    }

    /// Whether [`Item::freeze`] was called.
    pub fn is_frozen(&self) -> bool {
        self.0.read().frozen
    }

    /// Whether both handles share one cell.
    pub fn ptr_eq(&self, other: &Item) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Number of handles sharing this cell.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Address of the shared cell, stable for its lifetime.
    pub(crate) fn cell_id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    // ═══════════════════════════════════════════════════════════════════
    // Foreign Payload
    // ═══════════════════════════════════════════════════════════════════

    /// Attach a host payload, replacing any previous one.
    pub fn set_foreign<T: Any + Send + Sync>(&self, data: T) {
        self.0.write().foreign = Some(Arc::new(data));
    }

    /// Recover the host payload if it is a `T`.
    pub fn foreign<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let data = self.0.read().foreign.clone()?;
        data.downcast::<T>().ok()
    }

    /// Whether a host payload is attached.
    pub fn has_foreign(&self) -> bool {
        self.0.read().foreign.is_some()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Array Elements
    // ═══════════════════════════════════════════════════════════════════

    /// The element cell at `index`, shared with the array.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if this is not an array, `IndexOutOfBounds` for a bad index.
    pub fn element(&self, index: i64) -> Result<Item> {
        self.with_state(|state| match state {
            ItemState::Array(items) => usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or(InterpreterError::IndexOutOfBounds {
                    index,
                    len: items.len(),
                    line: 0,
                }),
            other => Err(InterpreterError::type_mismatch("Array", other)),
        })
    }

    /// Append an element cell to an array.
    pub fn push_element(&self, element: Item) -> Result<()> {
        let mut cell = self.0.write();
        if cell.frozen {
            return Err(InterpreterError::ReadOnly {
                name: "frozen array".to_string(),
                line: 0,
            });
        }
        match &mut cell.state {
            ItemState::Array(items) => items.push(element),
            other => return Err(InterpreterError::type_mismatch("Array", other)),
        }
        let bytes = footprint(&cell.state);
        if let Some(tracker) = &cell.tracker {
            tracker.on_resize(cell.bytes, bytes);
        }
        cell.bytes = bytes;
        Ok(())
    }

    /// Remove and return the last element cell of an array.
    pub fn pop_element(&self) -> Result<Option<Item>> {
        let mut cell = self.0.write();
        if cell.frozen {
            return Err(InterpreterError::ReadOnly {
                name: "frozen array".to_string(),
                line: 0,
            });
        }
        let popped = match &mut cell.state {
            ItemState::Array(items) => items.pop(),
            other => return Err(InterpreterError::type_mismatch("Array", other)),
        };
        let bytes = footprint(&cell.state);
        if let Some(tracker) = &cell.tracker {
            tracker.on_resize(cell.bytes, bytes);
        }
        cell.bytes = bytes;
        Ok(popped)
    }
}

impl Default for Item {
    fn default() -> Self {
        Item::undefined()
    }
}
