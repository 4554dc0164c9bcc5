//! Display and Debug implementations for Item

use std::fmt;

use super::{Item, ItemState};
use crate::error::type_name;

/// Nested arrays deeper than this print as `[...]`.
const MAX_DISPLAY_DEPTH: usize = 32;

/// Elements written per top-level item before the rest is elided.
const MAX_DISPLAY_ELEMENTS: usize = 10_000;

/// Writes one item, tracking the arrays it is inside of.
///
/// An array reached again while it is still being written prints as
/// `[...]` rather than being entered, and the element budget bounds the
/// work for arrays that share elements many times over.
struct Printer {
    open: Vec<usize>,
    remaining: usize,
}

impl Printer {
    fn new() -> Self {
        Printer {
            open: Vec::new(),
            remaining: MAX_DISPLAY_ELEMENTS,
        }
    }

    fn item(&mut self, f: &mut fmt::Formatter<'_>, item: &Item) -> fmt::Result {
        let id = item.cell_id();
        if self.open.contains(&id) {
            return write!(f, "[...]");
        }
        item.with_state(|s| self.state(f, s, id))
    }

    fn state(&mut self, f: &mut fmt::Formatter<'_>, state: &ItemState, id: usize) -> fmt::Result {
        match state {
            ItemState::Undefined => write!(f, "undefined"),
            ItemState::Boolean(b) => write!(f, "{}", b),
            ItemState::Integer(n) => write!(f, "{}", n),
            ItemState::Real(n) => write_real(f, *n),
            ItemState::String(s) => write!(f, "{}", s),
            ItemState::Function(func) => write!(f, "<function {}>", func.name()),
            ItemState::Object(obj) => write!(f, "<{}>", obj.type_name()),
            ItemState::Array(items) => {
                if self.open.len() >= MAX_DISPLAY_DEPTH {
                    return write!(f, "[...]");
                }
                self.open.push(id);
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if self.remaining == 0 {
                        write!(f, "...")?;
                        break;
                    }
                    self.remaining -= 1;
                    self.item(f, item)?;
                }
                self.open.pop();
                write!(f, "]")
            }
        }
    }
}

/// Reals always show a fractional part so `2.0` never reads as an Integer.
fn write_real(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
        write!(f, "{:.1}", n)
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer::new().item(f, self)
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_state(|s| match s {
            ItemState::String(text) => write!(f, "String({:?})", text),
            other => {
                write!(f, "{}(", type_name(other))?;
                Printer::new().state(f, other, self.cell_id())?;
                write!(f, ")")
            }
        })
    }
}
