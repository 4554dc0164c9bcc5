//! Completion signal for return/break/continue

use crate::Item;

/// How a statement finished.
///
/// Errors travel on the `Err` side of `Result`; a `Completion` only ever
/// describes control flow.
#[derive(Debug, Clone)]
pub enum Completion {
    /// Fell through. Carries the value of an expression statement.
    Normal(Option<Item>),

    /// Unwind to the nearest call boundary with a value.
    Return(Item),

    /// Leave the nearest enclosing loop.
    Break {
        /// Line of the `break`, for the error raised if no loop catches it
        line: u32,
    },

    /// Start the next iteration of the nearest enclosing loop.
    Continue {
        /// Line of the `continue`
        line: u32,
    },
}

impl Completion {
    /// A fall-through completion with no value.
    pub fn empty() -> Self {
        Completion::Normal(None)
    }

    /// Whether execution should carry on with the next statement.
    pub fn is_normal(&self) -> bool {
        matches!(self, Completion::Normal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_normal_falls_through() {
        assert!(Completion::empty().is_normal());
        assert!(Completion::Normal(Some(Item::integer(1))).is_normal());
        assert!(!Completion::Return(Item::undefined()).is_normal());
        assert!(!Completion::Break { line: 1 }.is_normal());
        assert!(!Completion::Continue { line: 1 }.is_normal());
    }
}
