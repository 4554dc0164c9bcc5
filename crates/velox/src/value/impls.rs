//! Item constructors, predicates, accessors, From traits, PartialEq

use std::sync::Arc;

use super::*;
use crate::error::type_name;

// ═══════════════════════════════════════════════════════════════════
// Convenience Constructors
// ═══════════════════════════════════════════════════════════════════

impl Item {
    /// Create an Undefined item
    pub fn undefined() -> Self {
        Item::new(ItemState::Undefined)
    }

    /// Create a Boolean item
    pub fn boolean(b: bool) -> Self {
        Item::new(ItemState::Boolean(b))
    }

    /// Create an Integer item
    pub fn integer(n: i64) -> Self {
        Item::new(ItemState::Integer(n))
    }

    /// Create a Real item
    pub fn real(n: f64) -> Self {
        Item::new(ItemState::Real(n))
    }

    /// Create a String item
    pub fn string(s: impl AsRef<str>) -> Self {
        Item::new(ItemState::String(Arc::from(s.as_ref())))
    }

    /// Create an Array item from element cells
    pub fn array(items: Vec<Item>) -> Self {
        Item::new(ItemState::Array(items))
    }

    /// Create a Function item
    pub fn function(f: Function) -> Self {
        Item::new(ItemState::Function(f))
    }

    /// Create a Function item wrapping a native function
    pub fn native(f: NativeFunction) -> Self {
        Item::function(Function::Native(Arc::new(f)))
    }

    /// Create an Object item
    pub fn object(instance: ObjectInstance) -> Self {
        Item::new(ItemState::Object(instance))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Type Predicates
    // ═══════════════════════════════════════════════════════════════════

    /// Check if the item is Undefined. Never fails.
    pub fn is_undefined(&self) -> bool {
        self.with_state(|s| matches!(s, ItemState::Undefined))
    }

    /// Check if the item is Integer or Real
    pub fn is_number(&self) -> bool {
        self.with_state(|s| matches!(s, ItemState::Integer(_) | ItemState::Real(_)))
    }

    /// Check if the item is callable
    pub fn is_function(&self) -> bool {
        self.with_state(|s| matches!(s, ItemState::Function(_)))
    }

    /// Check if the item is an object instance
    pub fn is_object(&self) -> bool {
        self.with_state(|s| matches!(s, ItemState::Object(_)))
    }

    /// Kind name of the current state
    pub fn type_name(&self) -> &'static str {
        self.with_state(type_name)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Accessors (fail with TypeMismatch on the wrong tag)
    // ═══════════════════════════════════════════════════════════════════

    /// Boolean payload
    pub fn get_boolean_value(&self) -> Result<bool> {
        self.with_state(|s| match s {
            ItemState::Boolean(b) => Ok(*b),
            other => Err(InterpreterError::type_mismatch("Boolean", other)),
        })
    }

    /// Integer payload. Reals are rejected rather than truncated.
    pub fn get_integer_value(&self) -> Result<i64> {
        self.with_state(|s| match s {
            ItemState::Integer(n) => Ok(*n),
            other => Err(InterpreterError::type_mismatch("Integer", other)),
        })
    }

    /// Real payload; Integers are promoted.
    pub fn get_real_value(&self) -> Result<f64> {
        self.with_state(|s| match s {
            ItemState::Real(n) => Ok(*n),
            ItemState::Integer(n) => Ok(*n as f64),
            other => Err(InterpreterError::type_mismatch("Real", other)),
        })
    }

    /// String payload
    pub fn get_string_value(&self) -> Result<Arc<str>> {
        self.with_state(|s| match s {
            ItemState::String(text) => Ok(Arc::clone(text)),
            other => Err(InterpreterError::type_mismatch("String", other)),
        })
    }

    /// Function payload
    pub fn get_function_value(&self) -> Result<Function> {
        self.with_state(|s| match s {
            ItemState::Function(f) => Ok(f.clone()),
            other => Err(InterpreterError::type_mismatch("Function", other)),
        })
    }

    /// Object payload
    pub fn get_object_value(&self) -> Result<ObjectInstance> {
        self.with_state(|s| match s {
            ItemState::Object(o) => Ok(o.clone()),
            other => Err(InterpreterError::type_mismatch("Object", other)),
        })
    }

    /// Element cells of an array (shared, not copied)
    pub fn get_array_value(&self) -> Result<Vec<Item>> {
        self.with_state(|s| match s {
            ItemState::Array(items) => Ok(items.clone()),
            other => Err(InterpreterError::type_mismatch("Array", other)),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════
// From Implementations
// ═══════════════════════════════════════════════════════════════════

impl From<bool> for Item {
    fn from(b: bool) -> Self {
        Item::boolean(b)
    }
}

impl From<i64> for Item {
    fn from(n: i64) -> Self {
        Item::integer(n)
    }
}

impl From<f64> for Item {
    fn from(n: f64) -> Self {
        Item::real(n)
    }
}

impl From<&str> for Item {
    fn from(s: &str) -> Self {
        Item::string(s)
    }
}

impl From<String> for Item {
    fn from(s: String) -> Self {
        Item::string(s)
    }
}

impl From<Vec<Item>> for Item {
    fn from(items: Vec<Item>) -> Self {
        Item::array(items)
    }
}

// ═══════════════════════════════════════════════════════════════════
// PartialEq Implementation
// ═══════════════════════════════════════════════════════════════════

/// Script-level equality of two states.
///
/// Numbers compare numerically across Integer/Real. Objects compare by
/// instance and functions by identity. Arrays are never equal by state;
/// two array items are equal only when they share a cell (see `Item::eq`).
pub fn states_equal(a: &ItemState, b: &ItemState) -> bool {
    match (a, b) {
        (ItemState::Undefined, ItemState::Undefined) => true,
        (ItemState::Boolean(x), ItemState::Boolean(y)) => x == y,
        (ItemState::Integer(x), ItemState::Integer(y)) => x == y,
        (ItemState::Real(x), ItemState::Real(y)) => x == y,
        (ItemState::Integer(x), ItemState::Real(y)) | (ItemState::Real(y), ItemState::Integer(x)) => {
            (*x as f64) == *y
        }
        (ItemState::String(x), ItemState::String(y)) => x == y,
        (ItemState::Function(x), ItemState::Function(y)) => x.ptr_eq(y),
        (ItemState::Object(x), ItemState::Object(y)) => x.same_instance(y),
        _ => false,
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.with_state(|a| other.with_state(|b| states_equal(a, b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_accessor_rejects_string() {
        let item = Item::string("5");
        let err = item.get_integer_value().unwrap_err();
        assert!(matches!(err, InterpreterError::TypeMismatch { .. }));
    }

    #[test]
    fn test_integer_accessor_rejects_real() {
        let item = Item::real(3.0);
        assert!(matches!(
            item.get_integer_value(),
            Err(InterpreterError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_real_accessor_promotes_integer() {
        assert_eq!(Item::integer(4).get_real_value().unwrap(), 4.0);
    }

    #[test]
    fn test_is_undefined_never_fails() {
        assert!(Item::undefined().is_undefined());
        assert!(!Item::integer(0).is_undefined());
        assert!(!Item::array(vec![]).is_undefined());
    }

    #[test]
    fn test_equality_mixed_numbers() {
        assert_eq!(Item::integer(2), Item::real(2.0));
        assert_ne!(Item::integer(2), Item::string("2"));
    }

    #[test]
    fn test_arrays_equal_only_by_identity() {
        let a = Item::array(vec![Item::integer(1)]);
        let b = Item::array(vec![Item::integer(1)]);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }
}
