//! Object type registry

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::RegistrationError;
use crate::value::ObjectType;

/// Position in the registry's history, used to discard types registered
/// after it (see [`ObjectTypeRegistry::rollback`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Maps type names to their templates for one interpreter session.
///
/// Registration order is preserved, which makes rolling back the types a
/// script declared a simple truncation.
#[derive(Debug, Default, Clone)]
pub struct ObjectTypeRegistry {
    types: IndexMap<String, Arc<ObjectType>>,
}

impl ObjectTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ty` under its own name.
    ///
    /// # Errors
    ///
    /// `DuplicateType` if the name is taken; the existing registration is
    /// left untouched.
    pub fn add(&mut self, ty: ObjectType) -> Result<Arc<ObjectType>, RegistrationError> {
        if self.types.contains_key(ty.name()) {
            return Err(RegistrationError::DuplicateType(ty.name().to_string()));
        }
        let ty = Arc::new(ty);
        self.types.insert(ty.name().to_string(), Arc::clone(&ty));
        Ok(ty)
    }

    /// Look up a type by name
    pub fn get(&self, name: &str) -> Option<Arc<ObjectType>> {
        self.types.get(name).cloned()
    }

    /// Whether a type with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no type is registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Mark the current registration state.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.types.len())
    }

    /// Unregister every type added since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.types.truncate(checkpoint.0);
    }

    /// Unregister everything.
    pub fn clear(&mut self) {
        self.types.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_keeps_first() {
        let mut registry = ObjectTypeRegistry::new();
        let first = registry
            .add(ObjectType::new("Image").with_method("Width", crate::Item::integer(1)))
            .unwrap();
        let err = registry.add(ObjectType::new("Image")).unwrap_err();
        assert_eq!(err, RegistrationError::DuplicateType("Image".to_string()));

        let kept = registry.get("Image").unwrap();
        assert!(Arc::ptr_eq(&first, &kept));
        assert!(kept.method("Width").is_some());
    }

    #[test]
    fn test_rollback_discards_later_types() {
        let mut registry = ObjectTypeRegistry::new();
        registry.add(ObjectType::new("Host")).unwrap();
        let mark = registry.checkpoint();
        registry.add(ObjectType::new("ScriptA")).unwrap();
        registry.add(ObjectType::new("ScriptB")).unwrap();

        registry.rollback(mark);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Host"]);
        assert!(!registry.contains("ScriptA"));
    }
}
