//! Object types and instances

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::{Item, NativeFunction};
use crate::environment::{Scope, ScopeKind};

/// A named template for object instances: a constructor plus a member
/// function table. Immutable once registered.
///
/// Uses IndexMap so member listings follow declaration order.
#[derive(Clone)]
pub struct ObjectType {
    name: String,
    constructor: Option<Item>,
    methods: IndexMap<String, Item>,
}

impl ObjectType {
    /// Create a type with no constructor and no members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructor: None,
            methods: IndexMap::new(),
        }
    }

    /// Set the constructor (builder pattern)
    pub fn with_constructor(mut self, constructor: Item) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Set a host-implemented constructor
    pub fn with_native_constructor(self, constructor: NativeFunction) -> Self {
        self.with_constructor(frozen(Item::native(constructor)))
    }

    /// Add a member function (builder pattern)
    pub fn with_method(mut self, name: impl Into<String>, method: Item) -> Self {
        self.methods.insert(name.into(), method);
        self
    }

    /// Add a host-implemented member function, keyed by its own name
    pub fn with_native_method(self, method: NativeFunction) -> Self {
        let name = method.name.clone();
        self.with_method(name, frozen(Item::native(method)))
    }

    /// The type's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The constructor, if any
    pub fn constructor(&self) -> Option<&Item> {
        self.constructor.as_ref()
    }

    /// Look up a member function
    pub fn method(&self, name: &str) -> Option<&Item> {
        self.methods.get(name)
    }

    /// Member function names in declaration order
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

fn frozen(item: Item) -> Item {
    item.freeze();
    item
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectType")
            .field("name", &self.name)
            .field("constructor", &self.constructor.is_some())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// An instance: its type plus a scope holding its fields.
///
/// Host state lives in the foreign slot of the item holding the instance,
/// never in the field scope.
#[derive(Clone)]
pub struct ObjectInstance {
    ty: Arc<ObjectType>,
    fields: Scope,
}

impl ObjectInstance {
    /// Create an instance with an empty field scope.
    pub fn new(ty: Arc<ObjectType>) -> Self {
        Self {
            ty,
            fields: Scope::new(ScopeKind::Fields),
        }
    }

    /// The instance's type
    pub fn object_type(&self) -> &Arc<ObjectType> {
        &self.ty
    }

    /// Name of the instance's type
    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    /// The field scope
    pub fn fields(&self) -> &Scope {
        &self.fields
    }

    /// Read a field cell
    pub fn field(&self, name: &str) -> Option<Item> {
        self.fields.lookup_local(name)
    }

    /// Define or replace a field slot
    pub fn set_field(&self, name: impl Into<String>, item: Item) {
        self.fields.define(name, item);
    }

    /// Whether both handles refer to the same instance.
    pub fn same_instance(&self, other: &ObjectInstance) -> bool {
        self.fields.ptr_eq(&other.fields)
    }
}

impl fmt::Debug for ObjectInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.ty.name())
    }
}
