//! Extension mechanism
//!
//! An [`Extension`] is a host module that injects native functions and
//! object types into an interpreter. The [`ExtensionManager`] keeps the
//! catalogue, enforces unique names and replays every injection, in
//! registration order, whenever an interpreter is (re)built.

mod logging;

pub use logging::{LogLevel, LogRecord, LogRecorder, LoggingExtension};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::context::EvalContext;
use crate::error::RegistrationError;
use crate::Interpreter;

/// A host module exposing functions and object types to scripts.
///
/// `inject` is expected to call [`Interpreter::add_global_function`],
/// [`Interpreter::add_global_constant`] and [`Interpreter::add_object_type`]
/// any number of times. It runs only while no script is executing.
pub trait Extension: Send + Sync {
    /// Unique extension name
    fn name(&self) -> &str;

    /// Register this extension's bindings into `interp`.
    fn inject(&self, interp: &mut Interpreter) -> Result<(), RegistrationError>;
}

/// Catalogue of registered extensions.
///
/// Registration may happen from any thread; injection order follows
/// registration order.
#[derive(Default)]
pub struct ExtensionManager {
    extensions: DashMap<String, (u64, Arc<dyn Extension>)>,
    next_seq: AtomicU64,
}

impl ExtensionManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extension to the catalogue.
    ///
    /// # Errors
    ///
    /// `DuplicateExtension` if an extension with the same name exists.
    pub fn register<E: Extension + 'static>(&self, extension: E) -> Result<(), RegistrationError> {
        self.register_arc(Arc::new(extension))
    }

    /// Add a shared extension to the catalogue.
    pub fn register_arc(&self, extension: Arc<dyn Extension>) -> Result<(), RegistrationError> {
        let name = extension.name().to_string();
        match self.extensions.entry(name.clone()) {
            Entry::Occupied(_) => Err(RegistrationError::DuplicateExtension(name)),
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert((seq, extension));
                debug!(target: "velox", extension = %name, "extension registered");
                Ok(())
            }
        }
    }

    /// Remove an extension from the catalogue.
    pub fn unregister(&self, name: &str) -> bool {
        self.extensions.remove(name).is_some()
    }

    /// Whether an extension with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.extensions.contains_key(name)
    }

    /// Number of registered extensions
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Whether no extension is registered
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Extension names in registration order
    pub fn names(&self) -> Vec<String> {
        self.ordered()
            .iter()
            .map(|ext| ext.name().to_string())
            .collect()
    }

    fn ordered(&self) -> Vec<Arc<dyn Extension>> {
        let mut entries: Vec<(u64, Arc<dyn Extension>)> = self
            .extensions
            .iter()
            .map(|entry| {
                let (seq, ext) = entry.value();
                (*seq, Arc::clone(ext))
            })
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, ext)| ext).collect()
    }

    /// Inject every registered extension into `interp`.
    ///
    /// # Errors
    ///
    /// Stops at the first extension whose injection fails.
    pub fn inject_all(&self, interp: &mut Interpreter) -> Result<(), RegistrationError> {
        for ext in self.ordered() {
            ext.inject(interp)?;
            debug!(target: "velox", extension = ext.name(), "extension injected");
        }
        Ok(())
    }

    /// Build a fresh interpreter with every extension injected.
    pub fn build_interpreter(&self, context: EvalContext) -> Result<Interpreter, RegistrationError> {
        let mut interp = Interpreter::with_context(context);
        self.inject_all(&mut interp)?;
        Ok(interp)
    }
}

impl fmt::Debug for ExtensionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionManager")
            .field("extensions", &self.names())
            .finish()
    }
}
