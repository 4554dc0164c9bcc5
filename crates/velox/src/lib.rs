//! # Velox
//!
//! An embeddable, dynamically-typed scripting language runtime.
//!
//! Velox evaluates a syntax tree directly. Hosts expose native functions,
//! constants and object types through extensions, then run scripts either
//! synchronously on an [`Interpreter`] or queued through a [`ScriptDriver`]
//! that parses and executes them on background workers.
//!
//! ## Architecture
//!
//! - **Frontend**: turns script text into a [`Program`] ([`VeloxFrontend`])
//! - **Values**: shared, mutable [`Item`] cells
//! - **Scopes**: lexical [`Scope`] chains, captured by closures
//! - **Engine**: the tree-walking [`Interpreter`]
//! - **Extensions**: host bindings injected through [`ExtensionManager`]
//! - **Driver**: the asynchronous Idle → Parsing → Executing → Idle queue
//!
//! ## Example
//!
//! ```
//! use velox::{Frontend, Interpreter, VeloxFrontend};
//!
//! let program = VeloxFrontend::new()
//!     .parse_str("example", "function twice(x) { return x * 2; } twice(21);")
//!     .unwrap();
//! let result = Interpreter::new().execute(&program).unwrap();
//! assert_eq!(result.to_string(), "42");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod context;
pub mod driver;
pub mod environment;
pub mod error;
pub mod eval;
pub mod extension;
pub mod frontend;
pub mod frontends;
pub mod interpreter;
pub mod memory;
pub mod registry;
pub mod value;

// Re-export main types
pub use ast::Program;
pub use context::EvalContext;
pub use driver::{DriverError, DriverState, ScriptDriver, ScriptFailure, ScriptReport, TaskId, Transition};
pub use environment::{Scope, ScopeGuard, ScopeKind};
pub use error::{type_name, InterpreterError, RegistrationError, Result};
pub use eval::{Completion, Evaluate, Execute};
pub use extension::{Extension, ExtensionManager, LogLevel, LogRecord, LogRecorder, LoggingExtension};
pub use frontend::{FileSource, Frontend, ParseError, ScriptSource, SourceLocation, TextSource};
pub use frontends::VeloxFrontend;
pub use interpreter::Interpreter;
pub use memory::{CountingTracker, MemoryStats, MemoryTracker, NullTracker, TrackerHandle};
pub use registry::{Checkpoint, ObjectTypeRegistry};
pub use value::{
    ForeignData, Function, Item, ItemState, NativeFnPtr, NativeFunction, ObjectInstance,
    ObjectType, ScriptFunction, VARIADIC_ARGS,
};

/// Velox version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
