//! Error types for Velox evaluation and setup

use thiserror::Error;

use crate::value::ItemState;

/// Errors raised by the evaluator while a script runs.
///
/// Every variant carries the source line it was raised at. Helpers that do
/// not know the line (item accessors, native adapters) report line `0`, and
/// the engine re-tags the error with [`InterpreterError::at`] on the way out.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpreterError {
    /// An accessor or operator received an item of the wrong kind
    #[error("line {line}: type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected kind
        expected: String,
        /// Kind actually found
        found: String,
        /// Source line
        line: u32,
    },

    /// A binary operator does not support this combination of operands
    #[error("line {line}: cannot apply `{op}` to {left} and {right}")]
    InvalidOperands {
        /// Operator symbol
        op: String,
        /// Left operand kind
        left: String,
        /// Right operand kind
        right: String,
        /// Source line
        line: u32,
    },

    /// Name not bound anywhere in the scope chain
    #[error("line {line}: unresolved identifier `{name}`")]
    UnresolvedIdentifier {
        /// The identifier
        name: String,
        /// Source line
        line: u32,
    },

    /// Member (field or function) not found on an object
    #[error("line {line}: `{type_name}` has no member `{member}`")]
    UnknownMember {
        /// Type of the receiver
        type_name: String,
        /// The member name
        member: String,
        /// Source line
        line: u32,
    },

    /// Object type not registered in this interpreter session
    #[error("line {line}: unknown object type `{name}`")]
    UnknownType {
        /// The type name
        name: String,
        /// Source line
        line: u32,
    },

    /// Wrong number of arguments for a call
    #[error("line {line}: `{name}` expects {expected} argument(s), got {got}")]
    Arity {
        /// Callee name
        name: String,
        /// Human readable expectation ("2", "at least 1")
        expected: String,
        /// Number of arguments supplied
        got: usize,
        /// Source line
        line: u32,
    },

    /// Attempted to call a non-function
    #[error("line {line}: {found} is not callable")]
    NotCallable {
        /// Kind of the callee
        found: String,
        /// Source line
        line: u32,
    },

    /// Array or string index outside the valid range
    #[error("line {line}: index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// Requested index
        index: i64,
        /// Length of the indexed value
        len: usize,
        /// Source line
        line: u32,
    },

    /// Integer division or remainder by zero
    #[error("line {line}: division by zero")]
    DivisionByZero {
        /// Source line
        line: u32,
    },

    /// Integer arithmetic overflowed
    #[error("line {line}: integer overflow")]
    IntegerOverflow {
        /// Source line
        line: u32,
    },

    /// Attempted to modify a frozen (standard library or extension) item
    #[error("line {line}: `{name}` is read-only")]
    ReadOnly {
        /// Name or description of the target
        name: String,
        /// Source line
        line: u32,
    },

    /// Call depth limit reached
    #[error("line {line}: stack overflow: call depth {depth} exceeds maximum {max}")]
    StackOverflow {
        /// Current depth
        depth: usize,
        /// Configured maximum
        max: usize,
        /// Source line
        line: u32,
    },

    /// `break` reached a function boundary or the top level
    #[error("line {line}: `break` outside of a loop")]
    BreakOutsideLoop {
        /// Source line
        line: u32,
    },

    /// `continue` reached a function boundary or the top level
    #[error("line {line}: `continue` outside of a loop")]
    ContinueOutsideLoop {
        /// Source line
        line: u32,
    },

    /// A registration performed by the script itself failed
    #[error("line {line}: {source}")]
    Registration {
        /// Underlying registration error
        source: RegistrationError,
        /// Source line
        line: u32,
    },

    /// Domain error raised by a host extension
    #[error("line {line}: {function}: {message}")]
    Native {
        /// Native function name
        function: String,
        /// Error message
        message: String,
        /// Source line
        line: u32,
    },
}

impl InterpreterError {
    /// Construct a type mismatch for `found`.
    pub fn type_mismatch(expected: impl Into<String>, found: &ItemState) -> Self {
        InterpreterError::TypeMismatch {
            expected: expected.into(),
            found: type_name(found).to_string(),
            line: 0,
        }
    }

    /// Construct a host-extension domain error.
    pub fn native(function: impl Into<String>, message: impl Into<String>) -> Self {
        InterpreterError::Native {
            function: function.into(),
            message: message.into(),
            line: 0,
        }
    }

    /// Source line the error was raised at (`0` when unknown).
    pub fn line(&self) -> u32 {
        match self {
            InterpreterError::TypeMismatch { line, .. }
            | InterpreterError::InvalidOperands { line, .. }
            | InterpreterError::UnresolvedIdentifier { line, .. }
            | InterpreterError::UnknownMember { line, .. }
            | InterpreterError::UnknownType { line, .. }
            | InterpreterError::Arity { line, .. }
            | InterpreterError::NotCallable { line, .. }
            | InterpreterError::IndexOutOfBounds { line, .. }
            | InterpreterError::DivisionByZero { line }
            | InterpreterError::IntegerOverflow { line }
            | InterpreterError::ReadOnly { line, .. }
            | InterpreterError::StackOverflow { line, .. }
            | InterpreterError::BreakOutsideLoop { line }
            | InterpreterError::ContinueOutsideLoop { line }
            | InterpreterError::Registration { line, .. }
            | InterpreterError::Native { line, .. } => *line,
        }
    }

    /// Tag the error with `at` if it does not carry a line yet.
    pub fn at(mut self, at: u32) -> Self {
        match &mut self {
            InterpreterError::TypeMismatch { line, .. }
            | InterpreterError::InvalidOperands { line, .. }
            | InterpreterError::UnresolvedIdentifier { line, .. }
            | InterpreterError::UnknownMember { line, .. }
            | InterpreterError::UnknownType { line, .. }
            | InterpreterError::Arity { line, .. }
            | InterpreterError::NotCallable { line, .. }
            | InterpreterError::IndexOutOfBounds { line, .. }
            | InterpreterError::DivisionByZero { line }
            | InterpreterError::IntegerOverflow { line }
            | InterpreterError::ReadOnly { line, .. }
            | InterpreterError::StackOverflow { line, .. }
            | InterpreterError::BreakOutsideLoop { line }
            | InterpreterError::ContinueOutsideLoop { line }
            | InterpreterError::Registration { line, .. }
            | InterpreterError::Native { line, .. } => {
                if *line == 0 {
                    *line = at;
                }
            }
        }
        self
    }
}

/// Setup-time errors raised while registering host bindings.
///
/// These are not line-tagged: they signal a contract violation by the host
/// and are expected before any script runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// An object type with this name already exists in the session
    #[error("object type `{0}` is already registered")]
    DuplicateType(String),

    /// An extension with this name is already registered
    #[error("extension `{0}` is already registered")]
    DuplicateExtension(String),

    /// A global function with this name already exists in the extension layer
    #[error("global function `{0}` is already registered")]
    DuplicateFunction(String),

    /// An extension failed while injecting itself
    #[error("extension `{name}` failed to inject: {message}")]
    Extension {
        /// Extension name
        name: String,
        /// Failure description
        message: String,
    },
}

/// Get a human-readable kind name for an item state.
pub fn type_name(state: &ItemState) -> &'static str {
    match state {
        ItemState::Undefined => "Undefined",
        ItemState::Boolean(_) => "Boolean",
        ItemState::Integer(_) => "Integer",
        ItemState::Real(_) => "Real",
        ItemState::String(_) => "String",
        ItemState::Function(_) => "Function",
        ItemState::Object(_) => "Object",
        ItemState::Array(_) => "Array",
    }
}

/// Result type alias for evaluator operations
pub type Result<T> = std::result::Result<T, InterpreterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_only_tags_untagged_errors() {
        let err = InterpreterError::DivisionByZero { line: 0 }.at(7);
        assert_eq!(err.line(), 7);

        let err = InterpreterError::DivisionByZero { line: 3 }.at(7);
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn test_native_error_message() {
        let err = InterpreterError::native("SetPixel", "first argument must be of type Image").at(12);
        assert_eq!(
            err.to_string(),
            "line 12: SetPixel: first argument must be of type Image"
        );
    }

    #[test]
    fn test_registration_error_display() {
        let err = RegistrationError::DuplicateType("Image".to_string());
        assert_eq!(err.to_string(), "object type `Image` is already registered");
    }
}
