//! Evaluation context configuration

use serde::{Deserialize, Serialize};

/// Configuration for an interpreter session.
///
/// Loaded from JSON by hosts (see [`EvalContext::from_json`]) or built in
/// code. Missing JSON fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalContext {
    /// Maximum call depth (stack overflow protection)
    pub max_call_depth: usize,

    /// Emit a `trace` event for every function call
    pub trace: bool,

    /// Report item allocations to a counting memory tracker
    pub track_memory: bool,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            max_call_depth: 256,
            trace: false,
            track_memory: true,
        }
    }
}

impl EvalContext {
    /// Create a new context with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with a custom call depth limit.
    pub fn with_max_call_depth(max_depth: usize) -> Self {
        Self {
            max_call_depth: max_depth,
            ..Default::default()
        }
    }

    /// Parse a context from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let ctx = EvalContext::new();
        assert_eq!(ctx.max_call_depth, 256);
        assert!(!ctx.trace);
        assert!(ctx.track_memory);
    }

    #[test]
    fn test_from_json_partial() {
        let ctx = EvalContext::from_json(r#"{ "max_call_depth": 32 }"#).unwrap();
        assert_eq!(ctx.max_call_depth, 32);
        assert!(ctx.track_memory);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(EvalContext::from_json("max_call_depth = 3").is_err());
    }
}
