//! Frontend trait and script sources
//!
//! The interpreter core only evaluates [`Program`]s. Producing them is the job
//! of a [`Frontend`]:
//!
//! ```text
//! ScriptSource → [Frontend] → Program → [Interpreter] → Item
//! ```
//!
//! Frontends are responsible for:
//! - Reading the script through its [`ScriptSource`]
//! - Tokenizing and parsing into the syntax tree
//! - Reporting syntax errors with a line and column
//!
//! The interpreter core is responsible for everything after that.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ast::Program;

// ═══════════════════════════════════════════════════════════════════════
// ERROR TYPES
// ═══════════════════════════════════════════════════════════════════════

/// Error that occurred while reading or parsing a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Human-readable error message
    pub message: String,

    /// Optional source location
    pub location: Option<SourceLocation>,

    /// Optional source snippet for context
    pub snippet: Option<String>,
}

impl ParseError {
    /// Create a new parse error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            snippet: None,
        }
    }

    /// Add location information to the error.
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Add a source snippet for context.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    /// Line of the error, `0` when unknown.
    pub fn line(&self) -> u32 {
        self.location.as_ref().map_or(0, |loc| loc.line)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error: {}", self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " at {}:{}:{}", loc.file, loc.line, loc.column)?;
        }
        if let Some(snippet) = &self.snippet {
            write!(f, "\n{}", snippet)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Source code location for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Script name
    pub file: String,

    /// Line number (1-indexed)
    pub line: u32,

    /// Column number (1-indexed)
    pub column: u32,
}

impl SourceLocation {
    /// Create a new source location.
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SCRIPT SOURCES
// ═══════════════════════════════════════════════════════════════════════

/// Where a script's bytes come from.
pub trait ScriptSource: Send + Sync {
    /// Name used in logs and error locations
    fn name(&self) -> &str;

    /// Open a byte stream over the script.
    fn open(&self) -> io::Result<Box<dyn Read + Send>>;

    /// Read the whole script as UTF-8 text.
    fn read_to_string(&self) -> io::Result<String> {
        let mut text = String::new();
        self.open()?.read_to_string(&mut text)?;
        Ok(text)
    }
}

/// A script held in memory.
#[derive(Debug, Clone)]
pub struct TextSource {
    name: String,
    text: Arc<str>,
}

impl TextSource {
    /// Wrap `text` under `name`.
    pub fn new(name: impl Into<String>, text: impl AsRef<str>) -> Self {
        Self {
            name: name.into(),
            text: Arc::from(text.as_ref()),
        }
    }
}

impl ScriptSource for TextSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(io::Cursor::new(self.text.as_bytes().to_vec())))
    }
}

/// A script read from disk when opened.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    /// Refer to the script at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            name: path.display().to_string(),
            path,
        }
    }

    /// Path of the script
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScriptSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(&self.path)?))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// FRONTEND TRAIT
// ═══════════════════════════════════════════════════════════════════════

/// Produces syntax trees for the interpreter.
///
/// Implementors supply [`Frontend::parse_str`]; reading the source is shared.
pub trait Frontend: Send + Sync {
    /// Parse `text`, naming it `name` in error locations.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the text is not a valid script.
    fn parse_str(&self, name: &str, text: &str) -> Result<Program, ParseError>;

    /// Read and parse a script source.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the source cannot be read or parsed.
    fn parse(&self, source: &dyn ScriptSource) -> Result<Program, ParseError> {
        let text = source.read_to_string().map_err(|e| {
            ParseError::new(format!("cannot read `{}`: {}", source.name(), e))
        })?;
        self.parse_str(source.name(), &text)
    }

    /// Name of the language
    fn name(&self) -> &str;

    /// File extension of scripts in this language
    fn file_extension(&self) -> &str;
}
