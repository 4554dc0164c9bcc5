//! Velox frontend
//!
//! Turns Velox source text into a [`Program`]. Lexing uses `logos`; parsing is
//! a hand-written recursive descent with the usual C-like precedence:
//!
//! ```text
//! assignment  =  +=  -=  *=  /=  %=    (right associative)
//! ||
//! &&
//! ==  !=
//! <  <=  >  >=
//! +  -
//! *  /  %
//! !  -                                 (prefix)
//! call  .member  .method()  [index]    (postfix)
//! ```

mod lexer;
mod parser;

use crate::ast::Program;
use crate::frontend::{Frontend, ParseError};

use parser::Parser;

/// Frontend for `.vx` scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct VeloxFrontend;

impl VeloxFrontend {
    /// Create the frontend.
    pub fn new() -> Self {
        Self
    }
}

impl Frontend for VeloxFrontend {
    fn parse_str(&self, name: &str, text: &str) -> Result<Program, ParseError> {
        match lexer::tokenize(text) {
            Ok(tokens) => Parser::new(name, text, tokens).parse_program(),
            Err(span) => {
                let parser = Parser::new(name, text, Vec::new());
                let bad = &text[span.clone()];
                Err(parser.error_at(span.start, format!("invalid token `{}`", bad)))
            }
        }
    }

    fn name(&self) -> &str {
        "Velox"
    }

    fn file_extension(&self) -> &str {
        "vx"
    }
}
