//! Syntax tree consumed by the evaluator
//!
//! The interpreter never parses text itself. Any [`Frontend`](crate::Frontend)
//! that produces a [`Program`] can drive it; [`VeloxFrontend`](crate::VeloxFrontend)
//! is the bundled one. Every statement and expression carries the source line
//! used to tag runtime errors.

use std::sync::Arc;

/// A parsed script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    /// Top-level statements in source order
    pub stmts: Vec<Stmt>,
}

impl Program {
    /// Create a program from its statements.
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

/// A statement with its source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    /// What kind of statement
    pub kind: StmtKind,
    /// Source line
    pub line: u32,
}

impl Stmt {
    /// Create a statement.
    pub fn new(kind: StmtKind, line: u32) -> Self {
        Self { kind, line }
    }
}

/// Statement kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `var name = init;`
    Var {
        /// Declared name
        name: String,
        /// Optional initializer (Undefined when absent)
        init: Option<Expr>,
    },

    /// Expression evaluated for its value and side effects
    Expr(Expr),

    /// `{ ... }` with its own scope
    Block(Vec<Stmt>),

    /// `if (cond) then else other`
    If {
        /// Condition (must be Boolean)
        cond: Expr,
        /// Taken when the condition holds
        then_branch: Box<Stmt>,
        /// Taken otherwise
        else_branch: Option<Box<Stmt>>,
    },

    /// `while (cond) body`
    While {
        /// Loop condition
        cond: Expr,
        /// Loop body
        body: Box<Stmt>,
    },

    /// `for (init; cond; step) body`
    For {
        /// Runs once in the loop's own scope
        init: Option<Box<Stmt>>,
        /// Missing condition loops until `break`
        cond: Option<Expr>,
        /// Runs after each iteration, including after `continue`
        step: Option<Expr>,
        /// Loop body
        body: Box<Stmt>,
    },

    /// `return expr;`
    Return(Option<Expr>),

    /// `break;`
    Break,

    /// `continue;`
    Continue,

    /// `function name(params) { ... }`
    Function(Arc<FunctionDecl>),

    /// `object Name { function ... }`
    Object(ObjectDecl),
}

/// A function literal or declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// Declared name; `None` for anonymous function expressions
    pub name: Option<String>,
    /// Formal parameter names in positional order
    pub params: Vec<String>,
    /// Body statements
    pub body: Vec<Stmt>,
    /// Line of the `function` keyword
    pub line: u32,
}

/// A user-defined object type declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDecl {
    /// Type name
    pub name: String,
    /// Member functions; the one named `constructor` initializes instances
    pub members: Vec<Arc<FunctionDecl>>,
}

/// Name of the member function used as an object type's constructor.
pub const CONSTRUCTOR: &str = "constructor";

/// An expression with its source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// What kind of expression
    pub kind: ExprKind,
    /// Source line
    pub line: u32,
}

impl Expr {
    /// Create an expression.
    pub fn new(kind: ExprKind, line: u32) -> Self {
        Self { kind, line }
    }
}

/// Expression kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Constant
    Literal(Literal),

    /// Name lookup through the scope chain
    Ident(String),

    /// `[a, b, c]`
    Array(Vec<Expr>),

    /// `function (params) { ... }`
    Function(Arc<FunctionDecl>),

    /// `-x`, `!x`
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },

    /// Arithmetic and comparison
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },

    /// Short-circuit `&&` / `||`
    Logical {
        /// Operator
        op: LogicalOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand (evaluated only when needed)
        right: Box<Expr>,
    },

    /// `target = value` or `target op= value`
    Assign {
        /// Identifier, member or index expression
        target: Box<Expr>,
        /// Operator for compound assignment
        op: Option<BinaryOp>,
        /// New value
        value: Box<Expr>,
    },

    /// `callee(args)`
    Call {
        /// Callee expression
        callee: Box<Expr>,
        /// Arguments in positional order
        args: Vec<Expr>,
    },

    /// `object.name`
    Member {
        /// Receiver
        object: Box<Expr>,
        /// Field name
        name: String,
    },

    /// `object.method(args)`
    MethodCall {
        /// Receiver
        object: Box<Expr>,
        /// Member function name
        method: String,
        /// Arguments
        args: Vec<Expr>,
    },

    /// `object[index]`
    Index {
        /// Indexed value
        object: Box<Expr>,
        /// Index
        index: Box<Expr>,
    },
}

/// Literal constants.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `undefined`
    Undefined,
    /// `true` / `false`
    Boolean(bool),
    /// Integer literal
    Integer(i64),
    /// Real literal
    Real(f64),
    /// String literal (escapes already resolved)
    String(Arc<str>),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl BinaryOp {
    /// Operator symbol, for messages.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `!`
    Not,
}

/// Short-circuit operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
}
