//! Recursive-descent parser producing the syntax tree

use std::sync::Arc;

use crate::ast::{
    BinaryOp, Expr, ExprKind, FunctionDecl, Literal, LogicalOp, ObjectDecl, Program, Stmt,
    StmtKind, UnaryOp,
};
use crate::frontend::{ParseError, SourceLocation};

use super::lexer::{Spanned, Token};

type PResult<T> = Result<T, ParseError>;

/// Parser state over a token stream.
pub struct Parser<'src> {
    file: &'src str,
    source: &'src str,
    tokens: Vec<Spanned>,
    pos: usize,
    line_starts: Vec<usize>,
}

impl<'src> Parser<'src> {
    pub fn new(file: &'src str, source: &'src str, tokens: Vec<Spanned>) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            file,
            source,
            tokens,
            pos: 0,
            line_starts,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Locations
    // ═══════════════════════════════════════════════════════════════════

    /// 1-indexed line and column of a byte offset.
    pub fn position(&self, offset: usize) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let column = self.source[self.line_starts[line]..offset].chars().count() + 1;
        (line as u32 + 1, column as u32)
    }

    pub fn error_at(&self, offset: usize, message: impl Into<String>) -> ParseError {
        let (line, column) = self.position(offset);
        let snippet = self
            .source
            .lines()
            .nth(line as usize - 1)
            .unwrap_or_default()
            .to_string();
        ParseError::new(message)
            .with_location(SourceLocation::new(self.file, line, column))
            .with_snippet(snippet)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |t| t.span.start)
    }

    fn line(&self) -> u32 {
        self.position(self.offset()).0
    }

    // ═══════════════════════════════════════════════════════════════════
    // Token Cursor
    // ═══════════════════════════════════════════════════════════════════

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|t| &t.token)
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|t| t.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let found = self
            .peek()
            .map_or_else(|| "end of input".to_string(), Token::describe);
        self.error_at(self.offset(), format!("expected {}, found {}", expected, found))
    }

    fn expect(&mut self, token: Token, expected: &str) -> PResult<()> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn ident(&mut self, what: &str) -> PResult<String> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════

    pub fn parse_program(&mut self) -> PResult<Program> {
        let mut stmts = Vec::new();
        while self.peek().is_some() {
            stmts.push(self.statement()?);
        }
        Ok(Program::new(stmts))
    }

    fn statement(&mut self) -> PResult<Stmt> {
        let line = self.line();
        let kind = match self.peek() {
            Some(Token::Var) => self.var_decl()?,
            Some(Token::Function) if matches!(self.peek_at(1), Some(Token::Ident(_))) => {
                self.pos += 1;
                let name = self.ident("function name")?;
                StmtKind::Function(self.function_rest(Some(name), line)?)
            }
            Some(Token::Object) => self.object_decl()?,
            Some(Token::If) => self.if_stmt()?,
            Some(Token::While) => {
                self.pos += 1;
                self.expect(Token::LParen, "`(` after `while`")?;
                let cond = self.expression()?;
                self.expect(Token::RParen, "`)` after condition")?;
                let body = Box::new(self.statement()?);
                StmtKind::While { cond, body }
            }
            Some(Token::For) => self.for_stmt()?,
            Some(Token::Return) => {
                self.pos += 1;
                let value = if self.check(&Token::Semicolon) {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.expect(Token::Semicolon, "`;` after return")?;
                StmtKind::Return(value)
            }
            Some(Token::Break) => {
                self.pos += 1;
                self.expect(Token::Semicolon, "`;` after `break`")?;
                StmtKind::Break
            }
            Some(Token::Continue) => {
                self.pos += 1;
                self.expect(Token::Semicolon, "`;` after `continue`")?;
                StmtKind::Continue
            }
            Some(Token::LBrace) => StmtKind::Block(self.block()?),
            _ => {
                let expr = self.expression()?;
                self.expect(Token::Semicolon, "`;` after expression")?;
                StmtKind::Expr(expr)
            }
        };
        Ok(Stmt::new(kind, line))
    }

    /// `var name (= init)? ;`
    fn var_decl(&mut self) -> PResult<StmtKind> {
        self.expect(Token::Var, "`var`")?;
        let name = self.ident("variable name")?;
        let init = if self.eat(&Token::Assign) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(Token::Semicolon, "`;` after variable declaration")?;
        Ok(StmtKind::Var { name, init })
    }

    fn block(&mut self) -> PResult<Vec<Stmt>> {
        self.expect(Token::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(self.unexpected("`}`"));
            }
            stmts.push(self.statement()?);
        }
        self.pos += 1;
        Ok(stmts)
    }

    /// Parameter list and body, after `function name`.
    fn function_rest(&mut self, name: Option<String>, line: u32) -> PResult<Arc<FunctionDecl>> {
        self.expect(Token::LParen, "`(` before parameters")?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                params.push(self.ident("parameter name")?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "`)` after parameters")?;
        let body = self.block()?;
        Ok(Arc::new(FunctionDecl {
            name,
            params,
            body,
            line,
        }))
    }

    /// `object Name { function member(...) { ... } ... }`
    fn object_decl(&mut self) -> PResult<StmtKind> {
        self.expect(Token::Object, "`object`")?;
        let name = self.ident("object type name")?;
        self.expect(Token::LBrace, "`{` after object type name")?;
        let mut members = Vec::new();
        while !self.eat(&Token::RBrace) {
            let line = self.line();
            self.expect(Token::Function, "`function` or `}` in object body")?;
            let member = self.ident("member function name")?;
            members.push(self.function_rest(Some(member), line)?);
        }
        Ok(StmtKind::Object(ObjectDecl { name, members }))
    }

    fn if_stmt(&mut self) -> PResult<StmtKind> {
        self.expect(Token::If, "`if`")?;
        self.expect(Token::LParen, "`(` after `if`")?;
        let cond = self.expression()?;
        self.expect(Token::RParen, "`)` after condition")?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.eat(&Token::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(StmtKind::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    /// `for (init; cond; step) body`
    fn for_stmt(&mut self) -> PResult<StmtKind> {
        self.expect(Token::For, "`for`")?;
        self.expect(Token::LParen, "`(` after `for`")?;

        let init_line = self.line();
        let init = if self.check(&Token::Var) {
            Some(Box::new(Stmt::new(self.var_decl()?, init_line)))
        } else if self.eat(&Token::Semicolon) {
            None
        } else {
            let expr = self.expression()?;
            self.expect(Token::Semicolon, "`;` after loop initializer")?;
            Some(Box::new(Stmt::new(StmtKind::Expr(expr), init_line)))
        };

        let cond = if self.check(&Token::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(Token::Semicolon, "`;` after loop condition")?;

        let step = if self.check(&Token::RParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(Token::RParen, "`)` after loop clauses")?;

        let body = Box::new(self.statement()?);
        Ok(StmtKind::For {
            init,
            cond,
            step,
            body,
        })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Expressions (lowest to highest precedence)
    // ═══════════════════════════════════════════════════════════════════

    pub fn expression(&mut self) -> PResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> PResult<Expr> {
        let start = self.offset();
        let target = self.logical_or()?;

        let op = match self.peek() {
            Some(Token::Assign) => None,
            Some(Token::PlusAssign) => Some(BinaryOp::Add),
            Some(Token::MinusAssign) => Some(BinaryOp::Sub),
            Some(Token::StarAssign) => Some(BinaryOp::Mul),
            Some(Token::SlashAssign) => Some(BinaryOp::Div),
            Some(Token::PercentAssign) => Some(BinaryOp::Rem),
            _ => return Ok(target),
        };
        if !matches!(
            target.kind,
            ExprKind::Ident(_) | ExprKind::Member { .. } | ExprKind::Index { .. }
        ) {
            return Err(self.error_at(start, "invalid assignment target"));
        }
        self.pos += 1;

        let value = self.assignment()?;
        let line = target.line;
        Ok(Expr::new(
            ExprKind::Assign {
                target: Box::new(target),
                op,
                value: Box::new(value),
            },
            line,
        ))
    }

    fn logical_or(&mut self) -> PResult<Expr> {
        let mut left = self.logical_and()?;
        while self.eat(&Token::Or) {
            let right = self.logical_and()?;
            left = logical(LogicalOp::Or, left, right);
        }
        Ok(left)
    }

    fn logical_and(&mut self) -> PResult<Expr> {
        let mut left = self.equality()?;
        while self.eat(&Token::And) {
            let right = self.equality()?;
            left = logical(LogicalOp::And, left, right);
        }
        Ok(left)
    }

    fn equality(&mut self) -> PResult<Expr> {
        let mut left = self.comparison()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::Ne,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.comparison()?;
            left = binary(op, left, right);
        }
    }

    fn comparison(&mut self) -> PResult<Expr> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::LtEq) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::GtEq) => BinaryOp::Ge,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.term()?;
            left = binary(op, left, right);
        }
    }

    fn term(&mut self) -> PResult<Expr> {
        let mut left = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.factor()?;
            left = binary(op, left, right);
        }
    }

    fn factor(&mut self) -> PResult<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = binary(op, left, right);
        }
    }

    fn unary(&mut self) -> PResult<Expr> {
        let line = self.line();
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Bang) => UnaryOp::Not,
            _ => return self.postfix(),
        };
        self.pos += 1;
        let operand = self.unary()?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            line,
        ))
    }

    /// Calls, member access, method calls and indexing.
    fn postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            let line = self.line();
            if self.eat(&Token::LParen) {
                let args = self.arguments()?;
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    line,
                );
            } else if self.eat(&Token::Dot) {
                let name = self.ident("member name after `.`")?;
                if self.eat(&Token::LParen) {
                    let args = self.arguments()?;
                    expr = Expr::new(
                        ExprKind::MethodCall {
                            object: Box::new(expr),
                            method: name,
                            args,
                        },
                        line,
                    );
                } else {
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            name,
                        },
                        line,
                    );
                }
            } else if self.eat(&Token::LBracket) {
                let index = self.expression()?;
                self.expect(Token::RBracket, "`]` after index")?;
                expr = Expr::new(
                    ExprKind::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                    line,
                );
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma separated expressions up to and including `)`.
    fn arguments(&mut self) -> PResult<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.expression()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RParen, "`)` after arguments")?;
        }
        Ok(args)
    }

    fn primary(&mut self) -> PResult<Expr> {
        let line = self.line();
        let kind = match self.peek() {
            Some(Token::Int(n)) => ExprKind::Literal(Literal::Integer(*n)),
            Some(Token::Real(n)) => ExprKind::Literal(Literal::Real(*n)),
            Some(Token::Str(s)) => ExprKind::Literal(Literal::String(Arc::from(s.as_str()))),
            Some(Token::True) => ExprKind::Literal(Literal::Boolean(true)),
            Some(Token::False) => ExprKind::Literal(Literal::Boolean(false)),
            Some(Token::Undefined) => ExprKind::Literal(Literal::Undefined),
            Some(Token::Ident(name)) => ExprKind::Ident(name.clone()),
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.expression()?;
                self.expect(Token::RParen, "`)`")?;
                return Ok(inner);
            }
            Some(Token::LBracket) => {
                self.pos += 1;
                let mut elements = Vec::new();
                if !self.eat(&Token::RBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                    self.expect(Token::RBracket, "`]` after array elements")?;
                }
                return Ok(Expr::new(ExprKind::Array(elements), line));
            }
            Some(Token::Function) => {
                self.pos += 1;
                let decl = self.function_rest(None, line)?;
                return Ok(Expr::new(ExprKind::Function(decl), line));
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.advance();
        Ok(Expr::new(kind, line))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let line = left.line;
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        line,
    )
}

fn logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
    let line = left.line;
    Expr::new(
        ExprKind::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        line,
    )
}
