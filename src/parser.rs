pub mod ast;

use thiserror::Error;

use crate::lexer;
use crate::lexer::token::{Span, Token, TokenKind};
use ast::{Block, Expression, InfixOp, PrefixOp, Program, Statement};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {expected}, got {got} at position {position}")]
    ExpectedToken {
        expected: &'static str,
        got: String,
        position: usize,
    },
    #[error("expected an expression, got {got} at position {position}")]
    ExpectedExpression { got: String, position: usize },
    #[error("could not parse '{literal}' as integer")]
    InvalidIntegerLiteral { literal: String },
    #[error("could not parse '{literal}' as float")]
    InvalidFloatLiteral { literal: String },
    #[error("inconsistent indentation at position {position}")]
    InconsistentIndentation { position: usize },
}

/// Binding powers for the Pratt expression loop, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

fn precedence_of(kind: &TokenKind<'_>) -> Precedence {
    match kind {
        TokenKind::Eq | TokenKind::NotEq | TokenKind::In => Precedence::Equals,
        TokenKind::Lt | TokenKind::Gt => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Asterisk | TokenKind::Slash => Precedence::Product,
        TokenKind::LParen | TokenKind::Dot => Precedence::Call,
        TokenKind::LBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

/// Pratt parser over the lexed token stream.
///
/// Every production records its diagnostics in `errors` and returns `None` on
/// failure; the statement loops resynchronize and keep going, so a single
/// parse collects every error it can find. The parser itself never panics.
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    current: Token<'a>,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(mut tokens: Vec<Token<'a>>) -> Self {
        if tokens.is_empty() {
            tokens.push(Token::new(TokenKind::Eof, Span::default()));
        }
        let current = tokens[0].clone();
        Self {
            tokens,
            pos: 0,
            current,
            errors: Vec::new(),
        }
    }

    pub fn parse_program(mut self) -> Result<Program, Vec<ParseError>> {
        let mut statements = Vec::new();
        while !matches!(self.current.kind, TokenKind::Eof) {
            if self.consume_layout() {
                continue;
            }
            let before = self.pos;
            match self.parse_statement() {
                Some(statement) => statements.push(statement),
                None => {
                    if self.pos == before {
                        self.advance();
                    }
                }
            }
        }

        if self.errors.is_empty() {
            Ok(Program { statements })
        } else {
            Err(self.errors)
        }
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.current.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Identifier(_) if matches!(self.peek_kind(), TokenKind::Assign) => {
                self.parse_assign_statement()
            }
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Def => self.parse_function_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Illegal(lexeme)
                if !lexeme.is_empty() && lexeme.chars().all(|c| c == '\t') =>
            {
                self.errors.push(ParseError::InconsistentIndentation {
                    position: self.current.span.start,
                });
                self.advance();
                None
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Statement> {
        self.advance(); // 'let'
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Assign, "'='")?;
        let value = self.parse_expression(Precedence::Lowest)?;
        self.end_statement();
        Some(Statement::Let { name, value })
    }

    // `x = expr` rebinding, equivalent to a let-statement.
    fn parse_assign_statement(&mut self) -> Option<Statement> {
        let name = self.expect_identifier()?;
        self.advance(); // '='
        let value = self.parse_expression(Precedence::Lowest)?;
        self.end_statement();
        Some(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        self.advance(); // 'return'
        if matches!(
            self.current.kind,
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Dedent | TokenKind::Eof
        ) {
            self.end_statement();
            return Some(Statement::Return(None));
        }
        let value = self.parse_expression(Precedence::Lowest)?;
        self.end_statement();
        Some(Statement::Return(Some(value)))
    }

    fn parse_function_statement(&mut self) -> Option<Statement> {
        self.advance(); // 'def'
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LParen, "'('")?;
        let params = self.parse_function_params()?;
        self.expect(TokenKind::Colon, "':'")?;
        let body = self.parse_block()?;
        Some(Statement::Function { name, params, body })
    }

    fn parse_function_params(&mut self) -> Option<Vec<String>> {
        let mut params = Vec::new();
        if matches!(self.current.kind, TokenKind::RParen) {
            self.advance();
            return Some(params);
        }

        params.push(self.expect_identifier()?);
        while matches!(self.current.kind, TokenKind::Comma) {
            self.advance();
            params.push(self.expect_identifier()?);
        }
        self.expect(TokenKind::RParen, "')'")?;
        Some(params)
    }

    fn parse_for_statement(&mut self) -> Option<Statement> {
        self.advance(); // 'for'
        let iterator = self.expect_identifier()?;
        self.expect(TokenKind::In, "'in'")?;
        let iterable = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::Colon, "':'")?;
        let body = self.parse_block()?;
        Some(Statement::For {
            iterator,
            iterable,
            body,
        })
    }

    fn parse_while_statement(&mut self) -> Option<Statement> {
        self.advance(); // 'while'
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::Colon, "':'")?;
        let body = self.parse_block()?;
        Some(Statement::While { condition, body })
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.end_statement();
        Some(Statement::Expr(expr))
    }

    /// Parses `Newline Indent statement+ Dedent` after a `:` header.
    fn parse_block(&mut self) -> Option<Block> {
        self.expect(TokenKind::Newline, "a newline")?;
        while matches!(self.current.kind, TokenKind::Newline) {
            self.advance();
        }
        self.expect(TokenKind::Indent, "an indented block")?;

        let mut statements = Vec::new();
        while !matches!(self.current.kind, TokenKind::Dedent | TokenKind::Eof) {
            if self.consume_newlines() {
                continue;
            }
            let before = self.pos;
            match self.parse_statement() {
                Some(statement) => statements.push(statement),
                None => {
                    if self.pos == before {
                        self.advance();
                    }
                }
            }
        }
        if matches!(self.current.kind, TokenKind::Dedent) {
            self.advance();
        }

        Some(Block { statements })
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left = self.parse_prefix()?;

        while !matches!(self.current.kind, TokenKind::Semicolon)
            && precedence < precedence_of(&self.current.kind)
        {
            left = self.parse_infix(left)?;
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        match self.current.kind {
            TokenKind::Identifier(name) => {
                self.advance();
                Some(Expression::Identifier(name.to_string()))
            }
            TokenKind::Int(literal) => {
                self.advance();
                match literal.parse::<i64>() {
                    Ok(value) => Some(Expression::Integer(value)),
                    Err(_) => {
                        self.errors.push(ParseError::InvalidIntegerLiteral {
                            literal: literal.to_string(),
                        });
                        None
                    }
                }
            }
            TokenKind::Float(literal) => {
                self.advance();
                match literal.parse::<f64>() {
                    Ok(value) => Some(Expression::Float(value)),
                    Err(_) => {
                        self.errors.push(ParseError::InvalidFloatLiteral {
                            literal: literal.to_string(),
                        });
                        None
                    }
                }
            }
            TokenKind::True => {
                self.advance();
                Some(Expression::Boolean(true))
            }
            TokenKind::False => {
                self.advance();
                Some(Expression::Boolean(false))
            }
            TokenKind::Str(value) => {
                self.advance();
                Some(Expression::Str(value.to_string()))
            }
            TokenKind::Bang => self.parse_prefix_operator(PrefixOp::Bang),
            TokenKind::Minus => self.parse_prefix_operator(PrefixOp::Minus),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.expect(TokenKind::RParen, "')'")?;
                Some(expr)
            }
            TokenKind::If => self.parse_if_expression(),
            TokenKind::LBracket => {
                self.advance();
                let elements = self.parse_expression_list(TokenKind::RBracket, "']'")?;
                Some(Expression::List(elements))
            }
            TokenKind::LBrace => self.parse_dict_literal(),
            _ => {
                self.errors.push(ParseError::ExpectedExpression {
                    got: self.current.kind.describe(),
                    position: self.current.span.start,
                });
                None
            }
        }
    }

    fn parse_prefix_operator(&mut self, op: PrefixOp) -> Option<Expression> {
        self.advance();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix {
            op,
            right: Box::new(right),
        })
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        self.advance(); // 'if'
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::Colon, "':'")?;
        let consequence = self.parse_block()?;

        // The block's Dedent puts `else` back at the same depth as its `if`.
        let alternative = if matches!(self.current.kind, TokenKind::Else) {
            self.advance();
            self.expect(TokenKind::Colon, "':'")?;
            Some(self.parse_block()?)
        } else {
            None
        };

        Some(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_dict_literal(&mut self) -> Option<Expression> {
        self.advance(); // '{'
        let mut pairs = Vec::new();

        while !matches!(self.current.kind, TokenKind::RBrace) {
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect(TokenKind::Colon, "':'")?;
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if !matches!(self.current.kind, TokenKind::RBrace) {
                self.expect(TokenKind::Comma, "','")?;
            }
        }
        self.advance(); // '}'

        Some(Expression::Dict(pairs))
    }

    fn parse_expression_list(
        &mut self,
        end: TokenKind<'static>,
        end_label: &'static str,
    ) -> Option<Vec<Expression>> {
        let mut list = Vec::new();
        if self.current.kind == end {
            self.advance();
            return Some(list);
        }

        list.push(self.parse_expression(Precedence::Lowest)?);
        while matches!(self.current.kind, TokenKind::Comma) {
            self.advance();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect(end, end_label)?;
        Some(list)
    }

    fn parse_infix(&mut self, left: Expression) -> Option<Expression> {
        match self.current.kind {
            TokenKind::Plus => self.parse_infix_operator(left, InfixOp::Plus),
            TokenKind::Minus => self.parse_infix_operator(left, InfixOp::Minus),
            TokenKind::Asterisk => self.parse_infix_operator(left, InfixOp::Asterisk),
            TokenKind::Slash => self.parse_infix_operator(left, InfixOp::Slash),
            TokenKind::Lt => self.parse_infix_operator(left, InfixOp::Lt),
            TokenKind::Gt => self.parse_infix_operator(left, InfixOp::Gt),
            TokenKind::Eq => self.parse_infix_operator(left, InfixOp::Eq),
            TokenKind::NotEq => self.parse_infix_operator(left, InfixOp::NotEq),
            TokenKind::LParen => {
                self.advance();
                let args = self.parse_expression_list(TokenKind::RParen, "')'")?;
                Some(Expression::Call {
                    callee: Box::new(left),
                    args,
                })
            }
            TokenKind::LBracket => self.parse_index_expression(left),
            TokenKind::Dot => self.parse_method_call(left),
            TokenKind::In => {
                self.advance();
                let right = self.parse_expression(Precedence::Lowest)?;
                Some(Expression::In {
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
            _ => {
                self.errors.push(ParseError::ExpectedExpression {
                    got: self.current.kind.describe(),
                    position: self.current.span.start,
                });
                None
            }
        }
    }

    fn parse_infix_operator(&mut self, left: Expression, op: InfixOp) -> Option<Expression> {
        let precedence = precedence_of(&self.current.kind);
        self.advance();
        let right = self.parse_expression(precedence)?;
        Some(Expression::Infix {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    /// Parses `expr[a]`, the slice `expr[a:b]`, and rewrites either into an
    /// index-assignment when `=` follows the closing bracket.
    fn parse_index_expression(&mut self, left: Expression) -> Option<Expression> {
        self.advance(); // '['
        let start = self.parse_expression(Precedence::Lowest)?;

        let end = if matches!(self.current.kind, TokenKind::Colon) {
            self.advance();
            Some(Box::new(self.parse_expression(Precedence::Lowest)?))
        } else {
            None
        };
        self.expect(TokenKind::RBracket, "']'")?;

        if matches!(self.current.kind, TokenKind::Assign) {
            self.advance();
            let value = self.parse_expression(Precedence::Lowest)?;
            return Some(Expression::IndexAssign {
                object: Box::new(left),
                start: Box::new(start),
                end,
                value: Box::new(value),
            });
        }

        Some(Expression::Index {
            object: Box::new(left),
            start: Box::new(start),
            end,
        })
    }

    fn parse_method_call(&mut self, left: Expression) -> Option<Expression> {
        self.advance(); // '.'
        let method = self.expect_identifier()?;
        self.expect(TokenKind::LParen, "'('")?;
        let args = self.parse_expression_list(TokenKind::RParen, "')'")?;
        Some(Expression::MethodCall {
            object: Box::new(left),
            method,
            args,
        })
    }

    /// Consumes optional semicolons and the line's terminating newline.
    fn end_statement(&mut self) {
        while matches!(self.current.kind, TokenKind::Semicolon) {
            self.advance();
        }
        if matches!(self.current.kind, TokenKind::Newline) {
            self.advance();
        }
    }

    fn consume_newlines(&mut self) -> bool {
        let mut consumed = false;
        while matches!(self.current.kind, TokenKind::Newline) {
            consumed = true;
            self.advance();
        }
        consumed
    }

    // Top-level only: multi-line bracketed literals can leave a closing
    // Dedent with no matching block; it is layout, not a statement.
    fn consume_layout(&mut self) -> bool {
        let mut consumed = false;
        while matches!(self.current.kind, TokenKind::Newline | TokenKind::Dedent) {
            consumed = true;
            self.advance();
        }
        consumed
    }

    fn expect_identifier(&mut self) -> Option<String> {
        if let TokenKind::Identifier(name) = self.current.kind {
            self.advance();
            Some(name.to_string())
        } else {
            self.errors.push(ParseError::ExpectedToken {
                expected: "an identifier",
                got: self.current.kind.describe(),
                position: self.current.span.start,
            });
            None
        }
    }

    fn expect(&mut self, kind: TokenKind<'static>, label: &'static str) -> Option<()> {
        if self.current.kind == kind {
            self.advance();
            Some(())
        } else {
            self.errors.push(ParseError::ExpectedToken {
                expected: label,
                got: self.current.kind.describe(),
                position: self.current.span.start,
            });
            None
        }
    }

    fn advance(&mut self) -> Token<'a> {
        let next = self
            .tokens
            .get(self.pos + 1)
            .cloned()
            .unwrap_or(Token::new(TokenKind::Eof, Span::default()));
        self.pos = self.pos.saturating_add(1);
        std::mem::replace(&mut self.current, next)
    }

    fn peek_kind(&self) -> TokenKind<'a> {
        self.tokens
            .get(self.pos + 1)
            .map(|token| token.kind)
            .unwrap_or(TokenKind::Eof)
    }
}

/// Lexes and parses `source` in one step.
pub fn parse_source(source: &str) -> Result<Program, Vec<ParseError>> {
    Parser::new(lexer::tokenize(source)).parse_program()
}
