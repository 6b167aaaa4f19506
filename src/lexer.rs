pub mod token;

use token::{Span, Token, TokenKind, lookup_keyword};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexerState {
    LineBegin,
    TokenStart,
}

enum StepOutcome<'a> {
    Emit(Token<'a>),
    Continue,
}

/// Converts source text into a token stream.
///
/// Indentation is tracked with a stack of tab depths; entering a deeper line
/// emits `Indent`, leaving one emits a `Dedent` per closed level. The lexer is
/// total: unknown characters become `Illegal` tokens and `next_token` keeps
/// returning `Eof` once the input is exhausted.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    indent_stack: Vec<usize>,
    pending_tokens: Vec<Token<'a>>,
    state: LexerState,
    bracket_depth: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            indent_stack: vec![0],
            pending_tokens: Vec::new(),
            state: LexerState::LineBegin,
            bracket_depth: 0,
        }
    }

    pub fn next_token(&mut self) -> Token<'a> {
        loop {
            if let Some(token) = self.pending_tokens.pop() {
                return token;
            }

            match self.step_state() {
                StepOutcome::Emit(token) => return token,
                StepOutcome::Continue => continue,
            }
        }
    }

    fn step_state(&mut self) -> StepOutcome<'a> {
        match self.state {
            LexerState::LineBegin => {
                let line_start = self.pos;
                let indent_level = self.count_indentation();
                let indent_end = self.pos;
                self.state = LexerState::TokenStart;

                let current_indent = self.current_indent();
                let span = Span {
                    start: line_start,
                    end: indent_end,
                };

                if indent_level > current_indent {
                    self.indent_stack.push(indent_level);
                    return StepOutcome::Emit(Token::new(TokenKind::Indent, span));
                }

                if indent_level < current_indent {
                    // pending_tokens is popped as a stack, so the token that
                    // must come out last is pushed first.
                    if !self.indent_stack.contains(&indent_level) {
                        self.pending_tokens.push(Token::new(
                            TokenKind::Illegal(&self.input[line_start..indent_end]),
                            span,
                        ));
                    }
                    while let Some(&top) = self.indent_stack.last() {
                        if top > indent_level && self.indent_stack.len() > 1 {
                            self.indent_stack.pop();
                            self.pending_tokens.push(Token::new(TokenKind::Dedent, span));
                        } else {
                            break;
                        }
                    }
                    return StepOutcome::Continue;
                }

                StepOutcome::Continue
            }
            LexerState::TokenStart => {
                self.skip_whitespace();

                if let Some('#') = self.peek_char() {
                    self.consume_while(|c| c != '\n');
                    return StepOutcome::Continue;
                }

                if self.peek_char().is_none() {
                    return self.handle_eof();
                }

                // Newlines inside an open bracket pair join lines implicitly:
                // no Newline token, no indentation tracking.
                if self.peek_char() == Some('\n') && self.bracket_depth > 0 {
                    self.consume_char();
                    return StepOutcome::Continue;
                }

                StepOutcome::Emit(self.read_token_from_current_position())
            }
        }
    }

    fn handle_eof(&mut self) -> StepOutcome<'a> {
        // All open indent levels close before the final Eof.
        self.flush_eof_dedents();
        if !self.pending_tokens.is_empty() {
            return StepOutcome::Continue;
        }

        let index = self.pos;
        StepOutcome::Emit(Token::new(
            TokenKind::Eof,
            Span {
                start: index,
                end: index,
            },
        ))
    }

    fn count_indentation(&mut self) -> usize {
        let tabs = self.consume_while(|c| c == '\t');
        match self.peek_char() {
            // Blank and comment-only lines do not change indentation depth.
            Some('\n') | Some('#') | None => self.current_indent(),
            _ => tabs,
        }
    }

    fn skip_whitespace(&mut self) {
        self.consume_while(|c| c == ' ' || c == '\t');
    }

    fn read_token_from_current_position(&mut self) -> Token<'a> {
        let start = self.pos;
        let ch = self
            .peek_char()
            .expect("read_token_from_current_position called at end of input");

        match ch {
            '\n' => {
                self.consume_char();
                self.state = LexerState::LineBegin;
                Token::new(
                    TokenKind::Newline,
                    Span {
                        start,
                        end: start + 1,
                    },
                )
            }
            '=' | '!' => self.read_operator(ch, start),
            '"' => self.read_string(start),
            '.' if self.char_at(start + 1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number(start)
            }
            c if c.is_alphabetic() || c == '_' => self.read_identifier(start),
            c if c.is_ascii_digit() => self.read_number(start),
            _ => {
                if let Some(token) = self.try_consume_single_char_token(ch, start) {
                    token
                } else {
                    self.consume_char();
                    Token::new(
                        TokenKind::Illegal(&self.input[start..self.pos]),
                        Span {
                            start,
                            end: self.pos,
                        },
                    )
                }
            }
        }
    }

    fn try_consume_single_char_token(&mut self, ch: char, start: usize) -> Option<Token<'a>> {
        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Asterisk,
            '/' => TokenKind::Slash,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            _ => return None,
        };

        match kind {
            TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => {
                self.bracket_depth += 1;
            }
            TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
            }
            _ => {}
        }

        self.consume_char();
        Some(Token::new(
            kind,
            Span {
                start,
                end: start + 1,
            },
        ))
    }

    fn read_operator(&mut self, ch: char, start: usize) -> Token<'a> {
        self.consume_char();
        let kind = if self.peek_char() == Some('=') {
            self.consume_char();
            match ch {
                '=' => TokenKind::Eq,
                _ => TokenKind::NotEq,
            }
        } else {
            match ch {
                '=' => TokenKind::Assign,
                _ => TokenKind::Bang,
            }
        };
        Token::new(
            kind,
            Span {
                start,
                end: self.pos,
            },
        )
    }

    fn read_identifier(&mut self, start: usize) -> Token<'a> {
        self.consume_while(|c| c.is_alphanumeric() || c == '_');
        let ident = &self.input[start..self.pos];

        let kind = lookup_keyword(ident).unwrap_or(TokenKind::Identifier(ident));
        Token::new(
            kind,
            Span {
                start,
                end: self.pos,
            },
        )
    }

    fn read_number(&mut self, start: usize) -> Token<'a> {
        self.consume_while(|c| c.is_ascii_digit());
        let mut is_float = false;
        if self.peek_char() == Some('.') {
            is_float = true;
            self.consume_char();
            self.consume_while(|c| c.is_ascii_digit());
        }

        let literal = &self.input[start..self.pos];
        let kind = if is_float {
            TokenKind::Float(literal)
        } else {
            TokenKind::Int(literal)
        };
        Token::new(
            kind,
            Span {
                start,
                end: self.pos,
            },
        )
    }

    fn read_string(&mut self, start: usize) -> Token<'a> {
        self.consume_char(); // opening quote
        let content_start = self.pos;

        self.consume_while(|c| c != '"');
        let content_end = self.pos;

        // An unterminated string yields whatever was collected up to the end
        // of input.
        if self.peek_char() == Some('"') {
            self.consume_char();
        }

        Token::new(
            TokenKind::Str(&self.input[content_start..content_end]),
            Span {
                start,
                end: self.pos,
            },
        )
    }

    fn consume_while<P>(&mut self, keep_predicate: P) -> usize
    where
        P: Fn(char) -> bool,
    {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if !keep_predicate(c) {
                break;
            }
            self.consume_char();
        }
        self.pos - start
    }

    fn char_at(&self, index: usize) -> Option<char> {
        if index >= self.input.len() {
            None
        } else {
            self.input[index..].chars().next()
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.char_at(self.pos)
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn current_indent(&self) -> usize {
        *self
            .indent_stack
            .last()
            .expect("indent stack always holds the base level")
    }

    fn flush_eof_dedents(&mut self) {
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            let index = self.pos;
            let span = Span {
                start: index,
                end: index,
            };
            self.pending_tokens.push(Token::new(TokenKind::Dedent, span));
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_token())
    }
}

/// Collects the full token stream, ending with the first `Eof`.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let is_eof = matches!(token.kind, TokenKind::Eof);
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn kinds(input: &str) -> Vec<TokenKind<'_>> {
        tokenize(input).into_iter().map(|token| token.kind).collect()
    }

    #[test]
    fn lexes_simple_function_program() {
        let input = indoc! {"
            def add(x, y):
            \treturn x + y
            add(1, 2)
        "};
        let expected = vec![
            TokenKind::Def,
            TokenKind::Identifier("add"),
            TokenKind::LParen,
            TokenKind::Identifier("x"),
            TokenKind::Comma,
            TokenKind::Identifier("y"),
            TokenKind::RParen,
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::Return,
            TokenKind::Identifier("x"),
            TokenKind::Plus,
            TokenKind::Identifier("y"),
            TokenKind::Newline,
            TokenKind::Dedent,
            TokenKind::Identifier("add"),
            TokenKind::LParen,
            TokenKind::Int("1"),
            TokenKind::Comma,
            TokenKind::Int("2"),
            TokenKind::RParen,
            TokenKind::Newline,
            TokenKind::Eof,
        ];
        assert_eq!(kinds(input), expected);
    }

    #[test]
    fn lexes_operators_and_delimiters() {
        let input = "= + - ! * / < > == != , ; : . ( ) { } [ ]";
        let expected = vec![
            TokenKind::Assign,
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Bang,
            TokenKind::Asterisk,
            TokenKind::Slash,
            TokenKind::Lt,
            TokenKind::Gt,
            TokenKind::Eq,
            TokenKind::NotEq,
            TokenKind::Comma,
            TokenKind::Semicolon,
            TokenKind::Colon,
            TokenKind::Dot,
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::RBrace,
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::Eof,
        ];
        assert_eq!(kinds(input), expected);
    }

    #[test]
    fn lexes_numeric_literals() {
        assert_eq!(
            kinds("5 3.14 .5 10."),
            vec![
                TokenKind::Int("5"),
                TokenKind::Float("3.14"),
                TokenKind::Float(".5"),
                TokenKind::Float("10."),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        assert_eq!(
            kinds("let x = true; for i in xs: while _y"),
            vec![
                TokenKind::Let,
                TokenKind::Identifier("x"),
                TokenKind::Assign,
                TokenKind::True,
                TokenKind::Semicolon,
                TokenKind::For,
                TokenKind::Identifier("i"),
                TokenKind::In,
                TokenKind::Identifier("xs"),
                TokenKind::Colon,
                TokenKind::While,
                TokenKind::Identifier("_y"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn strips_line_comments() {
        let input = indoc! {"
            x = 1 # trailing note
            # whole line
            y = 2
        "};
        assert_eq!(
            kinds(input),
            vec![
                TokenKind::Identifier("x"),
                TokenKind::Assign,
                TokenKind::Int("1"),
                TokenKind::Newline,
                TokenKind::Newline,
                TokenKind::Identifier("y"),
                TokenKind::Assign,
                TokenKind::Int("2"),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_literal_excludes_quotes() {
        assert_eq!(
            kinds("\"foo bar\""),
            vec![TokenKind::Str("foo bar"), TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string_collects_rest_of_input() {
        assert_eq!(
            kinds("\"abc"),
            vec![TokenKind::Str("abc"), TokenKind::Eof]
        );
    }

    #[test]
    fn unknown_character_becomes_illegal_token() {
        assert_eq!(
            kinds("x = 1 @ 2"),
            vec![
                TokenKind::Identifier("x"),
                TokenKind::Assign,
                TokenKind::Int("1"),
                TokenKind::Illegal("@"),
                TokenKind::Int("2"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn blank_line_does_not_change_indentation() {
        let input = indoc! {"
            if true:
            \tx = 1

            \ty = 2
        "};
        assert_eq!(
            kinds(input),
            vec![
                TokenKind::If,
                TokenKind::True,
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Identifier("x"),
                TokenKind::Assign,
                TokenKind::Int("1"),
                TokenKind::Newline,
                TokenKind::Newline,
                TokenKind::Identifier("y"),
                TokenKind::Assign,
                TokenKind::Int("2"),
                TokenKind::Newline,
                TokenKind::Dedent,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn emits_dedent_before_eof_without_trailing_newline() {
        let input = "if true:\n\tx = 1";
        assert_eq!(
            kinds(input),
            vec![
                TokenKind::If,
                TokenKind::True,
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Identifier("x"),
                TokenKind::Assign,
                TokenKind::Int("1"),
                TokenKind::Dedent,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn closes_nested_blocks_one_dedent_per_level() {
        let input = indoc! {"
            if true:
            \tif true:
            \t\tx = 1
            y = 2
        "};
        let stream = kinds(input);
        let dedents = stream
            .iter()
            .filter(|kind| matches!(kind, TokenKind::Dedent))
            .count();
        assert_eq!(dedents, 2);
        let indents = stream
            .iter()
            .filter(|kind| matches!(kind, TokenKind::Indent))
            .count();
        assert_eq!(indents, 2);
    }

    #[test]
    fn inconsistent_dedent_yields_illegal_token() {
        let input = "if true:\n\t\tx = 1\n\ty = 2\n";
        let stream = kinds(input);
        assert!(
            stream
                .iter()
                .any(|kind| matches!(kind, TokenKind::Illegal(_))),
            "expected an illegal token in {stream:?}"
        );
    }

    #[test]
    fn joins_lines_inside_open_brackets() {
        let input = "d = {\n\t\"a\": 1,\n\t\"b\": 2}\n";
        assert_eq!(
            kinds(input),
            vec![
                TokenKind::Identifier("d"),
                TokenKind::Assign,
                TokenKind::LBrace,
                TokenKind::Str("a"),
                TokenKind::Colon,
                TokenKind::Int("1"),
                TokenKind::Comma,
                TokenKind::Str("b"),
                TokenKind::Colon,
                TokenKind::Int("2"),
                TokenKind::RBrace,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn next_token_keeps_returning_eof() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier("x"));
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }
}
