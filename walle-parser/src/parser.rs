use crate::ast::{Expr, ExprKind, Program, Stmt, StmtKind};
use crate::lexer::{lex, SpannedToken, Token};
use std::mem;
use walle_source::{CodeLocation, Error, Source};

mod expr;
mod stmt;

/// Every grammar production either succeeds or returns the first syntax error it hits.
pub type ParseResult<T> = Result<T, Error>;

/// Deepest expression tree the parser builds. Later passes recurse over the tree.
pub const MAX_NESTING: usize = 128;

pub struct Parser<'a> {
    /// Always ends with [`Token::Eof`].
    tokens: Vec<SpannedToken>,
    /// Index of the current token.
    pos: usize,
    /// Height of the expression being parsed, see [`MAX_NESTING`].
    depth: usize,
    /// Source code
    source: &'a Source<'a>,
}

impl<'a> Parser<'a> {
    /// Lexes `source` and creates a parser over the resulting tokens.
    /// Lexical errors end up in `source.errors`.
    pub fn new(source: &'a Source<'a>) -> Self {
        Self::with_tokens(source, lex(source))
    }

    /// Creates a parser over already lexed `tokens`.
    pub fn with_tokens(source: &'a Source<'a>, mut tokens: Vec<SpannedToken>) -> Self {
        if tokens.last().map(|t| &t.token) != Some(&Token::Eof) {
            let end = source.content.len();
            tokens.push(SpannedToken {
                token: Token::Eof,
                lexeme: String::new(),
                span: end..end,
                loc: source.location(end),
            });
        }
        Self {
            tokens,
            pos: 0,
            depth: 0,
            source,
        }
    }
}

impl<'a> Parser<'a> {
    /// Parses a whole program, one statement per line.
    /// A malformed statement produces exactly one syntax error in `source.errors` and is dropped.
    pub fn parse_program(&mut self) -> Program {
        let mut stmts = Vec::new();

        loop {
            // skip blank lines between statements
            while self.eat(Token::Endl) {}
            if self.at_eof() {
                break;
            }

            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    self.source.errors.add_error(err);
                    self.synchronize();
                }
            }
        }

        let loc = stmts.first().map(|stmt| stmt.loc).unwrap_or_default();
        Program { stmts, loc }
    }
}

/// Parse utilities
impl<'a> Parser<'a> {
    fn current(&self) -> &SpannedToken {
        &self.tokens[self.pos]
    }

    fn current_token(&self) -> &Token {
        &self.current().token
    }

    fn current_loc(&self) -> CodeLocation {
        self.current().loc
    }

    /// Returns the token `n` positions after the current one, clamped to [`Token::Eof`].
    fn peek_token(&self, n: usize) -> &Token {
        let index = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[index].token
    }

    fn at_eof(&self) -> bool {
        *self.current_token() == Token::Eof
    }

    fn next(&mut self) -> Token {
        if !self.at_eof() {
            self.pos += 1;
        }
        self.current_token().clone()
    }

    /// Predicate that tests whether the next token has the same discriminant and eats the next token if yes as a side effect.
    fn eat(&mut self, tok: Token) -> bool {
        if mem::discriminant(self.current_token()) == mem::discriminant(&tok) {
            self.next(); // eat token
            true
        } else {
            false
        }
    }

    /// Eats a token with the same discriminant as `tok` or fails with an error describing `expected`.
    fn expect(&mut self, tok: Token, expected: &str) -> ParseResult<()> {
        if self.eat(tok) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Every statement ends with a line break or the end of the file.
    fn expect_line_end(&mut self) -> ParseResult<()> {
        if self.eat(Token::Endl) || self.at_eof() {
            Ok(())
        } else {
            Err(self.unexpected("end of line after statement"))
        }
    }

    /// Creates an unexpected token error at the current token.
    fn unexpected(&self, expected: &str) -> Error {
        let found = self.current_token().to_string();
        Error::syntax(
            self.current_loc(),
            format!("Expected {}, found '{}'.", expected, found),
            found,
            vec![expected.to_string()],
        )
    }

    /// Adds one level to the expression being parsed.
    fn nest(&mut self) -> ParseResult<()> {
        if self.depth >= MAX_NESTING {
            let found = self.current_token().to_string();
            return Err(Error::syntax(
                self.current_loc(),
                format!("Expression is nested more than {} levels deep.", MAX_NESTING),
                found,
                Vec::new(),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    /// Skips tokens until the start of the next line or a command keyword.
    fn synchronize(&mut self) {
        loop {
            match self.current_token() {
                Token::Eof => return,
                Token::Endl => {
                    self.next();
                    return;
                }
                _ => {
                    self.next();
                    if self.current_token().is_command() {
                        return;
                    }
                }
            }
        }
    }
}
