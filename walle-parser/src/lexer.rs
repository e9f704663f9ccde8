use std::fmt;
use std::ops::Range;

use logos::Logos;
use walle_source::{CodeLocation, Error, Source};

#[derive(Debug, Logos, Clone, PartialEq)]
pub enum Token {
    // literals
    #[regex(r"[0-9]+", |lex| lex.slice().parse())]
    NumberLit(i64),
    #[token("true", |_| true)]
    #[token("false", |_| false)]
    BoolLit(bool),
    /// Strings may span multiple lines. There are no escape sequences.
    #[regex(r#""[^"]*""#, |lex| lex.slice()[1..lex.slice().len() - 1].to_string())]
    StringLit(String),

    // identifiers
    #[regex("[a-zA-Z][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // unary operators
    #[token("!")]
    LogicalNot,

    // binary operators
    // - arithmetics
    #[token("+")]
    Plus,
    #[token("-")]
    Minus, // NOTE: can also be unary
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("**")]
    AsteriskAsterisk,
    // - assignment
    #[token("<-")]
    Assign,
    // - equality
    #[token("==")]
    EqualsEquals,
    #[token("!=")]
    NotEquals,
    // - ordering
    #[token(">")]
    GreaterThan,
    #[token(">=")]
    GreaterThanEquals,
    #[token("<")]
    LessThan,
    #[token("<=")]
    LessThanEquals,
    // - logical
    #[token("and")]
    And,
    #[token("or")]
    Or,

    // punctuation
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token(",")]
    Comma,
    /// Statements are terminated by line breaks.
    #[token("\n")]
    Endl,

    // commands
    #[token("Spawn")]
    Spawn,
    #[token("Respawn")]
    Respawn,
    #[token("Color")]
    Color,
    #[token("Size")]
    Size,
    #[token("DrawLine")]
    DrawLine,
    #[token("DrawCircle")]
    DrawCircle,
    #[token("DrawRectangle")]
    DrawRectangle,
    #[token("Fill")]
    Fill,
    #[token("Filling")]
    Filling,
    #[token("GoTo")]
    GoTo,

    // misc
    #[regex(r"[ \t\r\f]+", logos::skip)]
    #[regex(r"#[^\n]*", logos::skip)] // single line comments
    #[error]
    Error,

    /// Only generated at the end of [`lex`].
    Eof,
}

impl Token {
    /// Returns the binary binding power or `None` if invalid binop token.
    /// Binding power `0` is reserved for accepting any expression.
    /// `and` binds the loosest, `**` the tightest and is the only right associative operator.
    pub fn binop_bp(&self) -> Option<(u8, u8)> {
        match self {
            /* Logical */
            Token::And => Some((1, 2)),
            Token::Or => Some((3, 4)),
            /* Equality */
            Token::EqualsEquals | Token::NotEquals => Some((5, 6)),
            /* Ordering */
            Token::GreaterThan
            | Token::GreaterThanEquals
            | Token::LessThan
            | Token::LessThanEquals => Some((7, 8)),
            /* Additive */
            Token::Plus | Token::Minus => Some((9, 10)),
            /* Multiplicative */
            Token::Asterisk | Token::Slash | Token::Percent => Some((11, 12)),
            /* Power */
            Token::AsteriskAsterisk => Some((14, 13)),
            _ => None,
        }
    }

    /// Returns `true` if the token can only appear at the start of a statement.
    pub fn is_command(&self) -> bool {
        matches!(
            self,
            Token::Spawn
                | Token::Respawn
                | Token::Color
                | Token::Size
                | Token::DrawLine
                | Token::DrawCircle
                | Token::DrawRectangle
                | Token::Fill
                | Token::Filling
                | Token::GoTo
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::NumberLit(val) => return write!(f, "{}", val),
            Token::BoolLit(val) => return write!(f, "{}", val),
            Token::StringLit(val) => return write!(f, "\"{}\"", val),
            Token::Identifier(ident) => return f.write_str(ident),
            Token::LogicalNot => "!",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Asterisk => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::AsteriskAsterisk => "**",
            Token::Assign => "<-",
            Token::EqualsEquals => "==",
            Token::NotEquals => "!=",
            Token::GreaterThan => ">",
            Token::GreaterThanEquals => ">=",
            Token::LessThan => "<",
            Token::LessThanEquals => "<=",
            Token::And => "and",
            Token::Or => "or",
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            Token::OpenBracket => "[",
            Token::CloseBracket => "]",
            Token::Comma => ",",
            Token::Endl => "end of line",
            Token::Spawn => "Spawn",
            Token::Respawn => "Respawn",
            Token::Color => "Color",
            Token::Size => "Size",
            Token::DrawLine => "DrawLine",
            Token::DrawCircle => "DrawCircle",
            Token::DrawRectangle => "DrawRectangle",
            Token::Fill => "Fill",
            Token::Filling => "Filling",
            Token::GoTo => "GoTo",
            Token::Error => "invalid token",
            Token::Eof => "end of file",
        };
        f.write_str(text)
    }
}

/// A [`Token`] together with where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    /// Exact source text of the token.
    pub lexeme: String,
    pub span: Range<usize>,
    pub loc: CodeLocation,
}

/// Splits `source` into tokens. The result always ends with [`Token::Eof`].
/// Lexical errors are reported to `source.errors`; lexing continues after an unexpected
/// character but stops at an unterminated string.
pub fn lex(source: &Source) -> Vec<SpannedToken> {
    let mut lexer = Token::lexer(source.content);
    let mut tokens = Vec::new();

    while let Some(token) = lexer.next() {
        let span = lexer.span();
        let slice = lexer.slice();
        let loc = source.location(span.start);

        if token == Token::Error {
            match slice.chars().next() {
                Some('"') => {
                    source
                        .errors
                        .add_error(Error::lexical(loc, "Unterminated string literal."));
                    break; // the rest of the input belongs to the string
                }
                Some(c) if c.is_ascii_digit() => source.errors.add_error(Error::lexical(
                    loc,
                    format!("Invalid integer literal '{}'.", slice),
                )),
                Some(c) => source
                    .errors
                    .add_error(Error::lexical(loc, format!("Unexpected character '{}'.", c))),
                None => {}
            }
            continue;
        }

        tokens.push(SpannedToken {
            token,
            lexeme: slice.to_string(),
            span,
            loc,
        });
    }

    let end = source.content.len();
    tokens.push(SpannedToken {
        token: Token::Eof,
        lexeme: String::new(),
        span: end..end,
        loc: source.location(end),
    });
    tokens
}
