#![forbid(unsafe_code)]

//! Lexer shared by the assembly and TxScript front ends.
//!
//! Produces byte-range tokens over the whole source. Ranges always satisfy
//! `start <= end <= source.len()` and fall on `char` boundaries.

use std::fmt;
use std::ops::Range;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Lexical categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier-like word: opcode names, keywords, function names.
    Word,
    /// `$name`. The range includes the sigil.
    Variable,
    /// `'..'` or `".."`. The range includes the quotes.
    String,
    /// `#` to end of line. The range includes the `#`.
    Comment,
    /// Decimal integer, optionally signed in the assembly dialect.
    Number,
    /// `0x` followed by an even number of hex digits.
    Hex,
    /// `@0x..`: bytes copied verbatim into the script.
    Raw,
    /// `== != <= >= < > + - * / %`.
    Operator,
    /// `( ) , { } ; :`.
    Delimiter,
    /// A line break.
    Newline,
}

/// A token with a kind and a byte range in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: Range<usize>,
}

impl Token {
    pub fn new(kind: TokenKind, range: Range<usize>) -> Self {
        debug_assert!(range.start <= range.end, "token range must be ordered");
        Self { kind, range }
    }

    /// Extract the token's text from the source it was lexed from.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range.clone()]
    }

    /// Whether the token carries no meaning for a parser.
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Comment)
    }
}

/// Which front end the source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Assembly: `-` directly before a digit starts a negative number.
    Asm,
    /// TxScript: `-` is always an operator.
    TxScript,
}

/// A lexical error at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub offset: usize,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.message, self.offset)
    }
}

impl std::error::Error for LexError {}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

#[inline]
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Tokenize a full source text.
pub fn tokenize(source: &str, dialect: Dialect) -> Result<Vec<Token>, LexError> {
    Lexer {
        source,
        bytes: source.as_bytes(),
        pos: 0,
        dialect,
    }
    .run()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    dialect: Dialect,
}

impl Lexer<'_> {
    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn error(&self, message: impl Into<String>, offset: usize) -> LexError {
        LexError {
            message: message.into(),
            offset,
        }
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while let Some(b) = self.peek(0) {
            if !pred(b) {
                break;
            }
            self.pos += 1;
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while let Some(b) = self.peek(0) {
            let start = self.pos;
            let kind = match b {
                b' ' | b'\t' | b'\r' => {
                    self.pos += 1;
                    continue;
                }
                b'\n' => {
                    self.pos += 1;
                    TokenKind::Newline
                }
                b'#' => {
                    self.eat_while(|b| b != b'\n');
                    TokenKind::Comment
                }
                b'\'' | b'"' => {
                    self.string(b)?;
                    TokenKind::String
                }
                b'$' => {
                    self.pos += 1;
                    if !self.peek(0).is_some_and(is_ident_start) {
                        return Err(self.error("expected variable name after '$'", start));
                    }
                    self.eat_while(is_ident_byte);
                    TokenKind::Variable
                }
                b'@' => {
                    self.pos += 1;
                    if !(self.peek(0) == Some(b'0') && matches!(self.peek(1), Some(b'x' | b'X'))) {
                        return Err(self.error("expected 0x after '@'", start));
                    }
                    self.hex_digits(start)?;
                    TokenKind::Raw
                }
                b'0' if matches!(self.peek(1), Some(b'x' | b'X')) => {
                    self.hex_digits(start)?;
                    TokenKind::Hex
                }
                b'0'..=b'9' => {
                    self.number(start)?;
                    TokenKind::Number
                }
                b'-' if self.dialect == Dialect::Asm
                    && self.peek(1).is_some_and(|d| d.is_ascii_digit()) =>
                {
                    self.pos += 1;
                    self.number(start)?;
                    TokenKind::Number
                }
                _ if is_ident_start(b) => {
                    self.eat_while(is_ident_byte);
                    TokenKind::Word
                }
                b'=' | b'!' | b'<' | b'>' => {
                    let doubled = self.peek(1) == Some(b'=');
                    if !doubled && matches!(b, b'=' | b'!') {
                        return Err(self.error(format!("unexpected character '{}'", b as char), start));
                    }
                    self.pos += if doubled { 2 } else { 1 };
                    TokenKind::Operator
                }
                b'+' | b'-' | b'*' | b'/' | b'%' => {
                    self.pos += 1;
                    TokenKind::Operator
                }
                b'(' | b')' | b',' | b'{' | b'}' | b';' | b':' => {
                    self.pos += 1;
                    TokenKind::Delimiter
                }
                _ => {
                    let ch = self.source[start..].chars().next().unwrap_or('\u{fffd}');
                    return Err(self.error(format!("unexpected character {ch:?}"), start));
                }
            };
            tokens.push(Token::new(kind, start..self.pos));
        }

        Ok(tokens)
    }

    fn string(&mut self, quote: u8) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek(0) {
                Some(b) if b == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(b'\n') | None => {
                    return Err(self.error("unterminated string literal", start));
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Consume `0x` and the digits after it; `self.pos` is at the `0`.
    fn hex_digits(&mut self, token_start: usize) -> Result<(), LexError> {
        self.pos += 2;
        let digits_start = self.pos;
        self.eat_while(|b| b.is_ascii_hexdigit());
        if self.peek(0).is_some_and(is_ident_byte) {
            return Err(self.error("invalid hex literal", token_start));
        }
        if (self.pos - digits_start) % 2 != 0 {
            return Err(self.error("odd-length hex literal", token_start));
        }
        Ok(())
    }

    fn number(&mut self, token_start: usize) -> Result<(), LexError> {
        self.eat_while(|b| b.is_ascii_digit());
        if self.peek(0).is_some_and(is_ident_byte) {
            return Err(self.error("invalid number literal", token_start));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Literal helpers
// ---------------------------------------------------------------------------

/// Bytes of a `Hex` or `Raw` token's text (`0x..` or `@0x..`).
///
/// The lexer guarantees an even number of valid digits.
pub fn hex_literal_bytes(text: &str) -> Vec<u8> {
    let digits = text.trim_start_matches('@');
    let digits = &digits[2.min(digits.len())..];
    crate::hex::decode(digits).unwrap_or_default()
}

/// Contents of a `String` token's text without the quotes.
pub fn string_literal_contents(text: &str) -> &str {
    if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        ""
    }
}

/// Identifier of a `Variable` token's text without the sigil.
pub fn variable_name(text: &str) -> &str {
    text.strip_prefix('$').unwrap_or(text)
}
