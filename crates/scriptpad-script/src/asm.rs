#![forbid(unsafe_code)]

//! Assembly text: assembler and canonical disassembler.
//!
//! # Grammar
//!
//! Whitespace-separated items:
//!
//! - opcode names (`OP_DUP`, `dup`, `OP_UNKNOWN_0xba`)
//! - decimal numbers, encoded as script numbers (`5`, `-1`, `1000`)
//! - hex literals pushed as data (`0x0102`)
//! - string literals pushed as UTF-8 data (`'hello'`)
//! - `$variables` pushed as their bound bytes
//! - raw literals copied verbatim (`@0x76a9`)
//! - explicit pushes `OP_PUSHDATA1 0x..` (also `2` and `4`)
//!
//! `#` comments run to the end of the line.
//!
//! [`disassemble`] only emits items from this grammar, so every byte string
//! survives a disassemble/assemble round trip unchanged.

use std::fmt;

use crate::hex;
use crate::lex::{self, Dialect, LexError, Token, TokenKind};
use crate::opcodes;
use crate::script::{Instruction, Script, ScriptBuilder};
use crate::variables::VariableResolver;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A rejected assembly or TxScript source, with a 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl ParseError {
    /// Build an error positioned at a byte offset of `source`.
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let offset = offset.min(source.len());
        let before = source.get(..offset).unwrap_or(source);
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let col = before[line_start..].chars().count() + 1;
        Self {
            message: message.into(),
            line,
            col,
        }
    }

    pub(crate) fn from_lex(source: &str, err: LexError) -> Self {
        Self::at(source, err.offset, err.message)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {}, column {})", self.message, self.line, self.col)
    }
}

impl std::error::Error for ParseError {}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

/// Assemble `source` into a script.
pub fn assemble(source: &str, vars: &dyn VariableResolver) -> Result<Script, ParseError> {
    let tokens = lex::tokenize(source, Dialect::Asm)
        .map_err(|e| ParseError::from_lex(source, e))?;
    let mut items = tokens
        .iter()
        .filter(|t| !matches!(t.kind, TokenKind::Comment | TokenKind::Newline));

    let mut builder = ScriptBuilder::new();
    while let Some(token) = items.next() {
        let text = token.text(source);
        match token.kind {
            TokenKind::Word => {
                let opcode = opcodes::from_name(text).ok_or_else(|| {
                    ParseError::at(source, token.range.start, format!("unknown opcode '{text}'"))
                })?;
                if opcodes::is_pushdata(opcode) {
                    let operand = items.next().ok_or_else(|| {
                        ParseError::at(
                            source,
                            token.range.end,
                            format!("{} requires a data operand", opcodes::display_name(opcode)),
                        )
                    })?;
                    let data = push_data(source, operand, vars)?;
                    builder
                        .push_pushdata(opcode, &data)
                        .map_err(|e| ParseError::at(source, operand.range.start, e.to_string()))?;
                } else {
                    builder.push_opcode(opcode);
                }
            }
            TokenKind::Number => {
                let value: i64 = text.parse().map_err(|_| {
                    ParseError::at(source, token.range.start, format!("number out of range: {text}"))
                })?;
                builder.push_int(value);
            }
            TokenKind::Raw => {
                builder.push_raw(&lex::hex_literal_bytes(text));
            }
            TokenKind::Hex | TokenKind::String | TokenKind::Variable => {
                let data = push_data(source, token, vars)?;
                builder.push_slice(&data);
            }
            TokenKind::Operator | TokenKind::Delimiter => {
                return Err(ParseError::at(
                    source,
                    token.range.start,
                    format!("unexpected '{text}'"),
                ));
            }
            TokenKind::Comment | TokenKind::Newline => {}
        }
    }

    Ok(builder.into_script())
}

/// Bytes carried by a data-valued token.
fn push_data(
    source: &str,
    token: &Token,
    vars: &dyn VariableResolver,
) -> Result<Vec<u8>, ParseError> {
    let text = token.text(source);
    match token.kind {
        TokenKind::Hex => Ok(lex::hex_literal_bytes(text)),
        TokenKind::String => Ok(lex::string_literal_contents(text).as_bytes().to_vec()),
        TokenKind::Variable => {
            let name = lex::variable_name(text);
            vars.resolve(name).ok_or_else(|| {
                ParseError::at(source, token.range.start, format!("undefined variable '{name}'"))
            })
        }
        _ => Err(ParseError::at(
            source,
            token.range.start,
            format!("expected push data, found '{text}'"),
        )),
    }
}

// ---------------------------------------------------------------------------
// Disassembler
// ---------------------------------------------------------------------------

/// Canonical assembly for `script`.
#[must_use]
pub fn disassemble(script: &Script) -> String {
    let bytes = script.as_bytes();
    let mut items: Vec<String> = Vec::new();

    for next in script.instructions() {
        match next {
            Ok(Instruction::Op(opcode)) => items.push(opcodes::display_name(opcode)),
            Ok(Instruction::Push { opcode, data }) => {
                if opcode == opcodes::OP_0 {
                    items.push(opcodes::display_name(opcode));
                } else if opcodes::is_pushdata(opcode) {
                    items.push(format!(
                        "{} 0x{}",
                        opcodes::display_name(opcode),
                        hex::encode(data)
                    ));
                } else {
                    items.push(format!("0x{}", hex::encode(data)));
                }
            }
            Err(truncated) => {
                items.push(format!("@0x{}", hex::encode(&bytes[truncated.offset..])));
            }
        }
    }

    items.join(" ")
}
