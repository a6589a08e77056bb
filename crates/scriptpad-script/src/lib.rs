#![forbid(unsafe_code)]

//! Canonical script model for scriptpad.
//!
//! A [`Script`] is the byte form every editor format converts through:
//!
//! - [`hex`]: strict hex codec
//! - [`asm`]: assembler and lossless disassembler
//! - [`txscript`]: one-way compiler for the high-level language
//! - [`format`]: the conversion gateway tying them together
//!
//! # Example
//!
//! ```
//! use scriptpad_script::{Format, NoVariables, from_canonical, to_canonical};
//!
//! let script = to_canonical("OP_DUP OP_HASH160", Format::Asm, &NoVariables).unwrap();
//! assert_eq!(from_canonical(&script, Format::Hex).unwrap(), "76a9");
//! ```

pub mod asm;
pub mod format;
pub mod hex;
pub mod lex;
pub mod opcodes;
pub mod script;
pub mod txscript;
pub mod variables;

pub use asm::ParseError;
pub use format::{ConvertError, Format, UnknownFormat, from_canonical, to_canonical};
pub use hex::HexError;
pub use script::{Instruction, Script, ScriptBuilder};
pub use variables::{NoVariables, VariableResolver, VariableTable};
