#![forbid(unsafe_code)]

//! Script editor core.
//!
//! [`ScriptDocument`] ties the text of one script to its compiled form, its
//! span index and its highlighting. Everything a UI needs is a plain method
//! call: feed it edits, ask it for directives, tooltips or converted text.
//!
//! # Example
//!
//! ```
//! use scriptpad::{Format, ScriptDocument};
//!
//! let mut doc = ScriptDocument::with_text(Format::Asm, "OP_DUP OP_HASH160");
//! assert_eq!(doc.tooltip_at(0).as_deref(), Some("OP_DUP (Keyword:opcode)"));
//! assert_eq!(doc.hex().unwrap(), "76a9");
//!
//! doc.set_format(Format::Hex).unwrap();
//! assert_eq!(doc.text(), "76a9");
//! ```

pub mod cli;
pub mod config;
pub mod document;
pub mod logging;

pub use config::{EditorConfig, ThemeChoice};
pub use document::{DocumentState, FormatSwitch, ScriptDocument};

pub use scriptpad_script::{ConvertError, Format, Script, VariableResolver, VariableTable};
pub use scriptpad_syntax::{HighlightDirective, Span, SpanIndex, StyleKey, StyledRun};
