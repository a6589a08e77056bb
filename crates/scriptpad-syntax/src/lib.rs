#![forbid(unsafe_code)]

//! Syntax support for the scriptpad editor.
//!
//! Text is classified into [`Span`]s by a per-format [`Classifier`]; the
//! resulting [`SpanIndex`] drives both block highlighting and tooltips.
//!
//! # Example
//!
//! ```
//! use scriptpad_script::{Format, NoVariables};
//! use scriptpad_syntax::{ClassifierRegistry, SpanIndex, tooltip_at};
//!
//! let registry = ClassifierRegistry::with_defaults();
//! let text = "OP_DUP OP_HASH160";
//! let (spans, err) = SpanIndex::build(text, Format::Asm, &registry);
//! assert!(err.is_none());
//! assert_eq!(
//!     tooltip_at(&spans, text.len(), 8).as_deref(),
//!     Some("OP_HASH160 (Keyword:opcode)")
//! );
//! ```

pub mod ansi;
pub mod classify;
pub mod highlight;
pub mod span;
pub mod style;
pub mod stylesheet;
pub mod tooltip;

pub use classify::{AsmClassifier, Classifier, ClassifierRegistry, ClassifyError, TxScriptClassifier};
pub use highlight::{HighlightDirective, Highlighter, StyledRun, render_block};
pub use span::{MatchType, Span, SpanIndex};
pub use style::{ColorParseError, Rgb, Style, StyleFlags};
pub use stylesheet::{StyleKey, StyleSheet};
pub use tooltip::tooltip_at;
