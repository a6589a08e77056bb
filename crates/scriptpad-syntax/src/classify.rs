#![forbid(unsafe_code)]

//! Classifiers turn source text into spans, one classifier per format.
//!
//! Classification is lexical: it needs no variable definitions and never
//! assembles the script, so undefined names still get spans. Any lexical
//! error fails the whole text.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use scriptpad_script::lex::{self, Dialect, LexError, Token, TokenKind};
use scriptpad_script::opcodes::{self, OpcodeClass};
use scriptpad_script::txscript::{self, WordClass};
use scriptpad_script::Format;

use crate::span::{MatchType, Span};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A classifier rejected the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyError {
    /// Name of the classifier that failed.
    pub classifier: &'static str,
    pub message: String,
    /// Character offset of the failure.
    pub offset: usize,
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} classifier: {} at offset {}",
            self.classifier, self.message, self.offset
        )
    }
}

impl std::error::Error for ClassifyError {}

// ---------------------------------------------------------------------------
// Classifier trait
// ---------------------------------------------------------------------------

/// Produces spans for a whole document in one format.
pub trait Classifier: Send + Sync {
    /// Human-readable name (e.g. "ASM").
    fn name(&self) -> &'static str;

    /// The format this classifier understands.
    fn format(&self) -> Format;

    /// Classify the full text. Offsets in the result are character offsets.
    fn classify(&self, text: &str) -> Result<Vec<Span>, ClassifyError>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Classifiers keyed by format.
#[derive(Default, Clone)]
pub struct ClassifierRegistry {
    classifiers: Vec<Arc<dyn Classifier>>,
    by_format: HashMap<Format, usize>,
}

impl ClassifierRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the assembly and TxScript classifiers.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(AsmClassifier));
        registry.register(Box::new(TxScriptClassifier));
        registry
    }

    /// Register a classifier. A later registration for the same format
    /// replaces the earlier one.
    pub fn register(&mut self, classifier: Box<dyn Classifier>) {
        let classifier: Arc<dyn Classifier> = Arc::from(classifier);
        let index = self.classifiers.len();
        self.by_format.insert(classifier.format(), index);
        self.classifiers.push(classifier);
    }

    pub fn for_format(&self, format: Format) -> Option<&dyn Classifier> {
        let index = self.by_format.get(&format)?;
        self.classifiers.get(*index).map(AsRef::as_ref)
    }

    /// Number of formats with a classifier.
    pub fn len(&self) -> usize {
        self.by_format.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_format.is_empty()
    }

    /// Names of the active classifiers.
    pub fn names(&self) -> Vec<&str> {
        let mut active: Vec<usize> = self.by_format.values().copied().collect();
        active.sort_unstable();
        active
            .into_iter()
            .map(|i| self.classifiers[i].name())
            .collect()
    }
}

impl fmt::Debug for ClassifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierRegistry")
            .field("classifiers", &self.names())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Offsets
// ---------------------------------------------------------------------------

/// Byte offset to character offset conversion for one text.
struct CharOffsets {
    /// `None` when the text is ASCII and offsets coincide.
    table: Option<Vec<usize>>,
}

impl CharOffsets {
    fn new(text: &str) -> Self {
        if text.is_ascii() {
            return Self { table: None };
        }
        let mut table = vec![0; text.len() + 1];
        let mut chars = 0;
        for (byte, ch) in text.char_indices() {
            for slot in &mut table[byte..byte + ch.len_utf8()] {
                *slot = chars;
            }
            chars += 1;
        }
        table[text.len()] = chars;
        Self { table: Some(table) }
    }

    fn char_at(&self, byte: usize) -> usize {
        match &self.table {
            None => byte,
            Some(table) => table[byte.min(table.len() - 1)],
        }
    }
}

/// Shared span construction for both dialects.
struct SpanSink<'a> {
    text: &'a str,
    offsets: CharOffsets,
    spans: Vec<Span>,
}

impl<'a> SpanSink<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            offsets: CharOffsets::new(text),
            spans: Vec::new(),
        }
    }

    fn error(&self, classifier: &'static str, err: LexError) -> ClassifyError {
        ClassifyError {
            classifier,
            message: err.message,
            offset: self.offsets.char_at(err.offset),
        }
    }

    fn push(&mut self, byte_start: usize, byte_end: usize, value: String, match_type: MatchType) {
        let start = self.offsets.char_at(byte_start);
        let end = self.offsets.char_at(byte_end);
        if start < end {
            self.spans.push(Span::new(start, end, value, match_type));
        }
    }

    /// Spans common to both dialects. Returns false for tokens left to the
    /// dialect.
    fn common(&mut self, token: &Token) -> bool {
        let text = token.text(self.text);
        match token.kind {
            TokenKind::Variable => {
                // The recorded span excludes the sigil.
                self.push(
                    token.range.start + 1,
                    token.range.end,
                    lex::variable_name(text).to_string(),
                    MatchType::Variable,
                );
            }
            TokenKind::String => self.push(
                token.range.start,
                token.range.end,
                lex::string_literal_contents(text).to_string(),
                MatchType::StringLiteral,
            ),
            TokenKind::Comment => self.push(
                token.range.start,
                token.range.end,
                text.trim_start_matches('#').trim().to_string(),
                MatchType::Comment,
            ),
            _ => return false,
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Classifier for assembly text.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsmClassifier;

impl Classifier for AsmClassifier {
    fn name(&self) -> &'static str {
        "ASM"
    }

    fn format(&self) -> Format {
        Format::Asm
    }

    fn classify(&self, text: &str) -> Result<Vec<Span>, ClassifyError> {
        let mut sink = SpanSink::new(text);
        let tokens = lex::tokenize(text, Dialect::Asm).map_err(|e| sink.error(self.name(), e))?;

        for token in &tokens {
            if sink.common(token) || token.kind != TokenKind::Word {
                continue;
            }
            let Some(byte) = opcodes::from_name(token.text(text)) else {
                continue;
            };
            let match_type = match opcodes::class_of(byte) {
                OpcodeClass::FlowControl => MatchType::conditional("flow"),
                OpcodeClass::Boolean => MatchType::BooleanOperator(None),
                OpcodeClass::Other => MatchType::keyword("opcode"),
            };
            sink.push(
                token.range.start,
                token.range.end,
                opcodes::display_name(byte),
                match_type,
            );
        }

        Ok(sink.spans)
    }
}

// ---------------------------------------------------------------------------
// TxScript
// ---------------------------------------------------------------------------

/// Classifier for TxScript text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TxScriptClassifier;

impl Classifier for TxScriptClassifier {
    fn name(&self) -> &'static str {
        "TxScript"
    }

    fn format(&self) -> Format {
        Format::TxScript
    }

    fn classify(&self, text: &str) -> Result<Vec<Span>, ClassifyError> {
        let mut sink = SpanSink::new(text);
        let tokens =
            lex::tokenize(text, Dialect::TxScript).map_err(|e| sink.error(self.name(), e))?;

        for token in &tokens {
            if sink.common(token) || token.kind != TokenKind::Word {
                continue;
            }
            let word = token.text(text);
            let match_type = match txscript::word_class(word) {
                Some(WordClass::Statement) => MatchType::keyword("statement"),
                Some(WordClass::Builtin) => MatchType::keyword("builtin"),
                Some(WordClass::Constant) => MatchType::keyword("constant"),
                Some(WordClass::Conditional) => MatchType::Conditional(None),
                Some(WordClass::Boolean) => MatchType::BooleanOperator(None),
                Some(WordClass::TypeName) => MatchType::TypeName,
                None => continue,
            };
            sink.push(token.range.start, token.range.end, word.to_string(), match_type);
        }

        Ok(sink.spans)
    }
}
