#![forbid(unsafe_code)]

//! Classified spans over the document text and the index that holds them.
//!
//! Offsets are character offsets into the *whole* document. A [`SpanIndex`]
//! is never patched: every text or format change builds a new one.

use std::fmt;
use std::sync::Arc;

use scriptpad_script::Format;
use tracing::{debug, trace};

use crate::classify::{ClassifierRegistry, ClassifyError};

// ---------------------------------------------------------------------------
// Match types
// ---------------------------------------------------------------------------

/// Classification label of a span.
///
/// `Keyword`, `Conditional` and `BooleanOperator` are families: the optional
/// sub-kind is appended to the label as `Keyword:opcode`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchType {
    Variable,
    StringLiteral,
    Comment,
    TypeName,
    Keyword(Option<String>),
    Conditional(Option<String>),
    BooleanOperator(Option<String>),
}

impl MatchType {
    /// Keyword family member with a sub-kind.
    pub fn keyword(sub: &str) -> Self {
        Self::Keyword(Some(sub.to_string()))
    }

    /// Conditional family member with a sub-kind.
    pub fn conditional(sub: &str) -> Self {
        Self::Conditional(Some(sub.to_string()))
    }

    /// Label without the sub-kind.
    #[must_use]
    pub fn family(&self) -> &'static str {
        match self {
            Self::Variable => "Variable",
            Self::StringLiteral => "String literal",
            Self::Comment => "Comment",
            Self::TypeName => "Type name",
            Self::Keyword(_) => "Keyword",
            Self::Conditional(_) => "Conditional",
            Self::BooleanOperator(_) => "Boolean operator",
        }
    }

    /// Sub-kind of a family member, if any.
    pub fn sub_kind(&self) -> Option<&str> {
        match self {
            Self::Keyword(sub) | Self::Conditional(sub) | Self::BooleanOperator(sub) => {
                sub.as_deref()
            }
            _ => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable)
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.family())?;
        if let Some(sub) = self.sub_kind() {
            write!(f, ":{sub}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Span
// ---------------------------------------------------------------------------

/// A classified substring: half-open character range `[start, end)`.
///
/// For variables the range excludes the `$` sigil and `value` is the bare
/// name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub value: String,
    pub match_type: MatchType,
}

impl Span {
    pub fn new(start: usize, end: usize, value: impl Into<String>, match_type: MatchType) -> Self {
        debug_assert!(start < end, "span must be non-empty");
        Self {
            start,
            end,
            value: value.into(),
            match_type,
        }
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

// ---------------------------------------------------------------------------
// SpanIndex
// ---------------------------------------------------------------------------

/// Immutable, cheaply cloned list of spans for one version of the text.
///
/// Overlaps are not rejected; consumers apply spans in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanIndex {
    spans: Arc<[Span]>,
}

impl SpanIndex {
    /// The index used when there is nothing to classify or parsing failed.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_spans(spans: Vec<Span>) -> Self {
        Self {
            spans: spans.into(),
        }
    }

    /// Classify `text` in `format`.
    ///
    /// Never fails: a classifier error yields an empty index and is
    /// returned alongside it. Formats without a classifier (hex) yield an
    /// empty index and no error.
    pub fn build(
        text: &str,
        format: Format,
        registry: &ClassifierRegistry,
    ) -> (Self, Option<ClassifyError>) {
        if text.is_empty() {
            return (Self::empty(), None);
        }
        let Some(classifier) = registry.for_format(format) else {
            trace!(%format, "no classifier registered");
            return (Self::empty(), None);
        };

        match classifier.classify(text) {
            Ok(spans) => {
                trace!(
                    classifier = classifier.name(),
                    spans = spans.len(),
                    "span index rebuilt"
                );
                (Self::from_spans(spans), None)
            }
            Err(err) => {
                debug!(
                    classifier = err.classifier,
                    offset = err.offset,
                    error = %err.message,
                    "classification failed; highlighting disabled"
                );
                (Self::empty(), Some(err))
            }
        }
    }

    /// First span containing `index`.
    pub fn span_at(&self, index: usize) -> Option<&Span> {
        self.spans.iter().find(|s| s.contains(index))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.spans.iter()
    }

    pub fn as_slice(&self) -> &[Span] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

impl<'a> IntoIterator for &'a SpanIndex {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn labels() {
        assert_eq!(MatchType::Variable.to_string(), "Variable");
        assert_eq!(MatchType::StringLiteral.to_string(), "String literal");
        assert_eq!(MatchType::keyword("opcode").to_string(), "Keyword:opcode");
        assert_eq!(MatchType::BooleanOperator(None).to_string(), "Boolean operator");
    }

    #[test]
    fn span_contains_is_half_open() {
        let span = Span::new(5, 10, "foo", MatchType::Comment);
        assert!(!span.contains(4));
        assert!(span.contains(5));
        assert!(span.contains(9));
        assert!(!span.contains(10));
        assert_eq!(span.len(), 5);
    }

    #[test]
    fn span_at_returns_first_match() {
        let index = SpanIndex::from_spans(vec![
            Span::new(0, 10, "outer", MatchType::Comment),
            Span::new(2, 4, "inner", MatchType::Variable),
        ]);
        assert_eq!(index.span_at(3).map(|s| s.value.as_str()), Some("outer"));
        assert!(index.span_at(10).is_none());
    }

    #[test]
    fn clones_share_storage() {
        let index = SpanIndex::from_spans(vec![Span::new(0, 1, "x", MatchType::Comment)]);
        let copy = index.clone();
        assert!(std::ptr::eq(index.as_slice(), copy.as_slice()));
    }

    #[test]
    fn build_hex_is_empty() {
        let registry = ClassifierRegistry::with_defaults();
        let (index, err) = SpanIndex::build("76a9", Format::Hex, &registry);
        assert!(index.is_empty());
        assert!(err.is_none());
    }

    #[test]
    fn build_empty_text() {
        let registry = ClassifierRegistry::with_defaults();
        let (index, err) = SpanIndex::build("", Format::Asm, &registry);
        assert!(index.is_empty());
        assert!(err.is_none());
    }

    #[test]
    fn build_swallows_parse_failure() {
        let registry = ClassifierRegistry::with_defaults();
        let (index, err) = SpanIndex::build("PUSH $", Format::Asm, &registry);
        assert!(index.is_empty());
        assert!(err.is_some());
    }

    #[test]
    fn build_classifies_assembly() {
        let registry = ClassifierRegistry::with_defaults();
        let (index, err) = SpanIndex::build("OP_DUP # hi", Format::Asm, &registry);
        assert!(err.is_none());
        assert_eq!(index.len(), 2);
    }

    #[test]
    #[traced_test]
    fn parse_failure_is_logged_at_debug() {
        let registry = ClassifierRegistry::with_defaults();
        let (index, _) = SpanIndex::build("verify = 1", Format::TxScript, &registry);
        assert!(index.is_empty());
        assert!(logs_contain("classification failed"));
        assert!(logs_contain("TxScript"));
    }
}
