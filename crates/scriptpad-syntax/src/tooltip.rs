#![forbid(unsafe_code)]

//! Hover text for a character position.

use crate::span::SpanIndex;

/// Tooltip `"{value} ({match_type})"` for character `index`, or `None`
/// when no span contains it.
///
/// `text_len` is the document length in characters; indices past it never
/// match, even against stale spans.
pub fn tooltip_at(spans: &SpanIndex, text_len: usize, index: usize) -> Option<String> {
    if index > text_len {
        return None;
    }
    spans
        .span_at(index)
        .map(|span| format!("{} ({})", span.value, span.match_type))
}
