#![forbid(unsafe_code)]

//! Block highlighting from a [`SpanIndex`].
//!
//! A block is any contiguous slice of the document (the editor uses lines)
//! together with its character offset in the full text. Span offsets are
//! absolute, so the same index serves every block.

use scriptpad_script::VariableResolver;
use tracing::trace;

use crate::span::{Span, SpanIndex};
use crate::style::Style;
use crate::stylesheet::{StyleKey, StyleSheet};

// ---------------------------------------------------------------------------
// Directives
// ---------------------------------------------------------------------------

/// Style `len` characters from block-local `start`.
///
/// `len` is not clipped to the block; a span running past the end of the
/// block produces a directive that does too. `key: None` means default text
/// style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightDirective {
    pub start: usize,
    pub len: usize,
    pub key: Option<StyleKey>,
}

impl HighlightDirective {
    /// Block-local end, unclipped.
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Directives for the spans touching one block, in span order.
///
/// Variable spans are widened one character to the left to cover the `$`
/// sigil, and are only given [`StyleKey::Variables`] when `vars` defines
/// the name. A span that starts before the block starts at local 0.
pub fn render_block(
    block: &str,
    block_offset: usize,
    spans: &SpanIndex,
    vars: &dyn VariableResolver,
) -> Vec<HighlightDirective> {
    let block_len = block.chars().count();
    let block_end = block_offset + block_len;

    spans
        .iter()
        .filter_map(|span| {
            let is_variable = span.match_type.is_variable();
            let start = if is_variable {
                span.start.saturating_sub(1)
            } else {
                span.start
            };
            if span.end <= block_offset || start >= block_end {
                return None;
            }

            let local_start = start.saturating_sub(block_offset);
            let len = span.end - block_offset - local_start;
            let key = if is_variable {
                let name = variable_name(block, block_offset, block_len, span);
                vars.is_defined(name.trim()).then_some(StyleKey::Variables)
            } else {
                Some(StyleKey::for_match_type(&span.match_type))
            };

            Some(HighlightDirective {
                start: local_start,
                len,
                key,
            })
        })
        .collect()
}

/// Name for the defined-variable check: read from the block when the span
/// lies inside it, otherwise the span's recorded value.
fn variable_name(block: &str, block_offset: usize, block_len: usize, span: &Span) -> String {
    if span.start >= block_offset && span.end <= block_offset + block_len {
        block
            .chars()
            .skip(span.start - block_offset)
            .take(span.len())
            .collect()
    } else {
        span.value.clone()
    }
}

// ---------------------------------------------------------------------------
// Styled runs
// ---------------------------------------------------------------------------

/// A maximal run of equally styled text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub style: Style,
}

/// Resolves directives against a [`StyleSheet`].
#[derive(Debug, Clone)]
pub struct Highlighter {
    sheet: StyleSheet,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(StyleSheet::dark())
    }
}

impl Highlighter {
    pub fn new(sheet: StyleSheet) -> Self {
        Self { sheet }
    }

    pub fn stylesheet(&self) -> &StyleSheet {
        &self.sheet
    }

    pub fn set_stylesheet(&mut self, sheet: StyleSheet) {
        self.sheet = sheet;
    }

    /// See [`render_block`].
    pub fn directives(
        &self,
        block: &str,
        block_offset: usize,
        spans: &SpanIndex,
        vars: &dyn VariableResolver,
    ) -> Vec<HighlightDirective> {
        render_block(block, block_offset, spans, vars)
    }

    /// Styled runs covering `block` exactly.
    ///
    /// Directives are applied in order and clipped to the block; where they
    /// overlap the last one wins.
    pub fn highlight_block(
        &self,
        block: &str,
        block_offset: usize,
        spans: &SpanIndex,
        vars: &dyn VariableResolver,
    ) -> Vec<StyledRun> {
        let chars: Vec<char> = block.chars().collect();
        let mut styles = vec![Style::default(); chars.len()];

        for directive in render_block(block, block_offset, spans, vars) {
            let style = directive
                .key
                .map(|key| self.sheet.style_for(key))
                .unwrap_or_default();
            let end = directive.end().min(chars.len());
            for slot in styles.iter_mut().take(end).skip(directive.start) {
                *slot = style;
            }
        }

        let mut runs: Vec<StyledRun> = Vec::new();
        for (ch, style) in chars.into_iter().zip(styles) {
            match runs.last_mut() {
                Some(run) if run.style == style => run.text.push(ch),
                _ => runs.push(StyledRun {
                    text: ch.to_string(),
                    style,
                }),
            }
        }
        runs
    }

    /// Highlight every line of `text`. Line breaks are not part of any run.
    pub fn highlight_document(
        &self,
        text: &str,
        spans: &SpanIndex,
        vars: &dyn VariableResolver,
    ) -> Vec<Vec<StyledRun>> {
        let mut offset = 0;
        let mut lines = Vec::new();
        for line in text.split('\n') {
            lines.push(self.highlight_block(line, offset, spans, vars));
            offset += line.chars().count() + 1;
        }
        trace!(lines = lines.len(), spans = spans.len(), "document highlighted");
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::MatchType;
    use scriptpad_script::{NoVariables, VariableTable};

    fn vars_with(names: &[&str]) -> VariableTable {
        let mut vars = VariableTable::new();
        for name in names {
            vars.define(*name, vec![0x01]);
        }
        vars
    }

    fn index(spans: Vec<Span>) -> SpanIndex {
        SpanIndex::from_spans(spans)
    }

    // -- Directives ---------------------------------------------------------

    #[test]
    fn variable_is_widened_over_sigil() {
        let text = "..$abc...";
        let spans = index(vec![Span::new(3, 6, "abc", MatchType::Variable)]);
        let vars = vars_with(&["abc"]);
        assert_eq!(
            render_block(text, 0, &spans, &vars),
            vec![HighlightDirective {
                start: 2,
                len: 4,
                key: Some(StyleKey::Variables)
            }]
        );
    }

    #[test]
    fn undefined_variable_has_no_key() {
        let spans = index(vec![Span::new(3, 6, "abc", MatchType::Variable)]);
        let directives = render_block("..$abc...", 0, &spans, &NoVariables);
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].key, None);
        assert_eq!((directives[0].start, directives[0].len), (2, 4));
    }

    #[test]
    fn defined_check_reads_block_text() {
        // The recorded value is stale; the block text decides.
        let spans = index(vec![Span::new(1, 4, "old", MatchType::Variable)]);
        let vars = vars_with(&["new"]);
        let directives = render_block("$new", 0, &spans, &vars);
        assert_eq!(directives[0].key, Some(StyleKey::Variables));
    }

    #[test]
    fn spans_are_translated_to_block_coordinates() {
        let spans = index(vec![
            Span::new(0, 6, "OP_DUP", MatchType::keyword("opcode")),
            Span::new(7, 13, "OP_ADD", MatchType::keyword("opcode")),
        ]);
        // Second line starts at offset 7.
        let directives = render_block("OP_ADD", 7, &spans, &NoVariables);
        assert_eq!(
            directives,
            vec![HighlightDirective {
                start: 0,
                len: 6,
                key: Some(StyleKey::Keywords)
            }]
        );
    }

    #[test]
    fn span_past_block_end_is_not_clipped() {
        let spans = index(vec![Span::new(2, 20, "x", MatchType::Comment)]);
        let directives = render_block("abcd", 0, &spans, &NoVariables);
        assert_eq!((directives[0].start, directives[0].len), (2, 18));
    }

    #[test]
    fn span_before_block_starts_at_zero() {
        let spans = index(vec![Span::new(2, 12, "x", MatchType::Comment)]);
        let directives = render_block("abcd", 10, &spans, &NoVariables);
        assert_eq!((directives[0].start, directives[0].len), (0, 2));
    }

    #[test]
    fn sigil_at_block_start_belongs_to_block() {
        // `$` at offset 10 is the first character of the block.
        let spans = index(vec![Span::new(11, 13, "ab", MatchType::Variable)]);
        let directives = render_block("$ab", 10, &spans, &vars_with(&["ab"]));
        assert_eq!((directives[0].start, directives[0].len), (0, 3));
    }

    #[test]
    fn spans_outside_block_are_skipped() {
        let spans = index(vec![
            Span::new(0, 3, "a", MatchType::Comment),
            Span::new(10, 12, "b", MatchType::Comment),
        ]);
        assert!(render_block("xyz", 4, &spans, &NoVariables).is_empty());
    }

    // -- Runs ---------------------------------------------------------------

    #[test]
    fn highlight_block_runs() {
        let hl = Highlighter::default();
        let spans = index(vec![Span::new(0, 6, "OP_DUP", MatchType::keyword("opcode"))]);
        let runs = hl.highlight_block("OP_DUP 5", 0, &spans, &NoVariables);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "OP_DUP");
        assert_eq!(runs[0].style, hl.stylesheet().style_for(StyleKey::Keywords));
        assert_eq!(runs[1].text, " 5");
        assert!(runs[1].style.is_empty());
    }

    #[test]
    fn last_directive_wins() {
        let hl = Highlighter::default();
        let spans = index(vec![
            Span::new(0, 4, "c", MatchType::Comment),
            Span::new(1, 3, "s", MatchType::StringLiteral),
        ]);
        let runs = hl.highlight_block("abcd", 0, &spans, &NoVariables);
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "bc", "d"]);
        assert_eq!(runs[1].style, hl.stylesheet().style_for(StyleKey::Strings));
    }

    #[test]
    fn undefined_variable_resets_style() {
        let hl = Highlighter::default();
        let spans = index(vec![
            Span::new(0, 5, "c", MatchType::Comment),
            Span::new(2, 4, "ab", MatchType::Variable),
        ]);
        let runs = hl.highlight_block("x$ab ", 0, &spans, &NoVariables);
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["x", "$ab", " "]);
        assert!(runs[1].style.is_empty());
    }

    #[test]
    fn highlight_document_by_lines() {
        let hl = Highlighter::default();
        let text = "OP_1\n'x'";
        let spans = index(vec![
            Span::new(0, 4, "OP_1", MatchType::keyword("opcode")),
            Span::new(5, 8, "x", MatchType::StringLiteral),
        ]);
        let lines = hl.highlight_document(text, &spans, &NoVariables);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1][0].text, "'x'");
        assert_eq!(lines[1][0].style, hl.stylesheet().style_for(StyleKey::Strings));
    }

    #[test]
    fn empty_block_has_no_runs() {
        let hl = Highlighter::default();
        assert!(hl.highlight_block("", 0, &SpanIndex::empty(), &NoVariables).is_empty());
    }
}
