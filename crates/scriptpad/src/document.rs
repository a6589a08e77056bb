#![forbid(unsafe_code)]

//! The editable script document.
//!
//! # State machine
//!
//! ```text
//!            on_text_changed / paste / variables changed
//!   Clean ─────────────────────────────────────────────▶ Dirty
//!     ▲                                                   │
//!     └──────────── compile (explicit, or on read) ───────┘
//! ```
//!
//! Text edits only rebuild the [`SpanIndex`]; converting the text to a
//! [`Script`] is deferred until something reads the document in a format,
//! so any number of edits between two reads costs a single compile.

use scriptpad_script::{
    ConvertError, Format, Script, VariableTable, from_canonical, to_canonical,
};
use scriptpad_syntax::{
    ClassifierRegistry, ClassifyError, HighlightDirective, Highlighter, SpanIndex, StyleSheet,
    StyledRun, tooltip_at,
};
use tracing::{debug, info};

/// Whether the compiled script reflects the current text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// The compiled script matches the text.
    Clean,
    /// The text changed since the last compile.
    Dirty,
}

/// How [`ScriptDocument::set_format`] produced the new text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSwitch {
    /// The script was re-rendered in the new format.
    Converted,
    /// The new format is input-only, so the text was cleared instead. The
    /// error says why no rendering was possible.
    Cleared(ConvertError),
}

/// A script being edited in one of the text formats.
#[derive(Debug, Clone)]
pub struct ScriptDocument {
    text: String,
    format: Format,
    spans: SpanIndex,
    classify_error: Option<ClassifyError>,
    compiled: Result<Script, ConvertError>,
    state: DocumentState,
    compile_count: u64,
    rehighlight: bool,
    vars: VariableTable,
    registry: ClassifierRegistry,
    highlighter: Highlighter,
}

impl Default for ScriptDocument {
    fn default() -> Self {
        Self::new(Format::default())
    }
}

impl ScriptDocument {
    /// An empty document in `format`. Nothing has been compiled yet, so the
    /// document starts dirty.
    pub fn new(format: Format) -> Self {
        Self {
            text: String::new(),
            format,
            spans: SpanIndex::empty(),
            classify_error: None,
            compiled: Ok(Script::default()),
            state: DocumentState::Dirty,
            compile_count: 0,
            rehighlight: false,
            vars: VariableTable::new(),
            registry: ClassifierRegistry::with_defaults(),
            highlighter: Highlighter::default(),
        }
    }

    /// A document holding `text` in `format`.
    pub fn with_text(format: Format, text: impl Into<String>) -> Self {
        let mut doc = Self::new(format);
        doc.on_text_changed(text);
        doc
    }

    #[must_use]
    pub fn with_highlighter(mut self, highlighter: Highlighter) -> Self {
        self.highlighter = highlighter;
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: ClassifierRegistry) -> Self {
        self.registry = registry;
        self.rebuild_spans();
        self
    }

    // -- Accessors ---------------------------------------------------------

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn spans(&self) -> &SpanIndex {
        &self.spans
    }

    /// Why the current text could not be classified, if it could not.
    pub fn classify_error(&self) -> Option<&ClassifyError> {
        self.classify_error.as_ref()
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    /// Number of compiles run so far.
    pub fn compile_count(&self) -> u64 {
        self.compile_count
    }

    pub fn variables(&self) -> &VariableTable {
        &self.vars
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    // -- Editing -----------------------------------------------------------

    /// Replace the text. Spans are rebuilt immediately; compiling waits for
    /// the next read.
    pub fn on_text_changed(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.rebuild_spans();
        self.state = DocumentState::Dirty;
    }

    /// Insert `fragment` at character index `at` (clamped to the end of the
    /// text) and request a re-highlight.
    pub fn paste(&mut self, at: usize, fragment: &str) {
        let byte = self
            .text
            .char_indices()
            .nth(at)
            .map_or(self.text.len(), |(i, _)| i);
        let mut text = String::with_capacity(self.text.len() + fragment.len());
        text.push_str(&self.text[..byte]);
        text.push_str(fragment);
        text.push_str(&self.text[byte..]);
        self.on_text_changed(text);
        self.rehighlight = true;
    }

    /// Whether a full re-highlight was requested since the last call.
    pub fn take_rehighlight(&mut self) -> bool {
        std::mem::take(&mut self.rehighlight)
    }

    /// Replace the variable definitions. Variable colouring and compiled
    /// output both depend on them.
    pub fn set_variables(&mut self, vars: VariableTable) {
        self.vars = vars;
        self.state = DocumentState::Dirty;
        self.rehighlight = true;
    }

    /// Mutable access to the variable definitions; marks the document dirty.
    pub fn variables_mut(&mut self) -> &mut VariableTable {
        self.state = DocumentState::Dirty;
        self.rehighlight = true;
        &mut self.vars
    }

    pub fn set_stylesheet(&mut self, sheet: StyleSheet) {
        self.highlighter.set_stylesheet(sheet);
        self.rehighlight = true;
    }

    // -- Compiling ---------------------------------------------------------

    /// Convert the current text in the active format to a script.
    ///
    /// A failure is stored, not returned: reads report it until the text
    /// changes. The text itself is never touched.
    pub fn compile(&mut self) {
        self.compiled = to_canonical(&self.text, self.format, &self.vars);
        self.rebuild_spans();
        self.state = DocumentState::Clean;
        self.compile_count += 1;
        match &self.compiled {
            Ok(script) => debug!(
                format = %self.format,
                bytes = script.len(),
                count = self.compile_count,
                "compiled"
            ),
            Err(err) => debug!(
                format = %self.format,
                error = %err,
                count = self.compile_count,
                "compile failed"
            ),
        }
    }

    fn ensure_compiled(&mut self) {
        if self.state == DocumentState::Dirty {
            self.compile();
        }
    }

    /// The compiled script, compiling first when dirty.
    pub fn script(&mut self) -> Result<&Script, ConvertError> {
        self.ensure_compiled();
        self.compiled.as_ref().map_err(Clone::clone)
    }

    /// The document rendered in `format`, compiling first when dirty.
    pub fn data(&mut self, format: Format) -> Result<String, ConvertError> {
        let script = self.script()?;
        from_canonical(script, format)
    }

    /// Like [`data`](Self::data), with every failure collapsed to `""`.
    pub fn data_or_empty(&mut self, format: Format) -> String {
        self.data(format).unwrap_or_default()
    }

    /// The script as hex, for copying.
    pub fn hex(&mut self) -> Result<String, ConvertError> {
        self.data(Format::Hex)
    }

    /// The script as assembly.
    pub fn asm_text(&mut self) -> Result<String, ConvertError> {
        self.data(Format::Asm)
    }

    /// Switch to assembly and replace the text with `asm`.
    pub fn set_asm_text(&mut self, asm: impl Into<String>) {
        self.format = Format::Asm;
        self.on_text_changed(asm);
    }

    /// Switch the active format, re-rendering the text through the
    /// canonical script.
    ///
    /// Pending edits are compiled in the old format first. When the
    /// current text does not compile the error is returned and the text and
    /// format are left as they were.
    ///
    /// Scripts cannot be rendered as TxScript, so switching to it starts an
    /// empty dirty document and reports [`FormatSwitch::Cleared`].
    pub fn set_format(&mut self, format: Format) -> Result<FormatSwitch, ConvertError> {
        if !format.is_output() {
            info!(from = %self.format, to = %format, cleared = true, "format switched");
            self.format = format;
            self.on_text_changed(String::new());
            self.rehighlight = true;
            return Ok(FormatSwitch::Cleared(ConvertError::Unsupported { target: format }));
        }

        let text = self.data(format)?;
        info!(from = %self.format, to = %format, "format switched");
        self.format = format;
        self.text = text;
        self.rebuild_spans();
        self.rehighlight = true;
        Ok(FormatSwitch::Converted)
    }

    fn rebuild_spans(&mut self) {
        let (spans, err) = SpanIndex::build(&self.text, self.format, &self.registry);
        self.spans = spans;
        self.classify_error = err;
    }

    // -- Highlighting and tooltips -----------------------------------------

    /// Tooltip for character `index` of the text.
    pub fn tooltip_at(&self, index: usize) -> Option<String> {
        tooltip_at(&self.spans, self.char_len(), index)
    }

    /// Directives for a block starting at character `block_offset`.
    pub fn render_block(&self, block: &str, block_offset: usize) -> Vec<HighlightDirective> {
        self.highlighter
            .directives(block, block_offset, &self.spans, &self.vars)
    }

    pub fn highlight_block(&self, block: &str, block_offset: usize) -> Vec<StyledRun> {
        self.highlighter
            .highlight_block(block, block_offset, &self.spans, &self.vars)
    }

    /// Styled runs for every line of the text.
    pub fn highlight_document(&self) -> Vec<Vec<StyledRun>> {
        self.highlighter
            .highlight_document(&self.text, &self.spans, &self.vars)
    }
}
