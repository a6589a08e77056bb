#![forbid(unsafe_code)]

//! Style keys and the stylesheet that maps them to styles.
//!
//! Highlighting never hardcodes colors: spans resolve to a [`StyleKey`], and
//! the key is looked up in a [`StyleSheet`].
//!
//! # Example
//! ```
//! use scriptpad_syntax::{Rgb, Style, StyleKey, StyleSheet};
//!
//! let mut sheet = StyleSheet::dark();
//! sheet.define(StyleKey::Comments, Style::new().fg(Rgb::new(0, 128, 0)));
//! assert_eq!(sheet.style_for(StyleKey::Comments).fg, Some(Rgb::new(0, 128, 0)));
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::span::MatchType;
use crate::style::{Rgb, Style};

// ---------------------------------------------------------------------------
// Style keys
// ---------------------------------------------------------------------------

/// What a span is colored as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKey {
    Variables,
    Strings,
    Comments,
    TypeNames,
    Keywords,
    Conditionals,
    BooleanOperators,
}

impl StyleKey {
    pub const ALL: [StyleKey; 7] = [
        StyleKey::Variables,
        StyleKey::Strings,
        StyleKey::Comments,
        StyleKey::TypeNames,
        StyleKey::Keywords,
        StyleKey::Conditionals,
        StyleKey::BooleanOperators,
    ];

    /// Settings name of the key (`variables`, `booleanoperators`, ...).
    #[must_use]
    pub const fn settings_key(self) -> &'static str {
        match self {
            Self::Variables => "variables",
            Self::Strings => "strings",
            Self::Comments => "comments",
            Self::TypeNames => "typenames",
            Self::Keywords => "keywords",
            Self::Conditionals => "conditionals",
            Self::BooleanOperators => "booleanoperators",
        }
    }

    /// Inverse of [`settings_key`](Self::settings_key), ignoring ASCII case.
    pub fn from_settings_key(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.settings_key().eq_ignore_ascii_case(name))
    }

    /// Key for a span's match type.
    #[must_use]
    pub fn for_match_type(match_type: &MatchType) -> Self {
        match match_type {
            MatchType::Variable => Self::Variables,
            MatchType::StringLiteral => Self::Strings,
            MatchType::Comment => Self::Comments,
            MatchType::TypeName => Self::TypeNames,
            MatchType::Keyword(_) => Self::Keywords,
            MatchType::Conditional(_) => Self::Conditionals,
            MatchType::BooleanOperator(_) => Self::BooleanOperators,
        }
    }
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.settings_key())
    }
}

// ---------------------------------------------------------------------------
// StyleSheet
// ---------------------------------------------------------------------------

/// The style of each [`StyleKey`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSheet {
    styles: HashMap<StyleKey, Style>,
}

impl StyleSheet {
    /// Create an empty StyleSheet.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Palette for dark backgrounds, defining every [`StyleKey`].
    #[must_use]
    pub fn dark() -> Self {
        let purple = Rgb::new(198, 120, 221);
        let blue = Rgb::new(97, 175, 239);
        let cyan = Rgb::new(86, 182, 194);
        let green = Rgb::new(152, 195, 121);
        let orange = Rgb::new(209, 154, 102);
        let red = Rgb::new(224, 108, 117);

        Self::from_palette([
            (StyleKey::Variables, Style::new().fg(orange)),
            (StyleKey::Strings, Style::new().fg(cyan)),
            (StyleKey::Comments, Style::new().fg(green).italic()),
            (StyleKey::TypeNames, Style::new().fg(blue)),
            (StyleKey::Keywords, Style::new().fg(purple).bold()),
            (StyleKey::Conditionals, Style::new().fg(red)),
            (StyleKey::BooleanOperators, Style::new().fg(red).bold()),
        ])
    }

    /// Palette for light backgrounds, defining every [`StyleKey`].
    #[must_use]
    pub fn light() -> Self {
        let purple = Rgb::new(136, 57, 169);
        let blue = Rgb::new(0, 92, 197);
        let cyan = Rgb::new(0, 128, 128);
        let green = Rgb::new(80, 120, 60);
        let orange = Rgb::new(152, 104, 1);
        let red = Rgb::new(193, 52, 52);

        Self::from_palette([
            (StyleKey::Variables, Style::new().fg(orange)),
            (StyleKey::Strings, Style::new().fg(cyan)),
            (StyleKey::Comments, Style::new().fg(green).italic()),
            (StyleKey::TypeNames, Style::new().fg(blue)),
            (StyleKey::Keywords, Style::new().fg(purple).bold()),
            (StyleKey::Conditionals, Style::new().fg(red)),
            (StyleKey::BooleanOperators, Style::new().fg(red).bold()),
        ])
    }

    fn from_palette(entries: [(StyleKey, Style); 7]) -> Self {
        let mut sheet = Self::new();
        for (key, style) in entries {
            sheet.define(key, style);
        }
        sheet
    }

    /// Set the style of `key`, replacing any existing one.
    pub fn define(&mut self, key: StyleKey, style: Style) {
        self.styles.insert(key, style);
    }

    /// Style for a key; the default style when the key is undefined.
    pub fn style_for(&self, key: StyleKey) -> Style {
        self.styles.get(&key).copied().unwrap_or_default()
    }

    /// Set only the foreground of a key, keeping its attributes.
    pub fn set_color(&mut self, key: StyleKey, color: Rgb) {
        self.styles.entry(key).or_default().fg = Some(color);
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleFlags;

    #[test]
    fn settings_keys_round_trip() {
        for key in StyleKey::ALL {
            assert_eq!(StyleKey::from_settings_key(key.settings_key()), Some(key));
        }
        assert_eq!(
            StyleKey::from_settings_key("BooleanOperators"),
            Some(StyleKey::BooleanOperators)
        );
        assert_eq!(StyleKey::from_settings_key("numbers"), None);
    }

    #[test]
    fn match_type_families_share_a_key() {
        assert_eq!(
            StyleKey::for_match_type(&MatchType::keyword("opcode")),
            StyleKey::Keywords
        );
        assert_eq!(
            StyleKey::for_match_type(&MatchType::Keyword(None)),
            StyleKey::Keywords
        );
        assert_eq!(
            StyleKey::for_match_type(&MatchType::conditional("flow")),
            StyleKey::Conditionals
        );
        assert_eq!(
            StyleKey::for_match_type(&MatchType::StringLiteral),
            StyleKey::Strings
        );
    }

    #[test]
    fn palettes_define_every_key() {
        for sheet in [StyleSheet::dark(), StyleSheet::light()] {
            assert_eq!(sheet.len(), StyleKey::ALL.len());
            for key in StyleKey::ALL {
                assert!(sheet.style_for(key).fg.is_some(), "{key}");
            }
        }
    }

    #[test]
    fn undefined_key_uses_default_style() {
        let mut sheet = StyleSheet::new();
        assert!(sheet.is_empty());
        assert!(sheet.style_for(StyleKey::Comments).is_empty());
        sheet.define(StyleKey::Comments, Style::new().bold());
        assert!(sheet.style_for(StyleKey::Comments).has_attr(StyleFlags::BOLD));
    }

    #[test]
    fn set_color_keeps_attributes() {
        let mut sheet = StyleSheet::dark();
        sheet.set_color(StyleKey::Keywords, Rgb::new(1, 2, 3));
        let style = sheet.style_for(StyleKey::Keywords);
        assert_eq!(style.fg, Some(Rgb::new(1, 2, 3)));
        assert!(style.has_attr(StyleFlags::BOLD));
    }

    #[test]
    fn set_color_on_empty_sheet() {
        let mut sheet = StyleSheet::new();
        sheet.set_color(StyleKey::Strings, Rgb::new(9, 9, 9));
        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet.style_for(StyleKey::Strings).fg, Some(Rgb::new(9, 9, 9)));
    }

    #[test]
    fn clone_is_independent() {
        let a = StyleSheet::dark();
        let mut b = a.clone();
        b.set_color(StyleKey::Comments, Rgb::new(0, 0, 0));
        assert_ne!(a, b);
        assert_eq!(a, StyleSheet::dark());
    }
}
