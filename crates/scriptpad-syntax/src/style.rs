#![forbid(unsafe_code)]

//! Colors, text attributes and the composed [`Style`].

use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// RGB color (opaque).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel (0–255).
    pub r: u8,
    /// Green channel (0–255).
    pub g: u8,
    /// Blue channel (0–255).
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the `#` is optional).
    pub fn parse_hex(text: &str) -> Result<Self, ColorParseError> {
        let digits = text.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorParseError(text.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| ColorParseError(text.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

/// Text that is not a `#rrggbb` color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorParseError(pub String);

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color '{}' (expected #rrggbb)", self.0)
    }
}

impl std::error::Error for ColorParseError {}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

bitflags::bitflags! {
    /// Text attribute flags.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct StyleFlags: u8 {
        /// Bold / increased intensity.
        const BOLD      = 0b0000_0001;
        /// Dim / decreased intensity.
        const DIM       = 0b0000_0010;
        /// Italic text.
        const ITALIC    = 0b0000_0100;
        /// Underlined text.
        const UNDERLINE = 0b0000_1000;
    }
}

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

/// Foreground, background and attributes. Unset fields inherit when merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Style {
    pub fg: Option<Rgb>,
    pub bg: Option<Rgb>,
    pub attrs: StyleFlags,
}

impl Style {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fg: None,
            bg: None,
            attrs: StyleFlags::empty(),
        }
    }

    #[must_use]
    pub const fn fg(mut self, color: Rgb) -> Self {
        self.fg = Some(color);
        self
    }

    #[must_use]
    pub const fn bg(mut self, color: Rgb) -> Self {
        self.bg = Some(color);
        self
    }

    #[must_use]
    pub fn bold(self) -> Self {
        self.attr(StyleFlags::BOLD)
    }

    #[must_use]
    pub fn dim(self) -> Self {
        self.attr(StyleFlags::DIM)
    }

    #[must_use]
    pub fn italic(self) -> Self {
        self.attr(StyleFlags::ITALIC)
    }

    #[must_use]
    pub fn underline(self) -> Self {
        self.attr(StyleFlags::UNDERLINE)
    }

    #[must_use]
    pub fn attr(mut self, flags: StyleFlags) -> Self {
        self.attrs |= flags;
        self
    }

    pub fn has_attr(&self, flag: StyleFlags) -> bool {
        self.attrs.contains(flag)
    }

    /// Whether nothing is set.
    pub fn is_empty(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && self.attrs.is_empty()
    }

    /// Merge with a parent style. Fields set on `self` win; attributes are
    /// combined.
    #[must_use]
    pub fn merge(&self, parent: &Style) -> Style {
        Style {
            fg: self.fg.or(parent.fg),
            bg: self.bg.or(parent.bg),
            attrs: self.attrs | parent.attrs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_colors() {
        assert_eq!(Rgb::parse_hex("#ff8000"), Ok(Rgb::new(255, 128, 0)));
        assert_eq!("00FF00".parse::<Rgb>(), Ok(Rgb::new(0, 255, 0)));
        assert!(Rgb::parse_hex("#fff").is_err());
        assert!(Rgb::parse_hex("#gg0000").is_err());
        assert!(Rgb::parse_hex("#ééé").is_err());
    }

    #[test]
    fn rgb_display() {
        assert_eq!(Rgb::new(1, 171, 255).to_string(), "#01abff");
    }

    #[test]
    fn builder_sets_fields() {
        let style = Style::new().fg(Rgb::new(1, 2, 3)).bold().italic();
        assert_eq!(style.fg, Some(Rgb::new(1, 2, 3)));
        assert!(style.has_attr(StyleFlags::BOLD));
        assert!(style.has_attr(StyleFlags::ITALIC));
        assert!(!style.has_attr(StyleFlags::UNDERLINE));
        assert!(Style::new().is_empty());
    }

    #[test]
    fn merge_prefers_child() {
        let parent = Style::new().fg(Rgb::new(0, 0, 0)).bg(Rgb::new(9, 9, 9)).bold();
        let child = Style::new().fg(Rgb::new(255, 255, 255)).underline();
        let merged = child.merge(&parent);
        assert_eq!(merged.fg, Some(Rgb::new(255, 255, 255)));
        assert_eq!(merged.bg, Some(Rgb::new(9, 9, 9)));
        assert_eq!(merged.attrs, StyleFlags::BOLD | StyleFlags::UNDERLINE);
    }
}
