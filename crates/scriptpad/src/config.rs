#![forbid(unsafe_code)]

//! Editor configuration from `SCRIPTPAD_*` environment variables.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `SCRIPTPAD_FORMAT` | initial document format (`hex`, `asm`, `txscript`) | `asm` |
//! | `SCRIPTPAD_THEME` | `dark` or `light` | `dark` |
//! | `SCRIPTPAD_COLOR_<KEY>` | `#rrggbb` foreground for a style key, e.g. `SCRIPTPAD_COLOR_KEYWORDS` | theme |
//! | `SCRIPTPAD_LOG` | tracing filter directives | `warn` |
//! | `SCRIPTPAD_LOG_JSON` | `1`/`true` for JSON log lines | off |
//!
//! Invalid values are reported with `warn!` and the default is kept.

use std::env;
use std::fmt;
use std::str::FromStr;

use scriptpad_script::Format;
use scriptpad_syntax::{Highlighter, Rgb, StyleKey, StyleSheet};
use tracing::warn;

use crate::document::ScriptDocument;

const ENV_PREFIX: &str = "SCRIPTPAD_";

/// Built-in colour palette.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThemeChoice {
    #[default]
    Dark,
    Light,
}

impl ThemeChoice {
    pub fn stylesheet(self) -> StyleSheet {
        match self {
            Self::Dark => StyleSheet::dark(),
            Self::Light => StyleSheet::light(),
        }
    }
}

impl fmt::Display for ThemeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dark => "dark",
            Self::Light => "light",
        })
    }
}

impl FromStr for ThemeChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            other => Err(format!("unknown theme '{other}' (expected dark or light)")),
        }
    }
}

/// Settings shared by the library and the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    pub default_format: Format,
    pub theme: ThemeChoice,
    /// Foreground overrides applied on top of the theme, in order.
    pub color_overrides: Vec<(StyleKey, Rgb)>,
    /// `EnvFilter` directives.
    pub log_filter: String,
    pub log_json: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_format: Format::Asm,
            theme: ThemeChoice::Dark,
            color_overrides: Vec::new(),
            log_filter: "warn".into(),
            log_json: false,
        }
    }
}

impl EditorConfig {
    /// Read the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let var = |suffix: &str| lookup(&format!("{ENV_PREFIX}{suffix}"));

        if let Some(val) = var("FORMAT") {
            match val.parse() {
                Ok(format) => config.default_format = format,
                Err(err) => warn!(value = %val, error = %err, "ignoring SCRIPTPAD_FORMAT"),
            }
        }
        if let Some(val) = var("THEME") {
            match val.parse() {
                Ok(theme) => config.theme = theme,
                Err(err) => warn!(value = %val, error = %err, "ignoring SCRIPTPAD_THEME"),
            }
        }
        for key in StyleKey::ALL {
            let suffix = format!("COLOR_{}", key.settings_key().to_ascii_uppercase());
            let Some(val) = var(&suffix) else {
                continue;
            };
            match val.parse::<Rgb>() {
                Ok(color) => config.color_overrides.push((key, color)),
                Err(err) => warn!(
                    variable = %format!("{ENV_PREFIX}{suffix}"),
                    value = %val,
                    error = %err,
                    "ignoring colour override"
                ),
            }
        }
        if let Some(val) = var("LOG")
            && !val.trim().is_empty()
        {
            config.log_filter = val;
        }
        if let Some(val) = var("LOG_JSON") {
            match parse_flag(&val) {
                Some(flag) => config.log_json = flag,
                None => warn!(value = %val, "ignoring SCRIPTPAD_LOG_JSON"),
            }
        }

        config
    }

    /// The theme's stylesheet with the colour overrides applied.
    pub fn stylesheet(&self) -> StyleSheet {
        let mut sheet = self.theme.stylesheet();
        for (key, color) in &self.color_overrides {
            sheet.set_color(*key, *color);
        }
        sheet
    }

    /// An empty document in the configured format and colours.
    pub fn new_document(&self) -> ScriptDocument {
        self.document_in(self.default_format)
    }

    /// An empty document in `format` with the configured colours.
    pub fn document_in(&self, format: Format) -> ScriptDocument {
        ScriptDocument::new(format).with_highlighter(Highlighter::new(self.stylesheet()))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
