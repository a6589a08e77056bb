#![forbid(unsafe_code)]

//! Conversion between textual formats and the canonical script.

use std::fmt;
use std::str::FromStr;

use tracing::trace;

use crate::asm::{self, ParseError};
use crate::hex::HexError;
use crate::script::Script;
use crate::txscript;
use crate::variables::VariableResolver;

/// A textual representation of a script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Format {
    /// Lower-case hex of the raw bytes.
    Hex,
    /// Opcode mnemonics and push literals.
    #[default]
    Asm,
    /// The high-level language. Input only.
    TxScript,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Hex, Format::Asm, Format::TxScript];

    /// Editor label for this format.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hex => "Hex",
            Self::Asm => "ASM",
            Self::TxScript => "TxScript",
        }
    }

    /// Whether a canonical script can be rendered in this format.
    #[must_use]
    pub const fn is_output(self) -> bool {
        !matches!(self, Self::TxScript)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An unrecognised format name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat(pub String);

impl fmt::Display for UnknownFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown format '{}' (expected hex, asm or txscript)",
            self.0
        )
    }
}

impl std::error::Error for UnknownFormat {}

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hex" => Ok(Self::Hex),
            "asm" | "assembly" => Ok(Self::Asm),
            "txscript" | "highlevel" => Ok(Self::TxScript),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Why a conversion produced no result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Hex text could not be decoded.
    Decode(HexError),
    /// Assembly or TxScript text was rejected.
    Parse(ParseError),
    /// The target format cannot be produced from a script.
    Unsupported { target: Format },
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "invalid hex: {e}"),
            Self::Parse(e) => write!(f, "parse error: {e}"),
            Self::Unsupported { target } => {
                write!(f, "scripts cannot be converted to {target}")
            }
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Unsupported { .. } => None,
        }
    }
}

impl From<HexError> for ConvertError {
    fn from(e: HexError) -> Self {
        Self::Decode(e)
    }
}

impl From<ParseError> for ConvertError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

/// Parse `text` in `format` into a script.
pub fn to_canonical(
    text: &str,
    format: Format,
    vars: &dyn VariableResolver,
) -> Result<Script, ConvertError> {
    trace!(%format, len = text.len(), "converting to canonical");
    let script = match format {
        Format::Hex => Script::from_hex(text)?,
        Format::Asm => asm::assemble(text, vars)?,
        Format::TxScript => txscript::compile(text, vars)?,
    };
    Ok(script)
}

/// Render `script` in `format`.
pub fn from_canonical(script: &Script, format: Format) -> Result<String, ConvertError> {
    match format {
        Format::Hex => Ok(script.to_hex()),
        Format::Asm => Ok(script.to_asm()),
        Format::TxScript => Err(ConvertError::Unsupported { target: format }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::NoVariables;

    #[test]
    fn parse_format_names() {
        assert_eq!("hex".parse::<Format>(), Ok(Format::Hex));
        assert_eq!("ASM".parse::<Format>(), Ok(Format::Asm));
        assert_eq!("Assembly".parse::<Format>(), Ok(Format::Asm));
        assert_eq!("txscript".parse::<Format>(), Ok(Format::TxScript));
        assert_eq!("HighLevel".parse::<Format>(), Ok(Format::TxScript));
        assert!("json".parse::<Format>().is_err());
    }

    #[test]
    fn display_uses_editor_labels() {
        let labels: Vec<String> = Format::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["Hex", "ASM", "TxScript"]);
    }

    #[test]
    fn hex_to_canonical() {
        let script = to_canonical("ab", Format::Hex, &NoVariables).unwrap();
        assert_eq!(script.as_bytes(), &[0xab]);
        assert!(matches!(
            to_canonical("abc", Format::Hex, &NoVariables),
            Err(ConvertError::Decode(HexError::OddLength { len: 3 }))
        ));
        assert!(matches!(
            to_canonical("zz", Format::Hex, &NoVariables),
            Err(ConvertError::Decode(HexError::InvalidDigit { .. }))
        ));
    }

    #[test]
    fn asm_and_txscript_to_canonical() {
        let a = to_canonical("OP_1 OP_1 OP_ADD", Format::Asm, &NoVariables).unwrap();
        let t = to_canonical("1 + 1", Format::TxScript, &NoVariables).unwrap();
        assert_eq!(a, t);
    }

    #[test]
    fn parse_failure_is_reported() {
        let err = to_canonical("OP_NOPE", Format::Asm, &NoVariables).unwrap_err();
        assert!(matches!(err, ConvertError::Parse(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn deeply_nested_txscript_is_a_parse_error() {
        let source = format!("verify {}1{}", "(".repeat(10_000), ")".repeat(10_000));
        match to_canonical(&source, Format::TxScript, &NoVariables) {
            Err(ConvertError::Parse(e)) => assert_eq!(e.message, "expression nested too deeply"),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn from_canonical_outputs() {
        let script = Script::new(vec![0x76, 0xa9]);
        assert_eq!(from_canonical(&script, Format::Hex).unwrap(), "76a9");
        assert_eq!(
            from_canonical(&script, Format::Asm).unwrap(),
            "OP_DUP OP_HASH160"
        );
    }

    #[test]
    fn txscript_is_input_only() {
        let err = from_canonical(&Script::default(), Format::TxScript).unwrap_err();
        assert_eq!(
            err,
            ConvertError::Unsupported {
                target: Format::TxScript
            }
        );
        assert_eq!(err.to_string(), "scripts cannot be converted to TxScript");
        assert!(!Format::TxScript.is_output());
    }
}
