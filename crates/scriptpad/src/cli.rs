#![forbid(unsafe_code)]

//! Command-line interface of the `scriptpad` binary.
//!
//! Arguments are parsed by hand. Environment settings (see
//! [`config`](crate::config)) supply defaults that flags override.

use std::fmt;
use std::io::{self, Write};

use scriptpad_script::{ConvertError, Format, VariableTable};
use scriptpad_syntax::{ClassifyError, Rgb, StyleKey, ansi};

use crate::config::EditorConfig;
use crate::document::ScriptDocument;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = "\
scriptpad: convert, classify and highlight Bitcoin scripts

USAGE:
    scriptpad <COMMAND> [OPTIONS] < input

COMMANDS:
    convert      Convert the input between formats
    spans        List the classified spans of the input
    tooltip      Show the tooltip at a character position
    highlight    Print the input with ANSI colours

OPTIONS:
    --from=F, --format=F   Input format: hex, asm or txscript (default: asm)
    --to=F                 Output format for convert: hex or asm (default: hex)
    --at=N                 Character index for tooltip
    --var=NAME=HEX         Define a variable (repeatable)
    --color=KEY=#RRGGBB    Foreground for a style key, e.g. keywords (repeatable)
    --help, -h             Show this help message
    --version, -V          Show version

ENVIRONMENT VARIABLES:
    SCRIPTPAD_FORMAT          Default input format
    SCRIPTPAD_THEME           dark or light
    SCRIPTPAD_COLOR_<KEY>     #rrggbb colour for a style key (e.g. SCRIPTPAD_COLOR_KEYWORDS)
    SCRIPTPAD_LOG             Log filter (default: warn)
    SCRIPTPAD_LOG_JSON        1 for JSON log lines";

/// What to do with the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Convert { from: Format, to: Format },
    Spans { format: Format },
    Tooltip { format: Format, at: usize },
    Highlight { format: Format },
    Help,
    Version,
}

/// Parsed command line.
#[derive(Debug, Clone)]
pub struct Opts {
    pub command: Command,
    pub vars: VariableTable,
    pub config: EditorConfig,
}

/// Errors reported by the CLI before exiting non-zero.
#[derive(Debug)]
pub enum CliError {
    Usage(String),
    Convert(ConvertError),
    Classify(ClassifyError),
    Io(io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(msg) => write!(f, "{msg}\nRun with --help for usage information."),
            Self::Convert(e) => write!(f, "{e}"),
            Self::Classify(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Usage(_) => None,
            Self::Convert(e) => Some(e),
            Self::Classify(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<ConvertError> for CliError {
    fn from(e: ConvertError) -> Self {
        Self::Convert(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

fn usage(msg: impl Into<String>) -> CliError {
    CliError::Usage(msg.into())
}

fn parse_format(flag: &str, value: &str) -> Result<Format, CliError> {
    value
        .parse()
        .map_err(|_| usage(format!("Invalid {flag} value: {value}")))
}

fn parse_color(value: &str) -> Result<(StyleKey, Rgb), CliError> {
    let Some((name, color)) = value.split_once('=') else {
        return Err(usage(format!("Invalid --color value: {value}")));
    };
    let key = StyleKey::from_settings_key(name)
        .ok_or_else(|| usage(format!("Unknown style key: {name}")))?;
    let color = color
        .parse()
        .map_err(|e| usage(format!("Invalid --color value for {name}: {e}")))?;
    Ok((key, color))
}

impl Opts {
    /// Parse arguments (without the program name) on top of `config`.
    pub fn parse_from<I, S>(args: I, mut config: EditorConfig) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut command_name: Option<String> = None;
        let mut from: Option<Format> = None;
        let mut to = Format::Hex;
        let mut at: Option<usize> = None;
        let mut vars = VariableTable::new();

        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "--help" | "-h" => {
                    return Ok(Self {
                        command: Command::Help,
                        vars,
                        config,
                    });
                }
                "--version" | "-V" => {
                    return Ok(Self {
                        command: Command::Version,
                        vars,
                        config,
                    });
                }
                other => {
                    if let Some(val) = other
                        .strip_prefix("--from=")
                        .or_else(|| other.strip_prefix("--format="))
                    {
                        from = Some(parse_format("--from", val)?);
                    } else if let Some(val) = other.strip_prefix("--to=") {
                        to = parse_format("--to", val)?;
                    } else if let Some(val) = other.strip_prefix("--at=") {
                        at = Some(
                            val.parse()
                                .map_err(|_| usage(format!("Invalid --at value: {val}")))?,
                        );
                    } else if let Some(val) = other.strip_prefix("--var=") {
                        let Some((name, hex)) = val.split_once('=') else {
                            return Err(usage(format!("Invalid --var value: {val}")));
                        };
                        vars.define_hex(name, hex)
                            .map_err(|e| usage(format!("Invalid --var value for {name}: {e}")))?;
                    } else if let Some(val) = other.strip_prefix("--color=") {
                        config.color_overrides.push(parse_color(val)?);
                    } else if !other.starts_with('-') && command_name.is_none() {
                        command_name = Some(other.to_string());
                    } else {
                        return Err(usage(format!("Unknown argument: {other}")));
                    }
                }
            }
        }

        let format = from.unwrap_or(config.default_format);
        let command = match command_name.as_deref() {
            Some("convert") => Command::Convert { from: format, to },
            Some("spans") => Command::Spans { format },
            Some("tooltip") => Command::Tooltip {
                format,
                at: at.ok_or_else(|| usage("tooltip requires --at=N"))?,
            },
            Some("highlight") => Command::Highlight { format },
            Some(other) => return Err(usage(format!("Unknown command: {other}"))),
            None => return Err(usage("Missing command")),
        };

        Ok(Self {
            command,
            vars,
            config,
        })
    }

    fn document(&self, format: Format, input: &str) -> ScriptDocument {
        let mut doc = self.config.document_in(format);
        doc.set_variables(self.vars.clone());
        doc.on_text_changed(input);
        doc
    }

    /// Run the command on `input`, writing results to `out`.
    pub fn run<W: Write>(&self, input: &str, out: &mut W) -> Result<(), CliError> {
        match self.command {
            Command::Help => writeln!(out, "{HELP_TEXT}")?,
            Command::Version => writeln!(out, "scriptpad {VERSION}")?,
            Command::Convert { from, to } => {
                let mut doc = self.document(from, input);
                writeln!(out, "{}", doc.data(to)?)?;
            }
            Command::Spans { format } => {
                let doc = self.document(format, input);
                if let Some(err) = doc.classify_error() {
                    return Err(CliError::Classify(err.clone()));
                }
                for span in doc.spans() {
                    writeln!(
                        out,
                        "{}\t{}\t{}\t{}",
                        span.start, span.end, span.match_type, span.value
                    )?;
                }
            }
            Command::Tooltip { format, at } => {
                let doc = self.document(format, input);
                if let Some(tip) = doc.tooltip_at(at) {
                    writeln!(out, "{tip}")?;
                }
            }
            Command::Highlight { format } => {
                let doc = self.document(format, input);
                for runs in doc.highlight_document() {
                    ansi::write_runs(out, &runs)?;
                    writeln!(out)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Opts, CliError> {
        Opts::parse_from(args.iter().copied(), EditorConfig::default())
    }

    fn run(args: &[&str], input: &str) -> Result<String, CliError> {
        let mut out = Vec::new();
        parse(args)?.run(input, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn convert_defaults_to_asm_into_hex() {
        let opts = parse(&["convert"]).unwrap();
        assert_eq!(
            opts.command,
            Command::Convert {
                from: Format::Asm,
                to: Format::Hex
            }
        );
    }

    #[test]
    fn env_format_is_overridden_by_flag() {
        let config = EditorConfig {
            default_format: Format::Hex,
            ..EditorConfig::default()
        };
        let opts = Opts::parse_from(["spans"], config.clone()).unwrap();
        assert_eq!(opts.command, Command::Spans { format: Format::Hex });
        let opts = Opts::parse_from(["spans", "--format=txscript"], config).unwrap();
        assert_eq!(
            opts.command,
            Command::Spans {
                format: Format::TxScript
            }
        );
    }

    #[test]
    fn usage_errors() {
        assert!(matches!(parse(&[]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["frobnicate"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["tooltip"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["convert", "--to=nope"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["convert", "--var=k"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["convert", "--var=k=abc"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["convert", "--bogus"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["highlight", "--color=keywords"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["highlight", "--color=numbers=#000000"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["highlight", "--color=keywords=red"]), Err(CliError::Usage(_))));
    }

    #[test]
    fn help_wins() {
        assert_eq!(parse(&["convert", "--help"]).unwrap().command, Command::Help);
        assert!(run(&["-h"], "").unwrap().contains("COMMANDS:"));
        assert_eq!(run(&["-V"], "").unwrap(), format!("scriptpad {VERSION}\n"));
    }

    #[test]
    fn convert_with_variables() {
        let out = run(&["convert", "--var=pk=ab", "--to=hex"], "$pk OP_CHECKSIG").unwrap();
        assert_eq!(out, "01abac\n");
        let out = run(&["convert", "--from=hex", "--to=asm"], "76a9").unwrap();
        assert_eq!(out, "OP_DUP OP_HASH160\n");
    }

    #[test]
    fn convert_to_txscript_fails() {
        let err = run(&["convert", "--to=txscript"], "OP_1").unwrap_err();
        assert!(matches!(
            err,
            CliError::Convert(ConvertError::Unsupported { .. })
        ));
    }

    #[test]
    fn spans_listing() {
        let out = run(&["spans"], "OP_DUP # hi").unwrap();
        assert_eq!(out, "0\t6\tKeyword:opcode\tOP_DUP\n7\t11\tComment\thi\n");
        assert!(matches!(
            run(&["spans"], "PUSH $"),
            Err(CliError::Classify(_))
        ));
    }

    #[test]
    fn tooltip_lookup() {
        assert_eq!(
            run(&["tooltip", "--at=2"], "OP_IF OP_ENDIF").unwrap(),
            "OP_IF (Conditional:flow)\n"
        );
        assert_eq!(run(&["tooltip", "--at=5"], "OP_IF OP_ENDIF").unwrap(), "");
    }

    #[test]
    fn highlight_emits_sgr() {
        let out = run(&["highlight"], "OP_DUP\nfoo").unwrap();
        assert!(out.contains("\x1b["));
        assert!(out.ends_with("foo\n"));
    }

    #[test]
    fn color_flag_overrides_theme() {
        let opts = parse(&["highlight", "--color=Keywords=#010203"]).unwrap();
        assert_eq!(
            opts.config.color_overrides,
            vec![(StyleKey::Keywords, Rgb::new(1, 2, 3))]
        );
        let out = run(&["highlight", "--color=keywords=#010203"], "OP_DUP").unwrap();
        assert!(out.contains("\x1b[38;2;1;2;3m"), "{out:?}");
    }

    #[test]
    fn color_flag_follows_env_overrides() {
        let config = EditorConfig {
            color_overrides: vec![(StyleKey::Keywords, Rgb::new(9, 9, 9))],
            ..EditorConfig::default()
        };
        let opts = Opts::parse_from(["highlight", "--color=keywords=#010203"], config).unwrap();
        let sheet = opts.config.stylesheet();
        assert_eq!(sheet.style_for(StyleKey::Keywords).fg, Some(Rgb::new(1, 2, 3)));
    }

    #[test]
    fn help_mentions_env_vars() {
        assert!(HELP_TEXT.contains("SCRIPTPAD_FORMAT"));
        assert!(HELP_TEXT.contains("SCRIPTPAD_LOG"));
    }
}
