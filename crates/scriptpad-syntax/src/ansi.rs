#![forbid(unsafe_code)]

//! SGR output of styled runs for terminals.
//!
//! | Sequence | Meaning |
//! |----------|---------|
//! | `ESC [ 0 m` | reset |
//! | `ESC [ 1;3 m` | attributes (bold, italic, ...) |
//! | `ESC [ 38;2;r;g;b m` | true color foreground |
//! | `ESC [ 48;2;r;g;b m` | true color background |

use std::io::{self, Write};

use crate::highlight::StyledRun;
use crate::style::{Style, StyleFlags};

/// SGR reset: `CSI 0 m`
pub const SGR_RESET: &[u8] = b"\x1b[0m";

const FLAG_CODES: [(StyleFlags, u8); 4] = [
    (StyleFlags::BOLD, 1),
    (StyleFlags::DIM, 2),
    (StyleFlags::ITALIC, 3),
    (StyleFlags::UNDERLINE, 4),
];

/// Write the SGR sequences that switch to `style`. Writes nothing for the
/// empty style.
pub fn write_style<W: Write>(w: &mut W, style: &Style) -> io::Result<()> {
    if !style.attrs.is_empty() {
        let codes: Vec<String> = FLAG_CODES
            .iter()
            .filter(|(flag, _)| style.attrs.contains(*flag))
            .map(|(_, code)| code.to_string())
            .collect();
        write!(w, "\x1b[{}m", codes.join(";"))?;
    }
    if let Some(c) = style.fg {
        write!(w, "\x1b[38;2;{};{};{}m", c.r, c.g, c.b)?;
    }
    if let Some(c) = style.bg {
        write!(w, "\x1b[48;2;{};{};{}m", c.r, c.g, c.b)?;
    }
    Ok(())
}

/// Write runs with their styles, resetting after each styled run.
pub fn write_runs<W: Write>(w: &mut W, runs: &[StyledRun]) -> io::Result<()> {
    for run in runs {
        if run.style.is_empty() {
            w.write_all(run.text.as_bytes())?;
        } else {
            write_style(w, &run.style)?;
            w.write_all(run.text.as_bytes())?;
            w.write_all(SGR_RESET)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Rgb;

    fn render(runs: &[StyledRun]) -> String {
        let mut out = Vec::new();
        write_runs(&mut out, runs).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn plain_runs_have_no_escapes() {
        let runs = vec![StyledRun {
            text: "OP_DUP".into(),
            style: Style::new(),
        }];
        assert_eq!(render(&runs), "OP_DUP");
    }

    #[test]
    fn styled_run_is_wrapped() {
        let runs = vec![StyledRun {
            text: "x".into(),
            style: Style::new().fg(Rgb::new(1, 2, 3)).bold().italic(),
        }];
        assert_eq!(render(&runs), "\x1b[1;3m\x1b[38;2;1;2;3mx\x1b[0m");
    }

    #[test]
    fn background_color() {
        let mut out = Vec::new();
        write_style(&mut out, &Style::new().bg(Rgb::new(0, 0, 255))).unwrap();
        assert_eq!(out, b"\x1b[48;2;0;0;255m");
    }
}
