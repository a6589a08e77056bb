#![forbid(unsafe_code)]

//! `scriptpad` binary entry point.

use std::io::{self, Read, Write};
use std::process;

use scriptpad::EditorConfig;
use scriptpad::cli::{Command, Opts};
use scriptpad::logging;

fn main() {
    let config = EditorConfig::from_env();
    if let Err(e) = logging::init(&config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let opts = match Opts::parse_from(std::env::args().skip(1), config) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    };

    let mut input = String::new();
    if !matches!(opts.command, Command::Help | Command::Version)
        && let Err(e) = io::stdin().read_to_string(&mut input)
    {
        eprintln!("Failed to read stdin: {e}");
        process::exit(1);
    }
    let input = input.trim_end_matches(['\n', '\r']);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = opts.run(input, &mut out).and_then(|()| Ok(out.flush()?)) {
        eprintln!("scriptpad: {e}");
        process::exit(1);
    }
}
