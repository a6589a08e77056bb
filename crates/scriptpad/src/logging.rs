#![forbid(unsafe_code)]

//! Tracing subscriber setup.
//!
//! Libraries only emit events through `tracing`; binaries call [`init`]
//! once to print them to stderr.

use tracing_subscriber::EnvFilter;

use crate::config::EditorConfig;

/// Why the subscriber could not be installed.
#[derive(Debug)]
pub enum LoggingError {
    /// `log_filter` is not valid `EnvFilter` syntax.
    Filter(String),
    /// A global subscriber was already set.
    AlreadyInitialized,
}

impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Filter(msg) => write!(f, "invalid log filter: {msg}"),
            Self::AlreadyInitialized => f.write_str("a global subscriber is already installed"),
        }
    }
}

impl std::error::Error for LoggingError {}

/// Build the filter for `config`.
pub fn filter(config: &EditorConfig) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(&config.log_filter).map_err(|e| LoggingError::Filter(e.to_string()))
}

/// Install a stderr subscriber filtered by `config.log_filter`.
///
/// JSON output needs the `tracing-json` feature; without it
/// `config.log_json` falls back to plain lines.
pub fn init(config: &EditorConfig) -> Result<(), LoggingError> {
    let filter = filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    #[cfg(feature = "tracing-json")]
    if config.log_json {
        return builder
            .json()
            .try_init()
            .map_err(|_| LoggingError::AlreadyInitialized);
    }

    builder
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)
}
