//! Per-run logging context.
//!
//! The subscriber is built once at startup and handed to the pipeline
//! explicitly; nothing is installed as the process-wide default.

use std::fmt;
use std::str::FromStr;

use tracing::{Dispatch, Level};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_level(&self) -> Level {
        match self {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    /// Accepts the short, long and numeric spellings, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" | "debug" | "10" => Ok(LogLevel::Debug),
            "i" | "info" | "20" => Ok(LogLevel::Info),
            "w" | "warn" | "warning" | "30" => Ok(LogLevel::Warn),
            "e" | "error" | "40" => Ok(LogLevel::Error),
            _ => Err(Error::InvalidLogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.as_level(), f)
    }
}

pub struct LogContext {
    level: LogLevel,
    dispatch: Dispatch,
}

impl LogContext {
    /// Console logger on stderr: `LEVEL target:line: message`.
    pub fn new(level: LogLevel) -> Self {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level.as_level())
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_line_number(true)
            .finish();
        Self {
            level,
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Same format, captured by the test harness.
    pub fn for_tests(level: LogLevel) -> Self {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level.as_level())
            .with_test_writer()
            .with_line_number(true)
            .finish();
        Self {
            level,
            dispatch: Dispatch::new(subscriber),
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Runs `f` with this context as the active subscriber on the current thread.
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogContext")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}
