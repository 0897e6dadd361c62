use std::path::PathBuf;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Malformed JSON or a record missing a required field.
    #[error("json: {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported experiment: {0}")]
    UnsupportedExperiment(String),
    #[error("unsupported log level: {0} (d|debug|10, i|info|20, w|warning|30, e|error|40)")]
    InvalidLogLevel(String),
    /// Column name without an entry in the display-title table.
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("plot: {0}")]
    Plot(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    pub fn plot(msg: impl ToString) -> Self {
        Self::Plot(msg.to_string())
    }
}
