use std::fmt;

use idealfit_engine::MatchError;

#[derive(Debug)]
pub enum IoError {
    /// File could not be opened or read.
    File { path: String, message: String },
    /// CSV framing error (bad quoting, unreadable record).
    Csv { source: String, message: String },
    /// A field that must be numeric is not.
    Number { source: String, line: usize, value: String },
    /// Header names that cannot become table columns.
    Schema(String),
    /// Any SQLite failure.
    Sqlite(String),
    /// Connector used before `open` or after `close`.
    NotConnected,
    /// Chart could not be drawn or written.
    Chart(String),
}

impl IoError {
    /// Map into the run taxonomy for a failure while reading.
    pub fn into_read_error(self, source: &str) -> MatchError {
        match self {
            Self::Number { source, line, value } => MatchError::malformed(source, line, value),
            other => MatchError::source_unavailable(source, other.to_string()),
        }
    }

    /// Map into the run taxonomy for a failure while writing results.
    pub fn into_write_error(self) -> MatchError {
        MatchError::Persistence(self.to_string())
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path, message } => write!(f, "cannot read {path}: {message}"),
            Self::Csv { source, message } => write!(f, "{source}: CSV error: {message}"),
            Self::Number { source, line, value } => {
                write!(f, "{source}, line {line}: cannot parse '{value}' as a number")
            }
            Self::Schema(msg) => write!(f, "schema error: {msg}"),
            Self::Sqlite(msg) => write!(f, "SQLite error: {msg}"),
            Self::NotConnected => write!(f, "database connection is not open"),
            Self::Chart(msg) => write!(f, "chart error: {msg}"),
        }
    }
}

impl std::error::Error for IoError {}

impl From<rusqlite::Error> for IoError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e.to_string())
    }
}
