use std::fmt;

/// Terminal failure of a matching run. Every variant aborts the run.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchError {
    /// Candidate or test data cannot be read.
    SourceUnavailable { source: String, message: String },
    /// The candidate table has no candidate columns (or no rows at all).
    EmptyCandidateSet(String),
    /// A test or candidate row failed numeric parsing.
    MalformedRow {
        source: String,
        line: usize,
        value: String,
    },
    /// Results could not be written to the sink.
    Persistence(String),
}

impl MatchError {
    pub fn source_unavailable(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source: source.into(),
            message: message.into(),
        }
    }

    pub fn malformed(source: impl Into<String>, line: usize, value: impl Into<String>) -> Self {
        Self::MalformedRow {
            source: source.into(),
            line,
            value: value.into(),
        }
    }

    /// Short name of the run stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "read",
            Self::EmptyCandidateSet(_) => "index",
            Self::MalformedRow { .. } => "parse",
            Self::Persistence(_) => "commit",
        }
    }
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable { source, message } => {
                write!(f, "source '{source}' unavailable: {message}")
            }
            Self::EmptyCandidateSet(msg) => write!(f, "empty candidate set: {msg}"),
            Self::MalformedRow { source, line, value } => {
                write!(f, "{source}, line {line}: cannot parse '{value}' as a number")
            }
            Self::Persistence(msg) => write!(f, "cannot persist results: {msg}"),
        }
    }
}

impl std::error::Error for MatchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_row() {
        let err = MatchError::malformed("test.csv", 7, "abc");
        assert_eq!(err.to_string(), "test.csv, line 7: cannot parse 'abc' as a number");
        assert_eq!(err.stage(), "parse");
    }

    #[test]
    fn stages_are_distinct() {
        let stages = [
            MatchError::source_unavailable("ideal", "gone").stage(),
            MatchError::EmptyCandidateSet("no columns".into()).stage(),
            MatchError::malformed("t", 1, "x").stage(),
            MatchError::Persistence("disk full".into()).stage(),
        ];
        for (i, a) in stages.iter().enumerate() {
            for b in &stages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
