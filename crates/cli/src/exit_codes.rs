//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Code    | Domain    | Description                                   |
//! |---------|-----------|-----------------------------------------------|
//! | 0       | Universal | Success                                       |
//! | 1       | Universal | General error (unspecified)                   |
//! | 2       | Universal | Usage error (bad args, invalid config)        |
//! | 60      | run       | Candidate or test data cannot be read         |
//! | 61      | run       | Ideal table has no candidate columns or rows  |
//! | 62      | run       | A row failed numeric parsing                  |
//! | 63      | run       | Database could not be opened or written       |
//! | 64      | output    | Chart or report could not be written          |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the mapping functions below

use idealfit_engine::MatchError;
use idealfit_io::IoError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable or invalid config file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Run (60-63)
// =============================================================================

/// Candidate or test source missing or unreadable.
pub const EXIT_SOURCE_UNAVAILABLE: u8 = 60;

/// The ideal table has zero candidate columns or zero rows.
/// Raised before any test point is read.
pub const EXIT_EMPTY_CANDIDATES: u8 = 61;

/// A row could not be parsed as numbers. Nothing was committed.
pub const EXIT_MALFORMED_ROW: u8 = 62;

/// The database rejected a write, or could not be opened.
pub const EXIT_PERSISTENCE: u8 = 63;

// =============================================================================
// Output (64)
// =============================================================================

/// Chart rendering or report write failed after a successful commit.
pub const EXIT_OUTPUT: u8 = 64;

// =============================================================================
// Error Mapping
// =============================================================================

/// Map a run failure to its exit code.
pub fn match_exit_code(err: &MatchError) -> u8 {
    match err {
        MatchError::SourceUnavailable { .. } => EXIT_SOURCE_UNAVAILABLE,
        MatchError::EmptyCandidateSet(_) => EXIT_EMPTY_CANDIDATES,
        MatchError::MalformedRow { .. } => EXIT_MALFORMED_ROW,
        MatchError::Persistence(_) => EXIT_PERSISTENCE,
    }
}

/// Map a file or database failure outside the matching pass.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::File { .. } | IoError::Csv { .. } => EXIT_SOURCE_UNAVAILABLE,
        IoError::Number { .. } | IoError::Schema(_) => EXIT_MALFORMED_ROW,
        IoError::Sqlite(_) | IoError::NotConnected => EXIT_PERSISTENCE,
        IoError::Chart(_) => EXIT_OUTPUT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_SOURCE_UNAVAILABLE,
            EXIT_EMPTY_CANDIDATES,
            EXIT_MALFORMED_ROW,
            EXIT_PERSISTENCE,
            EXIT_OUTPUT,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn every_failure_is_nonzero() {
        let errors = [
            MatchError::source_unavailable("ideal", "missing"),
            MatchError::EmptyCandidateSet("no columns".into()),
            MatchError::malformed("test.csv", 3, "abc"),
            MatchError::Persistence("disk full".into()),
        ];
        for err in &errors {
            assert_ne!(match_exit_code(err), EXIT_SUCCESS);
        }
        assert_eq!(match_exit_code(&errors[2]), EXIT_MALFORMED_ROW);
    }

    #[test]
    fn import_errors_follow_run_codes() {
        let number = IoError::Number { source: "t".into(), line: 2, value: "x".into() };
        assert_eq!(io_exit_code(&number), EXIT_MALFORMED_ROW);
        assert_eq!(io_exit_code(&IoError::Sqlite("locked".into())), EXIT_PERSISTENCE);
        assert_eq!(io_exit_code(&IoError::Chart("font".into())), EXIT_OUTPUT);
    }
}
