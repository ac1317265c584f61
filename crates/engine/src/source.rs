//! Collaborator seams of a run.
//!
//! The engine never opens files or connections itself; the I/O crate
//! implements these traits over CSV files and the SQLite store.

use crate::error::MatchError;
use crate::model::{CandidateTable, MatchResult, TestPoint};

/// Iterator of parsed test points; a malformed row yields `Err`.
pub type PointIter<'a> = Box<dyn Iterator<Item = Result<TestPoint, MatchError>> + 'a>;

/// Read-only access to the ideal functions.
pub trait CandidateStore {
    /// Load the full candidate table, columns in declaration order.
    fn load_candidates(&mut self) -> Result<CandidateTable, MatchError>;
}

/// Ordered, finite, restartable sequence of test points.
pub trait TestPointSource {
    /// Start a fresh pass from the first point.
    fn points(&mut self) -> Result<PointIter<'_>, MatchError>;
}

/// Append-only destination for match decisions.
pub trait ResultSink {
    /// Persist the whole batch, or nothing.
    fn commit(&mut self, results: &[MatchResult]) -> Result<(), MatchError>;
}

impl CandidateStore for CandidateTable {
    fn load_candidates(&mut self) -> Result<CandidateTable, MatchError> {
        Ok(self.clone())
    }
}

impl TestPointSource for Vec<TestPoint> {
    fn points(&mut self) -> Result<PointIter<'_>, MatchError> {
        Ok(Box::new(self.iter().copied().map(Ok::<TestPoint, MatchError>)))
    }
}

impl ResultSink for Vec<MatchResult> {
    fn commit(&mut self, results: &[MatchResult]) -> Result<(), MatchError> {
        self.extend_from_slice(results);
        Ok(())
    }
}
