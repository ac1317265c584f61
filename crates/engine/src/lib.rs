//! `idealfit-engine`: ideal-function matching engine.
//!
//! Pure engine crate: receives a candidate table and a stream of test points,
//! returns match decisions. No CLI, file or database dependencies; storage is
//! reached through the traits in [`source`].

pub mod controller;
pub mod error;
pub mod index;
pub mod matcher;
pub mod model;
pub mod source;

pub use controller::{execute, match_all};
pub use error::MatchError;
pub use index::CandidateIndex;
pub use matcher::match_point;
pub use model::{CandidateRow, CandidateTable, MatchResult, RunReport, TestPoint};
pub use source::{CandidateStore, ResultSink, TestPointSource};
