use crate::error::MatchError;
use crate::index::CandidateIndex;
use crate::matcher::match_point;
use crate::model::{RunReport, TestPoint};
use crate::source::{CandidateStore, ResultSink, TestPointSource};

/// One pass over `points` against a prebuilt index.
///
/// Stops at the first error; nothing collected so far escapes.
pub fn match_all<I>(index: &CandidateIndex, points: I) -> Result<RunReport, MatchError>
where
    I: IntoIterator<Item = Result<TestPoint, MatchError>>,
{
    let mut report = RunReport::default();

    for point in points {
        let point = point?;
        report.points_read += 1;

        match match_point(&point, index) {
            Some(result) => {
                report.matched += 1;
                report.results.push(result);
            }
            None => {
                log::debug!("no candidate defined at x={}, point dropped", point.x);
                report.dropped += 1;
            }
        }
    }

    Ok(report)
}

/// Run the full pipeline: load candidates, index once, match every point,
/// then commit the batch. Any failure before the commit persists nothing.
pub fn execute<C, S, R>(store: &mut C, source: &mut S, sink: &mut R) -> Result<RunReport, MatchError>
where
    C: CandidateStore + ?Sized,
    S: TestPointSource + ?Sized,
    R: ResultSink + ?Sized,
{
    let table = store.load_candidates()?;
    let index = CandidateIndex::build(&table)?;
    log::info!(
        "candidate index ready: {} function(s), {} x value(s)",
        index.columns().len(),
        index.len()
    );

    let report = match_all(&index, source.points()?)?;
    log::info!(
        "matched {} of {} test point(s), {} dropped",
        report.matched,
        report.points_read,
        report.dropped
    );

    sink.commit(&report.results)?;
    log::info!("committed {} result(s)", report.results.len());

    Ok(report)
}
