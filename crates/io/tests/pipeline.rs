//! End-to-end runs over real files: CSV in, SQLite out.

use std::fs;
use std::path::Path;

use idealfit_engine::{execute, CandidateStore, MatchError, MatchResult};
use idealfit_io::csv::CsvTestPoints;
use idealfit_io::{Dataset, SqliteConnector, SqliteStore};
use tempfile::tempdir;

const IDEAL: &str = "x,y1,y2,y3\n\
-1,0.5,-1,4\n\
0,1,0,3\n\
1,2,1,2\n\
2,3,2,1\n";

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn open(db: &Path) -> SqliteStore {
    SqliteStore::open(SqliteConnector::file(db)).unwrap()
}

/// Import the ideal table, then stream test points from `test_csv`.
fn run(db: &Path, ideal: &Path, test_csv: &Path) -> Result<Vec<MatchResult>, MatchError> {
    let mut store = open(db);
    store.bootstrap().unwrap();
    store.import_csv(Dataset::Ideal, ideal, None).unwrap();

    let mut candidates = store.load_candidates()?;
    let mut points = CsvTestPoints::new(test_csv, b',');
    let report = execute(&mut candidates, &mut points, &mut store)?;
    Ok(report.results)
}

#[test]
fn csv_to_sqlite_round_trip() {
    let dir = tempdir().unwrap();
    let ideal = write(dir.path(), "ideal.csv", IDEAL);
    let test = write(dir.path(), "test.csv", "x,y\n0,0.1\n1,2.2\n5,5\n2,1.5\n");
    let db = dir.path().join("run.db");

    let results = run(&db, &ideal, &test).unwrap();
    assert_eq!(results.len(), 3);

    let stored = open(&db).read_mapping().unwrap();
    assert_eq!(stored, results);

    let names: Vec<&str> = stored.iter().map(|r| r.chosen_function.as_str()).collect();
    assert_eq!(names, ["y2", "y1", "y2"]);
    assert!((stored[1].deviation - 0.2).abs() < 1e-12);
    // y2 and y3 tie at x = 2; the earlier column wins
    assert_eq!(stored[2].deviation, 0.5);
}

#[test]
fn malformed_test_row_commits_nothing() {
    let dir = tempdir().unwrap();
    let ideal = write(dir.path(), "ideal.csv", IDEAL);
    let test = write(dir.path(), "test.csv", "x,y\n0,0.1\n1,2.2\n1,abc\n2,1.5\n");
    let db = dir.path().join("run.db");

    let err = run(&db, &ideal, &test).unwrap_err();
    assert_eq!(
        err,
        MatchError::MalformedRow {
            source: test.display().to_string(),
            line: 4,
            value: "abc".into()
        }
    );
    assert!(open(&db).read_mapping().unwrap().is_empty());
}

#[test]
fn header_only_ideal_is_empty_candidate_set() {
    let dir = tempdir().unwrap();
    let ideal = write(dir.path(), "ideal.csv", "x,y1\n");
    let test = write(dir.path(), "test.csv", "x,y\n1,1\n");
    let db = dir.path().join("run.db");

    let err = run(&db, &ideal, &test).unwrap_err();
    assert!(matches!(err, MatchError::EmptyCandidateSet(_)));
}

#[test]
fn missing_test_file_is_unavailable() {
    let dir = tempdir().unwrap();
    let ideal = write(dir.path(), "ideal.csv", IDEAL);
    let db = dir.path().join("run.db");

    let err = run(&db, &ideal, &dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(err, MatchError::SourceUnavailable { .. }));
}

#[test]
fn rerun_on_fresh_database_is_identical() {
    let dir = tempdir().unwrap();
    let ideal = write(dir.path(), "ideal.csv", IDEAL);
    let test = write(dir.path(), "test.csv", "x,y\n-1,0\n0,2\n1,1.5\n2,2.5\n");
    let db = dir.path().join("run.db");

    run(&db, &ideal, &test).unwrap();
    let first = open(&db).read_mapping().unwrap();
    run(&db, &ideal, &test).unwrap();
    let second = open(&db).read_mapping().unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
}

#[test]
fn match_from_imported_test_table() {
    let dir = tempdir().unwrap();
    let ideal = write(dir.path(), "ideal.csv", IDEAL);
    let test = write(dir.path(), "test.csv", "x,y\n0,0.1\n7,7\n");
    let db = dir.path().join("run.db");

    let mut store = open(&db);
    store.bootstrap().unwrap();
    store.import_csv(Dataset::Ideal, &ideal, None).unwrap();
    store.import_csv(Dataset::Test, &test, None).unwrap();

    let mut candidates = store.load_candidates().unwrap();
    let mut reader = open(&db);
    let report = execute(&mut candidates, &mut reader, &mut store).unwrap();

    assert_eq!(report.points_read, 2);
    assert_eq!(report.matched, 1);
    assert_eq!(report.dropped, 1);
    assert_eq!(store.read_mapping().unwrap()[0].chosen_function, "y2");
}
