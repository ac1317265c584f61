//! `idealfit import` / `match` / `plot`: step-by-step work on one database.

use std::path::{Path, PathBuf};

use idealfit_engine::{execute, CandidateStore, TestPointSource};
use idealfit_io::chart::{render_svg, ChartData};
use idealfit_io::csv::CsvTestPoints;
use idealfit_io::{Dataset, SqliteConnector, SqliteStore};

use crate::run::{emit_report, summary};
use crate::{delimiter_byte, CliError};

fn open(db: &Path) -> Result<SqliteStore, CliError> {
    SqliteStore::open(SqliteConnector::file(db))
        .map_err(|e| CliError::io(e).with_hint(format!("database: {}", db.display())))
}

pub fn cmd_import(
    db: PathBuf,
    train: Option<PathBuf>,
    ideal: Option<PathBuf>,
    test: Option<PathBuf>,
    delimiter: Option<char>,
) -> Result<(), CliError> {
    let inputs: Vec<(Dataset, PathBuf)> = [(Dataset::Train, train), (Dataset::Ideal, ideal), (Dataset::Test, test)]
        .into_iter()
        .filter_map(|(dataset, path)| path.map(|p| (dataset, p)))
        .collect();
    if inputs.is_empty() {
        return Err(CliError::args("nothing to import").with_hint("pass at least one of --train, --ideal, --test"));
    }
    let delimiter = delimiter.map(delimiter_byte).transpose()?;

    let store = open(&db)?;
    for (dataset, path) in &inputs {
        let rows = store
            .import_csv(*dataset, path, delimiter)
            .map_err(|e| CliError::import(e, path))?;
        eprintln!("{dataset}: {rows} row(s) from {}", path.display());
    }
    // Imported data invalidates any earlier mapping.
    store.reset_results()?;
    store.close()?;
    Ok(())
}

pub fn cmd_match(db: PathBuf, test: Option<PathBuf>, delimiter: char, json_output: bool) -> Result<(), CliError> {
    let delimiter = delimiter_byte(delimiter)?;
    let mut store = open(&db)?;

    // The commit replaces the previous mapping; a failed pass keeps it.
    let mut candidates = store.load_candidates()?;
    let mut source: Box<dyn TestPointSource> = match test {
        Some(path) => Box::new(CsvTestPoints::new(path, delimiter)),
        None => Box::new(open(&db)?),
    };
    let report = execute(&mut candidates, source.as_mut(), &mut store)?;
    drop(source);

    store.close()?;
    emit_report(&report, json_output, None)?;
    eprintln!("{}", summary(&report));
    Ok(())
}

pub fn cmd_plot(db: PathBuf, output: PathBuf, title: String, size: (u32, u32)) -> Result<(), CliError> {
    let store = open(&db)?;
    let mut data = ChartData::new(title).with_results(&store.read_mapping()?);
    if store.table_exists(Dataset::Train.table())? {
        data = data.with_training(&store.read_table(Dataset::Train)?);
    }
    if store.table_exists(Dataset::Test.table())? {
        data = data.with_test(&store.read_table(Dataset::Test)?);
    }
    store.close()?;

    render_svg(&data, &output, size)?;
    eprintln!("wrote {}", output.display());
    Ok(())
}
