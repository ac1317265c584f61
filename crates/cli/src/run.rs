//! `idealfit run` / `idealfit validate`: config-driven runs.

use std::path::{Path, PathBuf};

use idealfit_config::{ConfigError, RunConfig};
use idealfit_engine::{execute, CandidateStore, RunReport};
use idealfit_io::chart::{render_svg, ChartData};
use idealfit_io::{Dataset, SqliteConnector, SqliteStore};

use crate::exit_codes::{EXIT_ERROR, EXIT_OUTPUT, EXIT_USAGE};
use crate::CliError;

fn config_err(e: ConfigError) -> CliError {
    CliError::new(EXIT_USAGE, e.to_string())
}

pub fn cmd_run(config_path: PathBuf, json_output: bool, database: Option<PathBuf>) -> Result<(), CliError> {
    let config = RunConfig::load(&config_path).map_err(config_err)?;
    let delimiter = config.csv.delimiter_byte().map_err(config_err)?;
    let db_path = database.unwrap_or_else(|| config.database_path());
    log::info!("run '{}' using {}", config.name, db_path.display());

    let mut store = SqliteStore::open(SqliteConnector::file(&db_path))
        .map_err(|e| CliError::io(e).with_hint(format!("database: {}", db_path.display())))?;
    store.bootstrap()?;

    if let Some(train) = &config.inputs.train {
        import(&store, Dataset::Train, train, delimiter)?;
    }
    import(&store, Dataset::Ideal, &config.inputs.ideal, delimiter)?;
    import(&store, Dataset::Test, &config.inputs.test, delimiter)?;

    // The test file is parsed once, into its table; the pass reads it back
    // over a second connection while `store` takes the commit.
    let mut candidates = store.load_candidates()?;
    let mut points = SqliteStore::open(SqliteConnector::file(&db_path))?;
    let report = execute(&mut candidates, &mut points, &mut store)?;
    points.close()?;

    if let Some(chart) = &config.output.chart {
        let data = ChartData::new(&config.name)
            .with_training(&store.read_table(Dataset::Train)?)
            .with_test(&store.read_table(Dataset::Test)?)
            .with_results(&report.results);
        render_svg(&data, chart, config.chart_size())?;
        eprintln!("wrote {}", chart.display());
    }

    store.close()?;
    emit_report(&report, json_output, config.output.json.as_deref())?;
    eprintln!("{}: {}", config.name, summary(&report));
    Ok(())
}

fn import(store: &SqliteStore, dataset: Dataset, path: &Path, delimiter: Option<u8>) -> Result<usize, CliError> {
    let rows = store
        .import_csv(dataset, path, delimiter)
        .map_err(|e| CliError::import(e, path))?;
    log::info!("{dataset}: {rows} row(s) from {}", path.display());
    Ok(rows)
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = RunConfig::load(&config_path).map_err(config_err)?;
    eprintln!(
        "valid: run '{}' (ideal {}, test {}, database {})",
        config.name,
        config.inputs.ideal.display(),
        config.inputs.test.display(),
        config.database_path().display(),
    );
    Ok(())
}

pub fn summary(report: &RunReport) -> String {
    format!(
        "{} point(s) read, {} matched, {} dropped",
        report.points_read, report.matched, report.dropped
    )
}

/// Write the report as JSON to `file` and/or stdout.
pub fn emit_report(report: &RunReport, stdout: bool, file: Option<&Path>) -> Result<(), CliError> {
    if !stdout && file.is_none() {
        return Ok(());
    }
    let json_str = serde_json::to_string_pretty(report)
        .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;

    if let Some(path) = file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::new(EXIT_OUTPUT, format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }
    if stdout {
        println!("{json_str}");
    }
    Ok(())
}
