// SQLite store for the train / ideal / test tables and the result mapping

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use rusqlite::types::Value;

use idealfit_engine::source::PointIter;
use idealfit_engine::{
    CandidateStore, CandidateTable, MatchError, MatchResult, ResultSink, TestPoint, TestPointSource,
};

use crate::connector::{Connector, SqliteConnector};
use crate::csv::{read_numeric_csv, read_points_csv, NumericCsv};
use crate::error::IoError;

pub const MAPPING_TABLE: &str = "mapping";

const MAPPING_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS mapping (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    x REAL NOT NULL,
    y REAL NOT NULL,
    ideal_function TEXT NOT NULL,
    deviation REAL NOT NULL CHECK (deviation >= 0)
);
"#;

/// The three imported datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Train,
    Ideal,
    Test,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::Train, Dataset::Ideal, Dataset::Test];

    pub fn table(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Ideal => "ideal",
            Self::Test => "test",
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

// Constant pattern; compiled on first use.
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Value column names must be plain identifiers and must not shadow `id`/`x`.
fn check_columns(dataset: Dataset, columns: &[String]) -> Result<(), IoError> {
    for name in columns {
        if !IDENTIFIER.is_match(name) {
            return Err(IoError::Schema(format!("{dataset}: invalid column name '{name}'")));
        }
        if name.eq_ignore_ascii_case("id") || name.eq_ignore_ascii_case("x") {
            return Err(IoError::Schema(format!("{dataset}: reserved column name '{name}'")));
        }
    }
    Ok(())
}

fn cell_number(value: &Value, source: &str, line: usize) -> Result<Option<f64>, IoError> {
    let bad = |shown: String| IoError::Number {
        source: source.into(),
        line,
        value: shown,
    };
    match value {
        Value::Null => Ok(None),
        Value::Integer(i) => Ok(Some(*i as f64)),
        Value::Real(v) if v.is_finite() => Ok(Some(*v)),
        Value::Real(v) => Err(bad(v.to_string())),
        Value::Text(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(bad(s.clone())),
        },
        Value::Blob(_) => Err(bad("<blob>".into())),
    }
}

/// Function store over any [`Connector`]. Owns the connection for its lifetime.
pub struct SqliteStore<C: Connector = SqliteConnector> {
    conn: C,
}

impl<C: Connector> SqliteStore<C> {
    /// Open the connector and wrap it.
    pub fn open(mut conn: C) -> Result<Self, IoError> {
        conn.open()?;
        Ok(Self { conn })
    }

    pub fn close(mut self) -> Result<(), IoError> {
        self.conn.close()
    }

    pub fn connector(&self) -> &C {
        &self.conn
    }

    /// Run `f` inside a transaction; roll back on any error.
    fn in_transaction<T>(&self, f: impl FnOnce(&C) -> Result<T, IoError>) -> Result<T, IoError> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(&self.conn) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    log::warn!("rollback failed: {rollback}");
                }
                Err(e)
            }
        }
    }

    /// Drop every table and recreate an empty result mapping.
    pub fn bootstrap(&self) -> Result<(), IoError> {
        let mut ddl = String::new();
        for dataset in Dataset::ALL {
            ddl.push_str(&format!("DROP TABLE IF EXISTS \"{}\";\n", dataset.table()));
        }
        ddl.push_str(&format!("DROP TABLE IF EXISTS {MAPPING_TABLE};\n"));
        ddl.push_str(MAPPING_SCHEMA);
        self.conn.execute_batch(&ddl)?;
        log::info!("database schema initialized");
        Ok(())
    }

    /// Empty the result mapping so the next commit starts fresh.
    pub fn reset_results(&self) -> Result<(), IoError> {
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {MAPPING_TABLE};\n{MAPPING_SCHEMA}"))
    }

    pub fn table_exists(&self, table: &str) -> Result<bool, IoError> {
        let rows = self.conn.query(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            &[Value::Text(table.into())],
        )?;
        Ok(!rows.rows.is_empty())
    }

    /// Replace a dataset's table with the contents of `csv`.
    ///
    /// The first CSV column is stored as `x`; test data keeps only (x, y).
    pub fn import(&self, dataset: Dataset, csv: &NumericCsv) -> Result<usize, IoError> {
        let table = dataset.table();
        let columns: Vec<String> = match dataset {
            Dataset::Test => {
                if csv.headers.len() < 2 {
                    return Err(IoError::Schema(format!("{dataset}: expected x and y columns")));
                }
                vec!["y".into()]
            }
            Dataset::Train | Dataset::Ideal => {
                let columns = csv.value_columns().to_vec();
                check_columns(dataset, &columns)?;
                columns
            }
        };

        let column_defs: String = columns.iter().map(|c| format!(", \"{c}\" REAL")).collect();
        let column_list: String = columns.iter().map(|c| format!(", \"{c}\"")).collect();
        let placeholders: String = (0..columns.len()).map(|i| format!(", ?{}", i + 2)).collect();
        let insert = format!("INSERT INTO \"{table}\" (x{column_list}) VALUES (?1{placeholders})");
        let first_line = if csv.had_header { 2 } else { 1 };

        let count = self.in_transaction(|conn| {
            conn.execute_batch(&format!(
                "DROP TABLE IF EXISTS \"{table}\";\n\
                 CREATE TABLE \"{table}\" (id INTEGER PRIMARY KEY AUTOINCREMENT, x REAL NOT NULL{column_defs});"
            ))?;

            for (i, row) in csv.rows.iter().enumerate() {
                let line = first_line + i;
                let missing = |col: &str| IoError::Number {
                    source: format!("{table}.{col}"),
                    line,
                    value: String::new(),
                };
                let x = row.first().copied().flatten().ok_or_else(|| missing("x"))?;

                let mut params = Vec::with_capacity(columns.len() + 1);
                params.push(Value::Real(x));
                for (j, name) in columns.iter().enumerate() {
                    let cell = row.get(j + 1).copied().flatten();
                    match (dataset, cell) {
                        (Dataset::Test, None) => return Err(missing(name)),
                        (_, Some(v)) => params.push(Value::Real(v)),
                        (_, None) => params.push(Value::Null),
                    }
                }
                conn.execute(&insert, &params)?;
            }
            Ok(csv.rows.len())
        })?;

        log::info!("imported {count} row(s) into {table}");
        Ok(count)
    }

    /// Parse a CSV file and import it as `dataset`.
    pub fn import_csv(&self, dataset: Dataset, path: &Path, delimiter: Option<u8>) -> Result<usize, IoError> {
        let csv = match dataset {
            Dataset::Test => read_points_csv(path, delimiter)?,
            Dataset::Train | Dataset::Ideal => read_numeric_csv(path, delimiter)?,
        };
        self.import(dataset, &csv)
    }

    /// Read a dataset back as x plus its value columns, in insertion order.
    pub fn read_table(&self, dataset: Dataset) -> Result<NumericCsv, IoError> {
        let table = dataset.table();
        let result = self
            .conn
            .query(&format!("SELECT * FROM \"{table}\" ORDER BY id"), &[])?;

        let id_col = result.columns.iter().position(|c| c == "id");
        let x_col = result
            .columns
            .iter()
            .position(|c| c == "x")
            .ok_or_else(|| IoError::Schema(format!("{table}: missing x column")))?;
        let value_cols: Vec<usize> = (0..result.columns.len())
            .filter(|&i| i != x_col && Some(i) != id_col)
            .collect();

        let mut headers = vec!["x".to_string()];
        headers.extend(value_cols.iter().map(|&i| result.columns[i].clone()));

        let mut rows = Vec::with_capacity(result.rows.len());
        for (n, row) in result.rows.iter().enumerate() {
            let line = match id_col.map(|i| &row[i]) {
                Some(Value::Integer(id)) => *id as usize,
                _ => n + 1,
            };
            let mut values = Vec::with_capacity(headers.len());
            values.push(cell_number(&row[x_col], table, line)?);
            for &i in &value_cols {
                values.push(cell_number(&row[i], table, line)?);
            }
            rows.push(values);
        }

        Ok(NumericCsv {
            headers,
            rows,
            had_header: true,
        })
    }

    /// Committed results in insertion order.
    pub fn read_mapping(&self) -> Result<Vec<MatchResult>, IoError> {
        let result = self.conn.query(
            &format!("SELECT x, y, ideal_function, deviation FROM {MAPPING_TABLE} ORDER BY id"),
            &[],
        )?;

        result
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let line = i + 1;
                let num = |v: &Value| {
                    cell_number(v, MAPPING_TABLE, line)?.ok_or_else(|| IoError::Number {
                        source: MAPPING_TABLE.into(),
                        line,
                        value: "NULL".into(),
                    })
                };
                let chosen_function = match &row[2] {
                    Value::Text(s) => s.clone(),
                    other => return Err(IoError::Schema(format!("mapping row {line}: bad function name {other:?}"))),
                };
                Ok(MatchResult {
                    x: num(&row[0])?,
                    y: num(&row[1])?,
                    chosen_function,
                    deviation: num(&row[3])?,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Engine collaborators
// ---------------------------------------------------------------------------

impl<C: Connector> CandidateStore for SqliteStore<C> {
    fn load_candidates(&mut self) -> Result<CandidateTable, MatchError> {
        let source = Dataset::Ideal.table();
        let csv = self.read_table(Dataset::Ideal).map_err(|e| e.into_read_error(source))?;
        csv.into_candidate_table(source)
    }
}

impl<C: Connector> TestPointSource for SqliteStore<C> {
    fn points(&mut self) -> Result<PointIter<'_>, MatchError> {
        let source = Dataset::Test.table();
        let csv = self.read_table(Dataset::Test).map_err(|e| e.into_read_error(source))?;
        let y_col = csv
            .headers
            .iter()
            .position(|h| h == "y")
            .ok_or_else(|| MatchError::source_unavailable(source, "missing y column"))?;

        Ok(Box::new(csv.rows.into_iter().enumerate().map(move |(i, row)| {
            match (row[0], row[y_col]) {
                (Some(x), Some(y)) => Ok(TestPoint::new(x, y)),
                _ => Err(MatchError::malformed(source, i + 1, "NULL")),
            }
        })))
    }
}

/// A commit replaces the whole mapping in one transaction; a failed
/// commit leaves the previous mapping untouched.
impl<C: Connector> ResultSink for SqliteStore<C> {
    fn commit(&mut self, results: &[MatchResult]) -> Result<(), MatchError> {
        let insert = format!(
            "INSERT INTO {MAPPING_TABLE} (x, y, ideal_function, deviation) VALUES (?1, ?2, ?3, ?4)"
        );
        self.conn
            .execute_batch(MAPPING_SCHEMA)
            .and_then(|_| {
                self.in_transaction(|conn| {
                    conn.execute(&format!("DELETE FROM {MAPPING_TABLE}"), &[])?;
                    for r in results {
                        conn.execute(
                            &insert,
                            &[
                                Value::Real(r.x),
                                Value::Real(r.y),
                                Value::Text(r.chosen_function.clone()),
                                Value::Real(r.deviation),
                            ],
                        )?;
                    }
                    Ok(())
                })
            })
            .map_err(IoError::into_write_error)
    }
}
