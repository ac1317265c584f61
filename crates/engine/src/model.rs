use serde::Serialize;

use crate::error::MatchError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single noisy measurement to be explained by one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestPoint {
    pub x: f64,
    pub y: f64,
}

impl TestPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One row of the ideal table. `values[i]` belongs to `columns[i]`;
/// `None` means that candidate is undefined at `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRow {
    pub x: f64,
    pub values: Vec<Option<f64>>,
}

/// The full ideal-function table as read from the store.
///
/// Column order is significant: it is the tie-break order of the matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTable {
    columns: Vec<String>,
    rows: Vec<CandidateRow>,
}

impl CandidateTable {
    /// Build a table, checking column names and row widths.
    pub fn new(columns: Vec<String>, rows: Vec<CandidateRow>) -> Result<Self, MatchError> {
        for (i, name) in columns.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(MatchError::malformed("candidate header", 1, format!("column {}", i + 2)));
            }
            if columns[..i].contains(name) {
                return Err(MatchError::malformed("candidate header", 1, name.clone()));
            }
        }

        for (i, row) in rows.iter().enumerate() {
            let line = i + 1;
            if row.values.len() != columns.len() {
                return Err(MatchError::malformed(
                    "candidate table",
                    line,
                    format!("{} values for {} columns", row.values.len(), columns.len()),
                ));
            }
            if !row.x.is_finite() {
                return Err(MatchError::malformed("candidate table", line, row.x.to_string()));
            }
            if let Some(bad) = row.values.iter().flatten().find(|v| !v.is_finite()) {
                return Err(MatchError::malformed("candidate table", line, bad.to_string()));
            }
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[CandidateRow] {
        &self.rows
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The decision for one test point. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "ideal_function")]
    pub chosen_function: String,
    pub deviation: f64,
}

/// Summary of one completed run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub points_read: usize,
    pub matched: usize,
    pub dropped: usize,
    pub results: Vec<MatchResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(x: f64, values: &[Option<f64>]) -> CandidateRow {
        CandidateRow { x, values: values.to_vec() }
    }

    #[test]
    fn table_accepts_sparse_rows() {
        let table = CandidateTable::new(
            vec!["y1".into(), "y2".into()],
            vec![row(1.0, &[Some(2.0), None]), row(2.0, &[None, Some(4.0)])],
        )
        .unwrap();
        assert_eq!(table.columns(), ["y1", "y2"]);
        assert_eq!(table.rows().len(), 2);
    }

    #[test]
    fn duplicate_column_rejected() {
        let err = CandidateTable::new(vec!["y1".into(), "y1".into()], vec![]).unwrap_err();
        assert!(matches!(err, MatchError::MalformedRow { ref value, .. } if value == "y1"));
    }

    #[test]
    fn ragged_row_rejected() {
        let err = CandidateTable::new(vec!["y1".into(), "y2".into()], vec![row(1.0, &[Some(1.0)])])
            .unwrap_err();
        assert!(matches!(err, MatchError::MalformedRow { line: 1, .. }));
    }

    #[test]
    fn non_finite_value_rejected() {
        let err = CandidateTable::new(vec!["y1".into()], vec![row(1.0, &[Some(f64::NAN)])])
            .unwrap_err();
        assert!(matches!(err, MatchError::MalformedRow { .. }));
    }

    #[test]
    fn result_serializes_with_ideal_function_key() {
        let r = MatchResult {
            x: 1.0,
            y: 2.05,
            chosen_function: "y1".into(),
            deviation: 0.05,
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["ideal_function"], "y1");
        assert!(json.get("chosen_function").is_none());
    }
}
