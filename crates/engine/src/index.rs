use std::collections::HashMap;

use ordered_float::OrderedFloat;

use crate::error::MatchError;
use crate::model::CandidateTable;

/// x → {candidate → y} lookup over the ideal table.
///
/// Built once per run and shared read-only by every match. Keys compare by
/// exact `f64` equality; there is no tolerance.
#[derive(Debug, Clone)]
pub struct CandidateIndex {
    columns: Vec<String>,
    by_x: HashMap<OrderedFloat<f64>, Vec<Option<f64>>>,
}

fn key(x: f64) -> OrderedFloat<f64> {
    // -0.0 and 0.0 are the same sample position
    OrderedFloat(if x == 0.0 { 0.0 } else { x })
}

impl CandidateIndex {
    /// Index the whole table. Fails if there is nothing to match against.
    pub fn build(table: &CandidateTable) -> Result<Self, MatchError> {
        let columns = table.columns().to_vec();
        if columns.is_empty() {
            return Err(MatchError::EmptyCandidateSet("ideal table has no candidate columns".into()));
        }
        if table.rows().is_empty() {
            return Err(MatchError::EmptyCandidateSet("ideal table has no rows".into()));
        }

        let mut by_x: HashMap<OrderedFloat<f64>, Vec<Option<f64>>> = HashMap::new();
        for row in table.rows() {
            let slot = by_x
                .entry(key(row.x))
                .or_insert_with(|| vec![None; columns.len()]);
            // Repeated x: the first row that defines a column keeps it.
            for (cell, value) in slot.iter_mut().zip(&row.values) {
                if cell.is_none() {
                    *cell = *value;
                }
            }
        }

        log::debug!(
            "indexed {} candidate(s) over {} distinct x value(s)",
            columns.len(),
            by_x.len()
        );

        Ok(Self { columns, by_x })
    }

    /// Candidates defined at exactly `x`, in column order. Empty if none.
    pub fn lookup(&self, x: f64) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.by_x
            .get(&key(x))
            .into_iter()
            .flat_map(move |values| {
                self.columns
                    .iter()
                    .zip(values)
                    .filter_map(|(name, value)| value.map(|y| (name.as_str(), y)))
            })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of distinct x values.
    pub fn len(&self) -> usize {
        self.by_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_x.is_empty()
    }
}
