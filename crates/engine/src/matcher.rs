use crate::index::CandidateIndex;
use crate::model::{MatchResult, TestPoint};

/// Pick the candidate with the smallest absolute deviation at `point.x`.
///
/// Returns `None` when no candidate is defined at that x. Candidates are
/// scanned in column order and only a strictly smaller deviation replaces
/// the current best, so the earliest column wins exact ties.
pub fn match_point(point: &TestPoint, index: &CandidateIndex) -> Option<MatchResult> {
    let mut best: Option<(&str, f64)> = None;

    for (name, candidate_y) in index.lookup(point.x) {
        let deviation = (point.y - candidate_y).abs();
        match best {
            Some((_, min)) if deviation >= min => {}
            _ => best = Some((name, deviation)),
        }
    }

    best.map(|(name, deviation)| MatchResult {
        x: point.x,
        y: point.y,
        chosen_function: name.to_string(),
        deviation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CandidateRow, CandidateTable};
    use proptest::prelude::*;

    fn index(columns: &[&str], rows: Vec<(f64, Vec<Option<f64>>)>) -> CandidateIndex {
        let table = CandidateTable::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.into_iter().map(|(x, values)| CandidateRow { x, values }).collect(),
        )
        .unwrap();
        CandidateIndex::build(&table).unwrap()
    }

    fn two_lines() -> CandidateIndex {
        index(
            &["y1", "y2"],
            vec![
                (1.0, vec![Some(2.0), Some(3.0)]),
                (2.0, vec![Some(3.0), Some(4.0)]),
            ],
        )
    }

    #[test]
    fn picks_nearest_candidate() {
        let r = match_point(&TestPoint::new(1.0, 2.05), &two_lines()).unwrap();
        assert_eq!(r.chosen_function, "y1");
        assert_eq!(r.x, 1.0);
        assert_eq!(r.y, 2.05);
        assert!((r.deviation - 0.05).abs() < 1e-12);
    }

    #[test]
    fn picks_later_column_when_closer() {
        let r = match_point(&TestPoint::new(2.0, 3.9), &two_lines()).unwrap();
        assert_eq!(r.chosen_function, "y2");
        assert!((r.deviation - 0.1).abs() < 1e-12);
    }

    #[test]
    fn undefined_x_is_dropped() {
        assert!(match_point(&TestPoint::new(3.0, 5.0), &two_lines()).is_none());
    }

    #[test]
    fn tie_goes_to_first_column() {
        let idx = index(&["y1", "y2"], vec![(1.0, vec![Some(2.0), Some(2.0)])]);
        let r = match_point(&TestPoint::new(1.0, 2.0), &idx).unwrap();
        assert_eq!(r.chosen_function, "y1");
        assert_eq!(r.deviation, 0.0);
    }

    #[test]
    fn tie_on_both_sides_goes_to_first_column() {
        let idx = index(&["a", "b", "c"], vec![(0.0, vec![Some(5.0), Some(1.0), Some(3.0)])]);
        // |3-1| == |3-5| == 2, but c is exact
        let r = match_point(&TestPoint::new(0.0, 3.0), &idx).unwrap();
        assert_eq!(r.chosen_function, "c");

        let r = match_point(&TestPoint::new(0.0, 2.0), &idx).unwrap();
        // b: 1, c: 1, a: 3
        assert_eq!(r.chosen_function, "b");
    }

    #[test]
    fn only_defined_candidates_compete() {
        let idx = index(&["y1", "y2"], vec![(1.0, vec![None, Some(100.0)])]);
        let r = match_point(&TestPoint::new(1.0, 0.0), &idx).unwrap();
        assert_eq!(r.chosen_function, "y2");
        assert_eq!(r.deviation, 100.0);
    }

    fn candidate_values() -> impl Strategy<Value = Vec<Option<f64>>> {
        prop::collection::vec(prop::option::of(-1.0e6..1.0e6f64), 1..12)
    }

    proptest! {
        #[test]
        fn chosen_deviation_is_minimal(values in candidate_values(), y in -1.0e6..1.0e6f64) {
            let names: Vec<String> = (1..=values.len()).map(|i| format!("y{i}")).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let idx = index(&refs, vec![(1.0, values.clone())]);

            match match_point(&TestPoint::new(1.0, y), &idx) {
                None => prop_assert!(values.iter().all(Option::is_none)),
                Some(r) => {
                    let pos = names.iter().position(|n| *n == r.chosen_function).unwrap();
                    let chosen_y = values[pos].unwrap();
                    prop_assert_eq!(r.deviation, (y - chosen_y).abs());
                    for (i, v) in values.iter().enumerate() {
                        if let Some(v) = v {
                            let d = (y - v).abs();
                            prop_assert!(r.deviation <= d);
                            // earlier columns never tie with the winner
                            if i < pos {
                                prop_assert!(d > r.deviation);
                            }
                        }
                    }
                }
            }
        }

        #[test]
        fn repeated_matching_is_deterministic(values in candidate_values(), y in -100.0..100.0f64) {
            let names: Vec<String> = (1..=values.len()).map(|i| format!("y{i}")).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let idx = index(&refs, vec![(2.5, values)]);
            let p = TestPoint::new(2.5, y);
            prop_assert_eq!(match_point(&p, &idx), match_point(&p, &idx));
        }
    }
}
