use anyhow::{anyhow, Result};
use serde_json::Value;

/// Piecewise step function over a numeric input.
///
/// Each entry maps an upper boundary to the score given to values up to
/// and including that boundary. Entries are kept in ascending boundary
/// order no matter how they were configured, so a table written from the
/// largest boundary down answers exactly like the same table written in
/// ascending order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreTable {
    entries: Vec<(f64, f64)>,
}

impl ScoreTable {
    /// Builds a table from `(boundary, score)` pairs in any order.
    /// When a boundary repeats, the last pair wins.
    pub fn new(entries: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut sorted: Vec<(f64, f64)> = Vec::new();
        for (boundary, score) in entries {
            match sorted.iter_mut().find(|(b, _)| *b == boundary) {
                Some(existing) => existing.1 = score,
                None => sorted.push((boundary, score)),
            }
        }
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { entries: sorted }
    }

    /// Table that answers `score` for every input.
    #[must_use]
    pub fn constant(score: f64) -> Self {
        Self::new([(0.0, score)])
    }

    /// Reads the configuration form of a table.
    ///
    /// Objects map numeric-string boundaries to scores
    /// (`{"119": -100, "400": 10}`); arrays use the index as the boundary
    /// (`[0.5]` is `{0: 0.5}`).
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (key, score) in map {
                    let boundary: f64 = key
                        .trim()
                        .parse()
                        .map_err(|_| anyhow!("threshold '{key}' is not a number"))?;
                    if !boundary.is_finite() {
                        return Err(anyhow!("threshold '{key}' must be finite"));
                    }
                    entries.push((boundary, score_at(key, score)?));
                }
                Ok(Self::new(entries))
            }
            Value::Array(items) => {
                let mut entries = Vec::with_capacity(items.len());
                for (idx, score) in items.iter().enumerate() {
                    entries.push((idx as f64, score_at(&idx.to_string(), score)?));
                }
                Ok(Self::new(entries))
            }
            other => Err(anyhow!(
                "score table must be an object or an array (got {other})"
            )),
        }
    }

    /// Looks up the score for `value`.
    ///
    /// Returns the score of the smallest boundary that is `>= value`. Values
    /// below the table get the first score, values above it get the last
    /// score, and an empty table scores everything 0.
    #[must_use]
    pub fn score(&self, value: f64) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let mut last = 0.0;
        for &(boundary, score) in &self.entries {
            last = score;
            if value <= boundary {
                break;
            }
        }
        last
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in ascending boundary order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.entries.iter().copied()
    }
}

fn score_at(key: &str, score: &Value) -> Result<f64> {
    score
        .as_f64()
        .filter(|s| s.is_finite())
        .ok_or_else(|| anyhow!("score for threshold '{key}' must be a finite number (got {score})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn table(entries: &[(f64, f64)]) -> ScoreTable {
        ScoreTable::new(entries.iter().copied())
    }

    #[test]
    fn empty_table_scores_zero() {
        assert_eq!(ScoreTable::default().score(100.0), 0.0);
    }

    #[test]
    fn float_single_entry() {
        assert_eq!(table(&[(0.0, 0.5)]).score(0.0), 0.5);
    }

    #[test]
    fn clamps_outside_range() {
        let t = table(&[(200.0, 2.0), (800.0, 1.0)]);
        assert_eq!(t.score(0.0), 2.0);
        assert_eq!(t.score(1000.0), 1.0);

        let reversed = table(&[(800.0, 1.0), (200.0, 2.0)]);
        assert_eq!(reversed.score(0.0), 2.0);
        assert_eq!(reversed.score(1000.0), 1.0);
    }

    #[test]
    fn boundaries_are_inclusive() {
        let t = table(&[(200.0, 2.0), (400.0, 3.0), (800.0, 1.0)]);
        assert_eq!(t.score(200.0), 2.0);
        assert_eq!(t.score(201.0), 3.0);
        assert_eq!(t.score(400.0), 3.0);
        assert_eq!(t.score(401.0), 1.0);
    }

    #[test]
    fn repeated_boundary_keeps_last_score() {
        let t = table(&[(10.0, 1.0), (10.0, 7.0)]);
        assert_eq!(t.len(), 1);
        assert_eq!(t.score(5.0), 7.0);
    }

    #[test]
    fn reads_object_and_array_forms() {
        let t = ScoreTable::from_value(&json!({"800": 1, "200": 2.5})).unwrap();
        assert_eq!(t.iter().collect::<Vec<_>>(), vec![(200.0, 2.5), (800.0, 1.0)]);

        let t = ScoreTable::from_value(&json!([0.5])).unwrap();
        assert_eq!(t.score(0.0), 0.5);
    }

    #[test]
    fn rejects_non_numeric_threshold() {
        let err = ScoreTable::from_value(&json!({"wide": 1})).unwrap_err();
        assert!(err.to_string().contains("'wide'"), "{err}");
    }

    #[test]
    fn rejects_non_numeric_score() {
        let err = ScoreTable::from_value(&json!({"10": "high"})).unwrap_err();
        assert!(err.to_string().contains("threshold '10'"), "{err}");
    }

    fn entries_strategy() -> impl Strategy<Value = Vec<(i32, i32)>> {
        prop::collection::btree_map(-1000i32..1000, -500i32..500, 1..8)
            .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #[test]
        fn proptest_empty_table_is_zero(value in -1.0e6f64..1.0e6) {
            prop_assert_eq!(ScoreTable::default().score(value), 0.0);
        }

        #[test]
        fn proptest_entry_order_does_not_matter(
            entries in entries_strategy(),
            value in -2000i32..2000,
        ) {
            let ascending: Vec<(f64, f64)> =
                entries.iter().map(|&(b, s)| (f64::from(b), f64::from(s))).collect();
            let mut descending = ascending.clone();
            descending.reverse();
            let value = f64::from(value);
            prop_assert_eq!(
                ScoreTable::new(ascending).score(value),
                ScoreTable::new(descending).score(value)
            );
        }

        #[test]
        fn proptest_preserves_non_increasing_tables(
            entries in entries_strategy(),
            a in -2000i32..2000,
            b in -2000i32..2000,
        ) {
            // Pair ascending boundaries with descending scores.
            let mut scores: Vec<i32> = entries.iter().map(|&(_, s)| s).collect();
            scores.sort_unstable_by(|x, y| y.cmp(x));
            let t = ScoreTable::new(
                entries
                    .iter()
                    .zip(scores)
                    .map(|(&(boundary, _), s)| (f64::from(boundary), f64::from(s))),
            );
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(t.score(f64::from(lo)) >= t.score(f64::from(hi)));
        }

        #[test]
        fn proptest_preserves_non_decreasing_tables(
            entries in entries_strategy(),
            a in -2000i32..2000,
            b in -2000i32..2000,
        ) {
            let mut scores: Vec<i32> = entries.iter().map(|&(_, s)| s).collect();
            scores.sort_unstable();
            let t = ScoreTable::new(
                entries
                    .iter()
                    .zip(scores)
                    .map(|(&(boundary, _), s)| (f64::from(boundary), f64::from(s))),
            );
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(t.score(f64::from(lo)) <= t.score(f64::from(hi)));
        }
    }
}
