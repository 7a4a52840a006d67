//! Derived song scores
//!
//! | score        | source                                         | scale       |
//! |--------------|------------------------------------------------|-------------|
//! | `energy`     | tempo (`bpm`)                                  | 1-10        |
//! | `aggression` | `2 * number_fights + [victory_win_won == Yes]` | 1-10        |
//! | `cliche`     | `trope_count`                                  | raw count   |
//! | `complexity` | `sec_duration`                                 | 1-10        |
//!
//! The 1-10 scores are min-max normalized over the records being scored, so the same
//! song can score differently in a different selection.

use serde::{Deserialize, Serialize};

use crate::record::RawSongRecord;

/// Score given to every value of a constant column.
pub const CONSTANT_COLUMN_SCORE: f64 = 5.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SongScores {
    pub energy: f64,
    pub aggression: f64,
    pub cliche: f64,
    pub complexity: f64,
}

impl SongScores {
    /// Composite of energy and aggression used to qualify winning-manifold nodes.
    #[must_use]
    pub fn spirit(&self) -> f64 {
        (self.energy + self.aggression) / 2.0
    }
}

/// Min-max scales `values` onto `[1, 10]`.
///
/// # Examples
///
/// ```
/// use anthem_features::scores::normalize_1_10;
///
/// assert_eq!(normalize_1_10(&[0.0, 5.0, 10.0]), [1.0, 5.5, 10.0]);
/// assert_eq!(normalize_1_10(&[3.0, 3.0]), [5.5, 5.5]);
/// ```
#[must_use]
pub fn normalize_1_10(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max <= min {
        return vec![CONSTANT_COLUMN_SCORE; values.len()];
    }
    values
        .iter()
        .map(|v| 1.0 + (v - min) / (max - min) * 9.0)
        .collect()
}

/// Scores every record, normalizing over the whole slice.
#[must_use]
pub fn score_songs(records: &[RawSongRecord]) -> Vec<SongScores> {
    let column = |f: fn(&RawSongRecord) -> f64| records.iter().map(f).collect::<Vec<_>>();

    let energy = normalize_1_10(&column(|r| r.bpm));
    let aggression = normalize_1_10(&column(|r| {
        2.0 * f64::from(r.number_fights) + f64::from(u8::from(r.victory_win_won.is_yes()))
    }));
    let complexity = normalize_1_10(&column(|r| r.sec_duration));

    records
        .iter()
        .enumerate()
        .map(|(i, record)| SongScores {
            energy: energy[i],
            aggression: aggression[i],
            cliche: f64::from(record.trope_count),
            complexity: complexity[i],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{YesNo, tests::song};

    #[test]
    fn test_normalize_empty() {
        assert!(normalize_1_10(&[]).is_empty());
    }

    #[test]
    fn test_scores() {
        let mut slow = song("Indiana", "Big Ten");
        slow.bpm = 80.0;
        slow.sec_duration = 30.0;
        slow.number_fights = 0;
        slow.trope_count = 1;

        let mut fast = song("Michigan", "Big Ten");
        fast.bpm = 160.0;
        fast.sec_duration = 90.0;
        fast.number_fights = 4;
        fast.victory_win_won = YesNo::Yes;
        fast.trope_count = 6;

        let mut middle = song("Iowa", "Big Ten");
        middle.bpm = 120.0;
        middle.sec_duration = 60.0;
        middle.number_fights = 2;
        middle.trope_count = 3;

        let scores = score_songs(&[slow, fast, middle]);
        assert_eq!(scores[0].energy, 1.0);
        assert_eq!(scores[1].energy, 10.0);
        assert_eq!(scores[2].energy, 5.5);
        // aggression raw values 0, 9, 4
        assert_eq!(scores[0].aggression, 1.0);
        assert_eq!(scores[1].aggression, 10.0);
        assert!((scores[2].aggression - 5.0).abs() < 1e-12);
        assert_eq!(scores[1].cliche, 6.0);
        assert_eq!(scores[2].complexity, 5.5);
        assert_eq!(scores[1].spirit(), 10.0);
    }

    #[test]
    fn test_aggression_with_huge_fight_count() {
        let mut loud = song("Ohio State", "Big Ten");
        loud.number_fights = u32::MAX;
        loud.victory_win_won = YesNo::Yes;
        let mut quiet = song("Purdue", "Big Ten");
        quiet.number_fights = 0;

        let scores = score_songs(&[loud, quiet]);
        assert_eq!(scores[0].aggression, 10.0);
        assert_eq!(scores[1].aggression, 1.0);
    }
}
