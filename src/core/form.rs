//! Form Scoring
//!
//! Market-independent strength estimate for an entrant, built as the
//! product of four multiplicative factors (1.0 = neutral):
//!
//! ```text
//! form = gate × weight_change × ranking × last_3f
//! ```
//!
//! Any factor without data is neutral, so an entrant with no history
//! scores exactly 1.0 and the blend falls back toward the market.

use crate::models::{Entrant, PastResult};

/// Number of most recent races considered by the history factors
pub const RECENT_RACES: usize = 3;

/// Ranking factor slope and bounds
const RANKING_SLOPE: f64 = 0.40;
const RANKING_MIN: f64 = 0.80;
const RANKING_MAX: f64 = 1.20;

/// Multiplier per second of closing-time advantage over the field
const LAST_3F_SLOPE: f64 = 0.024;
const LAST_3F_MIN: f64 = 0.88;
const LAST_3F_MAX: f64 = 1.12;

/// Gate position factor
///
/// Inner gates (1-3) carry a small advantage, outer gates (7-8) a small
/// disadvantage. Unknown gate (None/0) is neutral.
pub fn gate_factor(gate_number: Option<u8>) -> f64 {
    match gate_number.unwrap_or(0) {
        0 => 1.00,
        1..=3 => 1.04,
        4..=6 => 1.00,
        _ => 0.96,
    }
}

/// Body weight change factor
///
/// # Examples
/// ```
/// use keiba::core::form::weight_change_factor;
/// assert_eq!(weight_change_factor(Some(4)), 1.04);
/// assert_eq!(weight_change_factor(Some(-14)), 0.90);
/// assert_eq!(weight_change_factor(None), 1.00);
/// ```
pub fn weight_change_factor(weight_change: Option<i32>) -> f64 {
    let Some(wc) = weight_change else {
        return 1.00;
    };

    if (2..=8).contains(&wc) {
        1.04
    } else if (-2..2).contains(&wc) {
        1.00
    } else if (-6..-2).contains(&wc) || (9..=12).contains(&wc) {
        0.95
    } else {
        0.90
    }
}

/// Recent finishing position factor
///
/// Each qualifying race (ranking present, field size > 1) scores
/// `(field_size - ranking) / (field_size - 1)`: 1.0 for a win, 0.0 for
/// last. The average maps linearly around 0.5 and is clamped to ±20%.
pub fn ranking_factor(history: &[PastResult]) -> f64 {
    let scores: Vec<f64> = history
        .iter()
        .take(RECENT_RACES)
        .filter_map(|r| match r.ranking {
            Some(rank) if r.field_size > 1 => {
                let n = r.field_size as f64;
                Some((n - rank as f64) / (n - 1.0))
            }
            _ => None,
        })
        .collect();

    if scores.is_empty() {
        return 1.00;
    }

    let avg = scores.iter().sum::<f64>() / scores.len() as f64;
    (1.0 + (avg - 0.5) * RANKING_SLOPE).clamp(RANKING_MIN, RANKING_MAX)
}

/// Average closing time over the recent races that recorded one
pub fn average_last_3f(history: &[PastResult]) -> Option<f64> {
    let times: Vec<f64> = history
        .iter()
        .take(RECENT_RACES)
        .map(|r| r.last_3f)
        .filter(|&t| t > 0.0)
        .collect();

    if times.is_empty() {
        None
    } else {
        Some(times.iter().sum::<f64>() / times.len() as f64)
    }
}

/// Closing speed factor relative to the field average
///
/// Faster (smaller) times than the field raise the factor by 2.4% per
/// second, clamped to ±12%.
pub fn last_3f_factor(history: &[PastResult], field_average: Option<f64>) -> f64 {
    let (Some(field_avg), Some(horse_avg)) = (field_average, average_last_3f(history)) else {
        return 1.00;
    };

    let diff = field_avg - horse_avg;
    (1.0 + diff * LAST_3F_SLOPE).clamp(LAST_3F_MIN, LAST_3F_MAX)
}

/// Per-factor breakdown of a form score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormBreakdown {
    pub gate: f64,
    pub weight_change: f64,
    pub ranking: f64,
    pub last_3f: f64,
}

impl FormBreakdown {
    pub fn score(&self) -> f64 {
        self.gate * self.weight_change * self.ranking * self.last_3f
    }
}

/// Form scorer bound to one field
///
/// Holds the field-wide closing-time average, so scores are only
/// meaningful for entrants of the field it was built from.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormScorer {
    field_last_3f: Option<f64>,
}

impl FormScorer {
    /// Build a scorer over the eligible entrants (odds > 0) of a field
    pub fn for_field(entrants: &[Entrant]) -> Self {
        let averages: Vec<f64> = entrants
            .iter()
            .filter(|e| e.odds_win > 0.0)
            .filter_map(|e| average_last_3f(&e.race_history))
            .collect();

        let field_last_3f = if averages.is_empty() {
            None
        } else {
            Some(averages.iter().sum::<f64>() / averages.len() as f64)
        };

        Self { field_last_3f }
    }

    pub fn field_last_3f(&self) -> Option<f64> {
        self.field_last_3f
    }

    pub fn breakdown(&self, entrant: &Entrant) -> FormBreakdown {
        FormBreakdown {
            gate: gate_factor(entrant.gate_number),
            weight_change: weight_change_factor(entrant.weight_change),
            ranking: ranking_factor(&entrant.race_history),
            last_3f: last_3f_factor(&entrant.race_history, self.field_last_3f),
        }
    }

    pub fn score(&self, entrant: &Entrant) -> f64 {
        self.breakdown(entrant).score()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(ranking: Option<u32>, field_size: u32, last_3f: f64) -> PastResult {
        PastResult::new(ranking, field_size, last_3f)
    }

    #[test]
    fn test_gate_factor() {
        assert_eq!(gate_factor(None), 1.00);
        assert_eq!(gate_factor(Some(0)), 1.00);
        assert_eq!(gate_factor(Some(1)), 1.04);
        assert_eq!(gate_factor(Some(3)), 1.04);
        assert_eq!(gate_factor(Some(4)), 1.00);
        assert_eq!(gate_factor(Some(6)), 1.00);
        assert_eq!(gate_factor(Some(7)), 0.96);
        assert_eq!(gate_factor(Some(8)), 0.96);
    }

    #[test]
    fn test_weight_change_boundaries() {
        assert_eq!(weight_change_factor(Some(2)), 1.04);
        assert_eq!(weight_change_factor(Some(8)), 1.04);
        assert_eq!(weight_change_factor(Some(-2)), 1.00);
        assert_eq!(weight_change_factor(Some(0)), 1.00);
        assert_eq!(weight_change_factor(Some(-3)), 0.95);
        assert_eq!(weight_change_factor(Some(-6)), 0.95);
        assert_eq!(weight_change_factor(Some(10)), 0.95);
        assert_eq!(weight_change_factor(Some(12)), 0.95);
        assert_eq!(weight_change_factor(Some(-7)), 0.90);
        assert_eq!(weight_change_factor(Some(13)), 0.90);
    }

    #[test]
    fn test_ranking_factor_no_history() {
        assert_eq!(ranking_factor(&[]), 1.00);
        // Unfinished or unknown field size does not qualify
        let history = vec![result(None, 16, 0.0), result(Some(1), 1, 0.0)];
        assert_eq!(ranking_factor(&history), 1.00);
    }

    #[test]
    fn test_ranking_factor_wins_and_lasts() {
        let wins = vec![result(Some(1), 10, 0.0); 3];
        assert!((ranking_factor(&wins) - 1.20).abs() < 1e-12);

        let lasts = vec![result(Some(10), 10, 0.0); 3];
        assert!((ranking_factor(&lasts) - 0.80).abs() < 1e-12);

        // Midfield finish is neutral
        let mid = vec![result(Some(5), 9, 0.0)];
        assert!((ranking_factor(&mid) - 1.00).abs() < 1e-12);
    }

    #[test]
    fn test_ranking_factor_only_three_most_recent() {
        let history = vec![
            result(Some(1), 10, 0.0),
            result(Some(1), 10, 0.0),
            result(Some(1), 10, 0.0),
            result(Some(10), 10, 0.0),
        ];
        assert!((ranking_factor(&history) - 1.20).abs() < 1e-12);
    }

    #[test]
    fn test_average_last_3f_skips_unknown() {
        let history = vec![result(Some(1), 10, 34.0), result(Some(2), 10, 0.0), result(Some(3), 10, 36.0)];
        assert_eq!(average_last_3f(&history), Some(35.0));
        assert_eq!(average_last_3f(&[result(Some(1), 10, 0.0)]), None);
    }

    #[test]
    fn test_last_3f_factor() {
        let history = vec![result(Some(1), 10, 34.0)];
        // One second faster than the field
        assert!((last_3f_factor(&history, Some(35.0)) - 1.024).abs() < 1e-12);
        // Far slower is clamped
        assert!((last_3f_factor(&history, Some(20.0)) - 0.88).abs() < 1e-12);
        // No field data or no entrant data is neutral
        assert_eq!(last_3f_factor(&history, None), 1.00);
        assert_eq!(last_3f_factor(&[], Some(35.0)), 1.00);
    }

    #[test]
    fn test_scorer_neutral_without_data() {
        let entrants = vec![Entrant::with_odds(1, 2.0), Entrant::with_odds(2, 3.0)];
        let scorer = FormScorer::for_field(&entrants);
        assert_eq!(scorer.field_last_3f(), None);
        assert_eq!(scorer.score(&entrants[0]), 1.0);
    }

    #[test]
    fn test_scorer_field_average_ignores_ineligible() {
        let mut a = Entrant::with_odds(1, 2.0);
        a.race_history = vec![result(Some(1), 10, 34.0)];
        let mut b = Entrant::with_odds(2, 0.0);
        b.race_history = vec![result(Some(1), 10, 40.0)];

        let scorer = FormScorer::for_field(&[a, b]);
        assert_eq!(scorer.field_last_3f(), Some(34.0));
    }

    #[test]
    fn test_breakdown_multiplies() {
        let mut entrant = Entrant::with_odds(1, 5.0);
        entrant.gate_number = Some(2);
        entrant.weight_change = Some(4);
        let scorer = FormScorer::default();
        let breakdown = scorer.breakdown(&entrant);
        assert!((breakdown.score() - 1.04 * 1.04).abs() < 1e-12);
    }
}
