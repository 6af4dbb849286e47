//! Probability Blending
//!
//! Market and form probabilities are normalized separately over the
//! field and then mixed with a fixed weight:
//!
//! ```text
//! p_market = (1/odds) / Σ(1/odds)
//! p_form   = form / Σ form
//! p_model  = α·p_form + (1 − α)·p_market
//! EV       = odds·p_model − 1
//! ```
//!
//! With α = 0 every entrant's EV equals the market take.

use super::form::FormScorer;
use crate::models::{Entrant, RatedEntrant};

/// Weight on the form model versus the market
pub const ALPHA: f64 = 0.40;

/// Blend parameters
#[derive(Debug, Clone, Copy)]
pub struct BlendConfig {
    pub alpha: f64,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self { alpha: ALPHA }
    }
}

/// Intermediate per-entrant probabilities, mostly for display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityBreakdown {
    pub form_score: f64,
    pub p_market: f64,
    pub p_form: f64,
    pub p_model: f64,
}

impl ProbabilityBreakdown {
    fn zero() -> Self {
        Self {
            form_score: 0.0,
            p_market: 0.0,
            p_form: 0.0,
            p_model: 0.0,
        }
    }
}

/// Blends market and form probabilities over a field
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbabilityBlender {
    config: BlendConfig,
}

impl ProbabilityBlender {
    pub fn new(config: BlendConfig) -> Self {
        Self { config }
    }

    pub fn alpha(&self) -> f64 {
        self.config.alpha
    }

    /// Probability breakdown per entrant, same order and length as input
    ///
    /// Entrants with `odds_win <= 0` are excluded from every sum and get
    /// an all-zero breakdown.
    pub fn breakdown(&self, entrants: &[Entrant]) -> Vec<ProbabilityBreakdown> {
        let scorer = FormScorer::for_field(entrants);

        let work: Vec<Option<(f64, f64)>> = entrants
            .iter()
            .map(|e| (e.odds_win > 0.0).then(|| (1.0 / e.odds_win, scorer.score(e))))
            .collect();

        let total_inv_odds: f64 = work.iter().flatten().map(|(inv, _)| inv).sum();
        let total_form: f64 = work.iter().flatten().map(|(_, form)| form).sum();

        work.into_iter()
            .map(|slot| match slot {
                Some((inv_odds, form_score)) if total_inv_odds > 0.0 => {
                    let p_market = inv_odds / total_inv_odds;
                    let p_form = if total_form > 0.0 {
                        form_score / total_form
                    } else {
                        p_market
                    };
                    let p_model = self.config.alpha * p_form + (1.0 - self.config.alpha) * p_market;

                    ProbabilityBreakdown {
                        form_score,
                        p_market,
                        p_form,
                        p_model,
                    }
                }
                _ => ProbabilityBreakdown::zero(),
            })
            .collect()
    }

    /// Attach `win_probability` and `expected_value` to every entrant
    pub fn rate(&self, entrants: &[Entrant]) -> Vec<RatedEntrant> {
        let breakdown = self.breakdown(entrants);

        entrants
            .iter()
            .zip(breakdown)
            .map(|(entrant, b)| {
                let expected_value = if b.p_model > 0.0 {
                    entrant.odds_win * b.p_model - 1.0
                } else {
                    0.0
                };
                RatedEntrant {
                    entrant: entrant.clone(),
                    win_probability: b.p_model,
                    expected_value,
                }
            })
            .collect()
    }
}

/// Blend probabilities with the default α
///
/// # Examples
/// ```
/// use keiba::core::compute_probabilities;
/// use keiba::Entrant;
///
/// let field = vec![
///     Entrant::with_odds(1, 2.0),
///     Entrant::with_odds(2, 3.0),
///     Entrant::with_odds(3, 4.0),
/// ];
/// let rated = compute_probabilities(&field);
/// let total: f64 = rated.iter().map(|r| r.win_probability).sum();
/// assert!((total - 1.0).abs() < 1e-9);
/// ```
pub fn compute_probabilities(entrants: &[Entrant]) -> Vec<RatedEntrant> {
    ProbabilityBlender::default().rate(entrants)
}
