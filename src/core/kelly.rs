//! Kelly Criterion Allocation
//!
//! Proportional budget split based on fractional Kelly stakes.
//!
//! The Kelly criterion formula:
//!     f* = (b*p - q) / b
//!
//! Where:
//!     f* = fraction of bankroll to bet
//!     b = odds - 1 (net odds)
//!     p = blended win probability
//!     q = 1 - p
//!
//! Negative fractions are floored to zero, scaled by the multiplier
//! (half Kelly by default) and normalized across the field so that the
//! scaled fractions share the whole budget.

use tracing::debug;

use super::allocator::Allocator;
use crate::models::{round_to, AllocationResult, KellyAllocation, KellyBet, RatedEntrant};

/// Default Kelly multiplier (half Kelly)
pub const HALF_KELLY: f64 = 0.5;

/// Calculate the full Kelly fraction for a single bet
///
/// # Arguments
/// * `probability` - Estimated probability of winning (0-1)
/// * `odds` - Decimal odds (e.g., 5.0 = 5x return)
///
/// # Returns
/// Kelly fraction, floored at zero (never short an entrant)
///
/// # Examples
/// ```
/// use keiba::core::kelly::calculate_kelly_fraction;
/// let kelly = calculate_kelly_fraction(0.25, 5.0); // EV = 1.25
/// assert!((kelly - 0.0625).abs() < 0.0001);
/// assert_eq!(calculate_kelly_fraction(0.10, 5.0), 0.0);
/// ```
pub fn calculate_kelly_fraction(probability: f64, odds: f64) -> f64 {
    let b = odds - 1.0;
    if b <= 0.0 {
        return 0.0;
    }

    let q = 1.0 - probability;
    ((b * probability - q) / b).max(0.0)
}

/// Fractional Kelly allocator
#[derive(Debug, Clone, Copy)]
pub struct KellyAllocator {
    pub multiplier: f64,
}

impl KellyAllocator {
    /// Create an allocator with a custom Kelly multiplier
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    /// Empty allocation: budget untouched, no bets
    pub fn empty(budget: i64) -> KellyAllocation {
        KellyAllocation {
            budget,
            bets: Vec::new(),
            total_bet: 0,
            remaining_budget: budget.max(0),
        }
    }

    /// Split the budget across entrants in proportion to their scaled Kelly fractions
    ///
    /// Stakes are floored to whole currency units, so the total never
    /// exceeds the budget.
    pub fn allocate_kelly(&self, rated: &[RatedEntrant], budget: i64) -> KellyAllocation {
        if rated.is_empty() || budget <= 0 {
            return Self::empty(budget);
        }

        let fractions: Vec<(f64, f64)> = rated
            .iter()
            .map(|r| {
                let kelly = calculate_kelly_fraction(r.win_probability, r.odds_win());
                (kelly, kelly * self.multiplier)
            })
            .collect();

        let total_scaled: f64 = fractions
            .iter()
            .map(|&(_, scaled)| scaled)
            .filter(|&scaled| scaled > 0.0)
            .sum();

        let bets: Vec<KellyBet> = rated
            .iter()
            .zip(&fractions)
            .map(|(r, &(kelly, scaled))| {
                let recommended_bet = if total_scaled > 0.0 && scaled > 0.0 {
                    (budget as f64 * (scaled / total_scaled)).floor() as i64
                } else {
                    0
                };

                debug!(
                    horse_number = r.entrant.horse_number,
                    kelly, recommended_bet, "kelly stake"
                );

                let expected_return =
                    recommended_bet as f64 * r.odds_win() * r.win_probability;

                KellyBet {
                    horse_id: r.entrant.horse_id.clone(),
                    horse_name: r.entrant.horse_name.clone(),
                    horse_number: r.entrant.horse_number,
                    odds_win: r.odds_win(),
                    recommended_bet,
                    expected_return: round_to(expected_return, 2),
                    kelly_fraction: round_to(kelly, 6),
                }
            })
            .collect();

        let total_bet: i64 = bets.iter().map(|b| b.recommended_bet).sum();

        KellyAllocation {
            budget,
            bets,
            total_bet,
            remaining_budget: budget - total_bet,
        }
    }
}

impl Default for KellyAllocator {
    fn default() -> Self {
        Self::new(HALF_KELLY)
    }
}

impl Allocator for KellyAllocator {
    fn name(&self) -> &'static str {
        "kelly"
    }

    fn allocate(&self, rated: &[RatedEntrant], budget: i64) -> AllocationResult {
        AllocationResult::Kelly(self.allocate_kelly(rated, budget))
    }
}
