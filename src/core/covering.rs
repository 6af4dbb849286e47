//! Covering (Dutch) Allocation
//!
//! Selects a subset of entrants such that any one of them winning
//! returns at least the budget, while the total stake stays within it.
//!
//! Entrants are considered in descending win probability. A candidate is
//! admitted when
//!
//! ```text
//! Σ(1/odds) + 1/odds_candidate + k_after·unit/budget <= 1
//! ```
//!
//! The `k_after·unit/budget` term reserves room for rounding each stake
//! up to the betting unit: every selected stake is below
//! `budget/odds + unit`, so the selected stakes sum to at most the budget.

use std::cmp::Ordering;

use tracing::{debug, warn};

use super::allocator::Allocator;
use crate::models::{round_to, AllocationResult, CoveringAllocation, CoveringBet, RatedEntrant};

/// Default betting unit (currency)
pub const DEFAULT_UNIT: i64 = 100;

/// Covering allocator staking in multiples of `unit`
#[derive(Debug, Clone, Copy)]
pub struct CoveringAllocator {
    pub unit: i64,
}

impl CoveringAllocator {
    pub fn new(unit: i64) -> Self {
        Self { unit: unit.max(1) }
    }

    /// Empty allocation: nothing selected, budget untouched
    pub fn empty(budget: i64) -> CoveringAllocation {
        CoveringAllocation {
            budget,
            bets: Vec::new(),
            total_bet: 0,
            remaining_budget: budget.max(0),
            guaranteed_return: 0,
            coverage: 0.0,
        }
    }

    /// Smallest multiple of `unit` whose payout at `odds` reaches the budget
    pub fn stake_for(&self, budget: i64, odds: f64) -> i64 {
        let unit = self.unit as f64;
        let units = (budget as f64 / odds / unit).ceil() as i64;
        (units * self.unit).max(self.unit)
    }

    /// Greedy probability-ordered selection of entrants to cover
    ///
    /// Returns references in selection order. Candidates that do not fit
    /// are skipped without stopping the scan.
    pub fn select<'a>(&self, rated: &'a [RatedEntrant], budget: i64) -> Vec<&'a RatedEntrant> {
        let mut candidates: Vec<&RatedEntrant> =
            rated.iter().filter(|r| r.odds_win() > 1.0).collect();
        if candidates.is_empty() || budget <= 0 {
            return Vec::new();
        }

        // Stable: ties keep field order
        candidates.sort_by(|a, b| {
            b.win_probability
                .partial_cmp(&a.win_probability)
                .unwrap_or(Ordering::Equal)
        });

        let mut selected: Vec<&RatedEntrant> = Vec::new();
        let mut inv_sum = 0.0;

        for candidate in &candidates {
            let inv_odds = 1.0 / candidate.odds_win();
            let k_after = (selected.len() + 1) as f64;
            let margin = k_after * self.unit as f64 / budget as f64;

            if inv_sum + inv_odds + margin <= 1.0 {
                inv_sum += inv_odds;
                selected.push(candidate);
                debug!(
                    horse_number = candidate.entrant.horse_number,
                    inv_sum, margin, "covering: admitted"
                );
            } else {
                debug!(
                    horse_number = candidate.entrant.horse_number,
                    inv_sum, margin, "covering: rejected"
                );
            }
        }

        if selected.is_empty() {
            let favourite = candidates[0];
            if self.stake_for(budget, favourite.odds_win()) > budget {
                warn!(
                    budget,
                    unit = self.unit,
                    "covering: budget cannot cover even the favourite"
                );
                return Vec::new();
            }
            warn!(
                horse_number = favourite.entrant.horse_number,
                "covering: no entrant fits the margin, forcing the favourite"
            );
            selected.push(favourite);
        }

        selected
    }

    /// Select and stake a covering set
    pub fn allocate_covering(&self, rated: &[RatedEntrant], budget: i64) -> CoveringAllocation {
        if rated.is_empty() || budget <= 0 {
            return Self::empty(budget);
        }

        let selected = self.select(rated, budget);
        if selected.is_empty() {
            return Self::empty(budget);
        }

        let bets: Vec<CoveringBet> = selected
            .iter()
            .map(|r| {
                let odds = r.odds_win();
                let recommended_bet = self.stake_for(budget, odds);
                let payout = recommended_bet as f64 * odds;

                CoveringBet {
                    horse_id: r.entrant.horse_id.clone(),
                    horse_name: r.entrant.horse_name.clone(),
                    horse_number: r.entrant.horse_number,
                    odds_win: odds,
                    win_probability: r.win_probability,
                    recommended_bet,
                    if_wins_return: payout.round() as i64,
                    expected_return: round_to(payout * r.win_probability, 2),
                }
            })
            .collect();

        let total_bet: i64 = bets.iter().map(|b| b.recommended_bet).sum();
        let guaranteed_return = bets.iter().map(|b| b.if_wins_return).min().unwrap_or(0);
        let miss_all: f64 = bets.iter().map(|b| 1.0 - b.win_probability).product();

        CoveringAllocation {
            budget,
            bets,
            total_bet,
            remaining_budget: (budget - total_bet).max(0),
            guaranteed_return,
            coverage: 1.0 - miss_all,
        }
    }
}

impl Default for CoveringAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_UNIT)
    }
}

impl Allocator for CoveringAllocator {
    fn name(&self) -> &'static str {
        "covering"
    }

    fn allocate(&self, rated: &[RatedEntrant], budget: i64) -> AllocationResult {
        AllocationResult::Covering(self.allocate_covering(rated, budget))
    }
}
