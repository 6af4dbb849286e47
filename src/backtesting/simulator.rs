//! Backtest Simulator
//!
//! Replays settled races through the blender and an allocator and records
//! what each allocation would have paid.

use super::metrics::{calculate_metrics, BacktestMetrics};
use crate::core::{allocate_budget, Allocator};
use crate::models::{AllocationResult, RaceCard};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A race with its known result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalRace {
    pub card: RaceCard,
    /// Winning horse number (None = race void / result unknown)
    #[serde(default)]
    pub winner: Option<u8>,
}

/// Outcome of one allocation against the race result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSettlement {
    pub race_id: String,
    pub total_bet: i64,
    pub payout: i64,
    pub hit: bool,
}

impl RaceSettlement {
    pub fn profit(&self) -> i64 {
        self.payout - self.total_bet
    }
}

/// Settle an allocation against the winning horse number
///
/// # Examples
/// ```
/// use keiba::backtesting::settle;
/// use keiba::core::{allocate_budget, CoveringAllocator};
/// use keiba::Entrant;
///
/// let field = vec![Entrant::with_odds(1, 2.0), Entrant::with_odds(2, 3.0), Entrant::with_odds(3, 4.0)];
/// let allocation = allocate_budget(&field, 1000, &CoveringAllocator::default());
/// let settlement = settle("demo", &allocation, Some(3));
/// assert_eq!(settlement.payout, 1200);
/// assert_eq!(settlement.profit(), 400);
/// ```
pub fn settle(race_id: &str, allocation: &AllocationResult, winner: Option<u8>) -> RaceSettlement {
    let payout = winner
        .and_then(|number| {
            let stake = allocation.stake_on(number);
            let odds = allocation.odds_on(number)?;
            (stake > 0).then(|| (stake as f64 * odds).round() as i64)
        })
        .unwrap_or(0);

    RaceSettlement {
        race_id: race_id.to_string(),
        total_bet: allocation.total_bet(),
        payout,
        hit: payout > 0,
    }
}

/// Backtest result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacktestResult {
    pub settlements: Vec<RaceSettlement>,
    pub total_races: usize,
    pub races_with_bets: usize,
    pub total_stake: i64,
    pub total_payout: i64,
    pub metrics: Option<BacktestMetrics>,
}

impl BacktestResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, settlement: RaceSettlement) {
        self.total_races += 1;
        if settlement.total_bet > 0 {
            self.races_with_bets += 1;
        }
        self.total_stake += settlement.total_bet;
        self.total_payout += settlement.payout;
        self.settlements.push(settlement);
    }

    pub fn total_profit(&self) -> i64 {
        self.total_payout - self.total_stake
    }

    pub fn roi(&self) -> f64 {
        if self.total_stake == 0 {
            0.0
        } else {
            self.total_profit() as f64 / self.total_stake as f64
        }
    }

    pub fn finalize(&mut self) {
        self.metrics = Some(calculate_metrics(&self.settlements, self.total_stake));
    }
}

/// Run every race through the allocator with a fixed per-race budget
pub fn run_backtest(races: &[HistoricalRace], allocator: &dyn Allocator, budget: i64) -> BacktestResult {
    let mut result = BacktestResult::new();

    for race in races {
        let allocation = allocate_budget(&race.card.entrants, budget, allocator);
        let settlement = settle(&race.card.race_id, &allocation, race.winner);
        debug!(
            race_id = %settlement.race_id,
            total_bet = settlement.total_bet,
            payout = settlement.payout,
            "settled race"
        );
        result.record(settlement);
    }

    result.finalize();
    result
}
