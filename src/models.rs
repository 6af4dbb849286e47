use serde::{Deserialize, Serialize};

/// One historical race outcome for an entrant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PastResult {
    /// Finishing position (None = did not finish / scratched)
    #[serde(default)]
    pub ranking: Option<u32>,
    /// Number of runners in that race (0 = unknown)
    #[serde(default)]
    pub field_size: u32,
    /// Closing 600m time in seconds (0 = unknown)
    #[serde(default)]
    pub last_3f: f64,
    /// Body weight delta recorded for that race, kg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_change: Option<i32>,
}

impl PastResult {
    pub fn new(ranking: Option<u32>, field_size: u32, last_3f: f64) -> Self {
        Self {
            ranking,
            field_size,
            last_3f,
            weight_change: None,
        }
    }
}

/// Race entrant as supplied by the race card / odds collaborators
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entrant {
    #[serde(default)]
    pub horse_id: String,
    #[serde(default)]
    pub horse_name: String,
    #[serde(default)]
    pub horse_number: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jockey: Option<String>,
    /// Decimal win odds (payout per unit stake)
    pub odds_win: f64,
    /// Starting gate 1-8 (None or 0 = unknown)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_number: Option<u8>,
    /// Body weight delta since previous race, kg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_change: Option<i32>,
    /// Most recent first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub race_history: Vec<PastResult>,
}

impl Entrant {
    /// Minimal entrant carrying only a number and win odds
    pub fn with_odds(horse_number: u8, odds_win: f64) -> Self {
        Self {
            horse_number,
            odds_win,
            ..Default::default()
        }
    }
}

/// Entrant enriched with the blended probability and expected value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedEntrant {
    #[serde(flatten)]
    pub entrant: Entrant,
    pub win_probability: f64,
    pub expected_value: f64,
}

impl RatedEntrant {
    /// Market underprices this entrant relative to the model
    pub fn is_value_bet(&self) -> bool {
        self.expected_value > 0.0
    }

    pub fn odds_win(&self) -> f64 {
        self.entrant.odds_win
    }
}

/// A race and its field, as read from a race file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaceCard {
    pub race_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race_name: Option<String>,
    pub entrants: Vec<Entrant>,
}

/// Per-entrant stake from the fractional Kelly strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KellyBet {
    pub horse_id: String,
    pub horse_name: String,
    pub horse_number: u8,
    pub odds_win: f64,
    pub recommended_bet: i64,
    pub expected_return: f64,
    /// Full Kelly fraction, floored at zero
    pub kelly_fraction: f64,
}

/// Fractional Kelly allocation over a field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KellyAllocation {
    pub budget: i64,
    pub bets: Vec<KellyBet>,
    pub total_bet: i64,
    pub remaining_budget: i64,
}

/// Per-entrant stake from the covering strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoveringBet {
    pub horse_id: String,
    pub horse_name: String,
    pub horse_number: u8,
    pub odds_win: f64,
    pub win_probability: f64,
    pub recommended_bet: i64,
    /// Payout if this entrant wins
    pub if_wins_return: i64,
    pub expected_return: f64,
}

/// Covering (Dutch) allocation over a field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoveringAllocation {
    pub budget: i64,
    pub bets: Vec<CoveringBet>,
    pub total_bet: i64,
    pub remaining_budget: i64,
    /// Smallest payout among the selected entrants
    pub guaranteed_return: i64,
    /// 1 - Π(1 - p) over selected entrants, treating wins as independent
    pub coverage: f64,
}

/// Result of either allocation strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum AllocationResult {
    Kelly(KellyAllocation),
    Covering(CoveringAllocation),
}

impl AllocationResult {
    pub fn total_bet(&self) -> i64 {
        match self {
            AllocationResult::Kelly(a) => a.total_bet,
            AllocationResult::Covering(a) => a.total_bet,
        }
    }

    pub fn remaining_budget(&self) -> i64 {
        match self {
            AllocationResult::Kelly(a) => a.remaining_budget,
            AllocationResult::Covering(a) => a.remaining_budget,
        }
    }

    pub fn budget(&self) -> i64 {
        match self {
            AllocationResult::Kelly(a) => a.budget,
            AllocationResult::Covering(a) => a.budget,
        }
    }

    /// Sum of per-entrant expected returns, rounded to 2 decimals
    pub fn expected_return(&self) -> f64 {
        let total: f64 = match self {
            AllocationResult::Kelly(a) => a.bets.iter().map(|b| b.expected_return).sum(),
            AllocationResult::Covering(a) => a.bets.iter().map(|b| b.expected_return).sum(),
        };
        round_to(total, 2)
    }

    /// Stake placed on a given horse number (0 if not staked)
    pub fn stake_on(&self, horse_number: u8) -> i64 {
        match self {
            AllocationResult::Kelly(a) => a
                .bets
                .iter()
                .find(|b| b.horse_number == horse_number)
                .map_or(0, |b| b.recommended_bet),
            AllocationResult::Covering(a) => a
                .bets
                .iter()
                .find(|b| b.horse_number == horse_number)
                .map_or(0, |b| b.recommended_bet),
        }
    }

    /// Odds recorded for a staked horse number
    pub fn odds_on(&self, horse_number: u8) -> Option<f64> {
        match self {
            AllocationResult::Kelly(a) => a
                .bets
                .iter()
                .find(|b| b.horse_number == horse_number)
                .map(|b| b.odds_win),
            AllocationResult::Covering(a) => a
                .bets
                .iter()
                .find(|b| b.horse_number == horse_number)
                .map(|b| b.odds_win),
        }
    }
}

/// Round to a fixed number of decimal places
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
