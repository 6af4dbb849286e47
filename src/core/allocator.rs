//! Budget allocation strategies
//!
//! Both strategies consume blended probabilities for one field and never
//! stake more than the budget in total.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::covering::CoveringAllocator;
use super::kelly::KellyAllocator;
use super::probability::ProbabilityBlender;
use crate::error::KeibaError;
use crate::models::{AllocationResult, Entrant, RatedEntrant};

/// A budget allocation strategy over a rated field
pub trait Allocator: Send + Sync {
    /// Short strategy name
    fn name(&self) -> &'static str;

    /// Stake the budget across the field
    ///
    /// `budget <= 0` or an empty field yields the strategy's empty result.
    fn allocate(&self, rated: &[RatedEntrant], budget: i64) -> AllocationResult;
}

/// Selectable allocation strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Kelly,
    #[default]
    Covering,
}

impl Strategy {
    /// Build the allocator for this strategy
    ///
    /// `unit` only applies to the covering strategy.
    pub fn allocator(self, unit: i64) -> Box<dyn Allocator> {
        match self {
            Strategy::Kelly => Box::new(KellyAllocator::default()),
            Strategy::Covering => Box::new(CoveringAllocator::new(unit)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Kelly => write!(f, "kelly"),
            Strategy::Covering => write!(f, "covering"),
        }
    }
}

impl FromStr for Strategy {
    type Err = KeibaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kelly" | "half-kelly" => Ok(Strategy::Kelly),
            "covering" | "dutch" => Ok(Strategy::Covering),
            other => Err(KeibaError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Blend probabilities for the field, then allocate with the given strategy
///
/// # Examples
/// ```
/// use keiba::core::{allocate_budget, CoveringAllocator};
/// use keiba::Entrant;
///
/// let field = vec![
///     Entrant::with_odds(1, 2.0),
///     Entrant::with_odds(2, 3.0),
///     Entrant::with_odds(3, 4.0),
/// ];
/// let result = allocate_budget(&field, 1000, &CoveringAllocator::default());
/// assert_eq!(result.total_bet(), 800);
/// ```
pub fn allocate_budget(entrants: &[Entrant], budget: i64, allocator: &dyn Allocator) -> AllocationResult {
    allocate_budget_with(&ProbabilityBlender::default(), entrants, budget, allocator)
}

/// `allocate_budget` with a custom blender
pub fn allocate_budget_with(
    blender: &ProbabilityBlender,
    entrants: &[Entrant],
    budget: i64,
    allocator: &dyn Allocator,
) -> AllocationResult {
    if entrants.is_empty() || budget <= 0 {
        return allocator.allocate(&[], budget);
    }

    let rated = blender.rate(entrants);
    allocator.allocate(&rated, budget)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(odds: &[f64]) -> Vec<Entrant> {
        odds.iter()
            .enumerate()
            .map(|(i, &o)| Entrant::with_odds(i as u8 + 1, o))
            .collect()
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("kelly".parse::<Strategy>().unwrap(), Strategy::Kelly);
        assert_eq!("Dutch".parse::<Strategy>().unwrap(), Strategy::Covering);
        assert_eq!(" covering ".parse::<Strategy>().unwrap(), Strategy::Covering);
        assert!("martingale".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_strategy_display_roundtrip() {
        for strategy in [Strategy::Kelly, Strategy::Covering] {
            assert_eq!(strategy.to_string().parse::<Strategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_strategy_allocator_names() {
        assert_eq!(Strategy::Kelly.allocator(100).name(), "kelly");
        assert_eq!(Strategy::Covering.allocator(100).name(), "covering");
    }

    #[test]
    fn test_allocate_budget_covering() {
        let result = allocate_budget(&field(&[2.0, 3.0, 4.0]), 1000, &CoveringAllocator::default());
        match result {
            AllocationResult::Covering(ref alloc) => {
                assert_eq!(alloc.total_bet, 800);
                assert_eq!(alloc.guaranteed_return, 1000);
            }
            AllocationResult::Kelly(_) => panic!("expected covering result"),
        }
        assert_eq!(result.stake_on(1), 500);
        assert_eq!(result.stake_on(2), 0);
        assert_eq!(result.stake_on(3), 300);
    }

    #[test]
    fn test_allocate_budget_kelly() {
        // Only the 4.0 runner has positive EV in the neutral-form blend
        let result = allocate_budget(&field(&[2.0, 3.0, 4.0]), 1000, &KellyAllocator::default());
        assert_eq!(result.stake_on(3), 1000);
        assert_eq!(result.total_bet(), 1000);
        assert_eq!(result.remaining_budget(), 0);
    }

    #[test]
    fn test_degenerate_inputs_are_empty() {
        for strategy in [Strategy::Kelly, Strategy::Covering] {
            let allocator = strategy.allocator(100);

            let result = allocate_budget(&[], 1000, allocator.as_ref());
            assert_eq!(result.total_bet(), 0);
            assert_eq!(result.remaining_budget(), 1000);

            let result = allocate_budget(&field(&[2.0, 3.0]), 0, allocator.as_ref());
            assert_eq!(result.total_bet(), 0);
            assert_eq!(result.remaining_budget(), 0);
            assert_eq!(result.expected_return(), 0.0);
        }
    }
}
