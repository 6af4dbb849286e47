//! Keiba - horse racing value estimation and budget allocation
//!
//! This library provides:
//! - Market-independent form scoring from gate, weight change and recent results
//! - Win probabilities blending form with the odds-implied market
//! - Budget allocation by fractional Kelly or by covering (Dutch) stakes
//! - Race history retrieval behind a provider trait
//! - Backtesting of allocation strategies on settled races
//!
//! # Example
//!
//! ```
//! use keiba::core::{allocate_budget, compute_probabilities, CoveringAllocator};
//! use keiba::Entrant;
//!
//! let field = vec![
//!     Entrant::with_odds(1, 2.0),
//!     Entrant::with_odds(2, 3.0),
//!     Entrant::with_odds(3, 4.0),
//! ];
//!
//! let rated = compute_probabilities(&field);
//! assert!(rated[2].is_value_bet());
//!
//! let allocation = allocate_budget(&field, 1000, &CoveringAllocator::default());
//! println!("Total stake: {}", allocation.total_bet());
//! ```

pub mod backtesting;
pub mod core;
pub mod data;
pub mod error;
pub mod history;
pub mod models;

// Re-export commonly used types
pub use crate::core::{allocate_budget, compute_probabilities, Allocator, Strategy};
pub use error::KeibaError;
pub use models::{
    AllocationResult, CoveringAllocation, CoveringBet, Entrant, KellyAllocation, KellyBet,
    PastResult, RaceCard, RatedEntrant,
};
