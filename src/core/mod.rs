//! Core business logic modules

pub mod allocator;
pub mod covering;
pub mod form;
pub mod kelly;
pub mod probability;

// Re-export commonly used types
pub use allocator::{allocate_budget, allocate_budget_with, Allocator, Strategy};
pub use covering::{CoveringAllocator, DEFAULT_UNIT};
pub use form::{FormBreakdown, FormScorer};
pub use kelly::{calculate_kelly_fraction, KellyAllocator, HALF_KELLY};
pub use probability::{compute_probabilities, BlendConfig, ProbabilityBlender, ALPHA};
