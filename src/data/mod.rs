//! Race file loading

pub mod race_file;

// Re-export commonly used types
pub use race_file::{load_historical_races, load_race_card, save_race_card};
