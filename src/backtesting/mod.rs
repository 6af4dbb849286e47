//! Backtesting engine for validating allocation strategies on settled races

pub mod metrics;
pub mod simulator;

pub use metrics::{calculate_metrics, BacktestMetrics};
pub use simulator::{run_backtest, settle, BacktestResult, HistoricalRace, RaceSettlement};
