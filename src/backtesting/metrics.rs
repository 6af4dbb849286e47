//! Backtest Metrics
//!
//! Calculate metrics such as ROI, hit rate, drawdown, etc.

use super::simulator::RaceSettlement;
use serde::{Deserialize, Serialize};

/// Backtest evaluation metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacktestMetrics {
    // Basic metrics
    pub races_bet: usize,
    pub hits: usize,
    pub hit_rate: f64,
    pub roi: f64,

    // Risk metrics
    pub profit_factor: f64,
    pub max_drawdown: i64,
    pub max_drawdown_pct: f64,

    // Win/Loss
    pub gross_profit: i64,
    pub gross_loss: i64,
    pub net_profit: i64,
}

/// Calculate metrics from race settlements
///
/// Races without a stake are ignored.
pub fn calculate_metrics(settlements: &[RaceSettlement], total_stake: i64) -> BacktestMetrics {
    let staked: Vec<&RaceSettlement> = settlements.iter().filter(|s| s.total_bet > 0).collect();
    if staked.is_empty() {
        return BacktestMetrics::default();
    }

    let races_bet = staked.len();
    let hits = staked.iter().filter(|s| s.hit).count();
    let hit_rate = hits as f64 / races_bet as f64;

    // Profit/Loss calculation
    let profits: Vec<i64> = staked.iter().map(|s| s.profit()).collect();
    let gross_profit: i64 = profits.iter().filter(|&&p| p > 0).sum();
    let gross_loss: i64 = profits.iter().filter(|&&p| p < 0).map(|p| p.abs()).sum();
    let net_profit: i64 = profits.iter().sum();

    let profit_factor = if gross_loss > 0 {
        gross_profit as f64 / gross_loss as f64
    } else if gross_profit > 0 {
        f64::INFINITY
    } else {
        0.0
    };

    // Drawdown from the running peak of cumulative profit
    let mut sum = 0i64;
    let mut peak = 0i64;
    let mut max_drawdown = 0i64;
    for &p in &profits {
        sum += p;
        peak = peak.max(sum);
        max_drawdown = max_drawdown.max(peak - sum);
    }

    let (max_drawdown_pct, roi) = if total_stake > 0 {
        (
            max_drawdown as f64 / total_stake as f64,
            net_profit as f64 / total_stake as f64,
        )
    } else {
        (0.0, 0.0)
    };

    BacktestMetrics {
        races_bet,
        hits,
        hit_rate,
        roi,
        profit_factor,
        max_drawdown,
        max_drawdown_pct,
        gross_profit,
        gross_loss,
        net_profit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settlement(total_bet: i64, payout: i64) -> RaceSettlement {
        RaceSettlement {
            race_id: String::new(),
            total_bet,
            payout,
            hit: payout > 0,
        }
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = calculate_metrics(&[], 0);
        assert_eq!(metrics.races_bet, 0);
        assert_eq!(metrics.roi, 0.0);
    }

    #[test]
    fn test_unstaked_races_ignored() {
        let metrics = calculate_metrics(&[settlement(0, 0), settlement(800, 1000)], 800);
        assert_eq!(metrics.races_bet, 1);
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.hit_rate, 1.0);
        assert_eq!(metrics.profit_factor, f64::INFINITY);
    }

    #[test]
    fn test_drawdown_and_profit_factor() {
        // +200, -800, -800, +400
        let settlements = vec![
            settlement(800, 1000),
            settlement(800, 0),
            settlement(800, 0),
            settlement(800, 1200),
        ];
        let metrics = calculate_metrics(&settlements, 3200);

        assert_eq!(metrics.gross_profit, 600);
        assert_eq!(metrics.gross_loss, 1600);
        assert_eq!(metrics.net_profit, -1000);
        assert_eq!(metrics.max_drawdown, 1600);
        assert!((metrics.max_drawdown_pct - 0.5).abs() < 1e-12);
        assert!((metrics.profit_factor - 0.375).abs() < 1e-12);
        assert!((metrics.roi + 0.3125).abs() < 1e-12);
    }
}
