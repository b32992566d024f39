//! Trading performance metrics.

use chrono::NaiveDateTime;

use super::portfolio::STARTING_BALANCE;
use super::position::Trade;

/// Annual risk-free rate used as the excess-return baseline.
pub const RISK_FREE_RATE: f64 = 0.01;

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Raw trade counts and returns.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingSummary {
    pub nb_trades: usize,
    pub nb_wins: usize,
    pub nb_losses: usize,
    pub total_return: f64,
    pub best_trade_return: f64,
    pub worst_trade_return: f64,
}

impl TradingSummary {
    pub fn from_trades(trades: &[Trade]) -> Self {
        let nb_trades = trades.len();
        let nb_wins = trades.iter().filter(|trade| trade.is_win).count();
        let total_profit: f64 = trades.iter().map(|trade| trade.total_profit).sum();
        let best = trades
            .iter()
            .map(|trade| trade.profit_pct)
            .fold(f64::NEG_INFINITY, f64::max);
        let worst = trades
            .iter()
            .map(|trade| trade.profit_pct)
            .fold(f64::INFINITY, f64::min);

        TradingSummary {
            nb_trades,
            nb_wins,
            nb_losses: nb_trades - nb_wins,
            total_return: round_to(total_profit / STARTING_BALANCE, 3),
            best_trade_return: if nb_trades == 0 { 0.0 } else { round_to(best, 5) },
            worst_trade_return: if nb_trades == 0 { 0.0 } else { round_to(worst, 5) },
        }
    }
}

/// Financial ratios of a trade sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingStatistics {
    pub max_drawdown: f64,
    pub cagr: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
}

impl TradingStatistics {
    pub fn from_trades(trades: &[Trade]) -> Self {
        TradingStatistics {
            max_drawdown: max_drawdown(trades),
            cagr: cagr(trades),
            sharpe_ratio: sharpe(trades),
            sortino_ratio: sortino(trades),
            calmar_ratio: calmar(trades),
        }
    }
}

/// Cumulative portfolio value over time, as a fraction of the starting
/// balance. Optional session bounds pad the curve with a flat start and end.
pub fn trades_to_wealth(
    trades: &[Trade],
    start_time: Option<NaiveDateTime>,
    end_time: Option<NaiveDateTime>,
) -> (Vec<f64>, Vec<NaiveDateTime>) {
    let mut profits: Vec<f64> = trades.iter().map(|trade| trade.total_profit).collect();
    let mut times: Vec<NaiveDateTime> = trades.iter().map(|trade| trade.close_date).collect();

    if let Some(start) = start_time {
        profits.insert(0, 0.0);
        times.insert(0, start);
    }
    if let Some(end) = end_time {
        profits.push(0.0);
        times.push(end);
    }

    let mut cumulative = 0.0;
    let wealth = profits
        .iter()
        .map(|profit| {
            cumulative += profit;
            cumulative / STARTING_BALANCE
        })
        .collect();
    (wealth, times)
}

/// Biggest peak-to-trough decline of the wealth curve. Zero for fewer than
/// two trades.
pub fn max_drawdown(trades: &[Trade]) -> f64 {
    if trades.len() < 2 {
        return 0.0;
    }

    let (wealth, _) = trades_to_wealth(trades, None, None);
    let mut peak = wealth[0];
    let mut worst = 0.0f64;
    for &value in &wealth[1..] {
        peak = peak.max(value);
        worst = worst.max(peak - value);
    }
    round_to(worst, 3)
}

/// Compound annual growth rate over the session span.
pub fn cagr(trades: &[Trade]) -> f64 {
    let (Some(first), Some(last)) = (trades.first(), trades.last()) else {
        return 0.0;
    };

    let total_profit: f64 = trades.iter().map(|trade| trade.total_profit).sum();
    let session_years = (last.close_date - first.open_date).num_days() as f64 / 365.0;
    if session_years == 0.0 {
        return 0.0;
    }

    let growth = ((STARTING_BALANCE + total_profit) / STARTING_BALANCE).powf(1.0 / session_years);
    round_to(growth, 3)
}

fn trade_returns(trades: &[Trade]) -> Vec<f64> {
    trades
        .iter()
        .map(|trade| trade.total_profit / trade.initial_investment)
        .collect()
}

/// Mean excess trade return over the total return deviation. Zero when the
/// deviation is zero.
pub fn sharpe(trades: &[Trade]) -> f64 {
    let returns = trade_returns(trades);
    let deviation = std_dev(&returns);
    if deviation == 0.0 {
        return 0.0;
    }
    round_to((mean(&returns) - RISK_FREE_RATE) / deviation, 3)
}

/// Mean excess trade return over the downside deviation only. Zero when no
/// losing trades exist.
pub fn sortino(trades: &[Trade]) -> f64 {
    let returns = trade_returns(trades);
    let negative: Vec<f64> = returns.iter().copied().filter(|ret| *ret < 0.0).collect();
    let deviation = std_dev(&negative);
    if deviation == 0.0 {
        return 0.0;
    }
    round_to((mean(&returns) - RISK_FREE_RATE) / deviation, 3)
}

/// CAGR over max drawdown. Zero when there is no drawdown.
pub fn calmar(trades: &[Trade]) -> f64 {
    let drawdown = max_drawdown(trades);
    if drawdown == 0.0 {
        return 0.0;
    }
    cagr(trades) / drawdown
}
