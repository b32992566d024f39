//! Trading session: replays strategy signals over candles into trades.

use log::debug;

use super::error::KestrelError;
use super::fluctuations::Fluctuations;
use super::portfolio::Portfolio;
use super::position::{Position, Trade};
use super::strategy::{padded_signals, Signal, Strategy};

/// Execution parameters of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Fraction of the available currency committed on each buy.
    pub position_size: f64,
    /// Relative stop-loss distance below the entry price, when set.
    pub stop_loss_pct: Option<f64>,
    /// Relative take-profit distance above the entry price, when set.
    pub take_profit_pct: Option<f64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            position_size: 1.0,
            stop_loss_pct: None,
            take_profit_pct: None,
        }
    }
}

/// Replays a strategy over market data with a fresh ledger per run.
///
/// The session holds at most one open position. On every candle the open
/// position is first checked against its exit thresholds, then the strategy
/// signal is applied. A position still open after the last candle stays open
/// and produces no trade.
pub struct TradingSession<'a> {
    strategy: &'a dyn Strategy,
    config: SessionConfig,
}

impl<'a> TradingSession<'a> {
    pub fn new(strategy: &'a dyn Strategy, config: SessionConfig) -> Self {
        TradingSession { strategy, config }
    }

    /// Run the strategy over `fluctuations` and return the closed trades with
    /// the final ledger.
    ///
    /// Each call starts from a fresh portfolio seeded with the starting
    /// balance, so runs are independent.
    pub fn get_trades(
        &self,
        fluctuations: &Fluctuations,
    ) -> Result<(Vec<Trade>, Portfolio), KestrelError> {
        let signals = padded_signals(self.strategy, fluctuations)?;
        let mut portfolio = Portfolio::with_starting_balance(fluctuations.currency());
        let mut open_position: Option<Position> = None;
        let mut trades = Vec::new();

        for (candle, signal) in fluctuations.candles().iter().zip(signals) {
            if let Some(position) = open_position.take() {
                match position.get_exit_signal(candle) {
                    Some(exit) => {
                        let (price, date) = exit.to_price_date(&position, candle);
                        let trade = position.close(date, price);
                        portfolio.update_from_trade(&trade)?;
                        trades.push(trade);
                    }
                    None => open_position = Some(position),
                }
            }

            match signal {
                Signal::Buy if open_position.is_none() => {
                    let money_to_invest =
                        portfolio.available(fluctuations.currency()) * self.config.position_size;
                    if money_to_invest <= 0.0 {
                        debug!("buy signal at {} skipped, no funds", candle.close_time);
                        continue;
                    }
                    let stop_loss = match self.config.stop_loss_pct {
                        Some(pct) => candle.close * (1.0 - pct),
                        None => 0.0,
                    };
                    let take_profit = match self.config.take_profit_pct {
                        Some(pct) => candle.close * (1.0 + pct),
                        None => f64::INFINITY,
                    };
                    let position = Position::open(
                        self.strategy.name(),
                        fluctuations.coin(),
                        fluctuations.currency(),
                        candle.close_time,
                        candle.close,
                        money_to_invest,
                        stop_loss,
                        take_profit,
                    );
                    portfolio.update_from_position(&position)?;
                    open_position = Some(position);
                }
                Signal::Sell => {
                    if let Some(position) = open_position.take() {
                        let trade = position.close(candle.close_time, candle.close);
                        portfolio.update_from_trade(&trade)?;
                        trades.push(trade);
                    }
                }
                _ => {}
            }
        }

        Ok((trades, portfolio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::Coin;
    use crate::domain::candle::Candle;
    use crate::domain::portfolio::STARTING_BALANCE;
    use crate::domain::position::FEES_PCT;
    use crate::domain::timeframe::Timeframe;
    use chrono::{NaiveDate, NaiveDateTime};

    struct FixedStrategy(Vec<Signal>);

    impl Strategy for FixedStrategy {
        fn name(&self) -> &str {
            "fixed"
        }

        fn compute_signals(&self, _fluctuations: &Fluctuations) -> Vec<Signal> {
            self.0.clone()
        }
    }

    fn day(offset: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1 + offset)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn daily_candle(offset: u32, open: f64, high: f64, low: f64, close: f64) -> Candle {
        let tf = Timeframe::parse("1d").unwrap();
        Candle {
            coin: Coin::Btc,
            currency: Coin::Usdt,
            open_time: day(offset),
            close_time: day(offset) + tf.duration(),
            timeframe: tf,
            open,
            high,
            low,
            close,
            volume: 1.0,
            quote_volume: open,
            nb_trades: 1,
            taker_volume: 0.5,
            taker_quote_volume: open / 2.0,
            high_time: None,
            low_time: None,
        }
    }

    fn flat_fluctuations(days: u32, price: f64) -> Fluctuations {
        let candles = (0..days)
            .map(|d| daily_candle(d, price, price + 1.0, price - 1.0, price))
            .collect();
        Fluctuations::from_candles(candles).unwrap()
    }

    #[test]
    fn buy_then_sell_produces_one_trade() {
        let fluctuations = flat_fluctuations(3, 100.0);
        let strategy = FixedStrategy(vec![Signal::Buy, Signal::Wait, Signal::Sell]);
        let session = TradingSession::new(&strategy, SessionConfig::default());
        let (trades, portfolio) = session.get_trades(&fluctuations).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].open_date, day(0) + chrono::Duration::days(1));
        assert_eq!(trades[0].close_date, day(2) + chrono::Duration::days(1));
        // everything sold back, ledger holds only the currency
        assert!((portfolio.available(Coin::Btc) - 0.0).abs() < 1e-12);
        assert!(
            (portfolio.available(Coin::Usdt) - (STARTING_BALANCE + trades[0].total_profit)).abs()
                < 1e-9
        );
    }

    #[test]
    fn position_size_scales_investment() {
        let fluctuations = flat_fluctuations(2, 100.0);
        let strategy = FixedStrategy(vec![Signal::Buy, Signal::Sell]);
        let config = SessionConfig {
            position_size: 0.33,
            ..SessionConfig::default()
        };
        let session = TradingSession::new(&strategy, config);
        let (trades, _) = session.get_trades(&fluctuations).unwrap();
        assert_eq!(trades.len(), 1);
        assert!((trades[0].initial_investment - STARTING_BALANCE * 0.33).abs() < f64::EPSILON);
        assert!((trades[0].open_fees - STARTING_BALANCE * 0.33 * FEES_PCT).abs() < f64::EPSILON);
    }

    #[test]
    fn stop_loss_closes_at_threshold() {
        let candles = vec![
            daily_candle(0, 100.0, 101.0, 99.0, 100.0),
            // low breaches the 10% stop below the 100.0 entry
            daily_candle(1, 100.0, 100.5, 85.0, 95.0),
            daily_candle(2, 95.0, 96.0, 94.0, 95.0),
        ];
        let fluctuations = Fluctuations::from_candles(candles).unwrap();
        let strategy = FixedStrategy(vec![Signal::Buy, Signal::Wait, Signal::Wait]);
        let config = SessionConfig {
            position_size: 1.0,
            stop_loss_pct: Some(0.1),
            take_profit_pct: None,
        };
        let session = TradingSession::new(&strategy, config);
        let (trades, _) = session.get_trades(&fluctuations).unwrap();
        assert_eq!(trades.len(), 1);
        assert!((trades[0].close_price - 90.0).abs() < f64::EPSILON);
        assert!(!trades[0].is_win);
    }

    #[test]
    fn take_profit_closes_at_threshold() {
        let candles = vec![
            daily_candle(0, 100.0, 101.0, 99.0, 100.0),
            daily_candle(1, 100.0, 125.0, 99.5, 120.0),
        ];
        let fluctuations = Fluctuations::from_candles(candles).unwrap();
        let strategy = FixedStrategy(vec![Signal::Buy, Signal::Wait]);
        let config = SessionConfig {
            position_size: 1.0,
            stop_loss_pct: None,
            take_profit_pct: Some(0.2),
        };
        let session = TradingSession::new(&strategy, config);
        let (trades, _) = session.get_trades(&fluctuations).unwrap();
        assert_eq!(trades.len(), 1);
        assert!((trades[0].close_price - 120.0).abs() < f64::EPSILON);
        assert!(trades[0].is_win);
    }

    #[test]
    fn open_position_at_end_yields_no_trade() {
        let fluctuations = flat_fluctuations(2, 100.0);
        let strategy = FixedStrategy(vec![Signal::Buy, Signal::Wait]);
        let session = TradingSession::new(&strategy, SessionConfig::default());
        let (trades, portfolio) = session.get_trades(&fluctuations).unwrap();
        assert!(trades.is_empty());
        // funds stay committed to the still-open position
        assert!(portfolio.available(Coin::Btc) > 0.0);
    }

    #[test]
    fn repeated_buys_do_not_stack() {
        let fluctuations = flat_fluctuations(4, 100.0);
        let strategy = FixedStrategy(vec![Signal::Buy, Signal::Buy, Signal::Buy, Signal::Sell]);
        let session = TradingSession::new(&strategy, SessionConfig::default());
        let (trades, _) = session.get_trades(&fluctuations).unwrap();
        assert_eq!(trades.len(), 1);
    }

    #[test]
    fn runs_are_independent() {
        let fluctuations = flat_fluctuations(2, 100.0);
        let strategy = FixedStrategy(vec![Signal::Buy, Signal::Sell]);
        let session = TradingSession::new(&strategy, SessionConfig::default());
        let (first, _) = session.get_trades(&fluctuations).unwrap();
        let (second, _) = session.get_trades(&fluctuations).unwrap();
        assert_eq!(first, second);
    }
}
