//! Position lifecycle: open commitment, exit resolution, closed trade.

use chrono::{Duration, NaiveDateTime};

use super::asset::Coin;
use super::candle::Candle;

/// Exchange fee rate applied on both sides of a trade (0.1%).
pub const FEES_PCT: f64 = 0.001;

/// Position direction. Short positions are reserved, not implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    TakeProfit,
    StopLoss,
    Close,
}

/// Which candle timestamp the exit resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBasis {
    High,
    Low,
    Close,
}

/// How a position needs to be closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitSignal {
    pub kind: ExitKind,
    pub basis: TimeBasis,
}

impl ExitSignal {
    /// Resolve the signal to the actual close price and date.
    pub fn to_price_date(&self, position: &Position, candle: &Candle) -> (f64, NaiveDateTime) {
        let price = match self.kind {
            ExitKind::TakeProfit => position.take_profit,
            ExitKind::StopLoss => position.stop_loss,
            ExitKind::Close => candle.close,
        };
        let date = match self.basis {
            TimeBasis::High => candle.high_time.unwrap_or(candle.close_time),
            TimeBasis::Low => candle.low_time.unwrap_or(candle.close_time),
            TimeBasis::Close => candle.close_time,
        };
        (price, date)
    }
}

/// An open market commitment.
///
/// Closing consumes the position and produces a [`Trade`], so a position can
/// never be closed twice.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub strategy_name: String,
    pub coin: Coin,
    pub currency: Coin,
    pub amount: f64,
    pub side: Side,
    pub open_date: NaiveDateTime,
    pub open_price: f64,
    pub initial_investment: f64,
    pub open_fees: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl Position {
    /// Invest `money_to_invest` at `open_price`; fees are taken before the
    /// bought amount is computed.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        strategy_name: &str,
        coin: Coin,
        currency: Coin,
        open_date: NaiveDateTime,
        open_price: f64,
        money_to_invest: f64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Self {
        let open_fees = money_to_invest * FEES_PCT;
        let amount = (money_to_invest - open_fees) / open_price;
        Position {
            strategy_name: strategy_name.to_string(),
            coin,
            currency,
            amount,
            side: Side::Long,
            open_date,
            open_price,
            initial_investment: money_to_invest,
            open_fees,
            stop_loss,
            take_profit,
        }
    }

    /// Check whether `candle` forces the position to close.
    ///
    /// When both the take-profit and stop-loss levels are breached inside the
    /// same candle, the earlier extremum wins if both extremum times are
    /// known. Without that granularity the ordering cannot be determined and
    /// the position resolves to a close-basis exit at the candle's close.
    pub fn get_exit_signal(&self, candle: &Candle) -> Option<ExitSignal> {
        let reached_tp = candle.high >= self.take_profit;
        let reached_sl = candle.low <= self.stop_loss;

        if reached_tp && reached_sl {
            match (candle.high_time, candle.low_time) {
                (Some(high_time), Some(low_time)) => {
                    if high_time < low_time {
                        Some(ExitSignal {
                            kind: ExitKind::TakeProfit,
                            basis: TimeBasis::High,
                        })
                    } else {
                        Some(ExitSignal {
                            kind: ExitKind::StopLoss,
                            basis: TimeBasis::Low,
                        })
                    }
                }
                _ => Some(ExitSignal {
                    kind: ExitKind::Close,
                    basis: TimeBasis::Close,
                }),
            }
        } else if reached_tp {
            Some(ExitSignal {
                kind: ExitKind::TakeProfit,
                basis: if candle.high_time.is_some() {
                    TimeBasis::High
                } else {
                    TimeBasis::Close
                },
            })
        } else if reached_sl {
            Some(ExitSignal {
                kind: ExitKind::StopLoss,
                basis: if candle.low_time.is_some() {
                    TimeBasis::Low
                } else {
                    TimeBasis::Close
                },
            })
        } else {
            None
        }
    }

    /// Sell the held amount, consuming the position.
    pub fn close(self, close_date: NaiveDateTime, close_price: f64) -> Trade {
        let close_fees = close_price * self.amount * FEES_PCT;
        let total_fees = close_fees + self.open_fees;
        let total_profit = self.amount * close_price - self.initial_investment - total_fees;
        let profit_pct = if self.initial_investment != 0.0 {
            total_profit / self.initial_investment
        } else {
            0.0
        };

        Trade {
            strategy_name: self.strategy_name,
            coin: self.coin,
            currency: self.currency,
            amount: self.amount,
            side: self.side,
            open_date: self.open_date,
            open_price: self.open_price,
            initial_investment: self.initial_investment,
            open_fees: self.open_fees,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            close_date,
            close_price,
            close_fees,
            total_fees,
            total_profit,
            profit_pct,
            is_win: total_profit > 0.0,
            trade_duration: close_date - self.open_date,
        }
    }
}

/// A closed position. Only produced by [`Position::close`].
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub strategy_name: String,
    pub coin: Coin,
    pub currency: Coin,
    pub amount: f64,
    pub side: Side,
    pub open_date: NaiveDateTime,
    pub open_price: f64,
    pub initial_investment: f64,
    pub open_fees: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub close_date: NaiveDateTime,
    pub close_price: f64,
    pub close_fees: f64,
    pub total_fees: f64,
    pub total_profit: f64,
    pub profit_pct: f64,
    pub is_win: bool,
    pub trade_duration: Duration,
}
