//! Asset ledger.

use std::collections::HashMap;

use super::asset::Coin;
use super::error::KestrelError;
use super::position::{Position, Trade};

/// Currency amount a fresh session ledger starts with.
pub const STARTING_BALANCE: f64 = 100.0;

/// Available amount of each coin. No entry may go negative.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Portfolio {
    assets: HashMap<Coin, f64>,
}

impl Portfolio {
    /// Fresh ledger seeded with the starting balance of `currency`.
    pub fn with_starting_balance(currency: Coin) -> Self {
        let mut assets = HashMap::new();
        assets.insert(currency, STARTING_BALANCE);
        Portfolio { assets }
    }

    pub fn available(&self, coin: Coin) -> f64 {
        self.assets.get(&coin).copied().unwrap_or(0.0)
    }

    /// Add `delta` (possibly negative) to the available amount of `coin`.
    pub fn update(&mut self, coin: Coin, delta: f64) -> Result<(), KestrelError> {
        let updated = self.available(coin) + delta;
        if updated < 0.0 {
            return Err(KestrelError::InsufficientBalance {
                coin: coin.symbol().to_string(),
                delta,
                result: updated,
            });
        }
        self.assets.insert(coin, updated);
        Ok(())
    }

    /// Move funds after a position is opened: currency out, coin in.
    pub fn update_from_position(&mut self, position: &Position) -> Result<(), KestrelError> {
        self.update(position.currency, -position.initial_investment)?;
        self.update(position.coin, position.amount)
    }

    /// Move funds after a position is closed: coin out, currency back in with
    /// the realized profit.
    pub fn update_from_trade(&mut self, trade: &Trade) -> Result<(), KestrelError> {
        self.update(trade.currency, trade.initial_investment + trade.total_profit)?;
        self.update(trade.coin, -trade.amount)
    }
}
