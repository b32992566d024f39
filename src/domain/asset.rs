//! Tradeable assets.

use std::fmt;
use std::str::FromStr;

use super::error::KestrelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coin {
    Btc,
    Eth,
    Usdt,
}

impl Coin {
    /// The coin traded when nothing else is configured.
    pub fn default_coin() -> Self {
        Coin::Btc
    }

    /// The quote currency used when nothing else is configured.
    pub fn default_currency() -> Self {
        Coin::Usdt
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Coin::Btc => "BTC",
            Coin::Eth => "ETH",
            Coin::Usdt => "USDT",
        }
    }
}

impl FromStr for Coin {
    type Err = KestrelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BTC" => Ok(Coin::Btc),
            "ETH" => Ok(Coin::Eth),
            "USDT" => Ok(Coin::Usdt),
            _ => Err(KestrelError::UnknownCoin {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
