//! Market data access port trait.

use chrono::NaiveDate;

use crate::domain::asset::Coin;
use crate::domain::error::KestrelError;
use crate::domain::fluctuations::Fluctuations;
use crate::domain::timeframe::Timeframe;

pub trait DataPort {
    /// Load candles for a pair over a date range, converted to `timeframe`.
    fn fetch_candles(
        &self,
        coin: Coin,
        currency: Coin,
        timeframe: &Timeframe,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Fluctuations, KestrelError>;

    /// Persist candles under the store's layout.
    fn save_candles(&self, fluctuations: &Fluctuations) -> Result<(), KestrelError>;
}
