//! Ordered, validated candle collections.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::asset::Coin;
use super::candle::{sanitize_candles, Candle};
use super::error::KestrelError;
use super::timeframe::Timeframe;

/// A time-ordered collection of candles for one coin/currency/timeframe.
///
/// Construction goes through [`Fluctuations::from_candles`], which sanitizes
/// and sorts the input and rejects mixed coin/currency/timeframe lists. The
/// collection is immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Fluctuations {
    candles: Vec<Candle>,
    coin: Coin,
    currency: Coin,
    timeframe: Timeframe,
    index: HashMap<NaiveDateTime, usize>,
}

impl Fluctuations {
    /// Build a collection from raw candles.
    ///
    /// Zero-volume and duplicate-open_time candles are dropped, the remainder
    /// is sorted ascending by open_time. An empty input yields an empty
    /// collection with default coin/currency and the 1m timeframe.
    pub fn from_candles(candles: Vec<Candle>) -> Result<Self, KestrelError> {
        let mut sanitized = sanitize_candles(candles);
        sanitized.sort_by_key(|candle| candle.open_time);

        let (coin, currency, timeframe) = match sanitized.first() {
            Some(first) => (first.coin, first.currency, first.timeframe.clone()),
            None => (
                Coin::default_coin(),
                Coin::default_currency(),
                Timeframe::parse("1m")?,
            ),
        };

        check_homogeneity(&sanitized)?;

        let index: HashMap<NaiveDateTime, usize> = sanitized
            .iter()
            .enumerate()
            .map(|(ii, candle)| (candle.open_time, ii))
            .collect();
        if index.len() != sanitized.len() {
            return Err(KestrelError::InconsistentMapping {
                len: sanitized.len(),
                unique: index.len(),
            });
        }

        Ok(Fluctuations {
            candles: sanitized,
            coin,
            currency,
            timeframe,
            index,
        })
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn coin(&self) -> Coin {
        self.coin
    }

    pub fn currency(&self) -> Coin {
        self.currency
    }

    pub fn timeframe(&self) -> &Timeframe {
        &self.timeframe
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Look up a candle by its open time.
    pub fn get_candle(&self, open_time: NaiveDateTime) -> Option<&Candle> {
        self.index.get(&open_time).map(|&ii| &self.candles[ii])
    }

    /// Materialize a sub-collection from candle positions, re-validating on
    /// the way. Out-of-range positions are ignored.
    pub fn subset(&self, indexes: &[usize]) -> Result<Fluctuations, KestrelError> {
        let picked: Vec<Candle> = indexes
            .iter()
            .filter_map(|&ii| self.candles.get(ii).cloned())
            .collect();
        Fluctuations::from_candles(picked)
    }

    /// Open times of every candle in order.
    pub fn open_times(&self) -> Vec<NaiveDateTime> {
        self.candles.iter().map(|candle| candle.open_time).collect()
    }

    /// Closing prices of every candle in order.
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|candle| candle.close).collect()
    }
}

fn check_homogeneity(candles: &[Candle]) -> Result<(), KestrelError> {
    let Some(first) = candles.first() else {
        return Ok(());
    };

    let mixed_timeframes: Vec<&str> = unique_values(
        candles
            .iter()
            .map(|candle| candle.timeframe.code())
            .collect(),
    );
    if mixed_timeframes.len() > 1 {
        return Err(KestrelError::MixedCandles {
            attribute: "timeframe".into(),
            values: mixed_timeframes.join(", "),
        });
    }

    if candles.iter().any(|candle| candle.coin != first.coin) {
        let values = unique_values(candles.iter().map(|candle| candle.coin.symbol()).collect());
        return Err(KestrelError::MixedCandles {
            attribute: "coin".into(),
            values: values.join(", "),
        });
    }

    if candles.iter().any(|candle| candle.currency != first.currency) {
        let values = unique_values(
            candles
                .iter()
                .map(|candle| candle.currency.symbol())
                .collect(),
        );
        return Err(KestrelError::MixedCandles {
            attribute: "currency".into(),
            values: values.join(", "),
        });
    }

    Ok(())
}

fn unique_values(values: Vec<&str>) -> Vec<&str> {
    let mut unique = Vec::new();
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}
