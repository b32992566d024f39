//! OHLCV candle representation and aggregation algorithms.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use log::debug;

use super::asset::Coin;
use super::error::KestrelError;
use super::timeframe::Timeframe;

/// One OHLCV bar.
///
/// `high_time`/`low_time` localize the intrabar extrema; they are `None` when
/// the candle was aggregated from a timeframe too coarse to know them.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub coin: Coin,
    pub currency: Coin,
    pub timeframe: Timeframe,
    pub open_time: NaiveDateTime,
    pub close_time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub quote_volume: f64,
    pub nb_trades: u64,
    pub taker_volume: f64,
    pub taker_quote_volume: f64,
    pub high_time: Option<NaiveDateTime>,
    pub low_time: Option<NaiveDateTime>,
}

/// Aggregate a non-empty homogeneous candle list into a single candle.
///
/// Open and open_time come from the earliest-opening input, close and
/// close_time from the latest-closing one. High/low come from the extremum
/// inputs; their times are localized to those inputs' open_time. Volume-like
/// fields are summed.
pub fn merge_candles(candles: &[Candle]) -> Result<Candle, KestrelError> {
    let first = candles.first().ok_or(KestrelError::EmptyCandles)?;

    let mut open_candle = first;
    let mut close_candle = first;
    let mut highest = first;
    let mut lowest = first;
    for candle in candles {
        if candle.open_time < open_candle.open_time {
            open_candle = candle;
        }
        if candle.close_time > close_candle.close_time {
            close_candle = candle;
        }
        if candle.high > highest.high {
            highest = candle;
        }
        if candle.low < lowest.low {
            lowest = candle;
        }
    }

    Ok(Candle {
        coin: first.coin,
        currency: first.currency,
        timeframe: first.timeframe.clone(),
        open_time: open_candle.open_time,
        close_time: close_candle.close_time,
        open: open_candle.open,
        high: highest.high,
        low: lowest.low,
        close: close_candle.close,
        volume: candles.iter().map(|c| c.volume).sum(),
        quote_volume: candles.iter().map(|c| c.quote_volume).sum(),
        nb_trades: candles.iter().map(|c| c.nb_trades).sum(),
        taker_volume: candles.iter().map(|c| c.taker_volume).sum(),
        taker_quote_volume: candles.iter().map(|c| c.taker_quote_volume).sum(),
        high_time: Some(highest.open_time),
        low_time: Some(lowest.open_time),
    })
}

/// Aggregate a homogeneous, possibly unsorted candle list into a coarser
/// timeframe.
///
/// Candles are sorted by open_time, then consumed window by window: a window
/// starts at the first unconsumed candle's open_time and is merged as soon as
/// a candle's close_time reaches `window_start + target duration`. Trailing
/// candles that never fill a window are dropped, not merged.
///
/// Converting to the same timeframe returns the input unchanged; converting to
/// a finer one is an error.
pub fn convert_to_period(
    candles: Vec<Candle>,
    target: &Timeframe,
) -> Result<Vec<Candle>, KestrelError> {
    let Some(first) = candles.first() else {
        return Ok(Vec::new());
    };
    let source = first.timeframe.clone();

    if source.duration() > target.duration() {
        return Err(KestrelError::LowerTimeframe {
            source_code: source.code().to_string(),
            target_code: target.code().to_string(),
        });
    }
    if source.duration() == target.duration() {
        return Ok(candles);
    }

    let mut sorted = candles;
    sorted.sort_by_key(|candle| candle.open_time);

    let mut merged = Vec::new();
    let mut window_start_index = 0;
    let mut window_from = sorted[0].open_time;

    for ii in 0..sorted.len() {
        if sorted[ii].close_time >= window_from + target.duration() {
            let mut candle = merge_candles(&sorted[window_start_index..=ii])?;
            candle.timeframe = target.clone();
            merged.push(candle);
            window_start_index = ii + 1;
            if window_start_index < sorted.len() {
                window_from = sorted[window_start_index].open_time;
            }
        }
    }

    if window_start_index < sorted.len() {
        debug!(
            "last {} window could not be closed, dropping {} trailing candles",
            target.code(),
            sorted.len() - window_start_index
        );
    }
    Ok(merged)
}

/// Drop invalid candles: duplicated open_time values collapse to the last
/// occurrence, and non-positive volumes are removed.
pub fn sanitize_candles(candles: Vec<Candle>) -> Vec<Candle> {
    let mut positions: HashMap<NaiveDateTime, usize> = HashMap::new();
    let mut unique: Vec<Candle> = Vec::with_capacity(candles.len());
    for candle in candles {
        match positions.get(&candle.open_time) {
            Some(&ii) => unique[ii] = candle,
            None => {
                positions.insert(candle.open_time, unique.len());
                unique.push(candle);
            }
        }
    }
    unique.retain(|candle| candle.volume > 0.0);
    unique
}
