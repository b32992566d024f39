#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use kestrel::domain::asset::Coin;
use kestrel::domain::candle::Candle;
use kestrel::domain::fluctuations::Fluctuations;
use kestrel::domain::strategy::{Signal, Strategy};
use kestrel::domain::timeframe::Timeframe;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn daily_candle(open_time: NaiveDateTime, open: f64, close: f64) -> Candle {
    let tf = Timeframe::parse("1d").unwrap();
    Candle {
        coin: Coin::Btc,
        currency: Coin::Usdt,
        open_time,
        close_time: open_time + tf.duration(),
        timeframe: tf,
        open,
        high: open.max(close) + 1.0,
        low: open.min(close) - 1.0,
        close,
        volume: 10.0,
        quote_volume: open * 10.0,
        nb_trades: 100,
        taker_volume: 5.0,
        taker_quote_volume: open * 5.0,
        high_time: None,
        low_time: None,
    }
}

pub fn minute_candle(open_time: NaiveDateTime, price: f64) -> Candle {
    let tf = Timeframe::parse("1m").unwrap();
    Candle {
        coin: Coin::Btc,
        currency: Coin::Usdt,
        open_time,
        close_time: open_time + tf.duration(),
        timeframe: tf,
        open: price,
        high: price + 0.5,
        low: price - 0.5,
        close: price + 0.1,
        volume: 1.0,
        quote_volume: price,
        nb_trades: 10,
        taker_volume: 0.5,
        taker_quote_volume: price / 2.0,
        high_time: Some(open_time + chrono::Duration::seconds(30)),
        low_time: None,
    }
}

/// A week of daily candles starting at `start`, opens stepping by 50 from 50
/// and closes stepping by 50 from 100.
pub fn weekly_ramp(start: NaiveDateTime) -> Fluctuations {
    let candles = (0..7)
        .map(|day| {
            let open = 50.0 * (day + 1) as f64;
            daily_candle(start + chrono::Duration::days(day), open, open + 50.0)
        })
        .collect();
    Fluctuations::from_candles(candles).unwrap()
}

/// Buys on Mondays and sells on Fridays.
pub struct WeekdaySwing;

impl Strategy for WeekdaySwing {
    fn name(&self) -> &str {
        "weekday_swing"
    }

    fn compute_signals(&self, fluctuations: &Fluctuations) -> Vec<Signal> {
        fluctuations
            .candles()
            .iter()
            .map(|candle| match candle.open_time.weekday() {
                chrono::Weekday::Mon => Signal::Buy,
                chrono::Weekday::Fri => Signal::Sell,
                _ => Signal::Wait,
            })
            .collect()
    }
}
