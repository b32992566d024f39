//! CSV candle store adapter.
//!
//! Candles are laid out one directory per pair and timeframe
//! (`BTC_USDT_1m/`), one file per day (`fluctuations_2024-01-01.csv`).
//! Fetching always reads the 1m dataset and aggregates to the requested
//! timeframe.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::domain::asset::Coin;
use crate::domain::candle::{convert_to_period, Candle};
use crate::domain::error::KestrelError;
use crate::domain::fluctuations::Fluctuations;
use crate::domain::timeframe::Timeframe;
use crate::ports::data_port::DataPort;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const HEADER: [&str; 16] = [
    "coin",
    "currency",
    "period",
    "open_time",
    "close_time",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "quote_volume",
    "nb_trades",
    "taker_volume",
    "taker_quote_volume",
    "high_time",
    "low_time",
];

pub struct CsvStore {
    root_dir: PathBuf,
}

impl CsvStore {
    pub fn new(root_dir: PathBuf) -> Self {
        Self { root_dir }
    }

    fn dataset_dir(&self, coin: Coin, currency: Coin, timeframe: &Timeframe) -> PathBuf {
        self.root_dir.join(format!(
            "{}_{}_{}",
            coin.symbol(),
            currency.symbol(),
            timeframe.code()
        ))
    }

    fn day_file(
        &self,
        coin: Coin,
        currency: Coin,
        timeframe: &Timeframe,
        date: NaiveDate,
    ) -> PathBuf {
        self.dataset_dir(coin, currency, timeframe)
            .join(format!("fluctuations_{}.csv", date.format("%Y-%m-%d")))
    }

    fn load_day(&self, path: &Path) -> Result<Vec<Candle>, KestrelError> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut candles = Vec::new();
        for record in reader.records() {
            candles.push(record_to_candle(&record?, path)?);
        }
        Ok(candles)
    }
}

impl DataPort for CsvStore {
    fn fetch_candles(
        &self,
        coin: Coin,
        currency: Coin,
        timeframe: &Timeframe,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Fluctuations, KestrelError> {
        let base_timeframe = Timeframe::parse("1m")?;
        let mut candles = Vec::new();

        let mut date = start_date;
        while date <= end_date {
            let path = self.day_file(coin, currency, &base_timeframe, date);
            if path.is_file() {
                candles.extend(self.load_day(&path)?);
            }
            date += chrono::Duration::days(1);
        }

        if candles.is_empty() {
            return Err(KestrelError::NoData {
                coin: coin.symbol().to_string(),
                currency: currency.symbol().to_string(),
                path: self
                    .dataset_dir(coin, currency, &base_timeframe)
                    .display()
                    .to_string(),
            });
        }

        let converted = convert_to_period(candles, timeframe)?;
        Fluctuations::from_candles(converted)
    }

    fn save_candles(&self, fluctuations: &Fluctuations) -> Result<(), KestrelError> {
        if fluctuations.is_empty() {
            return Ok(());
        }

        let dir = self.dataset_dir(
            fluctuations.coin(),
            fluctuations.currency(),
            fluctuations.timeframe(),
        );
        fs::create_dir_all(&dir)?;

        let mut current_day: Option<NaiveDate> = None;
        let mut writer: Option<csv::Writer<fs::File>> = None;
        for candle in fluctuations.candles() {
            let day = candle.open_time.date();
            if current_day != Some(day) {
                if let Some(mut finished) = writer.take() {
                    finished.flush()?;
                }
                let path = self.day_file(
                    fluctuations.coin(),
                    fluctuations.currency(),
                    fluctuations.timeframe(),
                    day,
                );
                let mut fresh = csv::Writer::from_path(path)?;
                fresh.write_record(HEADER)?;
                writer = Some(fresh);
                current_day = Some(day);
            }
            if let Some(ref mut active) = writer {
                active.write_record(candle_to_record(candle))?;
            }
        }
        if let Some(mut finished) = writer.take() {
            finished.flush()?;
        }
        Ok(())
    }
}

fn candle_to_record(candle: &Candle) -> Vec<String> {
    vec![
        candle.coin.symbol().to_string(),
        candle.currency.symbol().to_string(),
        candle.timeframe.code().to_string(),
        candle.open_time.format(DATETIME_FORMAT).to_string(),
        candle.close_time.format(DATETIME_FORMAT).to_string(),
        candle.open.to_string(),
        candle.high.to_string(),
        candle.low.to_string(),
        candle.close.to_string(),
        candle.volume.to_string(),
        candle.quote_volume.to_string(),
        candle.nb_trades.to_string(),
        candle.taker_volume.to_string(),
        candle.taker_quote_volume.to_string(),
        candle
            .high_time
            .map(|t| t.format(DATETIME_FORMAT).to_string())
            .unwrap_or_default(),
        candle
            .low_time
            .map(|t| t.format(DATETIME_FORMAT).to_string())
            .unwrap_or_default(),
    ]
}

fn get_field<'r>(
    record: &'r StringRecord,
    index: usize,
    name: &str,
    path: &Path,
) -> Result<&'r str, KestrelError> {
    record.get(index).ok_or_else(|| KestrelError::Store {
        reason: format!("missing column `{}` in {}", name, path.display()),
    })
}

fn parse_f64(
    record: &StringRecord,
    index: usize,
    name: &str,
    path: &Path,
) -> Result<f64, KestrelError> {
    get_field(record, index, name, path)?
        .parse()
        .map_err(|e| KestrelError::Store {
            reason: format!("invalid `{}` in {}: {}", name, path.display(), e),
        })
}

fn parse_datetime(
    record: &StringRecord,
    index: usize,
    name: &str,
    path: &Path,
) -> Result<NaiveDateTime, KestrelError> {
    NaiveDateTime::parse_from_str(get_field(record, index, name, path)?, DATETIME_FORMAT).map_err(
        |e| KestrelError::Store {
            reason: format!("invalid `{}` in {}: {}", name, path.display(), e),
        },
    )
}

fn parse_optional_datetime(
    record: &StringRecord,
    index: usize,
    name: &str,
    path: &Path,
) -> Result<Option<NaiveDateTime>, KestrelError> {
    match get_field(record, index, name, path)? {
        "" => Ok(None),
        value => NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
            .map(Some)
            .map_err(|e| KestrelError::Store {
                reason: format!("invalid `{}` in {}: {}", name, path.display(), e),
            }),
    }
}

fn record_to_candle(record: &StringRecord, path: &Path) -> Result<Candle, KestrelError> {
    Ok(Candle {
        coin: get_field(record, 0, "coin", path)?.parse()?,
        currency: get_field(record, 1, "currency", path)?.parse()?,
        timeframe: Timeframe::parse(get_field(record, 2, "period", path)?)?,
        open_time: parse_datetime(record, 3, "open_time", path)?,
        close_time: parse_datetime(record, 4, "close_time", path)?,
        open: parse_f64(record, 5, "open", path)?,
        high: parse_f64(record, 6, "high", path)?,
        low: parse_f64(record, 7, "low", path)?,
        close: parse_f64(record, 8, "close", path)?,
        volume: parse_f64(record, 9, "volume", path)?,
        quote_volume: parse_f64(record, 10, "quote_volume", path)?,
        nb_trades: get_field(record, 11, "nb_trades", path)?
            .parse()
            .map_err(|e| KestrelError::Store {
                reason: format!("invalid `nb_trades` in {}: {}", path.display(), e),
            })?,
        taker_volume: parse_f64(record, 12, "taker_volume", path)?,
        taker_quote_volume: parse_f64(record, 13, "taker_quote_volume", path)?,
        high_time: parse_optional_datetime(record, 14, "high_time", path)?,
        low_time: parse_optional_datetime(record, 15, "low_time", path)?,
    })
}
