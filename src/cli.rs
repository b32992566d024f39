//! CLI definition and dispatch.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::adapters::csv_store::CsvStore;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::random_search_adapter::RandomSearchAdapter;
use crate::adapters::text_report_adapter::TextReportAdapter;
use crate::domain::asset::Coin;
use crate::domain::error::KestrelError;
use crate::domain::optimizer::Optimizer;
use crate::domain::session::{SessionConfig, TradingSession};
use crate::domain::split::create_ccpv_splits;
use crate::domain::stats::{TradingStatistics, TradingSummary};
use crate::domain::strategy::{DcaStrategy, ParamValue, Weekday};
use crate::domain::timeframe::Timeframe;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "kestrel", about = "Trading strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a trading session and write a performance report
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Search strategy parameters over cross-validation folds
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        trials: Option<usize>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest { config, output } => run_backtest(&config, output.as_deref()),
        Command::Optimize { config, trials } => run_optimize(&config, trials),
    }
}

/// Market data selection: where candles live and which slice to load.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub root_dir: PathBuf,
    pub coin: Coin,
    pub currency: Coin,
    pub timeframe: Timeframe,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn require_string(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, KestrelError> {
    adapter
        .get_string(section, key)
        .ok_or_else(|| KestrelError::ConfigMissing {
            section: section.into(),
            key: key.into(),
        })
}

fn parse_date(adapter: &dyn ConfigPort, key: &str) -> Result<NaiveDate, KestrelError> {
    let value = require_string(adapter, "data", key)?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| KestrelError::ConfigInvalid {
        section: "data".into(),
        key: key.into(),
        reason: "invalid date format (expected YYYY-MM-DD)".into(),
    })
}

pub fn build_data_config(adapter: &dyn ConfigPort) -> Result<DataConfig, KestrelError> {
    let root_dir = PathBuf::from(require_string(adapter, "data", "root_dir")?);
    let coin: Coin = adapter
        .get_string("data", "coin")
        .unwrap_or_else(|| Coin::default_coin().symbol().to_string())
        .parse()?;
    let currency: Coin = adapter
        .get_string("data", "currency")
        .unwrap_or_else(|| Coin::default_currency().symbol().to_string())
        .parse()?;
    let timeframe = Timeframe::parse(
        &adapter
            .get_string("data", "timeframe")
            .unwrap_or_else(|| "1d".to_string()),
    )?;
    let start_date = parse_date(adapter, "start_date")?;
    let end_date = parse_date(adapter, "end_date")?;
    if end_date < start_date {
        return Err(KestrelError::ConfigInvalid {
            section: "data".into(),
            key: "end_date".into(),
            reason: "end_date is before start_date".into(),
        });
    }

    Ok(DataConfig {
        root_dir,
        coin,
        currency,
        timeframe,
        start_date,
        end_date,
    })
}

fn optional_pct(
    adapter: &dyn ConfigPort,
    key: &str,
) -> Result<Option<f64>, KestrelError> {
    match adapter.get_string("session", key) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| KestrelError::ConfigInvalid {
                section: "session".into(),
                key: key.into(),
                reason: "not a number".into(),
            }),
    }
}

pub fn build_session_config(adapter: &dyn ConfigPort) -> Result<SessionConfig, KestrelError> {
    let position_size = adapter.get_double("session", "position_size", 1.0);
    if !(position_size > 0.0 && position_size <= 1.0) {
        return Err(KestrelError::ConfigInvalid {
            section: "session".into(),
            key: "position_size".into(),
            reason: "must be in (0, 1]".into(),
        });
    }

    Ok(SessionConfig {
        position_size,
        stop_loss_pct: optional_pct(adapter, "stop_loss_pct")?,
        take_profit_pct: optional_pct(adapter, "take_profit_pct")?,
    })
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<DcaStrategy, KestrelError> {
    let name = adapter
        .get_string("strategy", "name")
        .unwrap_or_else(|| "dca".to_string());
    if name != "dca" {
        return Err(KestrelError::ConfigInvalid {
            section: "strategy".into(),
            key: "name".into(),
            reason: format!("unknown strategy `{name}`"),
        });
    }

    let weekday_str = adapter
        .get_string("strategy", "weekday")
        .unwrap_or_else(|| "every_day".to_string());
    let weekday = Weekday::parse(&weekday_str).ok_or_else(|| KestrelError::ConfigInvalid {
        section: "strategy".into(),
        key: "weekday".into(),
        reason: format!("unknown weekday `{weekday_str}`"),
    })?;

    Ok(DcaStrategy {
        weekday,
        hour: adapter.get_int("strategy", "hour", 0) as u32,
        minute: adapter.get_int("strategy", "minute", 0) as u32,
    })
}

fn run_backtest(config_path: &PathBuf, output: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let data_config = match build_data_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let session_config = match build_session_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let strategy = match build_strategy(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let store = CsvStore::new(data_config.root_dir.clone());
    eprintln!(
        "Loading {}/{} candles at {} from {} to {}",
        data_config.coin.symbol(),
        data_config.currency.symbol(),
        data_config.timeframe.code(),
        data_config.start_date,
        data_config.end_date,
    );
    let fluctuations = match store.fetch_candles(
        data_config.coin,
        data_config.currency,
        &data_config.timeframe,
        data_config.start_date,
        data_config.end_date,
    ) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Loaded {} candles", fluctuations.len());

    let session = TradingSession::new(&strategy, session_config);
    let (trades, _) = match session.get_trades(&fluctuations) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let summary = TradingSummary::from_trades(&trades);
    let statistics = TradingStatistics::from_trades(&trades);

    eprintln!("\n=== Results ===");
    eprintln!("Trades:       {}", summary.nb_trades);
    eprintln!("Wins:         {}", summary.nb_wins);
    eprintln!("Losses:       {}", summary.nb_losses);
    eprintln!("Total Return: {:.3}", summary.total_return);
    eprintln!("Max Drawdown: {:.3}", statistics.max_drawdown);
    eprintln!("CAGR:         {:.3}", statistics.cagr);
    eprintln!("Sharpe:       {:.3}", statistics.sharpe_ratio);
    eprintln!("Sortino:      {:.3}", statistics.sortino_ratio);
    eprintln!("Calmar:       {:.3}", statistics.calmar_ratio);

    let output = output.unwrap_or("report");
    match TextReportAdapter::new().write(&trades, &summary, &statistics, output) {
        Ok(()) => {
            eprintln!("\nReport written to: {output}.txt");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_optimize(config_path: &PathBuf, trials_override: Option<usize>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let data_config = match build_data_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let session_config = match build_session_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let strategy = match build_strategy(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let n_trials =
        trials_override.unwrap_or(adapter.get_int("optimize", "n_trials", 100) as usize);
    let test_size = adapter.get_double("optimize", "test_size", 0.2);
    let test_samples = adapter.get_int("optimize", "test_samples", 1) as usize;
    let purge_factor = adapter.get_double("optimize", "purge_factor", 0.01);
    let seed = adapter.get_int("optimize", "seed", 42) as u64;

    let store = CsvStore::new(data_config.root_dir.clone());
    let fluctuations = match store.fetch_candles(
        data_config.coin,
        data_config.currency,
        &data_config.timeframe,
        data_config.start_date,
        data_config.end_date,
    ) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Loaded {} candles", fluctuations.len());

    let split_manager =
        match create_ccpv_splits(fluctuations, test_size, test_samples, purge_factor) {
            Ok(m) => m,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
    eprintln!(
        "Searching {} trials over {} folds",
        n_trials,
        split_manager.len()
    );

    let mut optimizer = Optimizer::new(strategy, session_config, n_trials);
    let mut search = RandomSearchAdapter::new(seed);
    let results = match optimizer.find_ccpv_best_parameters(&split_manager, &mut search) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    for (fold, score) in results.iter().enumerate() {
        let mut parameters: Vec<String> = score
            .parameters
            .iter()
            .map(|(name, value)| match value {
                ParamValue::Int(v) => format!("{name}={v}"),
                ParamValue::Float(v) => format!("{name}={v:.4}"),
            })
            .collect();
        parameters.sort();
        println!(
            "fold {}: {} (train sharpe {:.3}, val sharpe {:.3})",
            fold,
            parameters.join(", "),
            score.train_score,
            score.val_score,
        );
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[data]
root_dir = /tmp/candles
coin = BTC
currency = USDT
timeframe = 1d
start_date = 2024-01-01
end_date = 2024-06-30

[session]
position_size = 0.33
stop_loss_pct = 0.05

[strategy]
name = dca
weekday = monday
hour = 12
"#;

    #[test]
    fn build_data_config_from_ini() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        let config = build_data_config(&adapter).unwrap();
        assert_eq!(config.coin, Coin::Btc);
        assert_eq!(config.currency, Coin::Usdt);
        assert_eq!(config.timeframe.code(), "1d");
        assert_eq!(
            config.start_date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn data_config_requires_root_dir() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\nstart_date = 2024-01-01\nend_date = 2024-02-01\n",
        )
        .unwrap();
        assert!(matches!(
            build_data_config(&adapter),
            Err(KestrelError::ConfigMissing { .. })
        ));
    }

    #[test]
    fn data_config_rejects_bad_date() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\nroot_dir = /tmp\nstart_date = 01/01/2024\nend_date = 2024-02-01\n",
        )
        .unwrap();
        assert!(matches!(
            build_data_config(&adapter),
            Err(KestrelError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn data_config_rejects_reversed_range() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\nroot_dir = /tmp\nstart_date = 2024-03-01\nend_date = 2024-02-01\n",
        )
        .unwrap();
        assert!(matches!(
            build_data_config(&adapter),
            Err(KestrelError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn build_session_config_reads_optional_thresholds() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        let config = build_session_config(&adapter).unwrap();
        assert!((config.position_size - 0.33).abs() < f64::EPSILON);
        assert_eq!(config.stop_loss_pct, Some(0.05));
        assert_eq!(config.take_profit_pct, None);
    }

    #[test]
    fn session_config_rejects_out_of_range_position_size() {
        let adapter =
            FileConfigAdapter::from_string("[session]\nposition_size = 1.5\n").unwrap();
        assert!(matches!(
            build_session_config(&adapter),
            Err(KestrelError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn build_strategy_reads_dca_fields() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        let strategy = build_strategy(&adapter).unwrap();
        assert_eq!(strategy.weekday, Weekday::Monday);
        assert_eq!(strategy.hour, 12);
        assert_eq!(strategy.minute, 0);
    }

    #[test]
    fn build_strategy_rejects_unknown_name() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nname = momentum\n").unwrap();
        assert!(matches!(
            build_strategy(&adapter),
            Err(KestrelError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn build_strategy_rejects_unknown_weekday() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nname = dca\nweekday = someday\n").unwrap();
        assert!(matches!(
            build_strategy(&adapter),
            Err(KestrelError::ConfigInvalid { .. })
        ));
    }
}
