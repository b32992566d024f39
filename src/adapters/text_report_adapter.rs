//! Plain-text report adapter.
//!
//! Writes a human-readable performance summary next to a CSV of the closed
//! trades (`<output>.txt` and `<output>_trades.csv`).

use std::fmt::Write as _;
use std::fs;

use crate::domain::error::KestrelError;
use crate::domain::position::Trade;
use crate::domain::stats::{TradingStatistics, TradingSummary};
use crate::ports::report_port::ReportPort;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct TextReportAdapter;

impl TextReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn render_summary(
        trades: &[Trade],
        summary: &TradingSummary,
        statistics: &TradingStatistics,
    ) -> String {
        let mut out = String::new();
        let strategy = trades
            .first()
            .map(|trade| trade.strategy_name.as_str())
            .unwrap_or("-");
        let _ = writeln!(out, "strategy: {strategy}");
        let _ = writeln!(out);
        let _ = writeln!(out, "trades:       {}", summary.nb_trades);
        let _ = writeln!(out, "wins:         {}", summary.nb_wins);
        let _ = writeln!(out, "losses:       {}", summary.nb_losses);
        let _ = writeln!(out, "total return: {:.3}", summary.total_return);
        let _ = writeln!(out, "best trade:   {:.5}", summary.best_trade_return);
        let _ = writeln!(out, "worst trade:  {:.5}", summary.worst_trade_return);
        let _ = writeln!(out);
        let _ = writeln!(out, "max drawdown: {:.3}", statistics.max_drawdown);
        let _ = writeln!(out, "cagr:         {:.3}", statistics.cagr);
        let _ = writeln!(out, "sharpe:       {:.3}", statistics.sharpe_ratio);
        let _ = writeln!(out, "sortino:      {:.3}", statistics.sortino_ratio);
        let _ = writeln!(out, "calmar:       {:.3}", statistics.calmar_ratio);
        out
    }

    fn write_trades_csv(trades: &[Trade], path: &str) -> Result<(), KestrelError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "strategy",
            "coin",
            "currency",
            "open_date",
            "close_date",
            "open_price",
            "close_price",
            "amount",
            "initial_investment",
            "total_fees",
            "total_profit",
            "profit_pct",
            "is_win",
        ])?;
        for trade in trades {
            writer.write_record([
                trade.strategy_name.clone(),
                trade.coin.symbol().to_string(),
                trade.currency.symbol().to_string(),
                trade.open_date.format(DATETIME_FORMAT).to_string(),
                trade.close_date.format(DATETIME_FORMAT).to_string(),
                trade.open_price.to_string(),
                trade.close_price.to_string(),
                trade.amount.to_string(),
                trade.initial_investment.to_string(),
                trade.total_fees.to_string(),
                trade.total_profit.to_string(),
                trade.profit_pct.to_string(),
                trade.is_win.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Default for TextReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for TextReportAdapter {
    fn write(
        &self,
        trades: &[Trade],
        summary: &TradingSummary,
        statistics: &TradingStatistics,
        output_path: &str,
    ) -> Result<(), KestrelError> {
        fs::write(
            format!("{output_path}.txt"),
            Self::render_summary(trades, summary, statistics),
        )?;
        Self::write_trades_csv(trades, &format!("{output_path}_trades.csv"))?;
        Ok(())
    }
}
