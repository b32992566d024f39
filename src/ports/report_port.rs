//! Report generation port trait.

use crate::domain::error::KestrelError;
use crate::domain::position::Trade;
use crate::domain::stats::{TradingStatistics, TradingSummary};

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(
        &self,
        trades: &[Trade],
        summary: &TradingSummary,
        statistics: &TradingStatistics,
        output_path: &str,
    ) -> Result<(), KestrelError>;
}
