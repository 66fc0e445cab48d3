//! Backtest result sink port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::FxError;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, symbol: &str, output_path: &str)
    -> Result<(), FxError>;
}
