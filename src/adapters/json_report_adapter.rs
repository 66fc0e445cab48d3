//! JSON backtest report adapter.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::FxError;
use crate::domain::metrics::{Metrics, TradeStats};
use crate::domain::position::TradeRecord;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;

/// Writes `{symbol, metrics, trade_stats, last_equity, trades}` as pretty JSON.
/// Non-finite numbers (e.g. profit factor with no losing trades) become `null`.
pub struct JsonReportAdapter;

#[derive(Serialize)]
struct Report<'a> {
    symbol: &'a str,
    metrics: &'a Metrics,
    trade_stats: &'a TradeStats,
    last_equity: f64,
    trades: &'a [TradeRecord],
}

impl JsonReportAdapter {
    pub fn render(result: &BacktestResult, symbol: &str) -> Result<String, FxError> {
        serde_json::to_string_pretty(&Self::report(result, symbol)).map_err(|e| FxError::Report {
            reason: e.to_string(),
        })
    }

    fn report<'a>(result: &'a BacktestResult, symbol: &'a str) -> Report<'a> {
        Report {
            symbol,
            metrics: &result.metrics,
            trade_stats: &result.trade_stats,
            last_equity: result.metrics.last_equity,
            trades: &result.trades,
        }
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        symbol: &str,
        output_path: &str,
    ) -> Result<(), FxError> {
        let file = File::create(output_path).map_err(|e| FxError::Report {
            reason: format!("failed to create {output_path}: {e}"),
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), &Self::report(result, symbol)).map_err(
            |e| FxError::Report {
                reason: format!("failed to write {output_path}: {e}"),
            },
        )
    }
}
