//! Backtest simulator.
//!
//! A single-position state machine that replays signal records in timestamp
//! order against a simulated bid/ask. Each bar runs, in order: quote, exit
//! check, risk gate + entry check, equity record. Equity changes only when a
//! trade closes; open positions are never marked to market.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::bar::{Bar, validate_bars};
use super::config::{AppConfig, ExecutionConfig, RiskConfig};
use super::error::FxError;
use super::indicator::compute_all_indicators;
use super::metrics::{Metrics, TradeStats};
use super::position::{Position, PositionState, Side, TradeRecord};
use super::risk::{enforce_daily_limits, position_size};
use super::signal::{Signal, SignalRecord, generate_signals};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

/// Simulated top of book around a close price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub bid: f64,
    pub ask: f64,
}

impl Quote {
    /// `ask = close + spread/2 + slippage`, `bid = close - spread/2 - slippage`.
    pub fn around(close: f64, execution: &ExecutionConfig) -> Self {
        let half_spread = execution.simulate_spread / 2.0;
        Quote {
            bid: close - half_spread - execution.simulate_slippage,
            ask: close + half_spread + execution.simulate_slippage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FillKind {
    EntryLong,
    EntryShort,
    Exit,
}

/// One execution event. `pnl` is set only on exits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fill {
    pub timestamp: DateTime<Utc>,
    pub kind: FillKind,
    pub price: f64,
    pub units: u64,
    pub pnl: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeRecord>,
    pub fills: Vec<Fill>,
    pub metrics: Metrics,
    pub trade_stats: TradeStats,
}

/// Owns the position, equity and logs for one run.
pub struct Simulator<'a> {
    risk: &'a RiskConfig,
    execution: &'a ExecutionConfig,
    equity: f64,
    position: Option<Position>,
    equity_curve: Vec<EquityPoint>,
    trades: Vec<TradeRecord>,
    fills: Vec<Fill>,
}

impl<'a> Simulator<'a> {
    pub fn new(risk: &'a RiskConfig, execution: &'a ExecutionConfig, capacity: usize) -> Self {
        Simulator {
            risk,
            execution,
            equity: risk.capital,
            position: None,
            equity_curve: Vec::with_capacity(capacity),
            trades: Vec::new(),
            // at most one entry and one exit per bar
            fills: Vec::with_capacity(capacity * 2),
        }
    }

    pub fn equity(&self) -> f64 {
        self.equity
    }

    pub fn state(&self) -> PositionState {
        PositionState::from(self.position.as_ref())
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    /// Process one bar.
    pub fn step(&mut self, record: &SignalRecord) {
        let timestamp = record.frame.timestamp();
        let quote = Quote::around(record.frame.close(), self.execution);

        self.check_exit(timestamp, quote);
        if self.position.is_none() {
            self.check_entry(record, timestamp, quote);
        }

        self.equity_curve.push(EquityPoint {
            timestamp,
            equity: self.equity,
        });
    }

    fn check_exit(&mut self, timestamp: DateTime<Utc>, quote: Quote) {
        let Some(reason) = self
            .position
            .as_ref()
            .and_then(|p| p.exit_reason(quote.bid, quote.ask))
        else {
            return;
        };
        let Some(position) = self.position.take() else {
            return;
        };
        let exit_price = position.exit_quote(quote.bid, quote.ask);
        let trade = position.close(timestamp, exit_price, reason);
        self.equity += trade.pnl;

        debug!(
            %timestamp,
            side = ?trade.side,
            reason = ?reason,
            price = exit_price,
            pnl = trade.pnl,
            equity = self.equity,
            "position closed"
        );

        self.fills.push(Fill {
            timestamp,
            kind: FillKind::Exit,
            price: exit_price,
            units: trade.units,
            pnl: Some(trade.pnl),
        });
        self.trades.push(trade);
    }

    fn check_entry(&mut self, record: &SignalRecord, timestamp: DateTime<Utc>, quote: Quote) {
        let (side, price, kind) = match record.signal {
            Signal::Flat => return,
            Signal::Long => (Side::Long, quote.ask, FillKind::EntryLong),
            Signal::Short => (Side::Short, quote.bid, FillKind::EntryShort),
        };

        if enforce_daily_limits(&self.trades, self.risk.capital, self.risk) {
            warn!(%timestamp, signal = ?record.signal, "entry blocked by daily limits");
            return;
        }

        let Some(bracket) = record.bracket else {
            return;
        };
        let units = position_size(self.equity, price, record.frame.atr, self.risk);

        debug!(
            %timestamp,
            side = ?side,
            price,
            units,
            stop_loss = bracket.stop_loss,
            take_profit = bracket.take_profit,
            "position opened"
        );

        self.fills.push(Fill {
            timestamp,
            kind,
            price,
            units,
            pnl: None,
        });
        self.position = Some(Position {
            side,
            units,
            entry_price: price,
            entry_time: timestamp,
            bracket,
        });
    }

    /// Consume the simulator. A position still open at the end is discarded.
    pub fn finish(self) -> BacktestResult {
        let metrics = Metrics::compute(&self.equity_curve);
        let trade_stats = TradeStats::compute(&self.trades);
        BacktestResult {
            equity_curve: self.equity_curve,
            trades: self.trades,
            fills: self.fills,
            metrics,
            trade_stats,
        }
    }
}

/// Replay already-generated signal records.
pub fn simulate(
    records: &[SignalRecord],
    risk: &RiskConfig,
    execution: &ExecutionConfig,
) -> BacktestResult {
    let mut simulator = Simulator::new(risk, execution, records.len());
    for record in records {
        simulator.step(record);
    }
    simulator.finish()
}

/// Full pipeline: validate, indicators, signals, warm-up cut, simulate, metrics.
///
/// Indicators and signals are computed over the whole series so that recursive
/// filters are seeded from the first bar; only the first `warmup_bars` records
/// are withheld from the simulator.
pub fn run_backtest(bars: &[Bar], config: &AppConfig) -> Result<BacktestResult, FxError> {
    validate_bars(bars)?;
    let minimum = config.warmup_bars + 1;
    if bars.len() < minimum {
        return Err(FxError::InsufficientData {
            bars: bars.len(),
            minimum,
        });
    }

    let frames = compute_all_indicators(bars, &config.indicators);
    let records = generate_signals(&frames, &config.strategy, &config.risk);
    let tradable = &records[config.warmup_bars..];

    info!(
        symbol = %config.symbol,
        bars = bars.len(),
        warmup = config.warmup_bars,
        simulated = tradable.len(),
        "starting backtest"
    );

    let result = simulate(tradable, &config.risk, &config.execution);

    info!(
        trades = result.trades.len(),
        last_equity = result.metrics.last_equity,
        cagr = result.metrics.cagr,
        max_drawdown = result.metrics.max_drawdown,
        "backtest complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Bar;
    use crate::domain::indicator::IndicatorFrame;
    use crate::domain::position::ExitReason;
    use chrono::{Duration, TimeZone};

    fn ts(i: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(5 * i)
    }

    fn record(i: i64, close: f64, signal: Signal) -> SignalRecord {
        let atr = 0.001;
        let risk = RiskConfig::default();
        SignalRecord {
            frame: IndicatorFrame {
                bar: Bar {
                    timestamp: ts(i),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: None,
                },
                tick_volume: 1.0,
                ema_fast: close,
                ema_slow: close,
                rsi: 50.0,
                macd: 0.0,
                macd_signal: 0.0,
                macd_hist: 0.0,
                atr,
                bb_mid: None,
                bb_upper: None,
                bb_lower: None,
            },
            signal,
            score: if signal == Signal::Flat { 0.0 } else { 1.0 },
            bracket: crate::domain::signal::bracket_for(signal, close, atr, &risk),
        }
    }

    fn zero_cost() -> ExecutionConfig {
        ExecutionConfig {
            simulate_spread: 0.0,
            simulate_slippage: 0.0,
        }
    }

    #[test]
    fn quote_around_close() {
        let q = Quote::around(1.1, &ExecutionConfig::default());
        assert!((q.ask - (1.1 + 0.000025 + 0.00002)).abs() < 1e-12);
        assert!((q.bid - (1.1 - 0.000025 - 0.00002)).abs() < 1e-12);
    }

    #[test]
    fn long_take_profit_round_trip() {
        let risk = RiskConfig::default();
        let exec = ExecutionConfig::default();
        let records = vec![
            record(0, 1.1000, Signal::Long),
            record(1, 1.1005, Signal::Flat),
            record(2, 1.1030, Signal::Flat),
        ];
        let result = simulate(&records, &risk, &exec);

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        let entry = Quote::around(1.1000, &exec).ask;
        let exit = Quote::around(1.1030, &exec).bid;
        assert!((trade.entry_price - entry).abs() < 1e-12);
        assert!((trade.exit_price - exit).abs() < 1e-12);
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        assert_eq!(trade.exit_time, ts(2));
        let expected = (exit - entry) * trade.units as f64;
        assert!((trade.pnl - expected).abs() < 1e-9);

        assert_eq!(result.equity_curve.len(), 3);
        assert!((result.equity_curve[0].equity - risk.capital).abs() < f64::EPSILON);
        assert!((result.equity_curve[1].equity - risk.capital).abs() < f64::EPSILON);
        assert!((result.equity_curve[2].equity - (risk.capital + trade.pnl)).abs() < 1e-9);

        assert_eq!(result.fills.len(), 2);
        assert_eq!(result.fills[0].kind, FillKind::EntryLong);
        assert_eq!(result.fills[1].kind, FillKind::Exit);
        assert_eq!(result.fills[1].pnl, Some(trade.pnl));
    }

    #[test]
    fn short_stop_loss_on_ask() {
        let risk = RiskConfig::default();
        let exec = zero_cost();
        // short at 1.1000, stop at 1.1015
        let records = vec![
            record(0, 1.1000, Signal::Short),
            record(1, 1.1010, Signal::Flat),
            record(2, 1.1016, Signal::Flat),
        ];
        let result = simulate(&records, &risk, &exec);
        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.side, Side::Short);
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert!(trade.pnl < 0.0);
        assert!((trade.pnl - (1.1000 - 1.1016) * trade.units as f64).abs() < 1e-9);
    }

    #[test]
    fn position_keeps_entry_bracket() {
        let risk = RiskConfig::default();
        let exec = zero_cost();
        let records = vec![
            record(0, 1.1000, Signal::Long),
            // a later flat bar carries no bracket; the open position must still exit
            record(1, 1.0980, Signal::Flat),
        ];
        let result = simulate(&records, &risk, &exec);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].exit_reason, ExitReason::StopLoss);
    }

    #[test]
    fn same_bar_reversal() {
        let risk = RiskConfig::default();
        let exec = zero_cost();
        let records = vec![
            record(0, 1.1000, Signal::Long),
            record(1, 1.1025, Signal::Short),
        ];
        let mut sim = Simulator::new(&risk, &exec, records.len());
        sim.step(&records[0]);
        assert_eq!(sim.state(), PositionState::Long);
        sim.step(&records[1]);
        assert_eq!(sim.state(), PositionState::Short);
        assert_eq!(sim.trades().len(), 1);
        assert_eq!(sim.position().map(|p| p.entry_time), Some(ts(1)));

        let result = sim.finish();
        let kinds: Vec<FillKind> = result.fills.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![FillKind::EntryLong, FillKind::Exit, FillKind::EntryShort]
        );
    }

    #[test]
    fn signal_ignored_while_in_position() {
        let risk = RiskConfig::default();
        let exec = zero_cost();
        let records = vec![
            record(0, 1.1000, Signal::Long),
            record(1, 1.1001, Signal::Long),
            record(2, 1.1002, Signal::Short),
        ];
        let result = simulate(&records, &risk, &exec);
        assert!(result.trades.is_empty());
        assert_eq!(result.fills.len(), 1);
    }

    #[test]
    fn daily_limit_blocks_entries() {
        let risk = RiskConfig {
            max_trades_per_day: 1,
            ..RiskConfig::default()
        };
        let exec = zero_cost();
        let records = vec![
            record(0, 1.1000, Signal::Long),
            record(1, 1.1030, Signal::Long),
            record(2, 1.1030, Signal::Long),
        ];
        let result = simulate(&records, &risk, &exec);
        // the take-profit on bar 1 uses the day's only trade, so no re-entry
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.fills.len(), 2);
    }

    #[test]
    fn open_position_not_marked_to_market() {
        let risk = RiskConfig::default();
        let exec = zero_cost();
        let records = vec![
            record(0, 1.1000, Signal::Long),
            record(1, 1.1010, Signal::Flat),
            record(2, 1.0990, Signal::Flat),
        ];
        let result = simulate(&records, &risk, &exec);
        assert!(result.trades.is_empty());
        for p in &result.equity_curve {
            assert!((p.equity - risk.capital).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn sizing_uses_current_equity() {
        let risk = RiskConfig {
            min_position_units: 1,
            max_position_units: 10_000_000,
            ..RiskConfig::default()
        };
        let exec = zero_cost();
        let records = vec![
            record(0, 1.1000, Signal::Long),
            record(1, 1.1030, Signal::Flat),
            record(2, 1.1030, Signal::Long),
        ];
        let result = simulate(&records, &risk, &exec);
        let first_units = result.fills[0].units;
        let second_units = result.fills[2].units;
        assert!(second_units > first_units);
    }

    #[test]
    fn run_backtest_rejects_short_series() {
        let config = AppConfig {
            warmup_bars: 5,
            ..AppConfig::default()
        };
        let bars: Vec<Bar> = (0..5).map(|i| record(i, 1.1, Signal::Flat).frame.bar).collect();
        let err = run_backtest(&bars, &config).unwrap_err();
        assert!(matches!(
            err,
            FxError::InsufficientData {
                bars: 5,
                minimum: 6
            }
        ));
    }

    #[test]
    fn run_backtest_rejects_nan() {
        let config = AppConfig {
            warmup_bars: 0,
            ..AppConfig::default()
        };
        let mut bars: Vec<Bar> = (0..3).map(|i| record(i, 1.1, Signal::Flat).frame.bar).collect();
        bars[1].close = f64::NAN;
        assert!(matches!(
            run_backtest(&bars, &config),
            Err(FxError::InvalidBar { .. })
        ));
    }

    #[test]
    fn run_backtest_drops_warmup() {
        let config = AppConfig {
            warmup_bars: 3,
            ..AppConfig::default()
        };
        let bars: Vec<Bar> = (0..10).map(|i| record(i, 1.1, Signal::Flat).frame.bar).collect();
        let result = run_backtest(&bars, &config).unwrap();
        assert_eq!(result.equity_curve.len(), 7);
        assert_eq!(result.equity_curve[0].timestamp, ts(3));
        assert_eq!(result.metrics.bars, 7);
    }
}
