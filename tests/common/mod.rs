#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use fxbracket::domain::bar::Bar;
use fxbracket::domain::config::ExecutionConfig;
use fxbracket::domain::error::FxError;
use fxbracket::domain::indicator::IndicatorFrame;
use fxbracket::ports::data_port::DataPort;

pub fn ts(i: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(5 * i)
}

pub fn make_bar(i: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: ts(i),
        open,
        high,
        low,
        close,
        volume: Some(100.0),
    }
}

/// Bars whose open is the previous close and whose wicks are `wick` wide.
pub fn bars_from_closes(closes: &[f64], wick: f64) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let open = if i == 0 { c } else { closes[i - 1] };
            make_bar(i as i64, open, open.max(c) + wick, open.min(c) - wick, c)
        })
        .collect()
}

/// Frame with neutral indicators; tests override the fields they care about.
pub fn make_frame(i: i64, close: f64) -> IndicatorFrame {
    IndicatorFrame {
        bar: make_bar(i, close, close, close, close),
        tick_volume: 100.0,
        ema_fast: close,
        ema_slow: close,
        rsi: 50.0,
        macd: 0.0,
        macd_signal: 0.0,
        macd_hist: 0.0,
        atr: 0.001,
        bb_mid: None,
        bb_upper: None,
        bb_lower: None,
    }
}

pub fn zero_cost() -> ExecutionConfig {
    ExecutionConfig {
        simulate_spread: 0.0,
        simulate_slippage: 0.0,
    }
}

pub struct MockDataPort {
    pub bars: Vec<Bar>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars, error: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            bars: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self) -> Result<Vec<Bar>, FxError> {
        match &self.error {
            Some(reason) => Err(FxError::DataSource {
                reason: reason.clone(),
            }),
            None => Ok(self.bars.clone()),
        }
    }

    fn describe(&self) -> String {
        "mock".into()
    }
}
