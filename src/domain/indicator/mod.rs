//! Technical indicator engine.
//!
//! Every indicator is a pure function over a price slice returning a vector of
//! the same length, aligned by index with the input bars. The only undefined
//! values are the Bollinger warm-up rows, which are carried as `None`.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::bar::Bar;
use crate::domain::config::IndicatorConfig;

/// A bar enriched with every indicator value computed at that index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorFrame {
    pub bar: Bar,
    pub tick_volume: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    pub atr: f64,
    pub bb_mid: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
}

impl IndicatorFrame {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.bar.timestamp
    }

    pub fn close(&self) -> f64 {
        self.bar.close
    }
}

/// Compute all indicators for a bar series.
///
/// The indicators are independent of each other apart from MACD, which reuses
/// the two EMAs. Output has exactly `bars.len()` frames.
pub fn compute_all_indicators(bars: &[Bar], config: &IndicatorConfig) -> Vec<IndicatorFrame> {
    let close: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let ema_fast = ema::ema(&close, config.ema_fast);
    let ema_slow = ema::ema(&close, config.ema_slow);
    let rsi = rsi::rsi(&close, config.rsi_period);
    let macd = macd::macd(&close, config.ema_fast, config.ema_slow, config.macd_signal);
    let atr = atr::atr(bars, config.atr_period);
    let bands = bollinger::bollinger(&close, config.bb_period, config.bb_k);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| IndicatorFrame {
            bar: bar.clone(),
            tick_volume: bar.tick_volume(),
            ema_fast: ema_fast[i],
            ema_slow: ema_slow[i],
            rsi: rsi[i],
            macd: macd.line[i],
            macd_signal: macd.signal[i],
            macd_hist: macd.histogram[i],
            atr: atr[i],
            bb_mid: bands.middle[i],
            bb_upper: bands.upper[i],
            bb_lower: bands.lower[i],
        })
        .collect()
}
