//! True range and Average True Range.
//!
//! ATR is the span-style recursive EMA (alpha = 2/(n+1)) of the true range,
//! seeded with the first bar's high - low.

use super::ema::ema;
use crate::domain::bar::Bar;

pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let prev_close = if i == 0 { None } else { Some(bars[i - 1].close) };
            bar.true_range(prev_close)
        })
        .collect()
}

pub fn atr(bars: &[Bar], period: usize) -> Vec<f64> {
    ema(&true_range(bars), period)
}
