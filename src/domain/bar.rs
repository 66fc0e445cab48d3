//! OHLCV bar representation and series preparation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::FxError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

impl Bar {
    /// max(high - low, |high - prev_close|, |low - prev_close|), or
    /// high - low when there is no previous close.
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        let hl = self.high - self.low;
        match prev_close {
            Some(pc) => {
                let hc = (self.high - pc).abs();
                let lc = (self.low - pc).abs();
                hl.max(hc).max(lc)
            }
            None => hl,
        }
    }

    /// Volume when the source supplied one, otherwise 1.0.
    pub fn tick_volume(&self) -> f64 {
        self.volume.unwrap_or(1.0)
    }
}

/// Deduplicate by timestamp keeping the last occurrence, then sort ascending.
pub fn normalize_bars(bars: Vec<Bar>) -> Vec<Bar> {
    let mut indexed: Vec<(usize, Bar)> = bars.into_iter().enumerate().collect();
    // Stable sort by (timestamp, original position) so the last duplicate ends
    // up at the end of each run.
    indexed.sort_by(|a, b| a.1.timestamp.cmp(&b.1.timestamp).then(a.0.cmp(&b.0)));

    let mut out: Vec<Bar> = Vec::with_capacity(indexed.len());
    for (_, bar) in indexed {
        match out.last_mut() {
            Some(last) if last.timestamp == bar.timestamp => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}

/// Reject non-finite prices and out-of-order timestamps.
pub fn validate_bars(bars: &[Bar]) -> Result<(), FxError> {
    for (i, bar) in bars.iter().enumerate() {
        let fields = [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(FxError::InvalidBar {
                    timestamp: bar.timestamp,
                    reason: format!("{name} is not finite ({value})"),
                });
            }
        }
        if let Some(v) = bar.volume {
            if !v.is_finite() {
                return Err(FxError::InvalidBar {
                    timestamp: bar.timestamp,
                    reason: format!("volume is not finite ({v})"),
                });
            }
        }
        if i > 0 && bars[i - 1].timestamp >= bar.timestamp {
            return Err(FxError::InvalidBar {
                timestamp: bar.timestamp,
                reason: "timestamps must be strictly increasing".into(),
            });
        }
    }
    Ok(())
}
