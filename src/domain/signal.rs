//! Signal generation: entry rules and bracket levels per indicator frame.
//!
//! Each bar is evaluated using only its own indicator values and the previous
//! bar's EMAs, so the output at index `t` never depends on data after `t`.

use serde::Serialize;

use super::config::{RiskConfig, StrategyConfig};
use super::indicator::IndicatorFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Signal {
    Short = -1,
    Flat = 0,
    Long = 1,
}

impl Signal {
    pub fn as_i8(self) -> i8 {
        self as i8
    }
}

/// Stop-loss and take-profit levels attached to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bracket {
    pub stop_loss: f64,
    pub take_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRecord {
    pub frame: IndicatorFrame,
    pub signal: Signal,
    pub score: f64,
    /// Present exactly when `signal` is not `Flat`.
    pub bracket: Option<Bracket>,
}

/// `a` crosses above `b`: `a[t] > b[t]` and `a[t-1] <= b[t-1]`.
/// Index 0 is always `false`.
pub fn cross_up(a: &[f64], b: &[f64]) -> Vec<bool> {
    crossings(a, b, |cur, prev| cur > 0.0 && prev <= 0.0)
}

/// `a` crosses below `b`: `a[t] < b[t]` and `a[t-1] >= b[t-1]`.
/// Index 0 is always `false`.
pub fn cross_down(a: &[f64], b: &[f64]) -> Vec<bool> {
    crossings(a, b, |cur, prev| cur < 0.0 && prev >= 0.0)
}

fn crossings(a: &[f64], b: &[f64], hit: impl Fn(f64, f64) -> bool) -> Vec<bool> {
    let n = a.len().min(b.len());
    let mut out = Vec::with_capacity(n);
    for t in 0..n {
        if t == 0 {
            out.push(false);
            continue;
        }
        out.push(hit(a[t] - b[t], a[t - 1] - b[t - 1]));
    }
    out
}

/// Trend strength filter: `|ema_fast - ema_slow| / |close| >= threshold`.
pub fn regime_trending(frame: &IndicatorFrame, threshold: f64) -> bool {
    (frame.ema_fast - frame.ema_slow).abs() / frame.close().abs() >= threshold
}

/// Volatility filter: `atr / |close| >= min_atr_pct`.
pub fn volatility_ok(frame: &IndicatorFrame, min_atr_pct: f64) -> bool {
    frame.atr / frame.close().abs() >= min_atr_pct
}

/// Combine the two directional entry conditions. A short trigger wins when
/// both fire on the same bar.
pub fn resolve_signal(long: bool, short: bool) -> Signal {
    if short {
        Signal::Short
    } else if long {
        Signal::Long
    } else {
        Signal::Flat
    }
}

/// Bracket for an entry at `close` with the given `atr`.
pub fn bracket_for(signal: Signal, close: f64, atr: f64, risk: &RiskConfig) -> Option<Bracket> {
    let sl = risk.atr_sl_mult * atr;
    let tp = risk.atr_tp_mult * atr;
    match signal {
        Signal::Long => Some(Bracket {
            stop_loss: close - sl,
            take_profit: close + tp,
        }),
        Signal::Short => Some(Bracket {
            stop_loss: close + sl,
            take_profit: close - tp,
        }),
        Signal::Flat => None,
    }
}

/// The five sub-conditions for one direction on one bar.
#[derive(Debug, Clone, Copy)]
struct Conditions {
    cross: bool,
    rsi: bool,
    macd: bool,
    volatility: bool,
    regime: bool,
}

impl Conditions {
    fn all(&self) -> bool {
        self.cross && self.rsi && self.macd && self.volatility && self.regime
    }

    fn score(&self) -> f64 {
        let hits = [self.cross, self.rsi, self.macd, self.volatility, self.regime]
            .iter()
            .filter(|c| **c)
            .count();
        (hits as f64 / 5.0).clamp(0.0, 1.0)
    }
}

pub fn generate_signals(
    frames: &[IndicatorFrame],
    strategy: &StrategyConfig,
    risk: &RiskConfig,
) -> Vec<SignalRecord> {
    let fast: Vec<f64> = frames.iter().map(|f| f.ema_fast).collect();
    let slow: Vec<f64> = frames.iter().map(|f| f.ema_slow).collect();
    let long_cross = cross_up(&fast, &slow);
    let short_cross = cross_down(&fast, &slow);

    frames
        .iter()
        .enumerate()
        .map(|(t, frame)| {
            let volatility = volatility_ok(frame, strategy.min_atr_pct);
            let regime = regime_trending(frame, strategy.regime_threshold);

            let long = Conditions {
                cross: long_cross[t],
                rsi: frame.rsi >= strategy.rsi_long_min,
                macd: !strategy.macd_confirm || frame.macd >= frame.macd_signal,
                volatility,
                regime,
            };
            let short = Conditions {
                cross: short_cross[t],
                rsi: frame.rsi <= strategy.rsi_short_max,
                macd: !strategy.macd_confirm || frame.macd <= frame.macd_signal,
                volatility,
                regime,
            };

            let signal = resolve_signal(long.all(), short.all());
            let score = match signal {
                Signal::Long => long.score(),
                Signal::Short => short.score(),
                Signal::Flat => 0.0,
            };

            SignalRecord {
                frame: frame.clone(),
                signal,
                score,
                bracket: bracket_for(signal, frame.close(), frame.atr, risk),
            }
        })
        .collect()
}
