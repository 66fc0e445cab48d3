//! Exponential Moving Average.
//!
//! alpha = 2/(n+1), seeded with the first value, then
//! EMA[i] = x[i]*alpha + EMA[i-1]*(1-alpha). No warm-up rows are dropped.

/// Recursive exponential filter with an explicit smoothing factor.
pub fn ewm(series: &[f64], alpha: f64) -> Vec<f64> {
    let mut values = Vec::with_capacity(series.len());
    let mut prev: Option<f64> = None;

    for &x in series {
        let next = match prev {
            None => x,
            Some(p) => x * alpha + p * (1.0 - alpha),
        };
        values.push(next);
        prev = Some(next);
    }

    values
}

/// Span-based smoothing factor, 2/(period+1).
pub fn span_alpha(period: usize) -> f64 {
    2.0 / (period.max(1) as f64 + 1.0)
}

pub fn ema(series: &[f64], period: usize) -> Vec<f64> {
    ewm(series, span_alpha(period))
}
