//! Bollinger Bands.
//!
//! Middle: simple moving average over a trailing window of n closes.
//! Upper/Lower: middle ± k × population standard deviation (divides by N).
//! The first n-1 rows are undefined (`None`).

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub middle: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

pub fn bollinger(close: &[f64], period: usize, k: f64) -> BollingerBands {
    let n = close.len();
    let mut middle = Vec::with_capacity(n);
    let mut upper = Vec::with_capacity(n);
    let mut lower = Vec::with_capacity(n);

    for i in 0..n {
        if period == 0 || i + 1 < period {
            middle.push(None);
            upper.push(None);
            lower.push(None);
            continue;
        }

        let window = &close[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window
            .iter()
            .map(|c| {
                let diff = c - mean;
                diff * diff
            })
            .sum::<f64>()
            / period as f64;
        let stddev = variance.sqrt();

        middle.push(Some(mean));
        upper.push(Some(mean + k * stddev));
        lower.push(Some(mean - k * stddev));
    }

    BollingerBands {
        middle,
        upper,
        lower,
    }
}
