//! RSI (Relative Strength Index).
//!
//! Wilder-style smoothing: separate recursive filters (alpha = 1/n) over
//! positive and negative closing-price changes, seeded with the first change.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss). When avg_loss is zero the
//! ratio is undefined and RSI is reported as the neutral 50. The first bar has
//! no change and is also 50.

pub const NEUTRAL_RSI: f64 = 50.0;

pub fn rsi(close: &[f64], period: usize) -> Vec<f64> {
    let mut values = Vec::with_capacity(close.len());
    if close.is_empty() {
        return values;
    }
    values.push(NEUTRAL_RSI);

    let alpha = 1.0 / period.max(1) as f64;
    let mut averages: Option<(f64, f64)> = None;

    for pair in close.windows(2) {
        let change = pair[1] - pair[0];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        let (avg_gain, avg_loss) = match averages {
            None => (gain, loss),
            Some((g, l)) => (
                gain * alpha + g * (1.0 - alpha),
                loss * alpha + l * (1.0 - alpha),
            ),
        };
        averages = Some((avg_gain, avg_loss));
        values.push(from_averages(avg_gain, avg_loss));
    }

    values
}

fn from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        NEUTRAL_RSI
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
