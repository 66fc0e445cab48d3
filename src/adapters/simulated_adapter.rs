//! Seeded random-walk bar generator.
//!
//! Produces a reproducible synthetic EURUSD-like series: per-bar volatility is
//! drawn from LogNormal(-5, 0.25), closes follow a cumulative Normal walk from
//! 1.08 clipped to [1.01, 1.20], and highs/lows extend the open/close body by
//! a half-volatility Normal wick.

use crate::domain::bar::Bar;
use crate::domain::config::Timeframe;
use crate::domain::error::FxError;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::distributions::Distribution;
use rand::{Rng, SeedableRng};
use statrs::distribution::{LogNormal, Normal};

const START_PRICE: f64 = 1.08;
const PRICE_FLOOR: f64 = 1.01;
const PRICE_CAP: f64 = 1.20;

pub struct SimulatedAdapter {
    bars: usize,
    timeframe: Timeframe,
    seed: u64,
}

impl SimulatedAdapter {
    pub fn new(bars: usize, timeframe: Timeframe, seed: u64) -> Self {
        Self {
            bars,
            timeframe,
            seed,
        }
    }

    fn start() -> Result<DateTime<Utc>, FxError> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| FxError::DataSource {
                reason: "invalid simulation start time".into(),
            })
    }
}

fn distr_err(e: impl std::fmt::Display) -> FxError {
    FxError::DataSource {
        reason: format!("simulation distribution error: {e}"),
    }
}

/// Absolute Normal(0, sd) draw.
fn wick(rng: &mut StdRng, sd: f64) -> Result<f64, FxError> {
    Ok(Normal::new(0.0, sd).map_err(distr_err)?.sample(rng).abs())
}

impl DataPort for SimulatedAdapter {
    fn fetch_bars(&self) -> Result<Vec<Bar>, FxError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let step = Duration::minutes(self.timeframe.minutes());
        let start = Self::start()?;
        let vol_dist = LogNormal::new(-5.0, 0.25).map_err(distr_err)?;

        let vols: Vec<f64> = (0..self.bars).map(|_| vol_dist.sample(&mut rng)).collect();

        let mut closes = Vec::with_capacity(self.bars);
        let mut walk = START_PRICE;
        for &vol in &vols {
            walk += Normal::new(0.0, vol).map_err(distr_err)?.sample(&mut rng);
            closes.push(walk.clamp(PRICE_FLOOR, PRICE_CAP));
        }

        let mut bars = Vec::with_capacity(self.bars);
        for (i, (&close, &vol)) in closes.iter().zip(&vols).enumerate() {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + wick(&mut rng, vol / 2.0)?;
            let low = open.min(close) - wick(&mut rng, vol / 2.0)?;
            let volume = rng.gen_range(50u32..500) as f64;

            bars.push(Bar {
                timestamp: start + step * i as i32,
                open,
                high,
                low,
                close,
                volume: Some(volume),
            });
        }

        Ok(bars)
    }

    fn describe(&self) -> String {
        format!(
            "simulated:{} {} bars seed={}",
            self.timeframe, self.bars, self.seed
        )
    }
}
