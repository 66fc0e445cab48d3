//! Typed run configuration.
//!
//! One `AppConfig` is built at process start (from an INI file through
//! [`crate::ports::config_port::ConfigPort`], or from [`AppConfig::default`])
//! and passed by reference to every component. Nothing mutates it afterwards.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    H1,
}

impl Timeframe {
    pub fn minutes(self) -> i64 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::H1 => 60,
        }
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "M1" => Ok(Timeframe::M1),
            "M5" => Ok(Timeframe::M5),
            "M15" => Ok(Timeframe::M15),
            "H1" => Ok(Timeframe::H1),
            other => Err(format!("unknown timeframe '{other}' (expected M1, M5, M15 or H1)")),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::H1 => "H1",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorConfig {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub rsi_period: usize,
    pub macd_signal: usize,
    pub atr_period: usize,
    pub bb_period: usize,
    pub bb_k: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            ema_fast: 12,
            ema_slow: 26,
            rsi_period: 14,
            macd_signal: 9,
            atr_period: 14,
            bb_period: 20,
            bb_k: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyConfig {
    pub rsi_long_min: f64,
    pub rsi_short_max: f64,
    pub macd_confirm: bool,
    pub min_atr_pct: f64,
    pub regime_threshold: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            rsi_long_min: 55.0,
            rsi_short_max: 45.0,
            macd_confirm: true,
            min_atr_pct: 0.0003,
            regime_threshold: 0.0001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskConfig {
    /// Starting capital; also the fixed denominator of the daily loss check.
    pub capital: f64,
    pub risk_per_trade: f64,
    pub atr_sl_mult: f64,
    pub atr_tp_mult: f64,
    pub daily_loss_limit: f64,
    pub max_trades_per_day: usize,
    pub max_position_units: u64,
    pub min_position_units: u64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            capital: 10_000.0,
            risk_per_trade: 0.0075,
            atr_sl_mult: 1.5,
            atr_tp_mult: 2.0,
            daily_loss_limit: 0.03,
            max_trades_per_day: 6,
            max_position_units: 100_000,
            min_position_units: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionConfig {
    pub simulate_spread: f64,
    pub simulate_slippage: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            simulate_spread: 0.00005,
            simulate_slippage: 0.00002,
        }
    }
}

pub const DEFAULT_SIMULATED_BARS: usize = 3000;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DataSource {
    Simulated { bars: usize, seed: u64 },
    Csv { path: String },
}

impl Default for DataSource {
    fn default() -> Self {
        DataSource::Simulated {
            bars: DEFAULT_SIMULATED_BARS,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppConfig {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub warmup_bars: usize,
    pub indicators: IndicatorConfig,
    pub strategy: StrategyConfig,
    pub risk: RiskConfig,
    pub execution: ExecutionConfig,
    pub data: DataSource,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            symbol: "EURUSD".to_string(),
            timeframe: Timeframe::M5,
            warmup_bars: 200,
            indicators: IndicatorConfig::default(),
            strategy: StrategyConfig::default(),
            risk: RiskConfig::default(),
            execution: ExecutionConfig::default(),
            data: DataSource::default(),
        }
    }
}
