//! Configuration loading and validation.
//!
//! Builds a typed [`AppConfig`] from a [`ConfigPort`]. Keys of the
//! `indicators`, `strategy`, `risk` and `execution` groups are required; a
//! missing one is reported immediately instead of being defaulted. `general`
//! and `data` keys fall back to the built-in defaults.

use crate::domain::config::{
    AppConfig, DEFAULT_SEED, DEFAULT_SIMULATED_BARS, DataSource, ExecutionConfig,
    IndicatorConfig, RiskConfig, StrategyConfig, Timeframe,
};
use crate::domain::error::FxError;
use crate::ports::config_port::ConfigPort;

pub fn build_app_config(config: &dyn ConfigPort) -> Result<AppConfig, FxError> {
    let defaults = AppConfig::default();

    let symbol = config
        .get_string("general", "symbol")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or(defaults.symbol);

    let timeframe = match config.get_string("general", "timeframe") {
        Some(s) => s
            .parse::<Timeframe>()
            .map_err(|reason| FxError::invalid("general", "timeframe", reason))?,
        None => defaults.timeframe,
    };

    let warmup_bars = match config.get_string("general", "warmup_bars") {
        Some(s) => parse_usize("general", "warmup_bars", &s)?,
        None => defaults.warmup_bars,
    };

    let app = AppConfig {
        symbol,
        timeframe,
        warmup_bars,
        indicators: build_indicator_config(config)?,
        strategy: build_strategy_config(config)?,
        risk: build_risk_config(config)?,
        execution: build_execution_config(config)?,
        data: build_data_source(config)?,
    };

    validate_app_config(&app)?;
    Ok(app)
}

pub fn build_indicator_config(config: &dyn ConfigPort) -> Result<IndicatorConfig, FxError> {
    const S: &str = "indicators";
    Ok(IndicatorConfig {
        ema_fast: require_usize(config, S, "ema_fast")?,
        ema_slow: require_usize(config, S, "ema_slow")?,
        rsi_period: require_usize(config, S, "rsi_period")?,
        macd_signal: require_usize(config, S, "macd_signal")?,
        atr_period: require_usize(config, S, "atr_period")?,
        bb_period: require_usize(config, S, "bb_period")?,
        bb_k: require_f64(config, S, "bb_k")?,
    })
}

pub fn build_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, FxError> {
    const S: &str = "strategy";
    Ok(StrategyConfig {
        rsi_long_min: require_f64(config, S, "rsi_long_min")?,
        rsi_short_max: require_f64(config, S, "rsi_short_max")?,
        macd_confirm: require_bool(config, S, "macd_confirm")?,
        min_atr_pct: require_f64(config, S, "min_atr_pct")?,
        regime_threshold: require_f64(config, S, "regime_threshold")?,
    })
}

pub fn build_risk_config(config: &dyn ConfigPort) -> Result<RiskConfig, FxError> {
    const S: &str = "risk";
    Ok(RiskConfig {
        capital: require_f64(config, S, "capital")?,
        risk_per_trade: require_f64(config, S, "risk_per_trade")?,
        atr_sl_mult: require_f64(config, S, "atr_sl_mult")?,
        atr_tp_mult: require_f64(config, S, "atr_tp_mult")?,
        daily_loss_limit: require_f64(config, S, "daily_loss_limit")?,
        max_trades_per_day: require_usize(config, S, "max_trades_per_day")?,
        max_position_units: require_usize(config, S, "max_position_units")? as u64,
        min_position_units: require_usize(config, S, "min_position_units")? as u64,
    })
}

pub fn build_execution_config(config: &dyn ConfigPort) -> Result<ExecutionConfig, FxError> {
    const S: &str = "execution";
    Ok(ExecutionConfig {
        simulate_spread: require_f64(config, S, "simulate_spread")?,
        simulate_slippage: require_f64(config, S, "simulate_slippage")?,
    })
}

fn build_data_source(config: &dyn ConfigPort) -> Result<DataSource, FxError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "simulated".to_string());

    match source.trim().to_lowercase().as_str() {
        "simulated" => {
            let bars = match config.get_string("data", "bars") {
                Some(s) => parse_usize("data", "bars", &s)?,
                None => DEFAULT_SIMULATED_BARS,
            };
            let seed = match config.get_string("data", "seed") {
                Some(s) => s
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| FxError::invalid("data", "seed", "expected an unsigned integer"))?,
                None => DEFAULT_SEED,
            };
            Ok(DataSource::Simulated { bars, seed })
        }
        "csv" => {
            let path = config
                .get_string("data", "csv_path")
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| FxError::missing("data", "csv_path"))?;
            Ok(DataSource::Csv { path })
        }
        other => Err(FxError::invalid(
            "data",
            "source",
            format!("unknown data source '{other}' (expected simulated or csv)"),
        )),
    }
}

/// Range checks over an already-typed configuration.
pub fn validate_app_config(config: &AppConfig) -> Result<(), FxError> {
    validate_indicators(&config.indicators)?;
    validate_strategy(&config.strategy)?;
    validate_risk(&config.risk)?;
    validate_execution(&config.execution)?;
    if let DataSource::Simulated { bars, .. } = config.data {
        if bars == 0 {
            return Err(FxError::invalid("data", "bars", "bars must be positive"));
        }
    }
    Ok(())
}

fn validate_indicators(c: &IndicatorConfig) -> Result<(), FxError> {
    const S: &str = "indicators";
    let periods = [
        ("ema_fast", c.ema_fast),
        ("ema_slow", c.ema_slow),
        ("rsi_period", c.rsi_period),
        ("macd_signal", c.macd_signal),
        ("atr_period", c.atr_period),
        ("bb_period", c.bb_period),
    ];
    for (key, value) in periods {
        if value == 0 {
            return Err(FxError::invalid(S, key, format!("{key} must be positive")));
        }
    }
    if c.ema_fast >= c.ema_slow {
        return Err(FxError::invalid(
            S,
            "ema_fast",
            "ema_fast must be shorter than ema_slow",
        ));
    }
    if c.bb_k <= 0.0 {
        return Err(FxError::invalid(S, "bb_k", "bb_k must be positive"));
    }
    Ok(())
}

fn validate_strategy(c: &StrategyConfig) -> Result<(), FxError> {
    const S: &str = "strategy";
    for (key, value) in [("rsi_long_min", c.rsi_long_min), ("rsi_short_max", c.rsi_short_max)] {
        if !(0.0..=100.0).contains(&value) {
            return Err(FxError::invalid(S, key, format!("{key} must be between 0 and 100")));
        }
    }
    for (key, value) in [
        ("min_atr_pct", c.min_atr_pct),
        ("regime_threshold", c.regime_threshold),
    ] {
        if value < 0.0 {
            return Err(FxError::invalid(S, key, format!("{key} must be non-negative")));
        }
    }
    Ok(())
}

fn validate_risk(c: &RiskConfig) -> Result<(), FxError> {
    const S: &str = "risk";
    if c.capital <= 0.0 {
        return Err(FxError::invalid(S, "capital", "capital must be positive"));
    }
    if c.risk_per_trade <= 0.0 || c.risk_per_trade > 1.0 {
        return Err(FxError::invalid(
            S,
            "risk_per_trade",
            "risk_per_trade must be in (0, 1]",
        ));
    }
    for (key, value) in [("atr_sl_mult", c.atr_sl_mult), ("atr_tp_mult", c.atr_tp_mult)] {
        if value <= 0.0 {
            return Err(FxError::invalid(S, key, format!("{key} must be positive")));
        }
    }
    if c.daily_loss_limit <= 0.0 || c.daily_loss_limit > 1.0 {
        return Err(FxError::invalid(
            S,
            "daily_loss_limit",
            "daily_loss_limit must be in (0, 1]",
        ));
    }
    if c.max_trades_per_day < 1 {
        return Err(FxError::invalid(
            S,
            "max_trades_per_day",
            "max_trades_per_day must be at least 1",
        ));
    }
    if c.min_position_units < 1 {
        return Err(FxError::invalid(
            S,
            "min_position_units",
            "min_position_units must be at least 1",
        ));
    }
    if c.min_position_units > c.max_position_units {
        return Err(FxError::invalid(
            S,
            "min_position_units",
            "min_position_units must not exceed max_position_units",
        ));
    }
    Ok(())
}

fn validate_execution(c: &ExecutionConfig) -> Result<(), FxError> {
    const S: &str = "execution";
    for (key, value) in [
        ("simulate_spread", c.simulate_spread),
        ("simulate_slippage", c.simulate_slippage),
    ] {
        if value < 0.0 {
            return Err(FxError::invalid(S, key, format!("{key} must be non-negative")));
        }
    }
    Ok(())
}

fn require_raw(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, FxError> {
    config
        .get_string(section, key)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| FxError::missing(section, key))
}

fn require_f64(config: &dyn ConfigPort, section: &str, key: &str) -> Result<f64, FxError> {
    let raw = require_raw(config, section, key)?;
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| FxError::invalid(section, key, format!("expected a number, got '{raw}'")))?;
    if !value.is_finite() {
        return Err(FxError::invalid(section, key, "value must be finite"));
    }
    Ok(value)
}

fn require_usize(config: &dyn ConfigPort, section: &str, key: &str) -> Result<usize, FxError> {
    let raw = require_raw(config, section, key)?;
    parse_usize(section, key, &raw)
}

fn require_bool(config: &dyn ConfigPort, section: &str, key: &str) -> Result<bool, FxError> {
    let raw = require_raw(config, section, key)?;
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(FxError::invalid(
            section,
            key,
            format!("expected a boolean, got '{raw}'"),
        )),
    }
}

fn parse_usize(section: &str, key: &str, raw: &str) -> Result<usize, FxError> {
    raw.trim().parse::<usize>().map_err(|_| {
        FxError::invalid(
            section,
            key,
            format!("expected a non-negative integer, got '{raw}'"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const VALID_INI: &str = r#"
[general]
symbol = GBPUSD
timeframe = M15
warmup_bars = 50

[indicators]
ema_fast = 12
ema_slow = 26
rsi_period = 14
macd_signal = 9
atr_period = 14
bb_period = 20
bb_k = 2.0

[strategy]
rsi_long_min = 55
rsi_short_max = 45
macd_confirm = true
min_atr_pct = 0.0003
regime_threshold = 0.0001

[risk]
capital = 10000
risk_per_trade = 0.0075
atr_sl_mult = 1.5
atr_tp_mult = 2.0
daily_loss_limit = 0.03
max_trades_per_day = 6
max_position_units = 100000
min_position_units = 1000

[execution]
simulate_spread = 0.00005
simulate_slippage = 0.00002
"#;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn without_line(key: &str) -> String {
        VALID_INI
            .lines()
            .filter(|l| !l.trim_start().starts_with(&format!("{key} ")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn with_value(key: &str, value: &str) -> String {
        VALID_INI
            .lines()
            .map(|l| {
                if l.trim_start().starts_with(&format!("{key} ")) {
                    format!("{key} = {value}")
                } else {
                    l.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn valid_config_builds() {
        let app = build_app_config(&make_config(VALID_INI)).unwrap();
        assert_eq!(app.symbol, "GBPUSD");
        assert_eq!(app.timeframe, Timeframe::M15);
        assert_eq!(app.warmup_bars, 50);
        assert_eq!(app.indicators, IndicatorConfig::default());
        assert_eq!(app.strategy, StrategyConfig::default());
        assert_eq!(app.risk, RiskConfig::default());
        assert_eq!(app.execution, ExecutionConfig::default());
        assert_eq!(app.data, DataSource::default());
    }

    #[test]
    fn general_section_is_optional() {
        let ini = VALID_INI.replace("[general]\nsymbol = GBPUSD\ntimeframe = M15\nwarmup_bars = 50\n", "");
        let app = build_app_config(&make_config(&ini)).unwrap();
        assert_eq!(app.symbol, "EURUSD");
        assert_eq!(app.timeframe, Timeframe::M5);
        assert_eq!(app.warmup_bars, 200);
    }

    #[test]
    fn missing_required_key_is_fatal() {
        for key in ["ema_slow", "macd_confirm", "capital", "simulate_spread"] {
            let err = build_app_config(&make_config(&without_line(key))).unwrap_err();
            assert!(
                matches!(&err, FxError::ConfigMissing { key: k, .. } if k == key),
                "expected missing {key}, got {err}"
            );
        }
    }

    #[test]
    fn non_numeric_value_is_invalid() {
        let err = build_app_config(&make_config(&with_value("atr_period", "abc"))).unwrap_err();
        assert!(matches!(err, FxError::ConfigInvalid { key, .. } if key == "atr_period"));
    }

    #[test]
    fn bad_bool_is_invalid() {
        let err = build_app_config(&make_config(&with_value("macd_confirm", "maybe"))).unwrap_err();
        assert!(matches!(err, FxError::ConfigInvalid { key, .. } if key == "macd_confirm"));
    }

    #[test]
    fn macd_confirm_accepts_no() {
        let app = build_app_config(&make_config(&with_value("macd_confirm", "no"))).unwrap();
        assert!(!app.strategy.macd_confirm);
    }

    #[test]
    fn zero_period_fails() {
        let err = build_app_config(&make_config(&with_value("rsi_period", "0"))).unwrap_err();
        assert!(matches!(err, FxError::ConfigInvalid { key, .. } if key == "rsi_period"));
    }

    #[test]
    fn fast_not_shorter_than_slow_fails() {
        let err = build_app_config(&make_config(&with_value("ema_fast", "30"))).unwrap_err();
        assert!(matches!(err, FxError::ConfigInvalid { key, .. } if key == "ema_fast"));
    }

    #[test]
    fn rsi_threshold_out_of_range_fails() {
        let err = build_app_config(&make_config(&with_value("rsi_long_min", "120"))).unwrap_err();
        assert!(matches!(err, FxError::ConfigInvalid { key, .. } if key == "rsi_long_min"));
    }

    #[test]
    fn risk_per_trade_above_one_fails() {
        let err = build_app_config(&make_config(&with_value("risk_per_trade", "1.5"))).unwrap_err();
        assert!(matches!(err, FxError::ConfigInvalid { key, .. } if key == "risk_per_trade"));
    }

    #[test]
    fn capital_zero_fails() {
        let err = build_app_config(&make_config(&with_value("capital", "0"))).unwrap_err();
        assert!(matches!(err, FxError::ConfigInvalid { key, .. } if key == "capital"));
    }

    #[test]
    fn min_units_above_max_fails() {
        let err =
            build_app_config(&make_config(&with_value("min_position_units", "200000"))).unwrap_err();
        assert!(matches!(err, FxError::ConfigInvalid { key, .. } if key == "min_position_units"));
    }

    #[test]
    fn negative_spread_fails() {
        let err =
            build_app_config(&make_config(&with_value("simulate_spread", "-0.1"))).unwrap_err();
        assert!(matches!(err, FxError::ConfigInvalid { key, .. } if key == "simulate_spread"));
    }

    #[test]
    fn csv_source_requires_path() {
        let ini = format!("{VALID_INI}\n[data]\nsource = csv\n");
        let err = build_app_config(&make_config(&ini)).unwrap_err();
        assert!(matches!(err, FxError::ConfigMissing { key, .. } if key == "csv_path"));
    }

    #[test]
    fn csv_source_with_path() {
        let ini = format!("{VALID_INI}\n[data]\nsource = csv\ncsv_path = ./data/eurusd.csv\n");
        let app = build_app_config(&make_config(&ini)).unwrap();
        assert_eq!(
            app.data,
            DataSource::Csv {
                path: "./data/eurusd.csv".into()
            }
        );
    }

    #[test]
    fn simulated_source_overrides() {
        let ini = format!("{VALID_INI}\n[data]\nsource = simulated\nbars = 500\nseed = 7\n");
        let app = build_app_config(&make_config(&ini)).unwrap();
        assert_eq!(app.data, DataSource::Simulated { bars: 500, seed: 7 });
    }

    #[test]
    fn unknown_source_fails() {
        let ini = format!("{VALID_INI}\n[data]\nsource = ib\n");
        let err = build_app_config(&make_config(&ini)).unwrap_err();
        assert!(matches!(err, FxError::ConfigInvalid { key, .. } if key == "source"));
    }

    #[test]
    fn bad_timeframe_fails() {
        let err = build_app_config(&make_config(&with_value("timeframe", "D1"))).unwrap_err();
        assert!(matches!(err, FxError::ConfigInvalid { key, .. } if key == "timeframe"));
    }

    #[test]
    fn defaults_validate() {
        assert!(validate_app_config(&AppConfig::default()).is_ok());
    }
}
