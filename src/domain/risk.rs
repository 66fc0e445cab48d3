//! Risk manager: position sizing and daily trading limits.

use super::config::RiskConfig;
use super::position::TradeRecord;

/// Smallest stop distance used for sizing, so a zero ATR cannot divide by zero.
pub const MIN_STOP_DISTANCE: f64 = 1e-6;

/// Units to trade so that a stop-out loses `equity * risk_per_trade`.
///
/// `units = floor(equity * risk_per_trade / max(eps, atr_sl_mult * atr))`,
/// clamped to `[min_position_units, max_position_units]`; the minimum wins if
/// the bounds are inverted. `_price` is part of the sizing interface but does
/// not affect the result.
pub fn position_size(equity: f64, _price: f64, atr: f64, risk: &RiskConfig) -> u64 {
    let risk_amount = equity * risk.risk_per_trade;
    let stop_distance = (risk.atr_sl_mult * atr).max(MIN_STOP_DISTANCE);
    let raw = (risk_amount / stop_distance).floor();

    // NaN and negative sizes fall to the minimum; `as` saturates large values.
    let units = if raw.is_nan() || raw < 0.0 { 0 } else { raw as u64 };
    units
        .min(risk.max_position_units)
        .max(risk.min_position_units)
}

/// Returns `true` when new entries must be blocked.
///
/// Only trades that exited on the same UTC calendar date as the most recent
/// trade are considered. Blocks when that day already has
/// `max_trades_per_day` trades, or when the day's realized PnL relative to
/// `reference_equity` is at or below `-daily_loss_limit`.
pub fn enforce_daily_limits(trades: &[TradeRecord], reference_equity: f64, risk: &RiskConfig) -> bool {
    let Some(last) = trades.last() else {
        return false;
    };
    let day = last.exit_time.date_naive();

    let (count, pnl) = trades
        .iter()
        .rev()
        .take_while(|t| t.exit_time.date_naive() == day)
        .fold((0usize, 0.0f64), |(n, sum), t| (n + 1, sum + t.pnl));

    if count >= risk.max_trades_per_day {
        return true;
    }
    pnl / reference_equity <= -risk.daily_loss_limit
}
