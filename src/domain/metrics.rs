//! Performance metrics over an equity curve and a trade log.

use serde::Serialize;

use super::backtest::EquityPoint;
use super::position::TradeRecord;

const PERIODS_PER_YEAR: f64 = 252.0;
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    /// Total growth `last / first - 1`. Not annualised.
    pub cagr: f64,
    pub sharpe: f64,
    /// NaN when no period return is negative.
    pub sortino: f64,
    /// Worst `equity / running_max - 1`; zero or negative.
    pub max_drawdown: f64,
    /// Number of return observations.
    pub bars: usize,
    pub last_equity: f64,
}

impl Metrics {
    pub fn compute(equity_curve: &[EquityPoint]) -> Self {
        let (Some(first), Some(last)) = (equity_curve.first(), equity_curve.last()) else {
            return Metrics {
                cagr: 0.0,
                sharpe: 0.0,
                sortino: 0.0,
                max_drawdown: 0.0,
                bars: 0,
                last_equity: 0.0,
            };
        };

        let cagr = if first.equity != 0.0 {
            last.equity / first.equity - 1.0
        } else {
            0.0
        };

        let returns = period_returns(equity_curve);
        let mean = mean(&returns);
        let annualiser = PERIODS_PER_YEAR.sqrt();

        let sharpe = mean / (population_std(&returns) + EPSILON) * annualiser;

        let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        // undefined without a single negative return
        let sortino = if downside.is_empty() {
            f64::NAN
        } else {
            mean / (population_std(&downside) + EPSILON) * annualiser
        };

        Metrics {
            cagr,
            sharpe,
            sortino,
            max_drawdown: compute_max_drawdown(equity_curve),
            bars: returns.len(),
            last_equity: last.equity,
        }
    }
}

/// Percent change between consecutive points; the first return is 0.
fn period_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(equity_curve.len());
    if equity_curve.is_empty() {
        return returns;
    }
    returns.push(0.0);
    returns.extend(equity_curve.windows(2).map(|w| {
        let prev = w[0].equity;
        if prev != 0.0 {
            w[1].equity / prev - 1.0
        } else {
            0.0
        }
    }));
    returns
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation dividing by N. Empty input gives 0.
fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn compute_max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;

    for point in equity_curve {
        peak = peak.max(point.equity);
        if peak > 0.0 {
            worst = worst.min(point.equity / peak - 1.0);
        }
    }

    worst
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeStats {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    /// Gross profit over gross loss; infinite when there are wins but no losses.
    pub profit_factor: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
}

impl TradeStats {
    pub fn compute(trades: &[TradeRecord]) -> Self {
        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for trade in trades {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                wins += 1;
                gross_profit += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                losses += 1;
                gross_loss += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            }
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            wins as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        TradeStats {
            total_trades,
            wins,
            losses,
            win_rate,
            profit_factor,
            largest_win,
            largest_loss,
        }
    }
}
