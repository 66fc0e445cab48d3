//! Open position state and closed trade records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::signal::Bracket;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Long,
    Short,
}

/// Simulator state. `Flat` corresponds to holding no `Position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PositionState {
    Flat,
    Long,
    Short,
}

impl From<Option<&Position>> for PositionState {
    fn from(position: Option<&Position>) -> Self {
        match position.map(|p| p.side) {
            None => PositionState::Flat,
            Some(Side::Long) => PositionState::Long,
            Some(Side::Short) => PositionState::Short,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub side: Side,
    pub units: u64,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub bracket: Bracket,
}

impl Position {
    /// The quote a closing order would fill at: bid for longs, ask for shorts.
    pub fn exit_quote(&self, bid: f64, ask: f64) -> f64 {
        match self.side {
            Side::Long => bid,
            Side::Short => ask,
        }
    }

    /// Checks the bracket against the closing quote. The stop is checked
    /// first, so a quote breaching both levels reports `StopLoss`.
    pub fn exit_reason(&self, bid: f64, ask: f64) -> Option<ExitReason> {
        let quote = self.exit_quote(bid, ask);
        let Bracket {
            stop_loss,
            take_profit,
        } = self.bracket;
        let (stopped, took_profit) = match self.side {
            Side::Long => (quote <= stop_loss, quote >= take_profit),
            Side::Short => (quote >= stop_loss, quote <= take_profit),
        };
        if stopped {
            Some(ExitReason::StopLoss)
        } else if took_profit {
            Some(ExitReason::TakeProfit)
        } else {
            None
        }
    }

    pub fn realized_pnl(&self, exit_price: f64) -> f64 {
        let units = self.units as f64;
        match self.side {
            Side::Long => (exit_price - self.entry_price) * units,
            Side::Short => (self.entry_price - exit_price) * units,
        }
    }

    pub fn close(
        self,
        exit_time: DateTime<Utc>,
        exit_price: f64,
        exit_reason: ExitReason,
    ) -> TradeRecord {
        TradeRecord {
            side: self.side,
            units: self.units,
            entry_time: self.entry_time,
            exit_time,
            entry_price: self.entry_price,
            exit_price,
            pnl: self.realized_pnl(exit_price),
            exit_reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub side: Side,
    pub units: u64,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl: f64,
    pub exit_reason: ExitReason,
}
