//! fxbracket: single-instrument FX signal research and bracket backtesting.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. The pipeline is
//! bars → indicators → signals → risk-gated simulation → metrics.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod logging;
pub mod ports;
