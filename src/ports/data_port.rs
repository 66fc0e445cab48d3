//! Bar source port trait.

use crate::domain::bar::Bar;
use crate::domain::error::FxError;

/// A source of bars for a single instrument and timeframe.
///
/// Implementations return a sequence that is already deduplicated, sorted
/// ascending and normalised to UTC, or fail outright.
pub trait DataPort {
    fn fetch_bars(&self) -> Result<Vec<Bar>, FxError>;

    /// Short description for log lines.
    fn describe(&self) -> String;
}
