//! Historical bar storage port trait.

use crate::domain::error::TurtleError;
use crate::domain::frequency::Frequency;
use crate::domain::ohlcv::Bar;

pub trait DataPort {
    /// Full stored history for one instrument, oldest first.
    fn fetch_bars(&self, instrument: &str, frequency: Frequency) -> Result<Vec<Bar>, TurtleError>;

    fn list_instruments(&self, frequency: Frequency) -> Result<Vec<String>, TurtleError>;
}
