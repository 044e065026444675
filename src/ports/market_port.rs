//! Market and account access port trait.

use crate::domain::account::AccountState;
use crate::domain::error::TurtleError;
use crate::domain::frequency::Frequency;
use crate::domain::ohlcv::Bar;

/// Read side of the host: price history, the live price and balances.
pub trait MarketPort {
    /// Up to `count` most recent bars, oldest first. The last bar is the one
    /// still in progress. May return fewer bars when history is short.
    fn get_bars(
        &self,
        instrument: &str,
        count: usize,
        frequency: Frequency,
    ) -> Result<Vec<Bar>, TurtleError>;

    fn get_current_price(&self, instrument: &str) -> Result<f64, TurtleError>;

    fn get_account_state(&self) -> Result<AccountState, TurtleError>;
}
