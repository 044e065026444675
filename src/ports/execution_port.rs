//! Order execution port trait.

use crate::domain::error::TurtleError;

/// Write side of the host. Submission is fire-and-forget: the effect of an
/// order shows up in the balances read on the next bar.
pub trait ExecutionPort {
    fn submit_market_buy(&mut self, instrument: &str, cash_amount: f64) -> Result<(), TurtleError>;

    fn submit_market_sell(&mut self, instrument: &str, quantity: f64) -> Result<(), TurtleError>;
}
