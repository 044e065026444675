//! Signal inputs for the position manager.
//!
//! - [`atr::VolatilityEstimator`]: rolling average true range
//! - [`channel::BreakoutDetector`]: rolling high/low channel and breakout classification

pub mod atr;
pub mod channel;

pub use atr::VolatilityEstimator;
pub use channel::{Breakout, BreakoutDetector, ChannelKind, ChannelState};
