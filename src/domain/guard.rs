//! Account-level equity guard.
//!
//! Compares net account value against the value seen on the first checked bar.
//! A crossed bound is reported by [`EquityGuard::check`]; the owner latches it
//! with [`EquityGuard::latch`] once the liquidation has gone through.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuardTrip {
    StopLoss { net_value: f64, floor: f64 },
    TakeProfit { net_value: f64, ceiling: f64 },
}

impl fmt::Display for GuardTrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardTrip::StopLoss { net_value, floor } => {
                write!(f, "net value {:.2} fell below stop line {:.2}", net_value, floor)
            }
            GuardTrip::TakeProfit { net_value, ceiling } => {
                write!(f, "net value {:.2} rose above take-profit line {:.2}", net_value, ceiling)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityGuard {
    stop_loss: f64,
    take_profit: f64,
    baseline: Option<f64>,
    tripped: Option<GuardTrip>,
}

impl EquityGuard {
    /// `stop_loss` is a fraction of the baseline, `take_profit` a multiple of
    /// it. Zero disables either side.
    pub fn new(stop_loss: f64, take_profit: f64) -> Self {
        EquityGuard {
            stop_loss,
            take_profit,
            baseline: None,
            tripped: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.stop_loss > 0.0 || self.take_profit > 0.0
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    pub fn tripped(&self) -> Option<GuardTrip> {
        self.tripped
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.is_some()
    }

    /// Reports a crossed bound without latching it. The first call only
    /// records the baseline. Returns `None` once latched.
    pub fn check(&mut self, net_value: f64) -> Option<GuardTrip> {
        if !self.is_enabled() || self.tripped.is_some() || !net_value.is_finite() {
            return None;
        }
        let baseline = *self.baseline.get_or_insert(net_value);

        if self.stop_loss > 0.0 && net_value < self.stop_loss * baseline {
            Some(GuardTrip::StopLoss {
                net_value,
                floor: self.stop_loss * baseline,
            })
        } else if self.take_profit > 0.0 && net_value > self.take_profit * baseline {
            Some(GuardTrip::TakeProfit {
                net_value,
                ceiling: self.take_profit * baseline,
            })
        } else {
            None
        }
    }

    pub fn latch(&mut self, trip: GuardTrip) {
        self.tripped = Some(trip);
    }
}
