//! Average True Range volatility estimator.
//!
//! TR[i] = max(high[i]-low[i], high[i]-close[i-1], close[i-1]-low[i])
//! ATR(n) = arithmetic mean of the last n true ranges.
//! Needs n+1 completed bars: the oldest one only supplies a previous close.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolatilityEstimator {
    window: usize,
}

impl VolatilityEstimator {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Completed bars needed for one estimate.
    pub fn required_bars(&self) -> usize {
        self.window + 1
    }

    /// Estimate ATR from the most recent completed bars.
    ///
    /// A flat market yields `Ok(0.0)`; deciding whether zero is usable is left
    /// to the caller. Non-finite inputs surface as `DegenerateVolatility`.
    pub fn estimate(&self, completed: &[Bar]) -> Result<f64, SignalError> {
        let need = self.required_bars();
        if self.window == 0 || completed.len() < need {
            return Err(SignalError::InsufficientHistory {
                have: completed.len(),
                need,
            });
        }

        let window = &completed[completed.len() - need..];
        // f64::max swallows NaN, so screen the inputs up front.
        if !window.iter().all(Bar::is_finite) {
            return Err(SignalError::DegenerateVolatility { value: f64::NAN });
        }
        let total: f64 = window
            .windows(2)
            .map(|pair| pair[1].true_range(pair[0].close))
            .sum();
        let atr = total / self.window as f64;

        if !atr.is_finite() {
            return Err(SignalError::DegenerateVolatility { value: atr });
        }
        Ok(atr)
    }
}
