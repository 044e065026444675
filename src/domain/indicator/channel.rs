//! Price channel breakout detector.
//!
//! Donchian: upper = max(high) over the entry window, lower = min(low) over the
//! shorter exit window, both over completed bars only.
//!
//! Dual Thrust: over the entry window take HH = max(high), HC = max(close),
//! LC = min(close), LL = min(low); range = max(HH-LC, HC-LL). The band is
//! anchored on the in-progress bar's open: open + k1*range / open - k2*range.

use std::fmt;

use crate::domain::error::SignalError;
use crate::domain::ohlcv::Bar;

/// Where the current price sits relative to the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakout {
    Above,
    Below,
    Inside,
}

impl fmt::Display for Breakout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Breakout::Above => write!(f, "ABOVE"),
            Breakout::Below => write!(f, "BELOW"),
            Breakout::Inside => write!(f, "INSIDE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelState {
    pub upper_bound: f64,
    pub lower_bound: f64,
}

impl ChannelState {
    pub fn classify(&self, price: f64) -> Breakout {
        if price > self.upper_bound {
            Breakout::Above
        } else if price < self.lower_bound {
            Breakout::Below
        } else {
            Breakout::Inside
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelKind {
    Donchian,
    DualThrust { k1: f64, k2: f64 },
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Donchian => write!(f, "donchian"),
            ChannelKind::DualThrust { k1, k2 } => write!(f, "dual_thrust({}, {})", k1, k2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakoutDetector {
    kind: ChannelKind,
    entry_window: usize,
    exit_window: usize,
}

impl BreakoutDetector {
    pub fn new(kind: ChannelKind, entry_window: usize, exit_window: usize) -> Self {
        Self {
            kind,
            entry_window,
            exit_window,
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Completed bars needed to build the channel.
    pub fn required_bars(&self) -> usize {
        match self.kind {
            ChannelKind::Donchian => self.entry_window.max(self.exit_window),
            ChannelKind::DualThrust { .. } => self.entry_window,
        }
    }

    pub fn channel(&self, completed: &[Bar], in_progress: &Bar) -> Result<ChannelState, SignalError> {
        let need = self.required_bars();
        if need == 0 || completed.len() < need {
            return Err(SignalError::InsufficientHistory {
                have: completed.len(),
                need,
            });
        }
        let recent = &completed[completed.len() - need..];
        if !recent.iter().all(Bar::is_finite) {
            return Err(SignalError::DegenerateVolatility { value: f64::NAN });
        }

        let channel = match self.kind {
            ChannelKind::Donchian => {
                let entry = &completed[completed.len() - self.entry_window..];
                let exit = &completed[completed.len() - self.exit_window..];
                ChannelState {
                    upper_bound: max_of(entry, |b| b.high),
                    lower_bound: min_of(exit, |b| b.low),
                }
            }
            ChannelKind::DualThrust { k1, k2 } => {
                if !in_progress.open.is_finite() {
                    return Err(SignalError::DegenerateVolatility {
                        value: in_progress.open,
                    });
                }
                let hh = max_of(recent, |b| b.high);
                let hc = max_of(recent, |b| b.close);
                let lc = min_of(recent, |b| b.close);
                let ll = min_of(recent, |b| b.low);
                let range = (hh - lc).max(hc - ll);
                ChannelState {
                    upper_bound: in_progress.open + k1 * range,
                    lower_bound: in_progress.open - k2 * range,
                }
            }
        };
        Ok(channel)
    }

    pub fn detect(
        &self,
        completed: &[Bar],
        in_progress: &Bar,
        price: f64,
    ) -> Result<(ChannelState, Breakout), SignalError> {
        let channel = self.channel(completed, in_progress)?;
        Ok((channel, channel.classify(price)))
    }
}

fn max_of(bars: &[Bar], field: impl Fn(&Bar) -> f64) -> f64 {
    bars.iter().map(field).fold(f64::NEG_INFINITY, f64::max)
}

fn min_of(bars: &[Bar], field: impl Fn(&Bar) -> f64) -> f64 {
    bars.iter().map(field).fold(f64::INFINITY, f64::min)
}
