//! Volatility-scaled breakout position manager.
//!
//! Two states, FLAT and HOLDING, evaluated once per completed bar.
//!
//! FLAT:
//! - ABOVE the channel: size a unit as `risk_fraction * net_value / ATR`, buy
//!   `min(cash, unit * price)` and open the episode.
//! - anything else: stay flat.
//!
//! HOLDING, in priority order:
//! 1. Stop: `price <= last_entry - stop_multiple * ATR` sells everything.
//! 2. Channel exit: BELOW the channel sells everything.
//! 3. Add: `price >= last_entry + add_multiple * ATR` buys one more unit
//!    while under the pyramid cap.
//!
//! Transitions are computed against a copy of the state. The caller commits
//! the copy once the order, if any, has been handed to the host.

use std::fmt;

use crate::domain::account::AccountState;
use crate::domain::config::StrategyConfig;
use crate::domain::error::SignalError;
use crate::domain::indicator::{Breakout, BreakoutDetector, VolatilityEstimator};
use crate::domain::ohlcv::{split_in_progress, Bar};
use crate::domain::order::OrderRequest;
use crate::domain::position::PositionState;

/// Everything the state machine looks at for one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarInputs {
    pub price: f64,
    pub atr: f64,
    pub breakout: Breakout,
    pub account: AccountState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Entry,
    Add,
    Stop,
    ChannelExit,
    GuardExit,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Trigger::Entry => "entry",
            Trigger::Add => "pyramid add",
            Trigger::Stop => "stop",
            Trigger::ChannelExit => "channel exit",
            Trigger::GuardExit => "equity guard exit",
        };
        f.write_str(name)
    }
}

/// Informational conditions. None of them is a failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notice {
    InsufficientFunds { cash_amount: f64, minimum: f64 },
    InsufficientPosition { quantity: f64, minimum: f64 },
    PyramidCapReached { limit: u32 },
    AlreadyHolding,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::InsufficientFunds {
                cash_amount,
                minimum,
            } => write!(
                f,
                "cash insufficient: order of {} is below minimum {}",
                cash_amount, minimum
            ),
            Notice::InsufficientPosition { quantity, minimum } => write!(
                f,
                "position insufficient: {} held is below minimum sell {}",
                quantity, minimum
            ),
            Notice::PyramidCapReached { limit } => {
                write!(f, "pyramid cap of {} entries reached, not adding", limit)
            }
            Notice::AlreadyHolding => write!(f, "already holding, entry signal ignored"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Signals were unusable; nothing was evaluated.
    Abstain(SignalError),
    /// One order to send to the host.
    Order { trigger: Trigger, order: OrderRequest },
    Skipped(Notice),
    Hold,
    /// The equity guard has latched; the strategy no longer trades.
    Halted,
}

impl Decision {
    pub fn order(&self) -> Option<OrderRequest> {
        match self {
            Decision::Order { order, .. } => Some(*order),
            _ => None,
        }
    }

    pub fn trigger(&self) -> Option<Trigger> {
        match self {
            Decision::Order { trigger, .. } => Some(*trigger),
            _ => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Abstain(reason) => write!(f, "abstain: {}", reason),
            Decision::Order { trigger, order } => write!(f, "{}: {}", trigger, order),
            Decision::Skipped(notice) => write!(f, "skipped: {}", notice),
            Decision::Hold => write!(f, "hold"),
            Decision::Halted => write!(f, "halted"),
        }
    }
}

/// A decision together with the state to adopt if it is carried out.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub decision: Decision,
    pub next: PositionState,
}

impl Transition {
    fn unchanged(decision: Decision, state: &PositionState) -> Self {
        Transition {
            decision,
            next: state.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionManager {
    estimator: VolatilityEstimator,
    detector: BreakoutDetector,
    risk_fraction: f64,
    add_atr_multiple: f64,
    stop_atr_multiple: f64,
    min_order_cash: f64,
    min_order_quantity: f64,
}

impl PositionManager {
    pub fn new(config: &StrategyConfig) -> Self {
        PositionManager {
            estimator: config.estimator(),
            detector: config.detector(),
            risk_fraction: config.risk_fraction_per_trade,
            add_atr_multiple: config.pyramid_add_atr_multiple,
            stop_atr_multiple: config.stop_loss_atr_multiple,
            min_order_cash: config.min_order_cash,
            min_order_quantity: config.min_order_quantity,
        }
    }

    /// Compute ATR and the breakout class from a host history whose last bar
    /// is still in progress.
    pub fn signals(&self, history: &[Bar], price: f64) -> Result<(f64, Breakout), SignalError> {
        let (completed, in_progress) =
            split_in_progress(history).ok_or(SignalError::InsufficientHistory {
                have: 0,
                need: self.estimator.required_bars() + 1,
            })?;
        let atr = self.estimator.estimate(completed)?;
        let (channel, breakout) = self.detector.detect(completed, in_progress, price)?;
        log::debug!(
            "price {} atr {} channel [{}, {}] {}",
            price,
            atr,
            channel.lower_bound,
            channel.upper_bound,
            breakout
        );
        Ok((atr, breakout))
    }

    /// Full per-bar evaluation from raw host data.
    pub fn evaluate(
        &self,
        state: &PositionState,
        history: &[Bar],
        price: f64,
        account: AccountState,
    ) -> Transition {
        match self.signals(history, price) {
            Ok((atr, breakout)) => self.decide(
                state,
                &BarInputs {
                    price,
                    atr,
                    breakout,
                    account,
                },
            ),
            Err(reason) => Transition::unchanged(Decision::Abstain(reason), state),
        }
    }

    /// The state machine proper.
    pub fn decide(&self, state: &PositionState, inputs: &BarInputs) -> Transition {
        if !(inputs.price.is_finite() && inputs.price > 0.0) {
            return Transition::unchanged(
                Decision::Abstain(SignalError::DegenerateVolatility {
                    value: inputs.price,
                }),
                state,
            );
        }
        if !(inputs.atr.is_finite() && inputs.atr > 0.0) {
            return Transition::unchanged(
                Decision::Abstain(SignalError::DegenerateVolatility { value: inputs.atr }),
                state,
            );
        }
        if !inputs.account.is_finite() {
            return Transition::unchanged(
                Decision::Abstain(SignalError::DegenerateVolatility {
                    value: inputs.account.net_value,
                }),
                state,
            );
        }

        let mut next = state.clone();
        if next.held && !inputs.account.has_asset() {
            log::warn!("position state says holding but account has no asset, resetting to flat");
            next.reset();
        }

        if next.held {
            self.decide_holding(next, inputs)
        } else {
            self.decide_flat(next, inputs)
        }
    }

    fn decide_flat(&self, mut next: PositionState, inputs: &BarInputs) -> Transition {
        if inputs.breakout != Breakout::Above {
            return Transition {
                decision: Decision::Hold,
                next,
            };
        }

        let unit_size = self.risk_fraction * inputs.account.net_value / inputs.atr;
        let cash_amount = self.buy_amount(unit_size, inputs);
        if !(unit_size > 0.0) || cash_amount < self.min_order_cash || cash_amount <= 0.0 {
            return Transition {
                decision: Decision::Skipped(Notice::InsufficientFunds {
                    cash_amount,
                    minimum: self.min_order_cash,
                }),
                next,
            };
        }

        next.open(unit_size, inputs.price);
        Transition {
            decision: Decision::Order {
                trigger: Trigger::Entry,
                order: OrderRequest::MarketBuy { cash_amount },
            },
            next,
        }
    }

    fn decide_holding(&self, mut next: PositionState, inputs: &BarInputs) -> Transition {
        let stop_price = next.last_entry_price - self.stop_atr_multiple * inputs.atr;
        if inputs.price <= stop_price {
            return self.exit(next, Trigger::Stop, inputs.account);
        }
        if inputs.breakout == Breakout::Below {
            return self.exit(next, Trigger::ChannelExit, inputs.account);
        }

        let add_price = next.last_entry_price + self.add_atr_multiple * inputs.atr;
        if inputs.price >= add_price {
            if !next.can_add() {
                return Transition {
                    decision: Decision::Skipped(Notice::PyramidCapReached {
                        limit: next.entry_count_limit,
                    }),
                    next,
                };
            }
            let cash_amount = self.buy_amount(next.unit_size, inputs);
            if cash_amount < self.min_order_cash || cash_amount <= 0.0 {
                return Transition {
                    decision: Decision::Skipped(Notice::InsufficientFunds {
                        cash_amount,
                        minimum: self.min_order_cash,
                    }),
                    next,
                };
            }
            next.add(inputs.price);
            return Transition {
                decision: Decision::Order {
                    trigger: Trigger::Add,
                    order: OrderRequest::MarketBuy { cash_amount },
                },
                next,
            };
        }

        let decision = if inputs.breakout == Breakout::Above {
            Decision::Skipped(Notice::AlreadyHolding)
        } else {
            Decision::Hold
        };
        Transition { decision, next }
    }

    /// Sell the entire holding and return to flat.
    pub fn exit(&self, mut next: PositionState, trigger: Trigger, account: AccountState) -> Transition {
        let quantity = account.asset_quantity;
        if !(quantity > 0.0) || quantity < self.min_order_quantity {
            return Transition {
                decision: Decision::Skipped(Notice::InsufficientPosition {
                    quantity,
                    minimum: self.min_order_quantity,
                }),
                next,
            };
        }
        next.reset();
        Transition {
            decision: Decision::Order {
                trigger,
                order: OrderRequest::MarketSell { quantity },
            },
            next,
        }
    }

    fn buy_amount(&self, unit_size: f64, inputs: &BarInputs) -> f64 {
        let wanted = unit_size * inputs.price;
        if wanted.is_finite() {
            inputs.account.cash.min(wanted).max(0.0)
        } else {
            0.0
        }
    }
}
