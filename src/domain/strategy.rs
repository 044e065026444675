//! Trend-following strategy bound to the host ports.
//!
//! [`TurtleStrategy::initialize`] builds the per-instrument state once;
//! [`TurtleStrategy::handle_data`] runs one evaluation per completed bar and
//! sends at most one order.

use crate::domain::config::StrategyConfig;
use crate::domain::error::{SignalError, TurtleError};
use crate::domain::guard::EquityGuard;
use crate::domain::manager::{Decision, PositionManager, Trigger};
use crate::domain::position::PositionState;
use crate::ports::execution_port::ExecutionPort;
use crate::ports::market_port::MarketPort;

#[derive(Debug, Clone)]
pub struct TurtleStrategy {
    config: StrategyConfig,
    manager: PositionManager,
    position: PositionState,
    guard: EquityGuard,
}

impl TurtleStrategy {
    pub fn initialize(config: StrategyConfig) -> Result<Self, TurtleError> {
        config.validate()?;
        log::info!(
            "initializing {} on {}: atr {} entry {} exit {} channel {}",
            config.instrument,
            config.frequency,
            config.atr_window,
            config.channel_entry_window,
            config.channel_exit_window,
            config.channel
        );
        Ok(TurtleStrategy {
            manager: PositionManager::new(&config),
            position: PositionState::flat(config.max_pyramid_entries),
            guard: EquityGuard::new(config.portfolio_stop_loss, config.portfolio_take_profit),
            config,
        })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn position(&self) -> &PositionState {
        &self.position
    }

    pub fn guard(&self) -> &EquityGuard {
        &self.guard
    }

    /// One bar. Port failures are returned as errors and leave the position
    /// untouched; everything else is reported through the decision.
    pub fn handle_data<H>(&mut self, host: &mut H) -> Result<Decision, TurtleError>
    where
        H: MarketPort + ExecutionPort + ?Sized,
    {
        if self.guard.is_tripped() {
            return Ok(Decision::Halted);
        }
        if self.guard.is_enabled() {
            if let Some(decision) = self.check_guard(host)? {
                return Ok(decision);
            }
        }

        let instrument = self.config.instrument.as_str();
        let need = self.config.history_len();
        let history = host.get_bars(instrument, need, self.config.frequency)?;
        if history.len() < need {
            let decision = Decision::Abstain(SignalError::InsufficientHistory {
                have: history.len(),
                need,
            });
            log::warn!("not enough bars, waiting for the next bar: {}", decision);
            return Ok(decision);
        }

        let price = host.get_current_price(instrument)?;
        let account = host.get_account_state()?;
        let transition = self.manager.evaluate(&self.position, &history, price, account);

        if let Some(order) = transition.decision.order() {
            order.submit(instrument, host)?;
        }
        self.position = transition.next;
        log_decision(instrument, &transition.decision);
        Ok(transition.decision)
    }

    /// Liquidates on a guard trip. The latch and the position reset are
    /// committed only after the sell is accepted; a rejected sell leaves both
    /// untouched so the next bar tries again.
    fn check_guard<H>(&mut self, host: &mut H) -> Result<Option<Decision>, TurtleError>
    where
        H: MarketPort + ExecutionPort + ?Sized,
    {
        let account = host.get_account_state()?;
        let Some(trip) = self.guard.check(account.net_value) else {
            return Ok(None);
        };
        log::warn!("equity guard tripped, liquidating and halting: {}", trip);

        let instrument = self.config.instrument.as_str();
        let transition = self
            .manager
            .exit(self.position.clone(), Trigger::GuardExit, account);
        let decision = match transition.decision.order() {
            Some(order) => {
                order.submit(instrument, host)?;
                transition.decision
            }
            // Dust below the sell minimum stays on the books and in the state.
            None if account.has_asset() => transition.decision,
            None => Decision::Halted,
        };
        self.position = transition.next;
        if !account.has_asset() {
            self.position.reset();
        }
        self.guard.latch(trip);
        log_decision(instrument, &decision);
        Ok(Some(decision))
    }
}

fn log_decision(instrument: &str, decision: &Decision) {
    match decision {
        Decision::Abstain(_) => log::warn!("{}: {}", instrument, decision),
        Decision::Order { .. } | Decision::Skipped(_) => log::info!("{}: {}", instrument, decision),
        Decision::Hold | Decision::Halted => log::debug!("{}: {}", instrument, decision),
    }
}
