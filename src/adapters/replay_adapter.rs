//! Bar-by-bar replay host.
//!
//! Serves history, price and balances from an in-memory bar vector and fills
//! market orders immediately at the current bar's close, adjusted by
//! proportional slippage and charged a proportional commission.

use chrono::NaiveDateTime;

use crate::domain::account::AccountState;
use crate::domain::config::ReplayConfig;
use crate::domain::error::TurtleError;
use crate::domain::frequency::Frequency;
use crate::domain::manager::Decision;
use crate::domain::ohlcv::Bar;
use crate::domain::order::OrderRequest;
use crate::domain::strategy::TurtleStrategy;
use crate::ports::data_port::DataPort;
use crate::ports::execution_port::ExecutionPort;
use crate::ports::market_port::MarketPort;

const DUST: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub timestamp: NaiveDateTime,
    pub order: OrderRequest,
    pub price: f64,
    pub quantity: f64,
    pub commission: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub decisions: Vec<(NaiveDateTime, Decision)>,
    pub fills: Vec<Fill>,
    pub final_account: AccountState,
}

impl ReplayReport {
    pub fn orders(&self) -> impl Iterator<Item = &Decision> + '_ {
        self.decisions
            .iter()
            .map(|(_, d)| d)
            .filter(|d| d.order().is_some())
    }
}

#[derive(Debug, Clone)]
pub struct ReplayHost {
    instrument: String,
    bars: Vec<Bar>,
    cursor: usize,
    cash: f64,
    asset: f64,
    config: ReplayConfig,
    fills: Vec<Fill>,
}

impl ReplayHost {
    pub fn new(instrument: &str, bars: Vec<Bar>, config: ReplayConfig) -> Self {
        ReplayHost {
            instrument: instrument.to_string(),
            bars,
            cursor: 0,
            cash: config.initial_cash,
            asset: config.initial_asset,
            config,
            fills: Vec::new(),
        }
    }

    pub fn from_data_port(
        port: &dyn DataPort,
        instrument: &str,
        frequency: Frequency,
        config: ReplayConfig,
    ) -> Result<Self, TurtleError> {
        let bars = port.fetch_bars(instrument, frequency)?;
        if bars.is_empty() {
            return Err(TurtleError::NoData {
                instrument: instrument.to_string(),
                frequency: frequency.to_string(),
            });
        }
        Ok(ReplayHost::new(instrument, bars, config))
    }

    pub fn current_bar(&self) -> Option<&Bar> {
        self.bars.get(self.cursor)
    }

    /// Move to the next bar. Returns false once history is exhausted.
    pub fn advance(&mut self) -> bool {
        if self.cursor + 1 < self.bars.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    pub fn account(&self) -> AccountState {
        let price = self.current_bar().map(|b| b.close).unwrap_or(0.0);
        AccountState::valued_at(self.cash, self.asset, price)
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    /// Drive `strategy` over every bar from the current cursor to the end.
    pub fn run(&mut self, strategy: &mut TurtleStrategy) -> Result<ReplayReport, TurtleError> {
        let mut decisions = Vec::with_capacity(self.bars.len().saturating_sub(self.cursor));
        if self.bars.is_empty() {
            return Err(TurtleError::NoData {
                instrument: self.instrument.clone(),
                frequency: strategy.config().frequency.to_string(),
            });
        }
        loop {
            let timestamp = self.bars[self.cursor].timestamp;
            let decision = strategy.handle_data(self)?;
            decisions.push((timestamp, decision));
            if !self.advance() {
                break;
            }
        }
        let final_account = self.account();
        log::info!(
            "replay of {} finished: {} bars, {} fills, net value {:.2}",
            self.instrument,
            decisions.len(),
            self.fills.len(),
            final_account.net_value
        );
        Ok(ReplayReport {
            decisions,
            fills: self.fills.clone(),
            final_account,
        })
    }

    fn check_instrument(&self, instrument: &str) -> Result<(), TurtleError> {
        if instrument == self.instrument {
            Ok(())
        } else {
            Err(TurtleError::Host {
                reason: format!("unknown instrument {}", instrument),
            })
        }
    }

    fn current(&self) -> Result<&Bar, TurtleError> {
        self.current_bar().ok_or_else(|| TurtleError::Host {
            reason: "no bars loaded".to_string(),
        })
    }
}

impl MarketPort for ReplayHost {
    fn get_bars(
        &self,
        instrument: &str,
        count: usize,
        _frequency: Frequency,
    ) -> Result<Vec<Bar>, TurtleError> {
        self.check_instrument(instrument)?;
        if self.bars.is_empty() {
            return Ok(Vec::new());
        }
        let end = self.cursor + 1;
        let start = end.saturating_sub(count);
        Ok(self.bars[start..end].to_vec())
    }

    fn get_current_price(&self, instrument: &str) -> Result<f64, TurtleError> {
        self.check_instrument(instrument)?;
        Ok(self.current()?.close)
    }

    fn get_account_state(&self) -> Result<AccountState, TurtleError> {
        Ok(self.account())
    }
}

impl ExecutionPort for ReplayHost {
    fn submit_market_buy(&mut self, instrument: &str, cash_amount: f64) -> Result<(), TurtleError> {
        self.check_instrument(instrument)?;
        if !(cash_amount > 0.0) || cash_amount > self.cash + DUST {
            return Err(TurtleError::OrderRejected {
                reason: format!("buy of {} with {} cash available", cash_amount, self.cash),
            });
        }
        let bar = self.current()?;
        let timestamp = bar.timestamp;
        let price = bar.close * (1.0 + self.config.slippage);
        let commission = cash_amount * self.config.commission;
        let quantity = (cash_amount - commission) / price;

        self.cash = (self.cash - cash_amount).max(0.0);
        self.asset += quantity;
        self.fills.push(Fill {
            timestamp,
            order: OrderRequest::MarketBuy { cash_amount },
            price,
            quantity,
            commission,
        });
        Ok(())
    }

    fn submit_market_sell(&mut self, instrument: &str, quantity: f64) -> Result<(), TurtleError> {
        self.check_instrument(instrument)?;
        if !(quantity > 0.0) || quantity > self.asset + DUST {
            return Err(TurtleError::OrderRejected {
                reason: format!("sell of {} with {} held", quantity, self.asset),
            });
        }
        let bar = self.current()?;
        let timestamp = bar.timestamp;
        let price = bar.close * (1.0 - self.config.slippage);
        let gross = quantity * price;
        let commission = gross * self.config.commission;

        self.cash += gross - commission;
        self.asset -= quantity;
        if self.asset < DUST {
            self.asset = 0.0;
        }
        self.fills.push(Fill {
            timestamp,
            order: OrderRequest::MarketSell { quantity },
            price,
            quantity,
            commission,
        });
        Ok(())
    }
}
