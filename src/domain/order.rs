//! Market order requests emitted by the position manager.

use std::fmt;

use crate::domain::error::TurtleError;
use crate::ports::execution_port::ExecutionPort;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderRequest {
    /// Spend this much cash at market.
    MarketBuy { cash_amount: f64 },
    /// Sell this much of the asset at market.
    MarketSell { quantity: f64 },
}

impl OrderRequest {
    pub fn is_buy(&self) -> bool {
        matches!(self, OrderRequest::MarketBuy { .. })
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, OrderRequest::MarketSell { .. })
    }

    /// Amount formatted the way hosts expect order parameters: plain decimal
    /// text, at most eight fractional digits, no trailing zeros.
    pub fn host_amount(&self) -> String {
        let value = match self {
            OrderRequest::MarketBuy { cash_amount } => *cash_amount,
            OrderRequest::MarketSell { quantity } => *quantity,
        };
        format_host_amount(value)
    }

    /// Hand the request to an execution collaborator.
    pub fn submit<E: ExecutionPort + ?Sized>(
        &self,
        instrument: &str,
        execution: &mut E,
    ) -> Result<(), TurtleError> {
        match *self {
            OrderRequest::MarketBuy { cash_amount } => {
                execution.submit_market_buy(instrument, cash_amount)
            }
            OrderRequest::MarketSell { quantity } => execution.submit_market_sell(instrument, quantity),
        }
    }
}

impl fmt::Display for OrderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderRequest::MarketBuy { .. } => write!(f, "BUY cash_amount={}", self.host_amount()),
            OrderRequest::MarketSell { .. } => write!(f, "SELL quantity={}", self.host_amount()),
        }
    }
}

pub fn format_host_amount(value: f64) -> String {
    let text = format!("{:.8}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() || text == "-" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
