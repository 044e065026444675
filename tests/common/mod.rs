#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use turtletrader::domain::account::AccountState;
use turtletrader::domain::config::StrategyConfig;
use turtletrader::domain::error::TurtleError;
use turtletrader::domain::frequency::Frequency;
pub use turtletrader::domain::ohlcv::Bar;
use turtletrader::domain::order::OrderRequest;
use turtletrader::ports::execution_port::ExecutionPort;
use turtletrader::ports::market_port::MarketPort;

/// Host whose history is edited by the test between bars. Orders fill
/// immediately at the current price with no costs.
pub struct MockHost {
    pub history: Vec<Bar>,
    pub price: f64,
    pub cash: f64,
    pub asset: f64,
    pub orders: Vec<OrderRequest>,
}

impl MockHost {
    pub fn new(cash: f64) -> Self {
        Self {
            history: Vec::new(),
            price: 0.0,
            cash,
            asset: 0.0,
            orders: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<Bar>) -> Self {
        self.history = history;
        self
    }

    /// Append a bar and make its close the current price.
    pub fn push(&mut self, bar: Bar) {
        self.price = bar.close;
        self.history.push(bar);
    }

    /// Replace the in-progress bar with one trading at `price`.
    pub fn set_price(&mut self, price: f64) {
        self.price = price;
        if let Some(last) = self.history.last_mut() {
            last.close = price;
        }
    }

    pub fn buys(&self) -> usize {
        self.orders.iter().filter(|o| o.is_buy()).count()
    }

    pub fn sells(&self) -> usize {
        self.orders.iter().filter(|o| o.is_sell()).count()
    }
}

impl MarketPort for MockHost {
    fn get_bars(
        &self,
        _instrument: &str,
        count: usize,
        _frequency: Frequency,
    ) -> Result<Vec<Bar>, TurtleError> {
        let start = self.history.len().saturating_sub(count);
        Ok(self.history[start..].to_vec())
    }

    fn get_current_price(&self, _instrument: &str) -> Result<f64, TurtleError> {
        Ok(self.price)
    }

    fn get_account_state(&self) -> Result<AccountState, TurtleError> {
        Ok(AccountState::valued_at(self.cash, self.asset, self.price))
    }
}

impl ExecutionPort for MockHost {
    fn submit_market_buy(&mut self, _instrument: &str, cash_amount: f64) -> Result<(), TurtleError> {
        self.cash -= cash_amount;
        self.asset += cash_amount / self.price;
        self.orders.push(OrderRequest::MarketBuy { cash_amount });
        Ok(())
    }

    fn submit_market_sell(&mut self, _instrument: &str, quantity: f64) -> Result<(), TurtleError> {
        self.cash += quantity * self.price;
        self.asset -= quantity;
        self.orders.push(OrderRequest::MarketSell { quantity });
        Ok(())
    }
}

pub fn ts(day: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2017, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::days(day)
}

pub fn make_bar(day: i64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: ts(day),
        open: close,
        high,
        low,
        close,
        volume: 100.0,
    }
}

/// `count` identical bars whose true range is `high - low`.
pub fn range_bars(start_day: i64, count: usize, high: f64, low: f64) -> Vec<Bar> {
    let close = (high + low) / 2.0;
    (0..count)
        .map(|i| make_bar(start_day + i as i64, high, low, close))
        .collect()
}

/// Steadily rising closes, `step` apart, with a one-point band each side.
pub fn rising_bars(start_day: i64, count: usize, start_close: f64, step: f64) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let close = start_close + step * i as f64;
            make_bar(start_day + i as i64, close + 1.0, close - 1.0, close)
        })
        .collect()
}

/// Windows from the worked example: ATR 20, entry 20, exit 10, 1% risk.
pub fn turtle_config() -> StrategyConfig {
    StrategyConfig {
        atr_window: 20,
        channel_entry_window: 20,
        channel_exit_window: 10,
        risk_fraction_per_trade: 0.01,
        ..StrategyConfig::default()
    }
}

pub fn small_config() -> StrategyConfig {
    StrategyConfig {
        atr_window: 3,
        channel_entry_window: 3,
        channel_exit_window: 1,
        ..StrategyConfig::default()
    }
}
