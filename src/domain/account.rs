//! Account balances as reported by the host.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountState {
    pub cash: f64,
    pub asset_quantity: f64,
    pub net_value: f64,
}

impl AccountState {
    /// Net value of a cash + single-asset account at `price`.
    pub fn valued_at(cash: f64, asset_quantity: f64, price: f64) -> Self {
        AccountState {
            cash,
            asset_quantity,
            net_value: cash + asset_quantity * price,
        }
    }

    pub fn has_asset(&self) -> bool {
        self.asset_quantity > 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.cash.is_finite() && self.asset_quantity.is_finite() && self.net_value.is_finite()
    }
}
