//! Strategy and replay configuration with validation.
//!
//! Values are read from `[strategy]` and `[replay]` through a [`ConfigPort`].
//! Missing keys fall back to defaults; present but malformed or out-of-range
//! values are rejected.

use std::fmt::Display;
use std::str::FromStr;

use crate::domain::error::TurtleError;
use crate::domain::frequency::Frequency;
use crate::domain::indicator::{BreakoutDetector, ChannelKind, VolatilityEstimator};
use crate::ports::config_port::ConfigPort;

pub const STRATEGY_SECTION: &str = "strategy";
pub const REPLAY_SECTION: &str = "replay";

const STRATEGY_KEYS: &[&str] = &[
    "instrument",
    "frequency",
    "atr_window",
    "channel_entry_window",
    "channel_exit_window",
    "risk_fraction_per_trade",
    "pyramid_add_atr_multiple",
    "stop_loss_atr_multiple",
    "max_pyramid_entries",
    "min_order_cash",
    "min_order_quantity",
    "channel",
    "dual_thrust_k1",
    "dual_thrust_k2",
    "portfolio_stop_loss",
    "portfolio_take_profit",
];

const REPLAY_KEYS: &[&str] = &["initial_cash", "initial_asset", "commission", "slippage"];

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub instrument: String,
    pub frequency: Frequency,
    pub atr_window: usize,
    pub channel_entry_window: usize,
    pub channel_exit_window: usize,
    pub risk_fraction_per_trade: f64,
    pub pyramid_add_atr_multiple: f64,
    pub stop_loss_atr_multiple: f64,
    pub max_pyramid_entries: u32,
    pub min_order_cash: f64,
    pub min_order_quantity: f64,
    pub channel: ChannelKind,
    /// Fraction of the starting net value; 0 disables.
    pub portfolio_stop_loss: f64,
    /// Multiple of the starting net value; 0 disables.
    pub portfolio_take_profit: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            instrument: "huobi_cny_btc".to_string(),
            frequency: Frequency::Day1,
            atr_window: 20,
            channel_entry_window: 20,
            channel_exit_window: 10,
            risk_fraction_per_trade: 0.01,
            pyramid_add_atr_multiple: 0.5,
            stop_loss_atr_multiple: 2.0,
            max_pyramid_entries: 4,
            min_order_cash: 1.0,
            min_order_quantity: 0.001,
            channel: ChannelKind::Donchian,
            portfolio_stop_loss: 0.0,
            portfolio_take_profit: 0.0,
        }
    }
}

impl StrategyConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TurtleError> {
        warn_unknown_keys(config, STRATEGY_SECTION, STRATEGY_KEYS);
        let defaults = StrategyConfig::default();
        let s = STRATEGY_SECTION;

        let instrument = config
            .get_string(s, "instrument")
            .map(|v| v.trim().to_string())
            .unwrap_or(defaults.instrument);
        let frequency = read(config, s, "frequency", defaults.frequency)?;
        let atr_window = read(config, s, "atr_window", defaults.atr_window)?;
        let channel_entry_window =
            read(config, s, "channel_entry_window", defaults.channel_entry_window)?;
        let channel_exit_window = read(
            config,
            s,
            "channel_exit_window",
            (channel_entry_window / 2).max(1),
        )?;

        let channel = match config.get_string(s, "channel").as_deref().map(str::trim) {
            None | Some("donchian") => ChannelKind::Donchian,
            Some("dual_thrust") => ChannelKind::DualThrust {
                k1: read(config, s, "dual_thrust_k1", 0.2)?,
                k2: read(config, s, "dual_thrust_k2", 0.3)?,
            },
            Some(other) => {
                return Err(TurtleError::invalid(
                    s,
                    "channel",
                    format!("unknown channel '{}', expected donchian or dual_thrust", other),
                ));
            }
        };

        let cfg = StrategyConfig {
            instrument,
            frequency,
            atr_window,
            channel_entry_window,
            channel_exit_window,
            risk_fraction_per_trade: read(
                config,
                s,
                "risk_fraction_per_trade",
                defaults.risk_fraction_per_trade,
            )?,
            pyramid_add_atr_multiple: read(
                config,
                s,
                "pyramid_add_atr_multiple",
                defaults.pyramid_add_atr_multiple,
            )?,
            stop_loss_atr_multiple: read(
                config,
                s,
                "stop_loss_atr_multiple",
                defaults.stop_loss_atr_multiple,
            )?,
            max_pyramid_entries: read(config, s, "max_pyramid_entries", defaults.max_pyramid_entries)?,
            min_order_cash: read(config, s, "min_order_cash", defaults.min_order_cash)?,
            min_order_quantity: read(config, s, "min_order_quantity", defaults.min_order_quantity)?,
            channel,
            portfolio_stop_loss: read(config, s, "portfolio_stop_loss", defaults.portfolio_stop_loss)?,
            portfolio_take_profit: read(
                config,
                s,
                "portfolio_take_profit",
                defaults.portfolio_take_profit,
            )?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), TurtleError> {
        validate_instrument(self)?;
        validate_windows(self)?;
        validate_risk_fraction(self)?;
        validate_atr_multiples(self)?;
        validate_max_pyramid_entries(self)?;
        validate_order_minimums(self)?;
        validate_channel(self)?;
        validate_portfolio_guard(self)?;
        Ok(())
    }

    pub fn estimator(&self) -> VolatilityEstimator {
        VolatilityEstimator::new(self.atr_window)
    }

    pub fn detector(&self) -> BreakoutDetector {
        BreakoutDetector::new(self.channel, self.channel_entry_window, self.channel_exit_window)
    }

    /// Bars to request from the host per evaluation, in-progress bar included.
    pub fn history_len(&self) -> usize {
        self.estimator()
            .required_bars()
            .max(self.detector().required_bars())
            + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    pub initial_cash: f64,
    pub initial_asset: f64,
    /// Proportional fee charged on each fill.
    pub commission: f64,
    /// Proportional adverse price adjustment on each fill.
    pub slippage: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            initial_cash: 100_000.0,
            initial_asset: 0.0,
            commission: 0.002,
            slippage: 0.001,
        }
    }
}

impl ReplayConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TurtleError> {
        warn_unknown_keys(config, REPLAY_SECTION, REPLAY_KEYS);
        let defaults = ReplayConfig::default();
        let s = REPLAY_SECTION;
        let cfg = ReplayConfig {
            initial_cash: read(config, s, "initial_cash", defaults.initial_cash)?,
            initial_asset: read(config, s, "initial_asset", defaults.initial_asset)?,
            commission: read(config, s, "commission", defaults.commission)?,
            slippage: read(config, s, "slippage", defaults.slippage)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), TurtleError> {
        let s = REPLAY_SECTION;
        if !(self.initial_cash >= 0.0 && self.initial_cash.is_finite()) {
            return Err(TurtleError::invalid(s, "initial_cash", "initial_cash must be non-negative"));
        }
        if !(self.initial_asset >= 0.0 && self.initial_asset.is_finite()) {
            return Err(TurtleError::invalid(s, "initial_asset", "initial_asset must be non-negative"));
        }
        if self.initial_cash == 0.0 && self.initial_asset == 0.0 {
            return Err(TurtleError::invalid(
                s,
                "initial_cash",
                "account must start with cash or asset",
            ));
        }
        if !(0.0..1.0).contains(&self.commission) {
            return Err(TurtleError::invalid(s, "commission", "commission must be in [0, 1)"));
        }
        if !(0.0..1.0).contains(&self.slippage) {
            return Err(TurtleError::invalid(s, "slippage", "slippage must be in [0, 1)"));
        }
        Ok(())
    }
}

fn read<T>(config: &dyn ConfigPort, section: &str, key: &str, default: T) -> Result<T, TurtleError>
where
    T: FromStr,
    T::Err: Display,
{
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| TurtleError::invalid(section, key, format!("cannot parse '{}': {}", raw.trim(), e))),
    }
}

fn warn_unknown_keys(config: &dyn ConfigPort, section: &str, known: &[&str]) {
    for key in config.keys(section) {
        if !known.contains(&key.as_str()) {
            log::warn!("ignoring unrecognized config key [{}] {}", section, key);
        }
    }
}

fn validate_instrument(cfg: &StrategyConfig) -> Result<(), TurtleError> {
    if cfg.instrument.is_empty() {
        return Err(TurtleError::ConfigMissing {
            section: STRATEGY_SECTION.to_string(),
            key: "instrument".to_string(),
        });
    }
    Ok(())
}

fn validate_windows(cfg: &StrategyConfig) -> Result<(), TurtleError> {
    let s = STRATEGY_SECTION;
    if cfg.atr_window < 2 {
        return Err(TurtleError::invalid(s, "atr_window", "atr_window must be >= 2"));
    }
    if cfg.channel_entry_window < 1 {
        return Err(TurtleError::invalid(
            s,
            "channel_entry_window",
            "channel_entry_window must be >= 1",
        ));
    }
    if cfg.channel_exit_window < 1 || cfg.channel_exit_window > cfg.channel_entry_window {
        return Err(TurtleError::invalid(
            s,
            "channel_exit_window",
            "channel_exit_window must be between 1 and channel_entry_window",
        ));
    }
    Ok(())
}

fn validate_risk_fraction(cfg: &StrategyConfig) -> Result<(), TurtleError> {
    let value = cfg.risk_fraction_per_trade;
    if !(value > 0.0 && value <= 1.0) {
        return Err(TurtleError::invalid(
            STRATEGY_SECTION,
            "risk_fraction_per_trade",
            "risk_fraction_per_trade must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_atr_multiples(cfg: &StrategyConfig) -> Result<(), TurtleError> {
    if !(cfg.pyramid_add_atr_multiple > 0.0 && cfg.pyramid_add_atr_multiple.is_finite()) {
        return Err(TurtleError::invalid(
            STRATEGY_SECTION,
            "pyramid_add_atr_multiple",
            "pyramid_add_atr_multiple must be positive",
        ));
    }
    if !(cfg.stop_loss_atr_multiple > 0.0 && cfg.stop_loss_atr_multiple.is_finite()) {
        return Err(TurtleError::invalid(
            STRATEGY_SECTION,
            "stop_loss_atr_multiple",
            "stop_loss_atr_multiple must be positive",
        ));
    }
    Ok(())
}

fn validate_max_pyramid_entries(cfg: &StrategyConfig) -> Result<(), TurtleError> {
    if cfg.max_pyramid_entries < 1 {
        return Err(TurtleError::invalid(
            STRATEGY_SECTION,
            "max_pyramid_entries",
            "max_pyramid_entries must be >= 1",
        ));
    }
    Ok(())
}

fn validate_order_minimums(cfg: &StrategyConfig) -> Result<(), TurtleError> {
    if !(cfg.min_order_cash >= 0.0 && cfg.min_order_cash.is_finite()) {
        return Err(TurtleError::invalid(
            STRATEGY_SECTION,
            "min_order_cash",
            "min_order_cash must be non-negative",
        ));
    }
    if !(cfg.min_order_quantity >= 0.0 && cfg.min_order_quantity.is_finite()) {
        return Err(TurtleError::invalid(
            STRATEGY_SECTION,
            "min_order_quantity",
            "min_order_quantity must be non-negative",
        ));
    }
    Ok(())
}

fn validate_channel(cfg: &StrategyConfig) -> Result<(), TurtleError> {
    if let ChannelKind::DualThrust { k1, k2 } = cfg.channel {
        if !(k1 > 0.0 && k1.is_finite()) {
            return Err(TurtleError::invalid(
                STRATEGY_SECTION,
                "dual_thrust_k1",
                "dual_thrust_k1 must be positive",
            ));
        }
        if !(k2 > 0.0 && k2.is_finite()) {
            return Err(TurtleError::invalid(
                STRATEGY_SECTION,
                "dual_thrust_k2",
                "dual_thrust_k2 must be positive",
            ));
        }
    }
    Ok(())
}

fn validate_portfolio_guard(cfg: &StrategyConfig) -> Result<(), TurtleError> {
    if !(0.0..1.0).contains(&cfg.portfolio_stop_loss) {
        return Err(TurtleError::invalid(
            STRATEGY_SECTION,
            "portfolio_stop_loss",
            "portfolio_stop_loss must be in [0, 1)",
        ));
    }
    let tp = cfg.portfolio_take_profit;
    if !(tp == 0.0 || (tp > 1.0 && tp.is_finite())) {
        return Err(TurtleError::invalid(
            STRATEGY_SECTION,
            "portfolio_take_profit",
            "portfolio_take_profit must be 0 or greater than 1",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = make_config("[strategy]\n");
        let cfg = StrategyConfig::from_config(&config).unwrap();
        assert_eq!(cfg, StrategyConfig::default());
    }

    #[test]
    fn full_strategy_config_parses() {
        let config = make_config(
            r#"
[strategy]
instrument = huobi_cny_eth
frequency = 4h
atr_window = 14
channel_entry_window = 30
channel_exit_window = 12
risk_fraction_per_trade = 0.02
pyramid_add_atr_multiple = 0.75
stop_loss_atr_multiple = 3
max_pyramid_entries = 6
min_order_cash = 5
min_order_quantity = 0.01
"#,
        );
        let cfg = StrategyConfig::from_config(&config).unwrap();
        assert_eq!(cfg.instrument, "huobi_cny_eth");
        assert_eq!(cfg.frequency, Frequency::Hour4);
        assert_eq!(cfg.atr_window, 14);
        assert_eq!(cfg.channel_entry_window, 30);
        assert_eq!(cfg.channel_exit_window, 12);
        assert_eq!(cfg.risk_fraction_per_trade, 0.02);
        assert_eq!(cfg.pyramid_add_atr_multiple, 0.75);
        assert_eq!(cfg.stop_loss_atr_multiple, 3.0);
        assert_eq!(cfg.max_pyramid_entries, 6);
        assert_eq!(cfg.min_order_cash, 5.0);
        assert_eq!(cfg.min_order_quantity, 0.01);
    }

    #[test]
    fn exit_window_defaults_to_half_entry() {
        let config = make_config("[strategy]\nchannel_entry_window = 55\n");
        let cfg = StrategyConfig::from_config(&config).unwrap();
        assert_eq!(cfg.channel_exit_window, 27);
    }

    #[test]
    fn exit_window_half_of_one_is_one() {
        let config = make_config("[strategy]\nchannel_entry_window = 1\n");
        let cfg = StrategyConfig::from_config(&config).unwrap();
        assert_eq!(cfg.channel_exit_window, 1);
    }

    #[test]
    fn non_numeric_window_is_rejected() {
        let config = make_config("[strategy]\natr_window = twenty\n");
        let err = StrategyConfig::from_config(&config).unwrap_err();
        assert!(matches!(err, TurtleError::ConfigInvalid { key, .. } if key == "atr_window"));
    }

    #[test]
    fn atr_window_below_two_fails() {
        let config = make_config("[strategy]\natr_window = 1\n");
        let err = StrategyConfig::from_config(&config).unwrap_err();
        assert!(matches!(err, TurtleError::ConfigInvalid { key, .. } if key == "atr_window"));
    }

    #[test]
    fn exit_window_longer_than_entry_fails() {
        let config = make_config("[strategy]\nchannel_entry_window = 10\nchannel_exit_window = 11\n");
        let err = StrategyConfig::from_config(&config).unwrap_err();
        assert!(
            matches!(err, TurtleError::ConfigInvalid { key, .. } if key == "channel_exit_window")
        );
    }

    #[test]
    fn risk_fraction_zero_fails() {
        let config = make_config("[strategy]\nrisk_fraction_per_trade = 0\n");
        let err = StrategyConfig::from_config(&config).unwrap_err();
        assert!(
            matches!(err, TurtleError::ConfigInvalid { key, .. } if key == "risk_fraction_per_trade")
        );
    }

    #[test]
    fn negative_stop_multiple_fails() {
        let config = make_config("[strategy]\nstop_loss_atr_multiple = -2\n");
        let err = StrategyConfig::from_config(&config).unwrap_err();
        assert!(
            matches!(err, TurtleError::ConfigInvalid { key, .. } if key == "stop_loss_atr_multiple")
        );
    }

    #[test]
    fn zero_pyramid_cap_fails() {
        let config = make_config("[strategy]\nmax_pyramid_entries = 0\n");
        let err = StrategyConfig::from_config(&config).unwrap_err();
        assert!(
            matches!(err, TurtleError::ConfigInvalid { key, .. } if key == "max_pyramid_entries")
        );
    }

    #[test]
    fn unknown_frequency_fails() {
        let config = make_config("[strategy]\nfrequency = 3d\n");
        let err = StrategyConfig::from_config(&config).unwrap_err();
        assert!(matches!(err, TurtleError::ConfigInvalid { key, .. } if key == "frequency"));
    }

    #[test]
    fn dual_thrust_channel_parses() {
        let config = make_config("[strategy]\nchannel = dual_thrust\ndual_thrust_k1 = 0.5\n");
        let cfg = StrategyConfig::from_config(&config).unwrap();
        assert_eq!(cfg.channel, ChannelKind::DualThrust { k1: 0.5, k2: 0.3 });
    }

    #[test]
    fn unknown_channel_fails() {
        let config = make_config("[strategy]\nchannel = keltner\n");
        let err = StrategyConfig::from_config(&config).unwrap_err();
        assert!(matches!(err, TurtleError::ConfigInvalid { key, .. } if key == "channel"));
    }

    #[test]
    fn portfolio_guard_ranges() {
        let config = make_config("[strategy]\nportfolio_stop_loss = 1.2\n");
        let err = StrategyConfig::from_config(&config).unwrap_err();
        assert!(
            matches!(err, TurtleError::ConfigInvalid { key, .. } if key == "portfolio_stop_loss")
        );

        let config = make_config("[strategy]\nportfolio_take_profit = 0.9\n");
        let err = StrategyConfig::from_config(&config).unwrap_err();
        assert!(
            matches!(err, TurtleError::ConfigInvalid { key, .. } if key == "portfolio_take_profit")
        );

        let config = make_config("[strategy]\nportfolio_stop_loss = 0.8\nportfolio_take_profit = 1.5\n");
        assert!(StrategyConfig::from_config(&config).is_ok());
    }

    #[test]
    fn history_len_covers_both_indicators() {
        let cfg = StrategyConfig::default();
        // ATR(20) needs 21 completed bars, channel needs 20, plus one in progress.
        assert_eq!(cfg.history_len(), 22);

        let cfg = StrategyConfig {
            channel_entry_window: 55,
            channel_exit_window: 20,
            ..StrategyConfig::default()
        };
        assert_eq!(cfg.history_len(), 56);
    }

    #[test]
    fn replay_config_defaults() {
        let config = make_config("[replay]\n");
        let cfg = ReplayConfig::from_config(&config).unwrap();
        assert_eq!(cfg, ReplayConfig::default());
    }

    #[test]
    fn replay_config_parses_and_validates() {
        let config = make_config("[replay]\ninitial_cash = 5000\ncommission = 0\nslippage = 0\n");
        let cfg = ReplayConfig::from_config(&config).unwrap();
        assert_eq!(cfg.initial_cash, 5000.0);
        assert_eq!(cfg.commission, 0.0);

        let config = make_config("[replay]\ncommission = 1.5\n");
        let err = ReplayConfig::from_config(&config).unwrap_err();
        assert!(matches!(err, TurtleError::ConfigInvalid { key, .. } if key == "commission"));
    }

    #[test]
    fn empty_account_fails() {
        let config = make_config("[replay]\ninitial_cash = 0\n");
        let err = ReplayConfig::from_config(&config).unwrap_err();
        assert!(matches!(err, TurtleError::ConfigInvalid { key, .. } if key == "initial_cash"));
    }
}
