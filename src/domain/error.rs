//! Domain error types.

/// Why an indicator could not produce a usable value for this bar.
///
/// Never fatal: the manager turns it into an abstention and retries on the
/// next bar.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignalError {
    #[error("insufficient history: have {have} bars, need {need}")]
    InsufficientHistory { have: usize, need: usize },

    #[error("degenerate volatility: {value}")]
    DegenerateVolatility { value: f64 },
}

/// Top-level error type for turtletrader.
#[derive(Debug, thiserror::Error)]
pub enum TurtleError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {instrument} at {frequency}")]
    NoData {
        instrument: String,
        frequency: String,
    },

    #[error("malformed bar data: {reason}")]
    DataFormat { reason: String },

    #[error("host error: {reason}")]
    Host { reason: String },

    #[error("order rejected: {reason}")]
    OrderRejected { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TurtleError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TurtleError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
