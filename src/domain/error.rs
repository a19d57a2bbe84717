//! Domain error types.

/// Top-level error type for marketscore.
///
/// Only failures that stop a whole invocation live here. Per-symbol problems
/// are recorded as skip reasons and never surface as an `Err`.
#[derive(Debug, thiserror::Error)]
pub enum MarketScoreError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("cannot read data directory {path}: {reason}")]
    DataSource { path: String, reason: String },

    #[error("cannot read {symbol}: {reason}")]
    SymbolRead { symbol: String, reason: String },

    #[error("failed to append history to {path}: {reason}")]
    HistoryWrite { path: String, reason: String },

    #[error("no usable symbols in {path}")]
    NoData { path: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&MarketScoreError> for std::process::ExitCode {
    fn from(err: &MarketScoreError) -> Self {
        let code: u8 = match err {
            MarketScoreError::Io(_) | MarketScoreError::HistoryWrite { .. } => 1,
            MarketScoreError::ConfigParse { .. } | MarketScoreError::ConfigInvalid { .. } => 2,
            MarketScoreError::DataSource { .. } | MarketScoreError::SymbolRead { .. } => 3,
            MarketScoreError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
