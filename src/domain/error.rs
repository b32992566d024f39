//! Domain error types.

/// Top-level error type for kestrel.
#[derive(Debug, thiserror::Error)]
pub enum KestrelError {
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

    #[error("invalid timeframe code `{code}`: {reason}")]
    InvalidTimeframe { code: String, reason: String },

    #[error("unknown coin `{name}`")]
    UnknownCoin { name: String },

    #[error("empty candles list")]
    EmptyCandles,

    #[error("cannot convert candles to a lower timeframe ({source_code} -> {target_code})")]
    LowerTimeframe {
        source_code: String,
        target_code: String,
    },

    #[error("all candles must share the same {attribute}, found [{values}]")]
    MixedCandles { attribute: String, values: String },

    #[error("inconsistent candles mapping: {len} candles, {unique} unique open times")]
    InconsistentMapping { len: usize, unique: usize },

    #[error("insufficient balance: updating {coin} by {delta} would leave {result}")]
    InsufficientBalance {
        coin: String,
        delta: f64,
        result: f64,
    },

    #[error(
        "strategy `{strategy}` produced too many signals: expected at most {expected}, got {got}"
    )]
    TooManySignals {
        strategy: String,
        expected: usize,
        got: usize,
    },

    #[error("unknown strategy parameter `{name}`")]
    UnknownParameter { name: String },

    #[error("candle store error: {reason}")]
    Store { reason: String },

    #[error("no candles for {coin}/{currency} under {path}")]
    NoData {
        coin: String,
        currency: String,
        path: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&KestrelError> for std::process::ExitCode {
    fn from(err: &KestrelError) -> Self {
        let code: u8 = match err {
            KestrelError::Io(_) => 1,
            KestrelError::ConfigParse { .. }
            | KestrelError::ConfigMissing { .. }
            | KestrelError::ConfigInvalid { .. } => 2,
            KestrelError::Store { .. } | KestrelError::NoData { .. } | KestrelError::Csv(_) => 3,
            KestrelError::EmptyCandles
            | KestrelError::LowerTimeframe { .. }
            | KestrelError::InsufficientBalance { .. }
            | KestrelError::TooManySignals { .. }
            | KestrelError::UnknownParameter { .. } => 4,
            KestrelError::InvalidTimeframe { .. }
            | KestrelError::UnknownCoin { .. }
            | KestrelError::MixedCandles { .. }
            | KestrelError::InconsistentMapping { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
