use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failures surfaced by strategy construction, indicator calculation and the
/// market data boundary. Execution rejections (insufficient capital or
/// position) are not errors; they are reported through the boolean return of
/// `BacktestEngine::execute_signal`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("missing required parameter `{0}`")]
    MissingParameter(String),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("unknown strategy template `{0}`")]
    UnknownStrategy(String),

    #[error("not enough data points: need at least {required}, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("invalid symbol `{0}`")]
    InvalidSymbol(String),

    #[error("invalid interval `{0}`")]
    InvalidInterval(String),

    #[error("start date {start} must be before end date {end}")]
    InvalidDateRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("no data received for {symbol} from {start} to {end}")]
    NoData {
        symbol: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl EngineError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        EngineError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
