use crate::models::Candle;
use chrono::{DateTime, Duration, Utc};

/// Structural checks on candle data before it reaches a strategy.
pub struct DataValidator;

impl DataValidator {
    /// Prices must be positive, volume non-negative, and the open/close must
    /// sit inside the low..=high range. NaN prices fail the comparisons.
    pub fn validate_ohlcv(candle: &Candle) -> bool {
        let prices_positive = candle.open > 0.0
            && candle.high > 0.0
            && candle.low > 0.0
            && candle.close > 0.0;
        let range_consistent = candle.low <= candle.open
            && candle.open <= candle.high
            && candle.low <= candle.close
            && candle.close <= candle.high;
        prices_positive && range_consistent && candle.volume >= 0
    }

    /// Keeps only the candles that pass `validate_ohlcv`.
    pub fn clean(data: &[Candle]) -> Vec<Candle> {
        let cleaned: Vec<Candle> = data
            .iter()
            .filter(|c| Self::validate_ohlcv(c))
            .cloned()
            .collect();
        let dropped = data.len() - cleaned.len();
        if dropped > 0 {
            log::warn!("dropped {} invalid candles out of {}", dropped, data.len());
        }
        cleaned
    }

    /// Returns the indices where the delta from the previous timestamp
    /// exceeds 1.5x the expected interval.
    pub fn detect_gaps(timestamps: &[DateTime<Utc>], expected: Duration) -> Vec<usize> {
        let tolerance = expected.num_seconds() as f64 * 1.5;
        timestamps
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| (pair[1] - pair[0]).num_seconds() as f64 > tolerance)
            .map(|(i, _)| i + 1)
            .collect()
    }
}
