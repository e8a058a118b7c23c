use crate::models::{Signal, SignalDirection};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// True when `a` moved from at-or-below `b` to strictly above it between two
/// consecutive samples. NaN on either side never counts as a crossing.
pub fn crossed_above(prev_a: f64, prev_b: f64, current_a: f64, current_b: f64) -> bool {
    prev_a <= prev_b && current_a > current_b
}

/// Downward mirror of [`crossed_above`].
pub fn crossed_below(prev_a: f64, prev_b: f64, current_a: f64, current_b: f64) -> bool {
    prev_a >= prev_b && current_a < current_b
}

/// Build a buy signal with the given confidence and metadata
pub fn buy_signal(
    timestamp: DateTime<Utc>,
    price: f64,
    confidence: f64,
    metadata: HashMap<String, Value>,
) -> Signal {
    Signal {
        timestamp,
        direction: SignalDirection::Buy,
        price,
        confidence,
        metadata,
    }
}

/// Build a sell signal with the given confidence and metadata
pub fn sell_signal(
    timestamp: DateTime<Utc>,
    price: f64,
    confidence: f64,
    metadata: HashMap<String, Value>,
) -> Signal {
    Signal {
        timestamp,
        direction: SignalDirection::Sell,
        price,
        confidence,
        metadata,
    }
}
