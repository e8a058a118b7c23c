use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// One OHLCV bar. Produced by a market data source, immutable once validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalDirection {
    Buy,
    Sell,
}

impl SignalDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalDirection::Buy => "buy",
            SignalDirection::Sell => "sell",
        }
    }
}

impl FromStr for SignalDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(SignalDirection::Buy),
            "sell" => Ok(SignalDirection::Sell),
            other => Err(anyhow!("Unknown signal direction '{}'", other)),
        }
    }
}

/// A timestamped trade directive emitted by a strategy at one point of the
/// series. Consumed once by the engine, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: DateTime<Utc>,
    pub direction: SignalDirection,
    pub price: f64,
    pub confidence: f64,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Buy => "buy",
            TradeType::Sell => "sell",
        }
    }
}

/// One executed order with realized costs. Created only by the engine and
/// appended to an ordered trade log that is never reordered within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub timestamp: DateTime<Utc>,
    pub trade_type: TradeType,
    pub quantity: i64,
    pub price: f64,
    pub commission: f64,
    pub slippage: f64,
}

impl Trade {
    /// Total cash impact of the trade: positive for buys (money out),
    /// negative for sells (money in). Slippage is already signed.
    pub fn total_cost(&self) -> f64 {
        match self.trade_type {
            TradeType::Buy => {
                self.quantity as f64 * (self.price + self.slippage) + self.commission
            }
            TradeType::Sell => {
                -(self.quantity as f64 * (self.price + self.slippage) - self.commission)
            }
        }
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trade({} {} @ {:.2})",
            self.trade_type.as_str(),
            self.quantity,
            self.price
        )
    }
}
