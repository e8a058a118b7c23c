use crate::error::{EngineError, Result};
use crate::indicators::{IndicatorSet, IndicatorView};
use crate::models::{Candle, Signal};
use std::collections::HashMap;

/// Capability contract shared by all strategy variants. The engine only ever
/// talks to this trait, so new variants extend the set without engine
/// changes.
///
/// `calculate_indicators` is pure and deterministic; it fails with
/// `EngineError::InsufficientData` when the series is shorter than the
/// minimum window the math needs. `generate_signal` sees only the price
/// series truncated to the current index and a matching [`IndicatorView`],
/// and returns at most one signal. Configuration is validated when the
/// strategy is constructed, never during signal generation.
pub trait Strategy: std::fmt::Debug {
    fn name(&self) -> &str;
    fn calculate_indicators(&self, candles: &[Candle]) -> Result<IndicatorSet>;
    fn generate_signal(&self, candles: &[Candle], indicators: &IndicatorView<'_>)
        -> Option<Signal>;
    fn required_params(&self) -> &'static [&'static str];
    /// Shortest series for which `calculate_indicators` succeeds.
    fn min_data_points(&self) -> usize;
}

#[path = "strategies/simple_ma.rs"]
pub mod simple_ma;

pub use simple_ma::SimpleMaStrategy;

#[path = "strategies/rsi.rs"]
pub mod rsi;

pub use rsi::RsiStrategy;

#[path = "strategies/macd.rs"]
pub mod macd;

pub use macd::MacdStrategy;

pub const STRATEGY_NAMES: &[&str] = &["simple_ma", "rsi", "macd"];

pub fn create_strategy(
    name: &str,
    parameters: &HashMap<String, f64>,
) -> Result<Box<dyn Strategy + Send + Sync>> {
    match name {
        "simple_ma" => Ok(Box::new(SimpleMaStrategy::from_params(parameters)?)),
        "rsi" => Ok(Box::new(RsiStrategy::from_params(parameters)?)),
        "macd" => Ok(Box::new(MacdStrategy::from_params(parameters)?)),
        other => Err(EngineError::UnknownStrategy(other.to_string())),
    }
}
