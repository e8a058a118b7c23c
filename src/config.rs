use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Engine-level cost and capital configuration. Validated once, at engine
/// construction; malformed values never reach a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub slippage_rate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            commission_rate: 0.001,
            slippage_rate: 0.0001,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(EngineError::invalid_parameter(
                "initial_capital",
                "must be a positive number",
            ));
        }
        if !self.commission_rate.is_finite() || self.commission_rate < 0.0 {
            return Err(EngineError::invalid_parameter(
                "commission_rate",
                "must be non-negative",
            ));
        }
        if !self.slippage_rate.is_finite() || self.slippage_rate < 0.0 {
            return Err(EngineError::invalid_parameter(
                "slippage_rate",
                "must be non-negative",
            ));
        }
        Ok(())
    }
}

/// How order quantities are derived from available capital and price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum PositionSizing {
    /// quantity = floor(amount / price)
    Fixed { amount: f64 },
    /// quantity = floor(current_capital * fraction / price)
    Percentage { fraction: f64 },
}

impl Default for PositionSizing {
    fn default() -> Self {
        PositionSizing::Fixed { amount: 10_000.0 }
    }
}

impl PositionSizing {
    pub fn label(&self) -> &'static str {
        match self {
            PositionSizing::Fixed { .. } => "fixed",
            PositionSizing::Percentage { .. } => "percentage",
        }
    }
}
