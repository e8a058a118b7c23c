use crate::error::Result;
use crate::indicators::{self, IndicatorSet, IndicatorView};
use crate::models::{Candle, Signal};
use crate::param_utils::{ensure_required_params, require_positive_int_param};
use crate::strategy_utils::{buy_signal, crossed_above, crossed_below, sell_signal};
use serde_json::json;
use std::collections::HashMap;

use crate::error::EngineError;

const REQUIRED_PARAMS: &[&str] = &["fast_period", "slow_period"];

/// Moving-average crossover: BUY when the fast SMA crosses above the slow
/// SMA, SELL on the downward cross, nothing otherwise.
#[derive(Debug)]
pub struct SimpleMaStrategy {
    fast_period: usize,
    slow_period: usize,
}

impl SimpleMaStrategy {
    pub fn from_params(parameters: &HashMap<String, f64>) -> Result<Self> {
        let fast_period = require_positive_int_param(parameters, "fast_period", 10)?;
        let slow_period = require_positive_int_param(parameters, "slow_period", 20)?;
        if fast_period >= slow_period {
            return Err(EngineError::invalid_parameter(
                "fast_period",
                format!(
                    "must be less than slow_period ({} >= {})",
                    fast_period, slow_period
                ),
            ));
        }
        Ok(Self {
            fast_period,
            slow_period,
        })
    }

    pub fn validate_config(parameters: &HashMap<String, f64>) -> Result<()> {
        ensure_required_params(parameters, REQUIRED_PARAMS)?;
        Self::from_params(parameters).map(|_| ())
    }
}

impl super::Strategy for SimpleMaStrategy {
    fn name(&self) -> &str {
        "simple_ma"
    }

    fn calculate_indicators(&self, candles: &[Candle]) -> Result<IndicatorSet> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

        let mut set = IndicatorSet::new();
        set.insert("fast_sma", indicators::calculate_sma(&closes, self.fast_period));
        set.insert("slow_sma", indicators::calculate_sma(&closes, self.slow_period));
        Ok(set)
    }

    fn generate_signal(
        &self,
        candles: &[Candle],
        indicators: &IndicatorView<'_>,
    ) -> Option<Signal> {
        let current = candles.last()?;
        let (prev_fast, current_fast) = indicators.latest_pair("fast_sma")?;
        let (prev_slow, current_slow) = indicators.latest_pair("slow_sma")?;

        if !prev_fast.is_finite()
            || !prev_slow.is_finite()
            || !current_fast.is_finite()
            || !current_slow.is_finite()
        {
            return None;
        }

        let confidence = ((current_fast - current_slow).abs() / current_slow).min(1.0);

        if crossed_above(prev_fast, prev_slow, current_fast, current_slow) {
            let metadata = HashMap::from([
                ("fast_sma".to_string(), json!(current_fast)),
                ("slow_sma".to_string(), json!(current_slow)),
                ("crossover_type".to_string(), json!("bullish")),
            ]);
            return Some(buy_signal(
                current.timestamp,
                current.close,
                confidence,
                metadata,
            ));
        }

        if crossed_below(prev_fast, prev_slow, current_fast, current_slow) {
            let metadata = HashMap::from([
                ("fast_sma".to_string(), json!(current_fast)),
                ("slow_sma".to_string(), json!(current_slow)),
                ("crossover_type".to_string(), json!("bearish")),
            ]);
            return Some(sell_signal(
                current.timestamp,
                current.close,
                confidence,
                metadata,
            ));
        }

        None
    }

    fn required_params(&self) -> &'static [&'static str] {
        REQUIRED_PARAMS
    }

    fn min_data_points(&self) -> usize {
        // Short series simply yield all-NaN averages and no signals.
        0
    }
}
