use crate::error::{EngineError, Result};
use crate::indicators::{self, IndicatorSet, IndicatorView};
use crate::models::{Candle, Signal};
use crate::param_utils::{ensure_required_params, get_param_bool, require_positive_int_param};
use crate::strategy_utils::{buy_signal, crossed_above, crossed_below, sell_signal};
use serde_json::json;
use std::collections::HashMap;

const REQUIRED_PARAMS: &[&str] = &["fast_period", "slow_period", "signal_period"];

/// Zero-line crossings confirm a trend change but carry less information
/// than a signal-line crossover, so their confidence is capped lower.
const ZERO_CROSS_CONFIDENCE_CAP: f64 = 0.8;

/// MACD: BUY/SELL on the MACD line crossing the signal line, with optional
/// lower-confidence signals on the line crossing zero.
#[derive(Debug)]
pub struct MacdStrategy {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
    use_zero_cross: bool,
}

impl MacdStrategy {
    pub fn from_params(parameters: &HashMap<String, f64>) -> Result<Self> {
        let fast_period = require_positive_int_param(parameters, "fast_period", 12)?;
        let slow_period = require_positive_int_param(parameters, "slow_period", 26)?;
        let signal_period = require_positive_int_param(parameters, "signal_period", 9)?;
        let use_zero_cross = get_param_bool(parameters, "use_zero_cross", true);

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
            signal_period,
            use_zero_cross,
        })
    }

    pub fn validate_config(parameters: &HashMap<String, f64>) -> Result<()> {
        ensure_required_params(parameters, REQUIRED_PARAMS)?;
        Self::from_params(parameters).map(|_| ())
    }

    fn crossover_confidence(&self, macd: f64, signal: f64, price: f64) -> f64 {
        ((macd - signal).abs() / price * 1000.0).min(1.0)
    }

    fn zero_cross_confidence(&self, macd: f64, price: f64) -> f64 {
        (macd.abs() / price * 1000.0).min(ZERO_CROSS_CONFIDENCE_CAP)
    }
}

impl super::Strategy for MacdStrategy {
    fn name(&self) -> &str {
        "macd"
    }

    fn calculate_indicators(&self, candles: &[Candle]) -> Result<IndicatorSet> {
        if candles.len() < self.min_data_points() {
            return Err(EngineError::InsufficientData {
                required: self.min_data_points(),
                actual: candles.len(),
            });
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let output = indicators::calculate_macd(
            &closes,
            self.fast_period,
            self.slow_period,
            self.signal_period,
        );

        let mut set = IndicatorSet::new();
        set.insert("macd_line", output.macd_line);
        set.insert("macd_signal", output.signal_line);
        set.insert("macd_histogram", output.histogram);
        set.insert("fast_ema", output.fast_ema);
        set.insert("slow_ema", output.slow_ema);
        Ok(set)
    }

    fn generate_signal(
        &self,
        candles: &[Candle],
        indicators: &IndicatorView<'_>,
    ) -> Option<Signal> {
        if candles.len() < 2 {
            return None;
        }
        let current = candles.last()?;
        let (previous_macd, current_macd) = indicators.latest_pair("macd_line")?;
        let (previous_signal, current_signal) = indicators.latest_pair("macd_signal")?;

        if [previous_macd, current_macd, previous_signal, current_signal]
            .iter()
            .any(|v| !v.is_finite())
        {
            return None;
        }

        if crossed_above(previous_macd, previous_signal, current_macd, current_signal) {
            let metadata = HashMap::from([
                ("macd_line".to_string(), json!(current_macd)),
                ("macd_signal".to_string(), json!(current_signal)),
                ("crossover_type".to_string(), json!("bullish")),
            ]);
            return Some(buy_signal(
                current.timestamp,
                current.close,
                self.crossover_confidence(current_macd, current_signal, current.close),
                metadata,
            ));
        }

        if crossed_below(previous_macd, previous_signal, current_macd, current_signal) {
            let metadata = HashMap::from([
                ("macd_line".to_string(), json!(current_macd)),
                ("macd_signal".to_string(), json!(current_signal)),
                ("crossover_type".to_string(), json!("bearish")),
            ]);
            return Some(sell_signal(
                current.timestamp,
                current.close,
                self.crossover_confidence(current_macd, current_signal, current.close),
                metadata,
            ));
        }

        if self.use_zero_cross {
            if previous_macd <= 0.0 && current_macd > 0.0 {
                let metadata = HashMap::from([
                    ("macd_line".to_string(), json!(current_macd)),
                    ("crossover_type".to_string(), json!("zero_line_bullish")),
                ]);
                return Some(buy_signal(
                    current.timestamp,
                    current.close,
                    self.zero_cross_confidence(current_macd, current.close),
                    metadata,
                ));
            }

            if previous_macd >= 0.0 && current_macd < 0.0 {
                let metadata = HashMap::from([
                    ("macd_line".to_string(), json!(current_macd)),
                    ("crossover_type".to_string(), json!("zero_line_bearish")),
                ]);
                return Some(sell_signal(
                    current.timestamp,
                    current.close,
                    self.zero_cross_confidence(current_macd, current.close),
                    metadata,
                ));
            }
        }

        None
    }

    fn required_params(&self) -> &'static [&'static str] {
        REQUIRED_PARAMS
    }

    fn min_data_points(&self) -> usize {
        self.fast_period.max(self.slow_period) + self.signal_period
    }
}
