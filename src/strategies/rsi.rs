use crate::error::{EngineError, Result};
use crate::indicators::{self, IndicatorSet, IndicatorView};
use crate::models::{Candle, Signal};
use crate::param_utils::{
    ensure_required_params, get_param_bool, require_finite_param, require_positive_int_param,
};
use crate::strategy_utils::{buy_signal, sell_signal};
use serde_json::json;
use std::collections::HashMap;

const REQUIRED_PARAMS: &[&str] = &["period", "overbought", "oversold"];

/// Number of bars on each side of a point when scanning for divergences.
const DIVERGENCE_WINDOW: usize = 10;

/// Confidence attached to divergence signals; these flag a pattern rather
/// than measure a distance, so the value is fixed.
const DIVERGENCE_CONFIDENCE: f64 = 0.7;

/// RSI oscillator: BUY when the index crosses down through the oversold
/// threshold, SELL when it crosses up through the overbought threshold.
/// Divergence detection can independently add fixed-confidence signals.
#[derive(Debug)]
pub struct RsiStrategy {
    period: usize,
    overbought: f64,
    oversold: f64,
    use_divergence: bool,
}

impl RsiStrategy {
    pub fn from_params(parameters: &HashMap<String, f64>) -> Result<Self> {
        let period = require_positive_int_param(parameters, "period", 14)?;
        let overbought = require_finite_param(parameters, "overbought", 70.0)?;
        let oversold = require_finite_param(parameters, "oversold", 30.0)?;
        let use_divergence = get_param_bool(parameters, "use_divergence", false);

        if !(overbought > 0.0 && overbought <= 100.0) {
            return Err(EngineError::invalid_parameter(
                "overbought",
                "must be between 0 and 100",
            ));
        }
        if !(oversold >= 0.0 && oversold < 100.0) {
            return Err(EngineError::invalid_parameter(
                "oversold",
                "must be between 0 and 100",
            ));
        }
        if overbought <= oversold {
            return Err(EngineError::invalid_parameter(
                "overbought",
                format!("must be greater than oversold ({} <= {})", overbought, oversold),
            ));
        }

        Ok(Self {
            period,
            overbought,
            oversold,
            use_divergence,
        })
    }

    pub fn validate_config(parameters: &HashMap<String, f64>) -> Result<()> {
        ensure_required_params(parameters, REQUIRED_PARAMS)?;
        Self::from_params(parameters).map(|_| ())
    }
}

impl super::Strategy for RsiStrategy {
    fn name(&self) -> &str {
        "rsi"
    }

    fn calculate_indicators(&self, candles: &[Candle]) -> Result<IndicatorSet> {
        if candles.len() < self.min_data_points() {
            return Err(EngineError::InsufficientData {
                required: self.min_data_points(),
                actual: candles.len(),
            });
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let output = indicators::calculate_rsi(&closes, self.period);

        let mut set = IndicatorSet::new();
        if self.use_divergence {
            set.insert(
                "divergence",
                indicators::detect_divergence(&closes, &output.rsi, DIVERGENCE_WINDOW),
            );
        }
        set.insert("rsi", output.rsi);
        set.insert("avg_gain", output.avg_gain);
        set.insert("avg_loss", output.avg_loss);
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
        let (previous_rsi, current_rsi) = indicators.latest_pair("rsi")?;
        if !previous_rsi.is_finite() || !current_rsi.is_finite() {
            return None;
        }

        // Crossing down through the oversold floor
        if previous_rsi >= self.oversold && current_rsi < self.oversold {
            let confidence = ((self.oversold - current_rsi) / self.oversold).min(1.0);
            let metadata = HashMap::from([
                ("rsi".to_string(), json!(current_rsi)),
                ("threshold".to_string(), json!(self.oversold)),
                ("signal_type".to_string(), json!("oversold_entry")),
            ]);
            return Some(buy_signal(
                current.timestamp,
                current.close,
                confidence,
                metadata,
            ));
        }

        // Crossing up through the overbought ceiling
        if previous_rsi <= self.overbought && current_rsi > self.overbought {
            let confidence =
                ((current_rsi - self.overbought) / (100.0 - self.overbought)).min(1.0);
            let metadata = HashMap::from([
                ("rsi".to_string(), json!(current_rsi)),
                ("threshold".to_string(), json!(self.overbought)),
                ("signal_type".to_string(), json!("overbought_entry")),
            ]);
            return Some(sell_signal(
                current.timestamp,
                current.close,
                confidence,
                metadata,
            ));
        }

        if self.use_divergence {
            match indicators.latest("divergence") {
                Some(flag) if flag == 1.0 => {
                    let metadata = HashMap::from([
                        ("rsi".to_string(), json!(current_rsi)),
                        ("signal_type".to_string(), json!("bullish_divergence")),
                    ]);
                    return Some(buy_signal(
                        current.timestamp,
                        current.close,
                        DIVERGENCE_CONFIDENCE,
                        metadata,
                    ));
                }
                Some(flag) if flag == -1.0 => {
                    let metadata = HashMap::from([
                        ("rsi".to_string(), json!(current_rsi)),
                        ("signal_type".to_string(), json!("bearish_divergence")),
                    ]);
                    return Some(sell_signal(
                        current.timestamp,
                        current.close,
                        DIVERGENCE_CONFIDENCE,
                        metadata,
                    ));
                }
                _ => {}
            }
        }

        None
    }

    fn required_params(&self) -> &'static [&'static str] {
        REQUIRED_PARAMS
    }

    fn min_data_points(&self) -> usize {
        self.period + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SignalDirection;
    use crate::strategy::Strategy;
    use chrono::{Duration, TimeZone, Utc};

    fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2023, 3, 1, 9, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: start + Duration::hours(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000,
            })
            .collect()
    }

    fn params(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), *value))
            .collect()
    }

    #[test]
    fn construction_enforces_threshold_ordering_and_bounds() {
        assert!(RsiStrategy::from_params(&params(&[
            ("overbought", 30.0),
            ("oversold", 70.0)
        ]))
        .is_err());
        assert!(RsiStrategy::from_params(&params(&[("overbought", 120.0)])).is_err());
        assert!(RsiStrategy::from_params(&params(&[("oversold", -5.0)])).is_err());
        assert!(RsiStrategy::from_params(&params(&[("period", 0.0)])).is_err());
        assert!(RsiStrategy::from_params(&HashMap::new()).is_ok());
    }

    #[test]
    fn indicators_require_period_plus_one_points() {
        let strategy = RsiStrategy::from_params(&params(&[("period", 14.0)])).unwrap();
        let candles = candles_from_closes(&vec![100.0; 14]);
        let err = strategy.calculate_indicators(&candles).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientData {
                required: 15,
                actual: 14
            }
        ));
    }

    #[test]
    fn rising_series_reports_rsi_near_100_and_no_buy() {
        let strategy = RsiStrategy::from_params(&HashMap::new()).unwrap();
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let candles = candles_from_closes(&closes);
        let set = strategy.calculate_indicators(&candles).unwrap();
        let rsi = set.get("rsi").unwrap();
        assert!((rsi.last().unwrap() - 100.0).abs() < 1e-9);
        assert!(strategy
            .generate_signal(&candles, &set.up_to(candles.len()))
            .is_none());
    }

    #[test]
    fn crossing_down_through_oversold_buys() {
        let strategy = RsiStrategy::from_params(&HashMap::new()).unwrap();
        let candles = candles_from_closes(&[100.0, 95.0]);

        let mut set = IndicatorSet::new();
        set.insert("rsi", vec![32.0, 25.0]);

        let signal = strategy
            .generate_signal(&candles, &set.up_to(2))
            .expect("oversold cross should signal");
        assert_eq!(signal.direction, SignalDirection::Buy);
        let expected = ((30.0f64 - 25.0) / 30.0).min(1.0);
        assert!((signal.confidence - expected).abs() < 1e-9);
        assert_eq!(signal.metadata["signal_type"], "oversold_entry");
    }

    #[test]
    fn crossing_up_through_overbought_sells() {
        let strategy = RsiStrategy::from_params(&HashMap::new()).unwrap();
        let candles = candles_from_closes(&[100.0, 105.0]);

        let mut set = IndicatorSet::new();
        set.insert("rsi", vec![68.0, 76.0]);

        let signal = strategy
            .generate_signal(&candles, &set.up_to(2))
            .expect("overbought cross should signal");
        assert_eq!(signal.direction, SignalDirection::Sell);
        let expected = ((76.0f64 - 70.0) / 30.0).min(1.0);
        assert!((signal.confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn staying_inside_the_band_is_silent() {
        let strategy = RsiStrategy::from_params(&HashMap::new()).unwrap();
        let candles = candles_from_closes(&[100.0, 101.0]);

        let mut set = IndicatorSet::new();
        set.insert("rsi", vec![55.0, 60.0]);
        assert!(strategy.generate_signal(&candles, &set.up_to(2)).is_none());
    }

    #[test]
    fn divergence_flag_produces_fixed_confidence_signal() {
        let strategy =
            RsiStrategy::from_params(&params(&[("use_divergence", 1.0)])).unwrap();
        let candles = candles_from_closes(&[100.0, 101.0]);

        let mut set = IndicatorSet::new();
        set.insert("rsi", vec![55.0, 60.0]);
        set.insert("divergence", vec![0.0, 1.0]);

        let signal = strategy
            .generate_signal(&candles, &set.up_to(2))
            .expect("bullish divergence should signal");
        assert_eq!(signal.direction, SignalDirection::Buy);
        assert!((signal.confidence - DIVERGENCE_CONFIDENCE).abs() < 1e-9);
        assert_eq!(signal.metadata["signal_type"], "bullish_divergence");
    }
}
