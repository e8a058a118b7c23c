use std::collections::HashMap;

/// Named indicator series computed once over a whole price series. Every
/// series is aligned to the input length, with `f64::NAN` marking entries
/// where the lookback window is not yet filled.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSet {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|values| values.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|name| name.as_str())
    }

    /// A view exposing at most the first `visible` entries of each series.
    /// Strategies only ever receive such views during a backtest, so values
    /// past the current index cannot leak into signal generation.
    pub fn up_to(&self, visible: usize) -> IndicatorView<'_> {
        IndicatorView { set: self, visible }
    }
}

/// Causally truncated window over an [`IndicatorSet`].
#[derive(Debug, Clone, Copy)]
pub struct IndicatorView<'a> {
    set: &'a IndicatorSet,
    visible: usize,
}

impl<'a> IndicatorView<'a> {
    pub fn series(&self, name: &str) -> Option<&'a [f64]> {
        self.set
            .get(name)
            .map(|values| &values[..values.len().min(self.visible)])
    }

    pub fn latest(&self, name: &str) -> Option<f64> {
        self.series(name).and_then(|values| values.last().copied())
    }

    /// Previous and current value of a series, if at least two are visible.
    /// Either may be NaN; callers decide how to treat unfilled windows.
    pub fn latest_pair(&self, name: &str) -> Option<(f64, f64)> {
        let values = self.series(name)?;
        if values.len() < 2 {
            return None;
        }
        Some((values[values.len() - 2], values[values.len() - 1]))
    }
}

/// Trailing simple moving average, NaN until the window fills.
pub fn calculate_sma(prices: &[f64], period: usize) -> Vec<f64> {
    let mut sma_values = vec![f64::NAN; prices.len()];
    if period == 0 || prices.len() < period {
        return sma_values;
    }

    let mut window_sum: f64 = prices[..period].iter().sum();
    sma_values[period - 1] = window_sum / period as f64;
    for i in period..prices.len() {
        window_sum += prices[i] - prices[i - period];
        sma_values[i] = window_sum / period as f64;
    }

    sma_values
}

/// Exponential moving average seeded with the simple average of the first
/// `period` prices; NaN before the seed.
pub fn calculate_ema(prices: &[f64], period: usize) -> Vec<f64> {
    let mut ema_values = vec![f64::NAN; prices.len()];
    if period == 0 || prices.len() < period {
        return ema_values;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let seed: f64 = prices[..period].iter().sum::<f64>() / period as f64;
    ema_values[period - 1] = seed;
    for i in period..prices.len() {
        ema_values[i] = prices[i] * multiplier + ema_values[i - 1] * (1.0 - multiplier);
    }

    ema_values
}

#[derive(Debug, Clone)]
pub struct MacdOutput {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
    pub fast_ema: Vec<f64>,
    pub slow_ema: Vec<f64>,
}

pub fn calculate_macd(
    prices: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MacdOutput {
    let fast_ema = calculate_ema(prices, fast_period);
    let slow_ema = calculate_ema(prices, slow_period);

    let macd_line: Vec<f64> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(&fast, &slow)| {
            if fast.is_finite() && slow.is_finite() {
                fast - slow
            } else {
                f64::NAN
            }
        })
        .collect();

    // The signal line is an EMA over the defined portion of the MACD line,
    // front-padded so all series stay aligned to the input length.
    let defined: Vec<f64> = macd_line.iter().copied().filter(|v| v.is_finite()).collect();
    let signal_defined = calculate_ema(&defined, signal_period);
    let mut signal_line = vec![f64::NAN; macd_line.len() - signal_defined.len()];
    signal_line.extend(signal_defined);

    let histogram: Vec<f64> = macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(&line, &signal)| {
            if line.is_finite() && signal.is_finite() {
                line - signal
            } else {
                f64::NAN
            }
        })
        .collect();

    MacdOutput {
        macd_line,
        signal_line,
        histogram,
        fast_ema,
        slow_ema,
    }
}

fn rsi_from_avgs(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

#[derive(Debug, Clone)]
pub struct RsiOutput {
    pub rsi: Vec<f64>,
    pub avg_gain: Vec<f64>,
    pub avg_loss: Vec<f64>,
}

/// RSI with Wilder smoothing: simple-average seed over the first `period`
/// price changes, then `avg = (avg * (period - 1) + new) / period`. The
/// first defined value sits at index `period`.
pub fn calculate_rsi(prices: &[f64], period: usize) -> RsiOutput {
    let n = prices.len();
    let mut rsi = vec![f64::NAN; n];
    let mut avg_gains = vec![f64::NAN; n];
    let mut avg_losses = vec![f64::NAN; n];

    if period == 0 || n < period + 1 {
        return RsiOutput {
            rsi,
            avg_gain: avg_gains,
            avg_loss: avg_losses,
        };
    }

    let mut sum_gain = 0.0f64;
    let mut sum_loss = 0.0f64;
    for i in 1..=period {
        let delta = prices[i] - prices[i - 1];
        if delta > 0.0 {
            sum_gain += delta;
        } else {
            sum_loss += -delta;
        }
    }

    let mut avg_gain = sum_gain / period as f64;
    let mut avg_loss = sum_loss / period as f64;
    rsi[period] = rsi_from_avgs(avg_gain, avg_loss);
    avg_gains[period] = avg_gain;
    avg_losses[period] = avg_loss;

    for i in (period + 1)..n {
        let delta = prices[i] - prices[i - 1];
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { -delta } else { 0.0 };
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
        rsi[i] = rsi_from_avgs(avg_gain, avg_loss);
        avg_gains[i] = avg_gain;
        avg_losses[i] = avg_loss;
    }

    RsiOutput {
        rsi,
        avg_gain: avg_gains,
        avg_loss: avg_losses,
    }
}

/// Flag divergences between price and a bounded oscillator within a
/// symmetric trailing/leading window: -1.0 where price makes the local high
/// but the oscillator does not (bearish), +1.0 for the local-low mirror
/// (bullish), 0.0 elsewhere. The leading half of the window means this
/// series is not causal; strategies using it opt into that explicitly.
pub fn detect_divergence(prices: &[f64], oscillator: &[f64], window: usize) -> Vec<f64> {
    let n = prices.len();
    let mut divergence = vec![0.0; n];
    if window == 0 || n <= 2 * window {
        return divergence;
    }

    for i in window..(n - window) {
        if !oscillator[i].is_finite() {
            continue;
        }

        let price_window = &prices[i - window..i + window];
        let osc_window: Vec<f64> = oscillator[i - window..i + window]
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect();
        if osc_window.len() < window {
            continue;
        }

        let price_max = price_window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let price_min = price_window.iter().copied().fold(f64::INFINITY, f64::min);
        let osc_max = osc_window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let osc_min = osc_window.iter().copied().fold(f64::INFINITY, f64::min);

        if prices[i] == price_max && oscillator[i] < osc_max {
            divergence[i] = -1.0;
        } else if prices[i] == price_min && oscillator[i] > osc_min {
            divergence[i] = 1.0;
        }
    }

    divergence
}
