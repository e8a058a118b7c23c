use crate::config::{EngineConfig, PositionSizing};
use crate::error::Result;
use crate::models::{Candle, Signal, SignalDirection, Trade, TradeType};
use crate::performance::{BacktestMetrics, PerformanceCalculator};
use crate::strategy::Strategy;
use log::debug;

/// Replays a price series through a strategy, executes the resulting signals
/// against a simulated long-only account, and aggregates the trade log into
/// performance metrics.
///
/// Each engine instance owns its account state exclusively; concurrent
/// backtests need separate instances. A run is deterministic for a given
/// (strategy, series, sizing) combination.
pub struct BacktestEngine {
    config: EngineConfig,
    current_capital: f64,
    current_position: i64,
    trades: Vec<Trade>,
    max_capital: f64,
    max_drawdown: f64,
}

impl BacktestEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            current_capital: config.initial_capital,
            current_position: 0,
            trades: Vec::new(),
            max_capital: config.initial_capital,
            max_drawdown: 0.0,
            config,
        })
    }

    /// Restore all mutable account state to its initial values.
    pub fn reset(&mut self) {
        self.current_capital = self.config.initial_capital;
        self.current_position = 0;
        self.trades.clear();
        self.max_capital = self.config.initial_capital;
        self.max_drawdown = 0.0;
    }

    pub fn current_capital(&self) -> f64 {
        self.current_capital
    }

    pub fn current_position(&self) -> i64 {
        self.current_position
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Execute a signal against the account. Returns whether the order was
    /// filled; rejections (non-positive sizing, insufficient capital or
    /// position) are normal market conditions, not errors, and leave the
    /// account untouched.
    pub fn execute_signal(&mut self, signal: &Signal, sizing: &PositionSizing) -> bool {
        match signal.direction {
            SignalDirection::Buy => self.execute_buy(signal, sizing),
            SignalDirection::Sell => self.execute_sell(signal, sizing),
        }
    }

    fn execute_buy(&mut self, signal: &Signal, sizing: &PositionSizing) -> bool {
        let quantity = self.position_size(signal.price, sizing);
        if quantity <= 0 {
            return false;
        }

        let commission = self.commission(quantity, signal.price);
        let slippage = signal.price * self.config.slippage_rate;
        let total_cost = quantity as f64 * (signal.price + slippage) + commission;

        if total_cost > self.current_capital {
            debug!(
                "buy rejected: cost {:.2} exceeds capital {:.2}",
                total_cost, self.current_capital
            );
            return false;
        }

        self.trades.push(Trade {
            timestamp: signal.timestamp,
            trade_type: TradeType::Buy,
            quantity,
            price: signal.price,
            commission,
            slippage,
        });
        self.current_capital -= total_cost;
        self.current_position += quantity;

        true
    }

    fn execute_sell(&mut self, signal: &Signal, sizing: &PositionSizing) -> bool {
        let quantity = self.position_size(signal.price, sizing);
        if quantity <= 0 || quantity > self.current_position {
            debug!(
                "sell rejected: quantity {} vs position {}",
                quantity, self.current_position
            );
            return false;
        }

        let commission = self.commission(quantity, signal.price);
        let slippage = -signal.price * self.config.slippage_rate;
        let total_proceeds = quantity as f64 * (signal.price + slippage) - commission;

        self.trades.push(Trade {
            timestamp: signal.timestamp,
            trade_type: TradeType::Sell,
            quantity,
            price: signal.price,
            commission,
            slippage,
        });
        self.current_capital += total_proceeds;
        self.current_position -= quantity;

        // Cash drawdown is tracked against the high-water mark whenever a
        // round trip completes.
        if self.current_capital > self.max_capital {
            self.max_capital = self.current_capital;
        }
        let current_drawdown = (self.max_capital - self.current_capital) / self.max_capital;
        if current_drawdown > self.max_drawdown {
            self.max_drawdown = current_drawdown;
        }

        true
    }

    fn position_size(&self, price: f64, sizing: &PositionSizing) -> i64 {
        if price <= 0.0 {
            return 0;
        }
        match sizing {
            PositionSizing::Fixed { amount } => (amount / price).floor() as i64,
            PositionSizing::Percentage { fraction } => {
                (self.current_capital * fraction / price).floor() as i64
            }
        }
    }

    fn commission(&self, quantity: i64, price: f64) -> f64 {
        quantity as f64 * price * self.config.commission_rate
    }

    /// Run a full backtest: indicators are computed once over the whole
    /// series, then each step sees only the prefix of prices and indicator
    /// values up to its own index.
    pub fn run_backtest(
        &mut self,
        strategy: &dyn Strategy,
        candles: &[Candle],
        sizing: &PositionSizing,
    ) -> Result<BacktestMetrics> {
        self.reset();

        let indicators = strategy.calculate_indicators(candles)?;

        for i in 0..candles.len() {
            let visible = indicators.up_to(i + 1);
            if let Some(signal) = strategy.generate_signal(&candles[..=i], &visible) {
                self.execute_signal(&signal, sizing);
            }
        }

        Ok(self.calculate_performance_metrics())
    }

    pub fn calculate_performance_metrics(&self) -> BacktestMetrics {
        PerformanceCalculator::calculate(
            &self.trades,
            self.config.initial_capital,
            self.current_capital,
            self.max_drawdown,
            self.current_position,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::HashMap;

    fn ts(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 4, 3, 9, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn signal(direction: SignalDirection, price: f64, hour: i64) -> Signal {
        Signal {
            timestamp: ts(hour),
            direction,
            price,
            confidence: 1.0,
            metadata: HashMap::new(),
        }
    }

    fn engine_with(initial_capital: f64, commission_rate: f64, slippage_rate: f64) -> BacktestEngine {
        BacktestEngine::new(EngineConfig {
            initial_capital,
            commission_rate,
            slippage_rate,
        })
        .unwrap()
    }

    #[test]
    fn construction_rejects_invalid_config() {
        assert!(BacktestEngine::new(EngineConfig {
            initial_capital: -1.0,
            ..EngineConfig::default()
        })
        .is_err());
    }

    #[test]
    fn buy_debits_cash_and_credits_position() {
        let mut engine = engine_with(100_000.0, 0.001, 0.0);
        let sizing = PositionSizing::Fixed { amount: 10_000.0 };
        let filled = engine.execute_signal(&signal(SignalDirection::Buy, 100.0, 0), &sizing);
        assert!(filled);
        assert_eq!(engine.current_position(), 100);
        // 100 shares * 100.0 + 10.0 commission
        assert!((engine.current_capital() - (100_000.0 - 10_010.0)).abs() < 1e-9);
        assert_eq!(engine.trades().len(), 1);
    }

    #[test]
    fn buy_slippage_raises_the_effective_price() {
        let mut engine = engine_with(100_000.0, 0.0, 0.01);
        let sizing = PositionSizing::Fixed { amount: 1_000.0 };
        assert!(engine.execute_signal(&signal(SignalDirection::Buy, 100.0, 0), &sizing));
        // 10 shares at 100 + 1.0 slippage each
        assert!((engine.current_capital() - (100_000.0 - 1_010.0)).abs() < 1e-9);
    }

    #[test]
    fn buy_is_rejected_when_cost_exceeds_capital() {
        let mut engine = engine_with(1_000.0, 0.001, 0.0001);
        let sizing = PositionSizing::Fixed { amount: 50_000.0 };
        let filled = engine.execute_signal(&signal(SignalDirection::Buy, 1_000.0, 0), &sizing);
        assert!(!filled);
        assert!(engine.trades().is_empty());
        assert_eq!(engine.current_position(), 0);
        assert!((engine.current_capital() - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn sell_without_position_is_rejected() {
        let mut engine = engine_with(100_000.0, 0.001, 0.0001);
        let sizing = PositionSizing::Fixed { amount: 10_000.0 };
        let filled = engine.execute_signal(&signal(SignalDirection::Sell, 100.0, 0), &sizing);
        assert!(!filled);
        assert!(engine.trades().is_empty());
    }

    #[test]
    fn sell_larger_than_position_is_rejected_not_capped() {
        let mut engine = engine_with(100_000.0, 0.0, 0.0);
        let buy_sizing = PositionSizing::Fixed { amount: 1_000.0 };
        assert!(engine.execute_signal(&signal(SignalDirection::Buy, 100.0, 0), &buy_sizing));
        assert_eq!(engine.current_position(), 10);

        let sell_sizing = PositionSizing::Fixed { amount: 5_000.0 };
        assert!(!engine.execute_signal(&signal(SignalDirection::Sell, 100.0, 1), &sell_sizing));
        assert_eq!(engine.current_position(), 10);
        assert_eq!(engine.trades().len(), 1);
    }

    #[test]
    fn percentage_sizing_uses_current_capital() {
        let mut engine = engine_with(50_000.0, 0.0, 0.0);
        let sizing = PositionSizing::Percentage { fraction: 0.1 };
        assert!(engine.execute_signal(&signal(SignalDirection::Buy, 100.0, 0), &sizing));
        // floor(50_000 * 0.1 / 100) = 50 shares
        assert_eq!(engine.current_position(), 50);
    }

    #[test]
    fn losing_round_trip_registers_drawdown() {
        let mut engine = engine_with(100_000.0, 0.0, 0.0);
        let sizing = PositionSizing::Fixed { amount: 10_000.0 };
        assert!(engine.execute_signal(&signal(SignalDirection::Buy, 100.0, 0), &sizing));
        // 100 shares sold at 90: capital ends at 99_000
        let sell_sizing = PositionSizing::Fixed { amount: 9_000.0 };
        assert!(engine.execute_signal(&signal(SignalDirection::Sell, 90.0, 1), &sell_sizing));

        let metrics = engine.calculate_performance_metrics();
        assert!((metrics.max_drawdown - 0.01).abs() < 1e-9);
        assert!((metrics.final_capital - 99_000.0).abs() < 1e-9);
        assert_eq!(metrics.losing_trades, 1);
    }

    #[test]
    fn reset_restores_the_initial_account() {
        let mut engine = engine_with(100_000.0, 0.001, 0.0);
        let sizing = PositionSizing::Fixed { amount: 10_000.0 };
        assert!(engine.execute_signal(&signal(SignalDirection::Buy, 100.0, 0), &sizing));
        engine.reset();
        assert!((engine.current_capital() - 100_000.0).abs() < 1e-9);
        assert_eq!(engine.current_position(), 0);
        assert!(engine.trades().is_empty());
        let metrics = engine.calculate_performance_metrics();
        assert_eq!(metrics.total_trades, 0);
        assert!((metrics.max_drawdown - 0.0).abs() < 1e-12);
    }
}
