use chrono::{Duration, TimeZone, Utc};
use std::collections::HashMap;
use stratsim::{
    create_strategy, BacktestEngine, Candle, DataFetcher, DataValidator, EngineConfig,
    MarketDataSource, PositionSizing, Signal, SignalDirection, STRATEGY_NAMES,
};

const SEED: u64 = 42;
const SERIES_HOURS: i64 = 24 * 90;

fn simulated_series() -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2023, 1, 2, 9, 0, 0).unwrap();
    let fetcher = DataFetcher::new("^NSEI", "1h", SEED).unwrap();
    let raw = fetcher
        .fetch(start, start + Duration::hours(SERIES_HOURS))
        .unwrap();
    DataValidator::clean(&raw)
}

fn signal(direction: SignalDirection, price: f64, hour: i64) -> Signal {
    Signal {
        timestamp: Utc.with_ymd_and_hms(2023, 1, 2, 9, 0, 0).unwrap() + Duration::hours(hour),
        direction,
        price,
        confidence: 1.0,
        metadata: HashMap::new(),
    }
}

#[test]
fn crossover_over_empty_series_reports_untouched_capital() {
    let strategy = create_strategy("simple_ma", &HashMap::new()).unwrap();
    let mut engine = BacktestEngine::new(EngineConfig {
        initial_capital: 100_000.0,
        commission_rate: 0.001,
        slippage_rate: 0.0001,
    })
    .unwrap();

    let metrics = engine
        .run_backtest(strategy.as_ref(), &[], &PositionSizing::default())
        .unwrap();

    assert_eq!(metrics.total_trades, 0);
    assert!((metrics.total_return - 0.0).abs() < 1e-12);
    assert!((metrics.final_capital - 100_000.0).abs() < 1e-9);
}

#[test]
fn every_strategy_completes_a_run_with_consistent_metrics() {
    let candles = simulated_series();
    for name in STRATEGY_NAMES {
        let strategy = create_strategy(name, &HashMap::new()).unwrap();
        let mut engine = BacktestEngine::new(EngineConfig::default()).unwrap();
        let metrics = engine
            .run_backtest(strategy.as_ref(), &candles, &PositionSizing::default())
            .unwrap();

        assert_eq!(metrics.total_trades as usize, engine.trades().len());
        assert!((0.0..=1.0).contains(&metrics.win_rate), "{name}");
        assert!((0.0..=1.0).contains(&metrics.max_drawdown), "{name}");
        assert!(metrics.current_position >= 0, "{name}");
        assert!(metrics.total_profit >= 0.0 && metrics.total_loss >= 0.0, "{name}");
        assert!(metrics.final_capital > 0.0, "{name}");
    }
}

#[test]
fn repeated_runs_over_the_same_seed_are_identical() {
    let candles = simulated_series();
    for name in STRATEGY_NAMES {
        let strategy = create_strategy(name, &HashMap::new()).unwrap();
        let mut engine = BacktestEngine::new(EngineConfig::default()).unwrap();
        let first = engine
            .run_backtest(strategy.as_ref(), &candles, &PositionSizing::default())
            .unwrap();
        let second = engine
            .run_backtest(strategy.as_ref(), &candles, &PositionSizing::default())
            .unwrap();

        assert_eq!(first.final_capital.to_bits(), second.final_capital.to_bits());
        assert_eq!(first.total_trades, second.total_trades);
        assert_eq!(first.max_drawdown.to_bits(), second.max_drawdown.to_bits());
    }
}

/// Truncating a whole-series indicator computation must match recomputing
/// over the prefix alone. If these ever diverge, later candles are leaking
/// into earlier signals.
#[test]
fn truncated_indicators_match_prefix_recomputation() {
    let candles = simulated_series();
    let prefixes = [40usize, 100, 500, candles.len()];

    for name in STRATEGY_NAMES {
        let strategy = create_strategy(name, &HashMap::new()).unwrap();
        let full = strategy.calculate_indicators(&candles).unwrap();

        for &n in &prefixes {
            let prefix = match strategy.calculate_indicators(&candles[..n]) {
                Ok(set) => set,
                // Shorter than the strategy minimum; nothing to compare.
                Err(_) => continue,
            };
            let view = full.up_to(n);
            for series_name in prefix.names() {
                let recomputed = prefix.get(series_name).unwrap();
                let truncated = view.series(series_name).unwrap();
                assert_eq!(recomputed.len(), truncated.len(), "{name}/{series_name}");
                for (i, (a, b)) in recomputed.iter().zip(truncated).enumerate() {
                    assert!(
                        (a.is_nan() && b.is_nan()) || a == b,
                        "{name}/{series_name} diverges at {i}: {a} vs {b}"
                    );
                }
            }
        }
    }
}

#[test]
fn round_trip_profit_is_counted_net_of_commissions() {
    let mut engine = BacktestEngine::new(EngineConfig {
        initial_capital: 100_000.0,
        commission_rate: 0.001,
        slippage_rate: 0.0,
    })
    .unwrap();

    // buy 10 @ 1000 (commission 10), sell 10 @ 1100 (commission 11)
    assert!(engine.execute_signal(
        &signal(SignalDirection::Buy, 1_000.0, 0),
        &PositionSizing::Fixed { amount: 10_000.0 }
    ));
    assert!(engine.execute_signal(
        &signal(SignalDirection::Sell, 1_100.0, 1),
        &PositionSizing::Fixed { amount: 11_000.0 }
    ));

    let metrics = engine.calculate_performance_metrics();
    assert_eq!(metrics.total_trades, 2);
    assert_eq!(metrics.winning_trades, 1);
    assert_eq!(metrics.losing_trades, 0);
    assert!((metrics.win_rate - 1.0).abs() < 1e-12);
    assert!((metrics.total_profit - 979.0).abs() < 1e-9);
    assert!((metrics.final_capital - 100_979.0).abs() < 1e-9);
    assert_eq!(metrics.current_position, 0);
}

#[test]
fn percentage_sizing_scales_with_remaining_capital() {
    let mut engine = BacktestEngine::new(EngineConfig {
        initial_capital: 100_000.0,
        commission_rate: 0.0,
        slippage_rate: 0.0,
    })
    .unwrap();
    let sizing = PositionSizing::Percentage { fraction: 0.5 };

    assert!(engine.execute_signal(&signal(SignalDirection::Buy, 100.0, 0), &sizing));
    // 50_000 / 100 = 500 shares, leaving 50_000 cash
    assert_eq!(engine.current_position(), 500);
    assert!(engine.execute_signal(&signal(SignalDirection::Buy, 100.0, 1), &sizing));
    // next buy sizes off the remaining 50_000
    assert_eq!(engine.current_position(), 750);
}
