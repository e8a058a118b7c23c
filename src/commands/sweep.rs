use crate::config::{EngineConfig, PositionSizing};
use crate::engine::BacktestEngine;
use crate::fetcher::{DataFetcher, MarketDataSource};
use crate::performance::BacktestMetrics;
use crate::strategy::{create_strategy, STRATEGY_NAMES};
use crate::validator::DataValidator;
use anyhow::Result;
use chrono::{Duration, Utc};
use log::info;
use rayon::prelude::*;
use std::collections::HashMap;

/// Runs every built-in strategy under both position sizing policies over the
/// same series and prints a ranking by total return.
pub fn run(symbol: &str, interval: &str, days: i64, seed: u64) -> Result<()> {
    let fetcher = DataFetcher::new(symbol, interval, seed)?;
    let end = Utc::now();
    let start = end - Duration::days(days);
    let candles = DataValidator::clean(&fetcher.fetch(start, end)?);
    info!(
        "sweeping {} strategies over {} candles",
        STRATEGY_NAMES.len(),
        candles.len()
    );

    let sizings = [
        PositionSizing::Fixed { amount: 10_000.0 },
        PositionSizing::Percentage { fraction: 0.1 },
    ];
    let runs: Vec<(&str, PositionSizing)> = STRATEGY_NAMES
        .iter()
        .flat_map(|name| sizings.iter().map(move |s| (*name, *s)))
        .collect();

    let mut results: Vec<(String, String, BacktestMetrics)> = runs
        .par_iter()
        .map(|(name, sizing)| -> Result<(String, String, BacktestMetrics)> {
            let strategy = create_strategy(name, &HashMap::new())?;
            let mut engine = BacktestEngine::new(EngineConfig::default())?;
            let metrics = engine.run_backtest(strategy.as_ref(), &candles, sizing)?;
            Ok((name.to_string(), sizing.label().to_string(), metrics))
        })
        .collect::<Result<Vec<_>>>()?;

    results.sort_by(|a, b| {
        b.2.total_return
            .partial_cmp(&a.2.total_return)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    println!(
        "{:<12} {:<12} {:>10} {:>8} {:>8} {:>12}",
        "strategy", "sizing", "return", "trades", "winrate", "drawdown"
    );
    for (name, sizing, metrics) in &results {
        println!(
            "{:<12} {:<12} {:>9.2}% {:>8} {:>7.0}% {:>11.2}%",
            name,
            sizing,
            metrics.total_return * 100.0,
            metrics.total_trades,
            metrics.win_rate * 100.0,
            metrics.max_drawdown * 100.0
        );
    }
    Ok(())
}
