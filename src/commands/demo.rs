use crate::config::{EngineConfig, PositionSizing};
use crate::engine::BacktestEngine;
use crate::fetcher::{DataFetcher, MarketDataSource};
use crate::strategy::create_strategy;
use crate::validator::DataValidator;
use anyhow::Result;
use chrono::{Duration, Utc};
use log::{info, warn};
use std::collections::HashMap;

pub struct DemoOptions {
    pub symbol: String,
    pub interval: String,
    pub days: i64,
    pub seed: u64,
    pub initial_capital: f64,
    pub fixed_amount: f64,
}

pub fn run(
    strategy_name: &str,
    options: &DemoOptions,
    params: &HashMap<String, f64>,
) -> Result<()> {
    let DemoOptions {
        symbol,
        interval,
        days,
        seed,
        initial_capital,
        fixed_amount,
    } = options;
    let fetcher = DataFetcher::new(symbol, interval, *seed)?;
    let end = Utc::now();
    let start = end - Duration::days(*days);

    let raw = fetcher.fetch(start, end)?;
    let candles = DataValidator::clean(&raw);
    info!(
        "{} candles for {} {} after cleaning ({} fetched)",
        candles.len(),
        symbol,
        interval,
        raw.len()
    );

    let expected = match interval.as_str() {
        "1d" => Duration::days(1),
        _ => Duration::hours(1),
    };
    let timestamps: Vec<_> = candles.iter().map(|c| c.timestamp).collect();
    let gaps = DataValidator::detect_gaps(&timestamps, expected);
    if !gaps.is_empty() {
        warn!("{} gaps detected in the series", gaps.len());
    }

    let strategy = create_strategy(strategy_name, params)?;
    let mut engine = BacktestEngine::new(EngineConfig {
        initial_capital: *initial_capital,
        ..EngineConfig::default()
    })?;
    let sizing = PositionSizing::Fixed {
        amount: *fixed_amount,
    };
    let metrics = engine.run_backtest(strategy.as_ref(), &candles, &sizing)?;

    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}
