pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod indicators;
pub mod models;
pub mod param_utils;
pub mod performance;
pub mod strategy;
pub mod strategy_utils;
pub mod validator;

pub use config::{EngineConfig, PositionSizing};
pub use engine::BacktestEngine;
pub use error::{EngineError, Result};
pub use fetcher::{DataFetcher, MarketDataSource};
pub use models::{Candle, Signal, SignalDirection, Trade, TradeType};
pub use performance::{BacktestMetrics, PerformanceCalculator};
pub use strategy::{create_strategy, Strategy, STRATEGY_NAMES};
pub use validator::DataValidator;
