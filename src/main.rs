use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::collections::HashMap;
use stratsim::commands::{demo, sweep};
use stratsim::strategy::STRATEGY_NAMES;

#[derive(Parser)]
#[command(name = "stratsim")]
#[command(about = "Rule-based trading strategy backtester over simulated market data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one strategy and print its metrics as JSON
    Demo {
        /// Strategy to run (simple_ma, rsi or macd)
        strategy: String,
        /// Symbol to simulate data for
        #[arg(long, default_value = "^NSEI")]
        symbol: String,
        /// Candle interval (1h or 1d)
        #[arg(long, default_value = "1h")]
        interval: String,
        /// Days of history to generate
        #[arg(long, default_value_t = 90)]
        days: i64,
        /// Seed for the simulated price walk
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Starting account capital
        #[arg(long, default_value_t = 100_000.0)]
        initial_capital: f64,
        /// Fixed notional amount per order
        #[arg(long, default_value_t = 10_000.0)]
        fixed_amount: f64,
        /// Strategy parameter override, as name=value (repeatable)
        #[arg(long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,
    },
    /// Backtest every strategy under both sizing policies and rank the results
    Sweep {
        #[arg(long, default_value = "^NSEI")]
        symbol: String,
        #[arg(long, default_value = "1h")]
        interval: String,
        #[arg(long, default_value_t = 365)]
        days: i64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn parse_params(raw: &[String]) -> Result<HashMap<String, f64>> {
    let mut params = HashMap::new();
    for entry in raw {
        let (name, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("expected NAME=VALUE, got `{entry}`"))?;
        let value: f64 = value
            .parse()
            .map_err(|_| anyhow!("parameter `{name}` has non-numeric value `{value}`"))?;
        params.insert(name.to_string(), value);
    }
    Ok(params)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    info!(
        "Starting stratsim with strategies: {}",
        STRATEGY_NAMES.join(", ")
    );

    match cli.command {
        Commands::Demo {
            strategy,
            symbol,
            interval,
            days,
            seed,
            initial_capital,
            fixed_amount,
            params,
        } => {
            let params = parse_params(&params)?;
            let options = demo::DemoOptions {
                symbol,
                interval,
                days,
                seed,
                initial_capital,
                fixed_amount,
            };
            demo::run(&strategy, &options, &params)
        }
        Commands::Sweep {
            symbol,
            interval,
            days,
            seed,
        } => sweep::run(&symbol, &interval, days, seed),
    }
}
