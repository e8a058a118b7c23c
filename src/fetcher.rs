use crate::error::{EngineError, Result};
use crate::models::Candle;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const VALID_INTERVALS: &[&str] = &[
    "1h", "1d", "1wk", "1mo", "2m", "5m", "15m", "30m", "60m", "90m", "3mo", "6mo", "1y", "2y",
    "5y", "10y", "ytd", "max",
];

const BASE_PRICE: f64 = 18_000.0;

/// Source of an ordered candle series over a date range. The engine only
/// depends on this contract, not on where the data comes from.
pub trait MarketDataSource {
    fn fetch(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Candle>>;
}

/// Simulated market data provider. Prices follow a seeded random walk so
/// every run over the same symbol/interval/seed reproduces the same series.
pub struct DataFetcher {
    symbol: String,
    interval: String,
    seed: u64,
}

impl DataFetcher {
    pub fn new(symbol: &str, interval: &str, seed: u64) -> Result<Self> {
        validate_symbol(symbol)?;
        validate_interval(interval)?;
        Ok(Self {
            symbol: symbol.to_string(),
            interval: interval.to_string(),
            seed,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> &str {
        &self.interval
    }

    /// Roughly one year back from now.
    pub fn default_date_range() -> (DateTime<Utc>, DateTime<Utc>) {
        let end = Utc::now();
        (end - Duration::days(365), end)
    }

    fn step(&self) -> Duration {
        match self.interval.as_str() {
            "1d" => Duration::days(1),
            _ => Duration::hours(1),
        }
    }

    fn generate(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Candle> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let step = self.step();
        let mut data = Vec::new();
        let mut base_price = BASE_PRICE;
        let mut current = start;

        while current < end {
            let open = base_price + rng.gen_range(-100.0..100.0);
            let mut high = open + rng.gen_range(0.0..50.0);
            let mut low = open - rng.gen_range(0.0..50.0);
            let close = open + rng.gen_range(-50.0..50.0);
            high = high.max(open).max(close);
            low = low.min(open).min(close);
            let volume = 1_000_000 + rng.gen_range(0..500_000);

            data.push(Candle {
                timestamp: current,
                open,
                high,
                low,
                close,
                volume,
            });

            current += step;
            base_price = close;
        }

        data
    }
}

impl MarketDataSource for DataFetcher {
    fn fetch(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Candle>> {
        if start >= end {
            return Err(EngineError::InvalidDateRange { start, end });
        }

        let data = self.generate(start, end);
        if data.is_empty() {
            return Err(EngineError::NoData {
                symbol: self.symbol.clone(),
                start,
                end,
            });
        }

        log::debug!(
            "fetched {} candles for {} {} ({} to {})",
            data.len(),
            self.symbol,
            self.interval,
            start,
            end
        );
        Ok(data)
    }
}

fn validate_symbol(symbol: &str) -> Result<()> {
    let well_formed = !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^'));
    if well_formed {
        Ok(())
    } else {
        Err(EngineError::InvalidSymbol(symbol.to_string()))
    }
}

fn validate_interval(interval: &str) -> Result<()> {
    if VALID_INTERVALS.contains(&interval) {
        Ok(())
    } else {
        Err(EngineError::InvalidInterval(interval.to_string()))
    }
}
