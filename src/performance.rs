use crate::models::{Trade, TradeType};
use serde::{Deserialize, Serialize};

/// Aggregated result of one backtest run. Final capital counts cash only;
/// an open position is reported but not marked to market.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestMetrics {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_return: f64,
    pub total_trades: i32,
    pub winning_trades: i32,
    pub losing_trades: i32,
    pub win_rate: f64,
    pub total_profit: f64,
    pub total_loss: f64,
    pub max_drawdown: f64,
    pub current_position: i64,
}

pub struct PerformanceCalculator;

impl PerformanceCalculator {
    pub fn calculate(
        trades: &[Trade],
        initial_capital: f64,
        final_capital: f64,
        max_drawdown: f64,
        current_position: i64,
    ) -> BacktestMetrics {
        let total_trades = trades.len() as i32;
        let total_return = (final_capital - initial_capital) / initial_capital;

        let mut winning_trades = 0;
        let mut losing_trades = 0;
        let mut total_profit = 0.0;
        let mut total_loss = 0.0;

        // Greedy round-trip pairing: each buy takes the first sell with a
        // strictly later timestamp that no earlier buy has already claimed.
        // A sell smaller than its buy still fully closes the pair; lot
        // accounting is out of scope here.
        let buys: Vec<&Trade> = trades
            .iter()
            .filter(|t| t.trade_type == TradeType::Buy)
            .collect();
        let sells: Vec<&Trade> = trades
            .iter()
            .filter(|t| t.trade_type == TradeType::Sell)
            .collect();
        let mut sell_used = vec![false; sells.len()];

        for buy in &buys {
            for (i, sell) in sells.iter().enumerate() {
                if sell_used[i] || sell.timestamp <= buy.timestamp {
                    continue;
                }

                let quantity = buy.quantity.min(sell.quantity) as f64;
                let profit =
                    (sell.price - buy.price) * quantity - (buy.commission + sell.commission);

                if profit > 0.0 {
                    winning_trades += 1;
                    total_profit += profit;
                } else {
                    losing_trades += 1;
                    total_loss += profit.abs();
                }

                sell_used[i] = true;
                break;
            }
        }

        let win_rate = winning_trades as f64 / 1.0f64.max((winning_trades + losing_trades) as f64);

        BacktestMetrics {
            initial_capital,
            final_capital,
            total_return,
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            total_profit,
            total_loss,
            max_drawdown,
            current_position,
        }
    }
}
