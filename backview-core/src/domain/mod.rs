//! Domain types for backtest summaries and full payloads.

pub mod backtest;
pub mod de;
pub mod direction;
pub mod ids;
pub mod summary;

pub use backtest::{
    Backtest, EquityPoint, MetricValue, PricePoint, Signal, SummaryStats, Trade, TradeInstruction,
};
pub use direction::Direction;
pub use ids::{BacktestId, ParseIdError};
pub use summary::{Parameters, Summary};
