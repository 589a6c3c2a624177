//! Backview Core — API client, stores, and view state for browsing stored backtests.
//!
//! This crate holds everything the front ends share:
//! - Domain types decoded leniently from the backend's JSON
//! - The `BacktestApi` seam and its blocking HTTP client
//! - Summaries store with strategy grouping
//! - Memoizing backtest cache with stale-result discard
//! - Open-tab dashboard state, chart series, paginated tables
//! - Config file and session persistence

pub mod api;
pub mod cache;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod session;
pub mod summaries;
pub mod table;
pub mod tabs;

pub use api::{ApiError, ApiFlavor, ApiResult, BacktestApi, HttpClient};
pub use cache::{BacktestCache, Completion, EntryState, FetchStart, FetchTicket};
pub use config::{ApiConfig, AppConfig, ConfigError};
pub use dashboard::{Dashboard, SelectedView};
pub use domain::{Backtest, BacktestId, Summary};
pub use session::SessionState;
pub use summaries::{LoadState, LoadTicket, SummariesStore};
