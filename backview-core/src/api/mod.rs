//! Backend API: the `BacktestApi` trait and its HTTP implementation.
//!
//! The trait is the seam between the cache/stores and the network, so the
//! stores can be exercised with in-memory fakes.

pub mod error;
pub mod http;

use crate::domain::{Backtest, BacktestId, Summary};

pub use error::{ApiError, ApiResult};
pub use http::{ApiFlavor, Endpoints, HttpClient};

/// Read access to stored backtests plus token login.
pub trait BacktestApi: Send + Sync {
    /// `GET /backtest/` — every stored backtest summary.
    fn list_summaries(&self) -> ApiResult<Vec<Summary>>;

    /// `GET /backtest/{id}/` — the full payload for one backtest.
    fn get_backtest(&self, id: BacktestId) -> ApiResult<Backtest>;

    /// `POST /api/account/login/` — exchange credentials for a token.
    fn login(&self, username: &str, password: &str) -> ApiResult<String>;
}

impl<T: BacktestApi + ?Sized> BacktestApi for std::sync::Arc<T> {
    fn list_summaries(&self) -> ApiResult<Vec<Summary>> {
        (**self).list_summaries()
    }

    fn get_backtest(&self, id: BacktestId) -> ApiResult<Backtest> {
        (**self).get_backtest(id)
    }

    fn login(&self, username: &str, password: &str) -> ApiResult<String> {
        (**self).login(username, password)
    }
}
