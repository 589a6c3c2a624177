//! Shared fixtures and an in-memory backend for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use backview_core::api::{ApiError, ApiResult, BacktestApi};
use backview_core::domain::{Backtest, BacktestId, Summary};

pub fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn load_summaries() -> Vec<Summary> {
    let raw = std::fs::read_to_string(fixture_dir().join("summaries.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

pub fn load_backtest() -> Backtest {
    let raw = std::fs::read_to_string(fixture_dir().join("backtest.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

/// Backend fake: serves the fixture payload under any known id, counts calls.
#[derive(Default)]
pub struct MockApi {
    pub summaries: Vec<Summary>,
    pub backtests: HashMap<BacktestId, Backtest>,
    pub failing: Mutex<Vec<BacktestId>>,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
}

impl MockApi {
    pub fn with_fixtures() -> Self {
        let summaries = load_summaries();
        let template = load_backtest();
        let backtests = summaries
            .iter()
            .map(|s| {
                let mut bt = template.clone();
                bt.id = s.id;
                bt.strategy_name = Some(s.strategy_name.clone());
                (s.id, bt)
            })
            .collect();
        Self {
            summaries,
            backtests,
            ..Self::default()
        }
    }

    pub fn fail(&self, id: BacktestId) {
        self.failing.lock().unwrap().push(id);
    }

    pub fn heal(&self, id: BacktestId) {
        self.failing.lock().unwrap().retain(|f| *f != id);
    }

    pub fn gets(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

impl BacktestApi for MockApi {
    fn list_summaries(&self) -> ApiResult<Vec<Summary>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.summaries.clone())
    }

    fn get_backtest(&self, id: BacktestId) -> ApiResult<Backtest> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&id) {
            return Err(ApiError::Http {
                status: 500,
                detail: "Internal Server Error".into(),
            });
        }
        self.backtests.get(&id).cloned().ok_or(ApiError::Http {
            status: 404,
            detail: "Not found.".into(),
        })
    }

    fn login(&self, username: &str, password: &str) -> ApiResult<String> {
        if username == "admin" && password == "secret" {
            Ok("token-abc".into())
        } else {
            Err(ApiError::Http {
                status: 400,
                detail: "Unable to log in with provided credentials.".into(),
            })
        }
    }
}
