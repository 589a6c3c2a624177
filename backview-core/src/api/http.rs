//! Blocking HTTP implementation of [`BacktestApi`] over reqwest.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult};
use super::BacktestApi;
use crate::config::ApiConfig;
use crate::domain::{Backtest, BacktestId, Summary};

/// Which URL layout the backend exposes.
///
/// The public dashboard reads `/backtest/...` without credentials; the
/// authenticated deployment mounts the same views under `/api/` and
/// requires a DRF token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiFlavor {
    #[default]
    Public,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
    flavor: ApiFlavor,
}

impl Endpoints {
    pub fn new(base_url: &str, flavor: ApiFlavor) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            flavor,
        }
    }

    pub fn flavor(&self) -> ApiFlavor {
        self.flavor
    }

    fn prefix(&self) -> &'static str {
        match self.flavor {
            ApiFlavor::Public => "",
            ApiFlavor::Authenticated => "/api",
        }
    }

    pub fn summaries(&self) -> String {
        format!("{}{}/backtest/", self.base_url, self.prefix())
    }

    pub fn backtest(&self, id: BacktestId) -> String {
        format!("{}{}/backtest/{id}/", self.base_url, self.prefix())
    }

    pub fn login(&self) -> String {
        format!("{}/api/account/login/", self.base_url)
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

pub struct HttpClient {
    client: reqwest::blocking::Client,
    endpoints: Endpoints,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(config: &ApiConfig, token: Option<String>) -> ApiResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoints: Endpoints::new(&config.base_url, config.flavor),
            token,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn authorize(
        &self,
        req: reqwest::blocking::RequestBuilder,
    ) -> ApiResult<reqwest::blocking::RequestBuilder> {
        match (&self.token, self.endpoints.flavor) {
            (Some(token), _) => Ok(req.header("Authorization", format!("Token {token}"))),
            (None, ApiFlavor::Authenticated) => Err(ApiError::MissingToken),
            (None, ApiFlavor::Public) => Ok(req),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        tracing::debug!(%url, "GET");
        let req = self.authorize(self.client.get(url))?;
        let resp = req.send().map_err(|e| {
            tracing::warn!(%url, error = %e, "request failed");
            ApiError::Network(e.to_string())
        })?;
        decode(url, resp)
    }
}

fn decode<T: DeserializeOwned>(url: &str, resp: reqwest::blocking::Response) -> ApiResult<T> {
    let status = resp.status();
    let body = resp
        .text()
        .map_err(|e| ApiError::Network(format!("reading response body: {e}")))?;
    if !status.is_success() {
        let err = ApiError::from_status(status.as_u16(), &body);
        tracing::warn!(%url, status = status.as_u16(), error = %err, "non-success response");
        return Err(err);
    }
    serde_json::from_str(&body).map_err(|e| {
        tracing::warn!(%url, error = %e, "response did not match expected shape");
        ApiError::Decode(e.to_string())
    })
}

impl BacktestApi for HttpClient {
    fn list_summaries(&self) -> ApiResult<Vec<Summary>> {
        self.get_json(&self.endpoints.summaries())
    }

    fn get_backtest(&self, id: BacktestId) -> ApiResult<Backtest> {
        self.get_json(&self.endpoints.backtest(id))
    }

    fn login(&self, username: &str, password: &str) -> ApiResult<String> {
        let url = self.endpoints.login();
        tracing::debug!(%url, username, "POST login");
        let resp = self
            .client
            .post(&url)
            .json(&LoginRequest { username, password })
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let body: LoginResponse = decode(&url, resp)?;
        Ok(body.token)
    }
}
