//! Countdown API HTTP client

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use countdown_common::{Identity, NewCountdown, RemindAt, Repeat, TimeLeft};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Health endpoint body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub version: String,
}

/// A registered wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSummary {
    pub wallet_id: String,
    pub path: String,
    pub created_at: i64,
}

/// A wallet page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletPage {
    pub wallet_id: String,
    pub path: String,
    pub created_at: i64,
    pub countdowns: Vec<CountdownInfo>,
}

/// A countdown as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownInfo {
    pub token: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub color: String,
    pub target_time: DateTime<Utc>,
    pub all_day: bool,
    pub repeat: Repeat,
    pub remind_at: RemindAt,
    pub created_at: i64,
    pub share_url: String,
    pub next_occurrence: DateTime<Utc>,
    pub time_left: TimeLeft,
    pub time_left_display: String,
    #[serde(default)]
    pub reminder_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the countdown HTTP API
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if the server is healthy
    pub async fn health(&self) -> Result<Health> {
        self.send(self.http.get(self.url("/api/health"))).await
    }

    /// Register a wallet for a locally generated owner secret
    pub async fn create_wallet(&self, owner_secret: &str) -> Result<WalletSummary> {
        let body = serde_json::json!({ "owner_secret": owner_secret });
        self.send(self.http.post(self.url("/api/wallets")).json(&body))
            .await
    }

    /// Prove ownership of an existing wallet with a locally derived secret
    pub async fn import_wallet(&self, wallet_id: &str, owner_secret: &str) -> Result<WalletSummary> {
        let body = serde_json::json!({
            "wallet_id": wallet_id,
            "owner_secret": owner_secret,
        });
        self.send(self.http.post(self.url("/api/wallets/import")).json(&body))
            .await
    }

    /// Get a wallet and its countdowns
    pub async fn get_wallet(&self, wallet_id: &str) -> Result<WalletPage> {
        self.send(self.http.get(self.url(&format!("/api/wallets/{}", wallet_id))))
            .await
    }

    /// Create a countdown in the held wallet, or a stand-alone one without an identity
    pub async fn create_countdown(
        &self,
        identity: Option<&Identity>,
        input: &NewCountdown,
    ) -> Result<CountdownInfo> {
        let request = match identity {
            Some(identity) => self
                .http
                .post(self.url(&format!("/api/wallets/{}/countdowns", identity.wallet_id)))
                .bearer_auth(&identity.owner_secret),
            None => self.http.post(self.url("/api/countdowns")),
        };
        self.send(request.json(input)).await
    }

    /// Get a countdown by its sharing token
    pub async fn get_countdown(&self, token: &str) -> Result<CountdownInfo> {
        self.send(self.http.get(self.url(&format!("/api/countdowns/{}", token))))
            .await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        debug!("{} {}", response.status(), response.url());
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(anyhow!("{} ({})", message, status))
}
