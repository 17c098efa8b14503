//! Client for the wallet service.
//!
//! The gateway proxies wallet operations and forwards the caller's
//! verified access token as the bearer credential. The wallet service
//! answers every endpoint with the same JSON envelope; request values
//! travel as headers, which is the service's wire format.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Bound on any single call to the wallet service.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("could not initialize wallet client: {0}")]
    Initialization(String),
    #[error("wallet service request failed: {0}")]
    Transport(String),
    #[error("could not decode wallet service response: {0}")]
    Decode(String),
}

/// A wallet account as reported by the wallet service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub ts: String,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: String,
    #[serde(rename = "accountno")]
    pub account_no: String,
    #[serde(default)]
    pub iin: String,
    #[serde(default)]
    pub amount: i64,
}

/// A single ledger entry for an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub ts: String,
    #[serde(default, rename = "from")]
    pub from_account: String,
    #[serde(default, rename = "to")]
    pub to_account: String,
    #[serde(default)]
    pub amount: i64,
}

/// The wallet service's uniform response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletEnvelope {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub wallets: Vec<Wallet>,
    #[serde(default, rename = "walletList")]
    pub wallet_list: Vec<String>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// Wallet-service operations consumed by the gateway handlers.
///
/// `top_up` and `transfer` return the upstream status alongside the
/// envelope: a 400 from the wallet service carries a user-facing message
/// that passes through, anything else collapses to an internal error.
#[async_trait]
pub trait WalletApi: Send + Sync {
    async fn wallets(&self, iin: &str, token: &str) -> Result<Vec<Wallet>, WalletError>;
    async fn wallet_list(&self, token: &str) -> Result<Vec<String>, WalletError>;
    async fn transactions(
        &self,
        token: &str,
        account: &str,
    ) -> Result<Vec<Transaction>, WalletError>;
    async fn top_up(
        &self,
        iin: &str,
        account: &str,
        amount: &str,
        token: &str,
    ) -> Result<(u16, WalletEnvelope), WalletError>;
    async fn transfer(
        &self,
        iin: &str,
        from: &str,
        to: &str,
        amount: &str,
        token: &str,
    ) -> Result<(u16, WalletEnvelope), WalletError>;
    async fn add_wallet(&self, token: &str) -> Result<String, WalletError>;
}

/// HTTP implementation talking to the wallet service.
pub struct HttpWalletService {
    base: Url,
    client: Client,
}

impl HttpWalletService {
    pub fn new(base: Url) -> Result<Self, WalletError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| WalletError::Initialization(e.to_string()))?;
        Ok(Self { base, client })
    }

    async fn call(
        &self,
        path: &str,
        headers: &[(&str, &str)],
    ) -> Result<(u16, WalletEnvelope), WalletError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| WalletError::Transport(e.to_string()))?;
        debug!(%url, "wallet service request");

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WalletError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let envelope = response
            .json::<WalletEnvelope>()
            .await
            .map_err(|e| WalletError::Decode(e.to_string()))?;
        Ok((status, envelope))
    }
}

#[async_trait]
impl WalletApi for HttpWalletService {
    async fn wallets(&self, iin: &str, token: &str) -> Result<Vec<Wallet>, WalletError> {
        let (_, envelope) = self.call("/info", &[("iin", iin), ("token", token)]).await?;
        Ok(envelope.wallets)
    }

    async fn wallet_list(&self, token: &str) -> Result<Vec<String>, WalletError> {
        let (_, envelope) = self.call("/wallets", &[("token", token)]).await?;
        Ok(envelope.wallet_list)
    }

    async fn transactions(
        &self,
        token: &str,
        account: &str,
    ) -> Result<Vec<Transaction>, WalletError> {
        let (_, envelope) = self
            .call("/transactions", &[("token", token), ("account", account)])
            .await?;
        Ok(envelope.transactions)
    }

    async fn top_up(
        &self,
        iin: &str,
        account: &str,
        amount: &str,
        token: &str,
    ) -> Result<(u16, WalletEnvelope), WalletError> {
        self.call(
            "/topup",
            &[
                ("iin", iin),
                ("account", account),
                ("amount", amount),
                ("token", token),
            ],
        )
        .await
    }

    async fn transfer(
        &self,
        iin: &str,
        from: &str,
        to: &str,
        amount: &str,
        token: &str,
    ) -> Result<(u16, WalletEnvelope), WalletError> {
        self.call(
            "/transfer",
            &[
                ("iin", iin),
                ("from", from),
                ("to", to),
                ("amount", amount),
                ("token", token),
            ],
        )
        .await
    }

    async fn add_wallet(&self, token: &str) -> Result<String, WalletError> {
        let (_, envelope) = self.call("/add", &[("token", token)]).await?;
        Ok(envelope.message)
    }
}
