//! Blockchain data API client

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::debug;

use crate::config::{Credential, MarketConfig};
use crate::error::{Error, Result};

const SERVICE: &str = "Moralis";

/// Chain name the data API expects for a wallet network
pub fn chain_for_network(network_id: &str) -> &'static str {
    if crate::wallet::is_base_mainnet(network_id) {
        "base"
    } else {
        "base sepolia"
    }
}

/// Read-only client keyed by `X-API-Key`
#[derive(Clone)]
pub struct MoralisClient {
    http_client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    chain: &'static str,
}

impl std::fmt::Debug for MoralisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoralisClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("chain", &self.chain)
            .finish()
    }
}

impl MoralisClient {
    /// The key may be absent; every request then fails with a missing-credential error
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        network_id: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::NetworkError)?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            chain: chain_for_network(network_id),
        })
    }

    pub fn from_config(config: &MarketConfig, network_id: &str, timeout: Duration) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            Credential::Moralis.resolve(),
            network_id,
            timeout,
        )
    }

    pub fn chain(&self) -> &'static str {
        self.chain
    }

    pub async fn token_metadata(&self, token_address: &str) -> Result<Value> {
        self.get_json(
            "erc20/metadata",
            &[("chain", self.chain), ("addresses[0]", token_address)],
        )
        .await
    }

    pub async fn wallet_tokens(&self, wallet_address: &str) -> Result<Value> {
        self.get_json(
            &format!("wallets/{}/tokens", wallet_address),
            &[("chain", self.chain)],
        )
        .await
    }

    pub async fn token_details(&self, token_address: &str) -> Result<Value> {
        self.get_json(
            "discovery/token",
            &[("chain", self.chain), ("token_address", token_address)],
        )
        .await
    }

    /// Unparsed response body
    pub async fn wallet_nfts(&self, wallet_address: &str) -> Result<String> {
        self.get(
            &format!("{}/nft", wallet_address),
            &[
                ("chain", self.chain),
                ("format", "decimal"),
                ("media_items", "false"),
            ],
        )
        .await
    }

    pub async fn token_pairs(&self, token_address: &str) -> Result<Value> {
        self.get_json(
            &format!("erc20/{}/pairs", token_address),
            &[("chain", self.chain)],
        )
        .await
    }

    /// Trending tokens are only listed for mainnet
    pub async fn trending_tokens(&self, security_score: u8, min_market_cap: u64) -> Result<Value> {
        let score = security_score.to_string();
        let cap = min_market_cap.to_string();
        self.get_json(
            "discovery/tokens/trending",
            &[
                ("chain", "base"),
                ("security_score", &score),
                ("min_market_cap", &cap),
            ],
        )
        .await
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let body = self.get(path, query).await?;
        serde_json::from_str(&body).map_err(|e| Error::ApiError {
            service: SERVICE,
            status: 200,
            body: format!("unparseable response: {}", e),
        })
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(Error::MissingCredential(Credential::Moralis.env_var()))?;

        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, chain = %self.chain, "Querying market data");

        let response = self
            .http_client
            .get(&url)
            .header("accept", "application/json")
            .header("X-API-Key", api_key)
            .query(query)
            .send()
            .await
            .map_err(Error::NetworkError)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::NetworkError)?;

        if !status.is_success() {
            return Err(Error::ApiError {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}
