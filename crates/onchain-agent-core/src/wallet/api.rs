//! REST client for the developer platform's wallet API
//!
//! Wallets are created in server-signer mode: the platform holds the keys
//! and signs, this client only issues requests and reads resource state.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client as HttpClient, Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::auth::CdpCredentials;
use crate::error::{Error, Result};

const SERVICE: &str = "CDP";

#[derive(Debug, Clone, Deserialize)]
pub struct WalletModel {
    pub id: String,
    pub network_id: String,
    #[serde(default)]
    pub default_address: Option<AddressModel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressModel {
    pub wallet_id: String,
    pub network_id: String,
    pub address_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetModel {
    pub network_id: String,
    pub asset_id: String,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(default)]
    pub contract_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceModel {
    pub amount: String,
    pub asset: AssetModel,
}

/// Onchain transaction as reported by the platform
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionModel {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub transaction_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferModel {
    pub transfer_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub transaction_link: Option<String>,
    #[serde(default)]
    pub transaction: Option<TransactionModel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradeModel {
    pub trade_id: String,
    pub from_amount: String,
    pub to_amount: String,
    pub from_asset: AssetModel,
    pub to_asset: AssetModel,
    pub transaction: TransactionModel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmartContractModel {
    pub smart_contract_id: String,
    pub contract_address: String,
    pub transaction: TransactionModel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractInvocationModel {
    pub contract_invocation_id: String,
    pub contract_address: String,
    pub transaction: TransactionModel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaucetTransactionModel {
    pub transaction_hash: String,
    #[serde(default)]
    pub transaction_link: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateWalletRequest<'a> {
    wallet: CreateWalletBody<'a>,
}

#[derive(Debug, Serialize)]
struct CreateWalletBody<'a> {
    network_id: &'a str,
    use_server_signer: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTransferRequest {
    pub amount: String,
    pub asset_id: String,
    pub destination: String,
    pub network_id: String,
    pub gasless: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTradeRequest {
    pub amount: String,
    pub from_asset_id: String,
    pub to_asset_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSmartContractRequest {
    #[serde(rename = "type")]
    pub contract_type: String,
    pub options: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateContractInvocationRequest {
    pub contract_address: String,
    pub method: String,
    /// JSON-encoded method arguments
    pub args: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
}

/// Authenticated platform client
#[derive(Clone)]
pub struct CdpClient {
    http_client: HttpClient,
    base_url: Url,
    credentials: Arc<CdpCredentials>,
}

impl std::fmt::Debug for CdpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpClient")
            .field("base_url", &self.base_url.as_str())
            .field("key_name", &self.credentials.key_name())
            .finish()
    }
}

impl CdpClient {
    pub fn new(base_url: &str, credentials: CdpCredentials, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .map_err(|e| Error::ConfigError(format!("Invalid platform URL '{}': {}", base_url, e)))?;

        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::NetworkError)?;

        Ok(Self {
            http_client,
            base_url,
            credentials: Arc::new(credentials),
        })
    }

    pub async fn create_wallet(&self, network_id: &str) -> Result<WalletModel> {
        let body = CreateWalletRequest {
            wallet: CreateWalletBody {
                network_id,
                use_server_signer: true,
            },
        };
        self.send(Method::POST, "v1/wallets", Some(&body)).await
    }

    pub async fn get_wallet(&self, wallet_id: &str) -> Result<WalletModel> {
        self.send(Method::GET, &format!("v1/wallets/{}", wallet_id), None::<&()>)
            .await
    }

    pub async fn create_address(&self, wallet_id: &str) -> Result<AddressModel> {
        self.send(
            Method::POST,
            &format!("v1/wallets/{}/addresses", wallet_id),
            Some(&serde_json::json!({})),
        )
        .await
    }

    /// Balance of one asset; `None` when the address has never held it
    pub async fn get_balance(
        &self,
        wallet_id: &str,
        address_id: &str,
        asset_id: &str,
    ) -> Result<Option<BalanceModel>> {
        let path = format!(
            "v1/wallets/{}/addresses/{}/balances/{}",
            wallet_id, address_id, asset_id
        );
        match self.send(Method::GET, &path, None::<&()>).await {
            Ok(balance) => Ok(Some(balance)),
            Err(Error::ApiError { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn get_asset(&self, network_id: &str, asset_id: &str) -> Result<AssetModel> {
        self.send(
            Method::GET,
            &format!("v1/networks/{}/assets/{}", network_id, asset_id),
            None::<&()>,
        )
        .await
    }

    pub async fn request_faucet(
        &self,
        network_id: &str,
        address_id: &str,
        asset_id: Option<&str>,
    ) -> Result<FaucetTransactionModel> {
        let path = format!("v1/networks/{}/addresses/{}/faucet", network_id, address_id);
        let query: Vec<(&str, &str)> = asset_id
            .map(|asset| ("asset_id", asset))
            .into_iter()
            .collect();
        self.send_with_query(Method::POST, &path, &query, Some(&serde_json::json!({})))
            .await
    }

    pub async fn create_transfer(
        &self,
        wallet_id: &str,
        address_id: &str,
        request: &CreateTransferRequest,
    ) -> Result<TransferModel> {
        self.send(
            Method::POST,
            &address_path(wallet_id, address_id, "transfers"),
            Some(request),
        )
        .await
    }

    pub async fn get_transfer(
        &self,
        wallet_id: &str,
        address_id: &str,
        transfer_id: &str,
    ) -> Result<TransferModel> {
        let path = format!(
            "{}/{}",
            address_path(wallet_id, address_id, "transfers"),
            transfer_id
        );
        self.send(Method::GET, &path, None::<&()>).await
    }

    pub async fn create_trade(
        &self,
        wallet_id: &str,
        address_id: &str,
        request: &CreateTradeRequest,
    ) -> Result<TradeModel> {
        self.send(
            Method::POST,
            &address_path(wallet_id, address_id, "trades"),
            Some(request),
        )
        .await
    }

    pub async fn get_trade(
        &self,
        wallet_id: &str,
        address_id: &str,
        trade_id: &str,
    ) -> Result<TradeModel> {
        let path = format!("{}/{}", address_path(wallet_id, address_id, "trades"), trade_id);
        self.send(Method::GET, &path, None::<&()>).await
    }

    pub async fn create_smart_contract(
        &self,
        wallet_id: &str,
        address_id: &str,
        request: &CreateSmartContractRequest,
    ) -> Result<SmartContractModel> {
        self.send(
            Method::POST,
            &address_path(wallet_id, address_id, "smart_contracts"),
            Some(request),
        )
        .await
    }

    pub async fn get_smart_contract(
        &self,
        wallet_id: &str,
        address_id: &str,
        smart_contract_id: &str,
    ) -> Result<SmartContractModel> {
        let path = format!(
            "{}/{}",
            address_path(wallet_id, address_id, "smart_contracts"),
            smart_contract_id
        );
        self.send(Method::GET, &path, None::<&()>).await
    }

    pub async fn create_contract_invocation(
        &self,
        wallet_id: &str,
        address_id: &str,
        request: &CreateContractInvocationRequest,
    ) -> Result<ContractInvocationModel> {
        self.send(
            Method::POST,
            &address_path(wallet_id, address_id, "contract_invocations"),
            Some(request),
        )
        .await
    }

    pub async fn get_contract_invocation(
        &self,
        wallet_id: &str,
        address_id: &str,
        invocation_id: &str,
    ) -> Result<ContractInvocationModel> {
        let path = format!(
            "{}/{}",
            address_path(wallet_id, address_id, "contract_invocations"),
            invocation_id
        );
        self.send(Method::GET, &path, None::<&()>).await
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_with_query(method, path, &[], body).await
    }

    async fn send_with_query<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| Error::WalletError(format!("Invalid request path '{}': {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(Error::WalletError(format!("URL has no host: {}", url))),
        };
        let token = self
            .credentials
            .bearer_token(method.as_str(), &host, url.path())?;

        debug!(method = %method, path = %url.path(), "Sending platform request");

        let mut request = self
            .http_client
            .request(method, url.clone())
            .bearer_auth(token)
            .header("Accept", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(Error::NetworkError)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 => Error::AuthError(body),
                429 => Error::RateLimited(60),
                code => Error::ApiError {
                    service: SERVICE,
                    status: code,
                    body,
                },
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::WalletError(format!("Failed to parse platform response: {}", e)))
    }
}

fn address_path(wallet_id: &str, address_id: &str, resource: &str) -> String {
    format!(
        "v1/wallets/{}/addresses/{}/{}",
        wallet_id, address_id, resource
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use wiremock::matchers::{body_json, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> CdpClient {
        let creds = CdpCredentials::new("organizations/o/apiKeys/k", &STANDARD.encode([3u8; 32]))
            .unwrap();
        CdpClient::new(
            &format!("{}/platform", server.uri()),
            creds,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_wallet_uses_server_signer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/platform/v1/wallets"))
            .and(header_exists("authorization"))
            .and(body_json(serde_json::json!({
                "wallet": {"network_id": "base-sepolia", "use_server_signer": true}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "w1",
                "network_id": "base-sepolia",
                "default_address": {
                    "wallet_id": "w1",
                    "network_id": "base-sepolia",
                    "address_id": "0xabc"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let wallet = client(&server).create_wallet("base-sepolia").await.unwrap();
        assert_eq!(wallet.id, "w1");
        assert_eq!(wallet.default_address.unwrap().address_id, "0xabc");
    }

    #[tokio::test]
    async fn test_missing_balance_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/platform/v1/wallets/w1/addresses/0xabc/balances/usdc"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let balance = client(&server)
            .get_balance("w1", "0xabc", "usdc")
            .await
            .unwrap();
        assert!(balance.is_none());
    }

    #[tokio::test]
    async fn test_faucet_passes_asset_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/platform/v1/networks/base-sepolia/addresses/0xabc/faucet"))
            .and(query_param("asset_id", "usdc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "transaction_hash": "0xhash",
                "transaction_link": "https://sepolia.basescan.org/tx/0xhash"
            })))
            .mount(&server)
            .await;

        let tx = client(&server)
            .request_faucet("base-sepolia", "0xabc", Some("usdc"))
            .await
            .unwrap();
        assert_eq!(tx.transaction_hash, "0xhash");
    }

    #[tokio::test]
    async fn test_faucet_asset_query_is_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/platform/v1/networks/base-sepolia/addresses/0xabc/faucet"))
            .and(query_param("asset_id", "usd coin&x=1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "transaction_hash": "0xhash",
                "transaction_link": "https://sepolia.basescan.org/tx/0xhash"
            })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .request_faucet("base-sepolia", "0xabc", Some("usd coin&x=1"))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), Some("asset_id=usd+coin%26x%3D1"));
    }

    #[tokio::test]
    async fn test_error_statuses_are_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/platform/v1/wallets/unauthorized"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad jwt"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/platform/v1/wallets/broken"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client(&server);
        assert!(matches!(
            client.get_wallet("unauthorized").await.unwrap_err(),
            Error::AuthError(body) if body == "bad jwt"
        ));
        assert!(matches!(
            client.get_wallet("broken").await.unwrap_err(),
            Error::ApiError { status: 500, .. }
        ));
    }
}
