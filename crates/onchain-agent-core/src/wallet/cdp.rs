//! Platform-backed wallet

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::amount::{from_atomic, known_decimals, to_atomic};
use super::api::{
    CdpClient, CreateContractInvocationRequest, CreateSmartContractRequest, CreateTradeRequest,
    CreateTransferRequest, TransactionModel, TransferModel,
};
use super::{
    ContractCall, ContractKind, DeployedContract, TradeReceipt, TransferRequest, TxReceipt,
    WalletData, WalletProvider, WalletStore, is_base_mainnet, is_testnet,
};
use crate::config::WalletConfig;
use crate::error::{Error, Result};

/// How long to wait for pending platform operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollSettings {
    pub fn from_config(config: &WalletConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.poll_interval_ms),
            timeout: Duration::from_secs(config.poll_timeout_secs),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from_config(&WalletConfig::default())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Progress {
    Pending,
    Complete,
    Failed,
}

fn progress(status: &str) -> Progress {
    match status.to_ascii_lowercase().as_str() {
        "complete" | "completed" | "success" => Progress::Complete,
        "failed" | "reverted" => Progress::Failed,
        _ => Progress::Pending,
    }
}

fn receipt_of(tx: &TransactionModel) -> TxReceipt {
    TxReceipt {
        transaction_hash: tx.transaction_hash.clone(),
        transaction_link: tx.transaction_link.clone(),
    }
}

fn transfer_status(transfer: &TransferModel) -> String {
    transfer
        .transaction
        .as_ref()
        .map(|tx| tx.status.clone())
        .filter(|s| !s.is_empty())
        .or_else(|| transfer.status.clone())
        .unwrap_or_default()
}

fn transfer_receipt(transfer: &TransferModel) -> TxReceipt {
    let tx = transfer.transaction.as_ref();
    TxReceipt {
        transaction_hash: tx
            .and_then(|t| t.transaction_hash.clone())
            .or_else(|| transfer.transaction_hash.clone()),
        transaction_link: tx
            .and_then(|t| t.transaction_link.clone())
            .or_else(|| transfer.transaction_link.clone()),
    }
}

/// A server-signer wallet with one default address
pub struct CdpWallet {
    client: CdpClient,
    data: WalletData,
    address: String,
    poll: PollSettings,
}

impl std::fmt::Debug for CdpWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpWallet")
            .field("wallet_id", &self.data.wallet_id)
            .field("network_id", &self.data.network_id)
            .field("address", &self.address)
            .finish()
    }
}

impl CdpWallet {
    /// Restore the persisted wallet or create a new one, then persist it
    pub async fn load_or_create(
        client: CdpClient,
        store: &WalletStore,
        network_id: &str,
        poll: PollSettings,
    ) -> Result<Self> {
        let wallet = match store.load()? {
            Some(data) => {
                if data.network_id != network_id {
                    warn!(
                        persisted = %data.network_id,
                        requested = %network_id,
                        "Persisted wallet belongs to a different network; using persisted wallet"
                    );
                }
                Self::restore(client, data, poll).await?
            }
            None => Self::create(client, network_id, poll).await?,
        };

        store.save(&wallet.export())?;
        Ok(wallet)
    }

    pub async fn create(client: CdpClient, network_id: &str, poll: PollSettings) -> Result<Self> {
        let model = client.create_wallet(network_id).await?;
        info!(wallet_id = %model.id, network = %model.network_id, "Created wallet");

        let address = match model.default_address {
            Some(address) => address.address_id,
            None => client.create_address(&model.id).await?.address_id,
        };

        Ok(Self {
            data: WalletData {
                wallet_id: model.id,
                network_id: model.network_id,
                default_address: Some(address.clone()),
            },
            address,
            client,
            poll,
        })
    }

    pub async fn restore(client: CdpClient, data: WalletData, poll: PollSettings) -> Result<Self> {
        let address = match &data.default_address {
            Some(address) => address.clone(),
            None => {
                let model = client.get_wallet(&data.wallet_id).await?;
                match model.default_address {
                    Some(address) => address.address_id,
                    None => client.create_address(&data.wallet_id).await?.address_id,
                }
            }
        };
        debug!(wallet_id = %data.wallet_id, address = %address, "Restored wallet");

        Ok(Self {
            data: WalletData {
                default_address: Some(address.clone()),
                ..data
            },
            address,
            client,
            poll,
        })
    }

    /// Wallet identity suitable for [`WalletStore::save`]
    pub fn export(&self) -> WalletData {
        self.data.clone()
    }

    async fn decimals(&self, asset_id: &str) -> Result<u32> {
        if let Some(decimals) = known_decimals(asset_id) {
            return Ok(decimals);
        }
        self.client
            .get_asset(&self.data.network_id, &asset_id.to_lowercase())
            .await?
            .decimals
            .ok_or_else(|| Error::WalletError(format!("Asset '{}' has no decimals", asset_id)))
    }

    async fn await_completion<T, S, F, Fut>(
        &self,
        what: &str,
        mut current: T,
        status: S,
        mut refresh: F,
    ) -> Result<T>
    where
        S: Fn(&T) -> String,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let deadline = Instant::now() + self.poll.timeout;

        loop {
            match progress(&status(&current)) {
                Progress::Complete => return Ok(current),
                Progress::Failed => return Err(Error::WalletError(format!("{} failed", what))),
                Progress::Pending => {}
            }

            if Instant::now() >= deadline {
                return Err(Error::OperationTimeout(
                    self.poll.timeout.as_secs(),
                    what.to_string(),
                ));
            }

            debug!(what = %what, "Waiting for platform operation");
            tokio::time::sleep(self.poll.interval).await;
            current = refresh().await?;
        }
    }
}

#[async_trait]
impl WalletProvider for CdpWallet {
    fn wallet_id(&self) -> &str {
        &self.data.wallet_id
    }

    fn network_id(&self) -> &str {
        &self.data.network_id
    }

    fn default_address(&self) -> &str {
        &self.address
    }

    async fn balance(&self, asset_id: &str) -> Result<String> {
        let asset_id = asset_id.to_lowercase();
        let balance = self
            .client
            .get_balance(&self.data.wallet_id, &self.address, &asset_id)
            .await?;

        match balance {
            Some(balance) => {
                let decimals = match balance.asset.decimals {
                    Some(d) => d,
                    None => self.decimals(&asset_id).await?,
                };
                from_atomic(&balance.amount, decimals)
            }
            None => Ok("0".to_string()),
        }
    }

    async fn request_faucet_funds(&self, asset_id: Option<&str>) -> Result<TxReceipt> {
        if !is_testnet(&self.data.network_id) {
            return Err(Error::UnsupportedNetwork {
                operation: "Faucet",
                required: "base-sepolia",
                network: self.data.network_id.clone(),
            });
        }

        let tx = self
            .client
            .request_faucet(&self.data.network_id, &self.address, asset_id)
            .await?;
        info!(tx = %tx.transaction_hash, "Faucet funds requested");

        Ok(TxReceipt {
            transaction_hash: Some(tx.transaction_hash),
            transaction_link: tx.transaction_link,
        })
    }

    async fn transfer(&self, request: TransferRequest) -> Result<TxReceipt> {
        let decimals = self.decimals(&request.asset_id).await?;
        let body = CreateTransferRequest {
            amount: to_atomic(&request.amount, decimals)?,
            asset_id: request.asset_id.to_lowercase(),
            destination: request.destination.clone(),
            network_id: self.data.network_id.clone(),
            gasless: request.gasless,
        };

        let created = self
            .client
            .create_transfer(&self.data.wallet_id, &self.address, &body)
            .await?;
        info!(transfer_id = %created.transfer_id, destination = %request.destination, "Transfer created");

        let id = created.transfer_id.clone();
        let done = self
            .await_completion("transfer", created, transfer_status, || {
                self.client
                    .get_transfer(&self.data.wallet_id, &self.address, &id)
            })
            .await?;

        Ok(transfer_receipt(&done))
    }

    async fn trade(
        &self,
        amount: &str,
        from_asset_id: &str,
        to_asset_id: &str,
    ) -> Result<TradeReceipt> {
        if !is_base_mainnet(&self.data.network_id) {
            return Err(Error::UnsupportedNetwork {
                operation: "Trading",
                required: "base-mainnet",
                network: self.data.network_id.clone(),
            });
        }

        let decimals = self.decimals(from_asset_id).await?;
        let body = CreateTradeRequest {
            amount: to_atomic(amount, decimals)?,
            from_asset_id: from_asset_id.to_lowercase(),
            to_asset_id: to_asset_id.to_lowercase(),
        };

        let created = self
            .client
            .create_trade(&self.data.wallet_id, &self.address, &body)
            .await?;
        info!(trade_id = %created.trade_id, "Trade created");

        let id = created.trade_id.clone();
        let done = self
            .await_completion(
                "trade",
                created,
                |t| t.transaction.status.clone(),
                || self.client.get_trade(&self.data.wallet_id, &self.address, &id),
            )
            .await?;

        let to_decimals = match done.to_asset.decimals {
            Some(d) => d,
            None => self.decimals(&done.to_asset.asset_id).await?,
        };

        Ok(TradeReceipt {
            to_amount: from_atomic(&done.to_amount, to_decimals)?,
            receipt: receipt_of(&done.transaction),
        })
    }

    async fn deploy_contract(&self, kind: ContractKind) -> Result<DeployedContract> {
        let request = match &kind {
            ContractKind::Token {
                name,
                symbol,
                total_supply,
            } => CreateSmartContractRequest {
                contract_type: "erc20".to_string(),
                options: serde_json::json!({
                    "name": name,
                    "symbol": symbol,
                    "total_supply": total_supply,
                }),
            },
            ContractKind::Nft {
                name,
                symbol,
                base_uri,
            } => CreateSmartContractRequest {
                contract_type: "erc721".to_string(),
                options: serde_json::json!({
                    "name": name,
                    "symbol": symbol,
                    "base_uri": base_uri,
                }),
            },
            ContractKind::MultiToken { uri } => CreateSmartContractRequest {
                contract_type: "erc1155".to_string(),
                options: serde_json::json!({ "uri": uri }),
            },
        };

        let created = self
            .client
            .create_smart_contract(&self.data.wallet_id, &self.address, &request)
            .await?;
        info!(
            contract_type = %request.contract_type,
            smart_contract_id = %created.smart_contract_id,
            "Contract deployment created"
        );

        let id = created.smart_contract_id.clone();
        let done = self
            .await_completion(
                "contract deployment",
                created,
                |c| c.transaction.status.clone(),
                || {
                    self.client
                        .get_smart_contract(&self.data.wallet_id, &self.address, &id)
                },
            )
            .await?;

        Ok(DeployedContract {
            contract_address: done.contract_address.clone(),
            receipt: receipt_of(&done.transaction),
        })
    }

    async fn invoke_contract(&self, call: ContractCall) -> Result<TxReceipt> {
        let amount = match &call.amount {
            Some(amount) => {
                let asset = call.asset_id.as_deref().unwrap_or("eth");
                Some(to_atomic(amount, self.decimals(asset).await?)?)
            }
            None => None,
        };

        let request = CreateContractInvocationRequest {
            contract_address: call.contract_address.clone(),
            method: call.method.clone(),
            args: serde_json::to_string(&call.args)?,
            abi: call.abi.as_ref().map(serde_json::to_string).transpose()?,
            asset_id: amount.as_ref().map(|_| {
                call.asset_id
                    .clone()
                    .unwrap_or_else(|| "eth".to_string())
            }),
            amount,
        };

        let created = self
            .client
            .create_contract_invocation(&self.data.wallet_id, &self.address, &request)
            .await?;
        info!(
            contract = %created.contract_address,
            method = %call.method,
            "Contract invocation created"
        );

        let id = created.contract_invocation_id.clone();
        let done = self
            .await_completion(
                "contract invocation",
                created,
                |c| c.transaction.status.clone(),
                || {
                    self.client
                        .get_contract_invocation(&self.data.wallet_id, &self.address, &id)
                },
            )
            .await?;

        Ok(receipt_of(&done.transaction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::CdpCredentials;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use tempfile::TempDir;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_poll() -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(10),
            timeout: Duration::from_millis(500),
        }
    }

    fn client(server: &MockServer) -> CdpClient {
        let creds = CdpCredentials::new("organizations/o/apiKeys/k", &STANDARD.encode([5u8; 32]))
            .unwrap();
        CdpClient::new(&server.uri(), creds, Duration::from_secs(5)).unwrap()
    }

    fn data(network: &str) -> WalletData {
        WalletData {
            wallet_id: "w1".to_string(),
            network_id: network.to_string(),
            default_address: Some("0xabc".to_string()),
        }
    }

    async fn wallet(server: &MockServer, network: &str) -> CdpWallet {
        CdpWallet::restore(client(server), data(network), fast_poll())
            .await
            .unwrap()
    }

    #[test]
    fn test_progress() {
        assert_eq!(progress("complete"), Progress::Complete);
        assert_eq!(progress("FAILED"), Progress::Failed);
        assert_eq!(progress("broadcast"), Progress::Pending);
        assert_eq!(progress(""), Progress::Pending);
    }

    #[tokio::test]
    async fn test_load_or_create_persists_new_wallet() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/wallets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "w-new",
                "network_id": "base-sepolia"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/wallets/w-new/addresses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "wallet_id": "w-new",
                "network_id": "base-sepolia",
                "address_id": "0xnew"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = WalletStore::new(dir.path().join("wallet_data.txt"));
        let wallet = CdpWallet::load_or_create(client(&server), &store, "base-sepolia", fast_poll())
            .await
            .unwrap();

        assert_eq!(wallet.default_address(), "0xnew");
        let persisted = store.load().unwrap().unwrap();
        assert_eq!(persisted.wallet_id, "w-new");
        assert_eq!(persisted.default_address.as_deref(), Some("0xnew"));
    }

    #[tokio::test]
    async fn test_load_or_create_reuses_persisted_wallet() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/wallets"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = WalletStore::new(dir.path().join("wallet_data.txt"));
        store.save(&data("base-sepolia")).unwrap();

        let wallet = CdpWallet::load_or_create(client(&server), &store, "base-sepolia", fast_poll())
            .await
            .unwrap();
        assert_eq!(wallet.wallet_id(), "w1");
        assert_eq!(wallet.export(), data("base-sepolia"));
    }

    #[tokio::test]
    async fn test_balance_converts_units() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/wallets/w1/addresses/0xabc/balances/eth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "amount": "1500000000000000000",
                "asset": {"network_id": "base-sepolia", "asset_id": "eth", "decimals": 18}
            })))
            .mount(&server)
            .await;

        let wallet = wallet(&server, "base-sepolia").await;
        assert_eq!(wallet.balance("eth").await.unwrap(), "1.5");
        assert_eq!(wallet.balance("ETH").await.unwrap(), "1.5");
    }

    #[tokio::test]
    async fn test_balance_of_unknown_asset_fetches_lowercased_decimals() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/wallets/w1/addresses/0xabc/balances/cbbtc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "amount": "250000000",
                "asset": {"network_id": "base-sepolia", "asset_id": "cbbtc"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/networks/base-sepolia/assets/cbbtc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "network_id": "base-sepolia",
                "asset_id": "cbbtc",
                "decimals": 8
            })))
            .expect(1)
            .mount(&server)
            .await;

        let wallet = wallet(&server, "base-sepolia").await;
        assert_eq!(wallet.balance("cbBTC").await.unwrap(), "2.5");
    }

    #[tokio::test]
    async fn test_faucet_requires_testnet() {
        let server = MockServer::start().await;
        let wallet = wallet(&server, "base-mainnet").await;
        let err = wallet.request_faucet_funds(None).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedNetwork { operation: "Faucet", .. }));
    }

    #[tokio::test]
    async fn test_trade_requires_mainnet() {
        let server = MockServer::start().await;
        let wallet = wallet(&server, "base-sepolia").await;
        let err = wallet.trade("1", "eth", "usdc").await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedNetwork { operation: "Trading", .. }));
    }

    #[tokio::test]
    async fn test_transfer_polls_until_complete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/wallets/w1/addresses/0xabc/transfers"))
            .and(body_partial_json(serde_json::json!({
                "amount": "10000000000000000",
                "asset_id": "eth",
                "destination": "0xdef",
                "gasless": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "transfer_id": "t1",
                "status": "pending"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/wallets/w1/addresses/0xabc/transfers/t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "transfer_id": "t1",
                "transaction": {
                    "status": "complete",
                    "transaction_hash": "0xhash",
                    "transaction_link": "https://sepolia.basescan.org/tx/0xhash"
                }
            })))
            .mount(&server)
            .await;

        let wallet = wallet(&server, "base-sepolia").await;
        let receipt = wallet
            .transfer(TransferRequest {
                amount: "0.01".to_string(),
                asset_id: "ETH".to_string(),
                destination: "0xdef".to_string(),
                gasless: false,
            })
            .await
            .unwrap();
        assert_eq!(receipt.transaction_hash.as_deref(), Some("0xhash"));
    }

    #[tokio::test]
    async fn test_deploy_times_out_when_never_complete() {
        let server = MockServer::start().await;
        let pending = serde_json::json!({
            "smart_contract_id": "sc1",
            "contract_address": "0xcontract",
            "transaction": {"status": "broadcast"}
        });
        Mock::given(method("POST"))
            .and(path("/v1/wallets/w1/addresses/0xabc/smart_contracts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(pending.clone()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/wallets/w1/addresses/0xabc/smart_contracts/sc1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(pending))
            .mount(&server)
            .await;

        let wallet = wallet(&server, "base-sepolia").await;
        let err = wallet
            .deploy_contract(ContractKind::MultiToken {
                uri: "https://example.com/{id}.json".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OperationTimeout(..)));
    }

    #[tokio::test]
    async fn test_failed_deploy_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/wallets/w1/addresses/0xabc/smart_contracts"))
            .and(body_partial_json(serde_json::json!({"type": "erc20"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "smart_contract_id": "sc1",
                "contract_address": "0xcontract",
                "transaction": {"status": "failed"}
            })))
            .mount(&server)
            .await;

        let wallet = wallet(&server, "base-sepolia").await;
        let err = wallet
            .deploy_contract(ContractKind::Token {
                name: "Test".to_string(),
                symbol: "TST".to_string(),
                total_supply: "1000".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Wallet error: contract deployment failed");
    }

    #[tokio::test]
    async fn test_invoke_contract_converts_value() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/wallets/w1/addresses/0xabc/contract_invocations"))
            .and(body_partial_json(serde_json::json!({
                "method": "mint",
                "args": "{\"to\":\"0xdef\"}",
                "amount": "2000000000000000",
                "asset_id": "eth"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "contract_invocation_id": "ci1",
                "contract_address": "0xnft",
                "transaction": {"status": "complete", "transaction_hash": "0xmint"}
            })))
            .mount(&server)
            .await;

        let wallet = wallet(&server, "base-sepolia").await;
        let receipt = wallet
            .invoke_contract(ContractCall {
                contract_address: "0xnft".to_string(),
                method: "mint".to_string(),
                args: serde_json::json!({"to": "0xdef"}),
                abi: None,
                amount: Some("0.002".to_string()),
                asset_id: None,
            })
            .await
            .unwrap();
        assert_eq!(receipt.hash_or_unknown(), "0xmint");
    }
}
