//! Wallet access through the external developer platform
//!
//! This module provides:
//! - The [`WalletProvider`] trait the wallet tools are written against
//! - A platform-backed implementation ([`CdpWallet`]) in server-signer mode
//! - Request authentication, amount conversion and wallet persistence

pub mod amount;
mod api;
mod auth;
mod cdp;
mod store;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::WalletConfig;
use crate::error::Result;

pub use api::CdpClient;
pub use auth::CdpCredentials;
pub use cdp::{CdpWallet, PollSettings};
pub use store::WalletStore;

/// Exported wallet identity, persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletData {
    pub wallet_id: String,
    pub network_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_address: Option<String>,
}

/// Transaction reference returned by the platform
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: Option<String>,
    pub transaction_link: Option<String>,
}

impl TxReceipt {
    pub fn hash_or_unknown(&self) -> &str {
        self.transaction_hash.as_deref().unwrap_or("unknown")
    }

    pub fn link_or_unknown(&self) -> &str {
        self.transaction_link.as_deref().unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Whole-unit amount, e.g. "0.01"
    pub amount: String,
    pub asset_id: String,
    pub destination: String,
    pub gasless: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeReceipt {
    /// Whole-unit amount received
    pub to_amount: String,
    pub receipt: TxReceipt,
}

/// Contract templates the platform can deploy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractKind {
    Token {
        name: String,
        symbol: String,
        total_supply: String,
    },
    Nft {
        name: String,
        symbol: String,
        base_uri: String,
    },
    MultiToken {
        uri: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub contract_address: String,
    pub receipt: TxReceipt,
}

/// A write call against an arbitrary contract
#[derive(Debug, Clone, PartialEq)]
pub struct ContractCall {
    pub contract_address: String,
    pub method: String,
    pub args: serde_json::Value,
    pub abi: Option<serde_json::Value>,
    /// Whole-unit native asset amount sent with the call
    pub amount: Option<String>,
    pub asset_id: Option<String>,
}

/// Onchain operations available to the agent
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn wallet_id(&self) -> &str;

    fn network_id(&self) -> &str;

    fn default_address(&self) -> &str;

    /// Whole-unit balance of an asset held by the default address
    async fn balance(&self, asset_id: &str) -> Result<String>;

    async fn request_faucet_funds(&self, asset_id: Option<&str>) -> Result<TxReceipt>;

    async fn transfer(&self, request: TransferRequest) -> Result<TxReceipt>;

    async fn trade(&self, amount: &str, from_asset_id: &str, to_asset_id: &str)
    -> Result<TradeReceipt>;

    async fn deploy_contract(&self, kind: ContractKind) -> Result<DeployedContract>;

    async fn invoke_contract(&self, call: ContractCall) -> Result<TxReceipt>;
}

/// Restore or create the configured wallet using environment credentials
pub async fn open_wallet(config: &WalletConfig, timeout: Duration) -> Result<CdpWallet> {
    let network_id = config.effective_network_id();
    let client = CdpClient::new(&config.api_base_url, CdpCredentials::from_env()?, timeout)?;
    let store = WalletStore::new(&config.data_file);
    CdpWallet::load_or_create(client, &store, &network_id, PollSettings::from_config(config)).await
}

/// Test networks served by the faucet
pub fn is_testnet(network_id: &str) -> bool {
    network_id.ends_with("-sepolia") || network_id.ends_with("-testnet")
}

pub fn is_base_mainnet(network_id: &str) -> bool {
    matches!(network_id, "base" | "base-mainnet")
}
