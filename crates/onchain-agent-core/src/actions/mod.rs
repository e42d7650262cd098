//! Wallet tools offered to the agent
//!
//! Every tool here is a thin adapter from model-supplied JSON arguments to a
//! [`WalletProvider`] operation, with the result rendered as text.

mod assets;
mod basename;
mod contracts;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::tools::{Tool, object_schema, parse_args};
use crate::wallet::WalletProvider;

pub use assets::{TradeTool, TransferTool};
pub use basename::RegisterBasenameTool;
pub use contracts::{DeployMultiTokenTool, DeployNftTool, DeployTokenTool, MintNftTool};

/// All wallet tools bound to one wallet, in the order they are offered
pub fn wallet_tools(wallet: Arc<dyn WalletProvider>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(GetWalletDetailsTool::new(wallet.clone())),
        Arc::new(GetBalanceTool::new(wallet.clone())),
        Arc::new(RequestFaucetFundsTool::new(wallet.clone())),
        Arc::new(TransferTool::new(wallet.clone())),
        Arc::new(TradeTool::new(wallet.clone())),
        Arc::new(DeployTokenTool::new(wallet.clone())),
        Arc::new(DeployNftTool::new(wallet.clone())),
        Arc::new(MintNftTool::new(wallet.clone())),
        Arc::new(RegisterBasenameTool::new(wallet.clone())),
        Arc::new(DeployMultiTokenTool::new(wallet)),
    ]
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub struct GetWalletDetailsTool {
    wallet: Arc<dyn WalletProvider>,
}

impl GetWalletDetailsTool {
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl Tool for GetWalletDetailsTool {
    fn name(&self) -> &str {
        "get_wallet_details"
    }

    fn description(&self) -> &str {
        "This tool will get details about the MPC Wallet."
    }

    fn parameters(&self) -> Value {
        object_schema(&[], &[])
    }

    async fn call(&self, _args: Value) -> Result<String> {
        Ok(format!(
            "Wallet: {} on network: {} with default address: {}",
            self.wallet.wallet_id(),
            self.wallet.network_id(),
            self.wallet.default_address()
        ))
    }
}

#[derive(Debug, Deserialize)]
struct GetBalanceInput {
    asset_id: String,
}

pub struct GetBalanceTool {
    wallet: Arc<dyn WalletProvider>,
}

impl GetBalanceTool {
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl Tool for GetBalanceTool {
    fn name(&self) -> &str {
        "get_balance"
    }

    fn description(&self) -> &str {
        "This tool will get the balance of all the addresses in the wallet for a given asset. \
         It takes the asset ID as input."
    }

    fn parameters(&self) -> Value {
        object_schema(
            &[(
                "asset_id",
                "string",
                "The asset ID to get the balance for, e.g. `eth`, `0x036CbD53842c5426634e7929541eC2318f3dCF7e`",
            )],
            &["asset_id"],
        )
    }

    async fn call(&self, args: Value) -> Result<String> {
        let input: GetBalanceInput = parse_args(self.name(), args)?;
        require_non_empty("asset_id", &input.asset_id)?;

        let balance = self.wallet.balance(&input.asset_id).await?;
        Ok(format!(
            "Balances for wallet {}:\n  {}: {}",
            self.wallet.wallet_id(),
            self.wallet.default_address(),
            balance
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
struct RequestFaucetInput {
    #[serde(default)]
    asset_id: Option<String>,
}

pub struct RequestFaucetFundsTool {
    wallet: Arc<dyn WalletProvider>,
}

impl RequestFaucetFundsTool {
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl Tool for RequestFaucetFundsTool {
    fn name(&self) -> &str {
        "request_faucet_funds"
    }

    fn description(&self) -> &str {
        "This tool will request test tokens from the faucet for the default address in the wallet. \
         It takes the wallet and asset ID as input. If no asset ID is provided the faucet defaults \
         to ETH. Faucet is only allowed on `base-sepolia` and can only provide asset ID `eth` or `usdc`. \
         You are not allowed to faucet with any other network or asset ID."
    }

    fn parameters(&self) -> Value {
        object_schema(
            &[(
                "asset_id",
                "string",
                "The optional asset ID to request from faucet, `eth` or `usdc`",
            )],
            &[],
        )
    }

    async fn call(&self, args: Value) -> Result<String> {
        let input: RequestFaucetInput = parse_args(self.name(), args)?;
        let asset = input.asset_id.filter(|a| !a.trim().is_empty());

        let receipt = self.wallet.request_faucet_funds(asset.as_deref()).await?;
        Ok(format!(
            "Received {} from the faucet. Transaction: {}",
            asset.as_deref().unwrap_or("ETH"),
            receipt.link_or_unknown()
        ))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::{Error, Result};
    use crate::wallet::{
        ContractCall, ContractKind, DeployedContract, TradeReceipt, TransferRequest, TxReceipt,
        WalletProvider, is_base_mainnet, is_testnet,
    };

    /// Everything the fake wallet was asked to do
    #[derive(Debug, Clone, PartialEq)]
    pub enum Recorded {
        Faucet(Option<String>),
        Transfer(TransferRequest),
        Trade(String, String, String),
        Deploy(ContractKind),
        Invoke(ContractCall),
    }

    pub struct FakeWallet {
        pub network_id: String,
        pub calls: Mutex<Vec<Recorded>>,
    }

    impl FakeWallet {
        pub fn on(network_id: &str) -> Self {
            Self {
                network_id: network_id.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<Recorded> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Recorded) {
            self.calls.lock().unwrap().push(call);
        }

        fn receipt(hash: &str) -> TxReceipt {
            TxReceipt {
                transaction_hash: Some(hash.to_string()),
                transaction_link: Some(format!("https://sepolia.basescan.org/tx/{}", hash)),
            }
        }
    }

    #[async_trait]
    impl WalletProvider for FakeWallet {
        fn wallet_id(&self) -> &str {
            "wallet-1"
        }

        fn network_id(&self) -> &str {
            &self.network_id
        }

        fn default_address(&self) -> &str {
            "0xagent"
        }

        async fn balance(&self, asset_id: &str) -> Result<String> {
            match asset_id {
                "eth" => Ok("0.5".to_string()),
                _ => Ok("0".to_string()),
            }
        }

        async fn request_faucet_funds(&self, asset_id: Option<&str>) -> Result<TxReceipt> {
            if !is_testnet(&self.network_id) {
                return Err(Error::UnsupportedNetwork {
                    operation: "Faucet",
                    required: "base-sepolia",
                    network: self.network_id.clone(),
                });
            }
            self.record(Recorded::Faucet(asset_id.map(str::to_string)));
            Ok(Self::receipt("0xfaucet"))
        }

        async fn transfer(&self, request: TransferRequest) -> Result<TxReceipt> {
            self.record(Recorded::Transfer(request));
            Ok(Self::receipt("0xtransfer"))
        }

        async fn trade(
            &self,
            amount: &str,
            from_asset_id: &str,
            to_asset_id: &str,
        ) -> Result<TradeReceipt> {
            if !is_base_mainnet(&self.network_id) {
                return Err(Error::UnsupportedNetwork {
                    operation: "Trading",
                    required: "base-mainnet",
                    network: self.network_id.clone(),
                });
            }
            self.record(Recorded::Trade(
                amount.to_string(),
                from_asset_id.to_string(),
                to_asset_id.to_string(),
            ));
            Ok(TradeReceipt {
                to_amount: "42.5".to_string(),
                receipt: Self::receipt("0xtrade"),
            })
        }

        async fn deploy_contract(&self, kind: ContractKind) -> Result<DeployedContract> {
            self.record(Recorded::Deploy(kind));
            Ok(DeployedContract {
                contract_address: "0xcontract".to_string(),
                receipt: Self::receipt("0xdeploy"),
            })
        }

        async fn invoke_contract(&self, call: ContractCall) -> Result<TxReceipt> {
            self.record(Recorded::Invoke(call));
            Ok(Self::receipt("0xinvoke"))
        }
    }
}
