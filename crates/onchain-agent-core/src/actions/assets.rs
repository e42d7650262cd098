//! Moving value: transfers and trades

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::require_non_empty;
use crate::error::{Error, Result};
use crate::tools::{Tool, parse_args};
use crate::wallet::amount::is_positive;
use crate::wallet::{TransferRequest, WalletProvider};

fn require_amount(amount: &str) -> Result<()> {
    if !is_positive(amount) {
        return Err(Error::InvalidInput(format!(
            "Amount '{}' must be a positive decimal number",
            amount
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct TransferInput {
    amount: String,
    asset_id: String,
    destination: String,
    #[serde(default)]
    gasless: bool,
}

pub struct TransferTool {
    wallet: Arc<dyn WalletProvider>,
}

impl TransferTool {
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl Tool for TransferTool {
    fn name(&self) -> &str {
        "transfer"
    }

    fn description(&self) -> &str {
        "
This tool will transfer an asset from the wallet to another onchain address.

It takes the following inputs:
- amount: The amount to transfer
- asset_id: The asset ID to transfer
- destination: Where to send the funds, which can be an onchain address, ENS name or basename
- gasless: Whether to do a gasless transfer

Important notes:
- Gasless transfers are only available on base-sepolia and base-mainnet networks for usdc
- Always use gasless transfers when available
- If you have a default address, please use it
"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "amount": {"type": "string", "description": "The amount of the asset to transfer, e.g. `15`, `0.000001`"},
                "asset_id": {"type": "string", "description": "The asset ID to transfer, e.g. `eth`, `usdc`"},
                "destination": {"type": "string", "description": "The destination to transfer the funds, e.g. `0x58dBecc0894Ab4C24F98a0e684c989eD07e4e027`, `example.eth`, `example.base.eth`"},
                "gasless": {"type": "boolean", "description": "Whether to do a gasless transfer", "default": false}
            },
            "required": ["amount", "asset_id", "destination"]
        })
    }

    async fn call(&self, args: Value) -> Result<String> {
        let input: TransferInput = parse_args(self.name(), args)?;
        require_amount(&input.amount)?;
        require_non_empty("asset_id", &input.asset_id)?;
        require_non_empty("destination", &input.destination)?;

        info!(
            amount = %input.amount,
            asset = %input.asset_id,
            destination = %input.destination,
            gasless = input.gasless,
            "Transferring"
        );

        let receipt = self
            .wallet
            .transfer(TransferRequest {
                amount: input.amount.clone(),
                asset_id: input.asset_id.clone(),
                destination: input.destination.clone(),
                gasless: input.gasless,
            })
            .await?;

        Ok(format!(
            "Transferred {} of {} to {}.\nTransaction hash for the transfer: {}\nTransaction link for the transfer: {}",
            input.amount,
            input.asset_id,
            input.destination,
            receipt.hash_or_unknown(),
            receipt.link_or_unknown()
        ))
    }
}

#[derive(Debug, Deserialize)]
struct TradeInput {
    amount: String,
    from_asset_id: String,
    to_asset_id: String,
}

pub struct TradeTool {
    wallet: Arc<dyn WalletProvider>,
}

impl TradeTool {
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl Tool for TradeTool {
    fn name(&self) -> &str {
        "trade"
    }

    fn description(&self) -> &str {
        "
This tool will trade a specified amount of a from asset to a to asset for the wallet.

It takes the following inputs:
- amount: The amount of the from asset to trade
- from_asset_id: The from asset ID to trade
- to_asset_id: The to asset ID to receive from the trade

Important notes:
- Trades are only supported on mainnet networks (ie, 'base-mainnet')
- Never allow trades on any other network, ie `base-sepolia`
"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "amount": {"type": "string", "description": "The amount of the from asset to trade, e.g. `15`, `0.000001`"},
                "from_asset_id": {"type": "string", "description": "The from asset ID to trade, e.g. `eth`, `0x036CbD53842c5426634e7929541eC2318f3dCF7e`"},
                "to_asset_id": {"type": "string", "description": "The to asset ID to receive from the trade, e.g. `eth`, `usdc`"}
            },
            "required": ["amount", "from_asset_id", "to_asset_id"]
        })
    }

    async fn call(&self, args: Value) -> Result<String> {
        let input: TradeInput = parse_args(self.name(), args)?;
        require_amount(&input.amount)?;
        require_non_empty("from_asset_id", &input.from_asset_id)?;
        require_non_empty("to_asset_id", &input.to_asset_id)?;

        let trade = self
            .wallet
            .trade(&input.amount, &input.from_asset_id, &input.to_asset_id)
            .await?;

        Ok(format!(
            "Traded {} of {} for {} of {}.\nTransaction hash for the trade: {}\nTransaction link for the trade: {}",
            input.amount,
            input.from_asset_id,
            trade.to_amount,
            input.to_asset_id,
            trade.receipt.hash_or_unknown(),
            trade.receipt.link_or_unknown()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::testing::{FakeWallet, Recorded};

    #[tokio::test]
    async fn test_transfer_output_and_request() {
        let wallet = Arc::new(FakeWallet::on("base-sepolia"));
        let tool = TransferTool::new(wallet.clone());

        let out = tool
            .call(json!({"amount": "0.01", "asset_id": "eth", "destination": "0xdef"}))
            .await
            .unwrap();
        assert_eq!(
            out,
            "Transferred 0.01 of eth to 0xdef.\n\
             Transaction hash for the transfer: 0xtransfer\n\
             Transaction link for the transfer: https://sepolia.basescan.org/tx/0xtransfer"
        );
        assert_eq!(
            wallet.calls(),
            vec![Recorded::Transfer(TransferRequest {
                amount: "0.01".to_string(),
                asset_id: "eth".to_string(),
                destination: "0xdef".to_string(),
                gasless: false,
            })]
        );
    }

    #[tokio::test]
    async fn test_transfer_rejects_non_positive_amount() {
        let wallet = Arc::new(FakeWallet::on("base-sepolia"));
        let tool = TransferTool::new(wallet.clone());

        for amount in ["0", "-1", "abc"] {
            let err = tool
                .call(json!({"amount": amount, "asset_id": "eth", "destination": "0xdef"}))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }
        assert!(wallet.calls().is_empty());
    }

    #[tokio::test]
    async fn test_trade_on_mainnet() {
        let wallet = Arc::new(FakeWallet::on("base-mainnet"));
        let out = TradeTool::new(wallet)
            .call(json!({"amount": "0.1", "from_asset_id": "eth", "to_asset_id": "usdc"}))
            .await
            .unwrap();
        assert!(out.starts_with("Traded 0.1 of eth for 42.5 of usdc.\n"));
        assert!(out.contains("Transaction hash for the trade: 0xtrade"));
    }

    #[tokio::test]
    async fn test_trade_on_testnet_fails() {
        let wallet = Arc::new(FakeWallet::on("base-sepolia"));
        let err = TradeTool::new(wallet.clone())
            .call(json!({"amount": "0.1", "from_asset_id": "eth", "to_asset_id": "usdc"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedNetwork { .. }));
        assert!(wallet.calls().is_empty());
    }
}
