//! Basename registration through the Base registrar controller

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::error::{Error, Result};
use crate::tools::{Tool, object_schema, parse_args};
use crate::wallet::amount::is_positive;
use crate::wallet::{ContractCall, WalletProvider, is_base_mainnet};

const MAINNET_REGISTRAR: &str = "0x4cCb0BB02FCABA27e82a56646E81d8c5bC4119a5";
const MAINNET_RESOLVER: &str = "0xC6d566A56A1aFf6508b41f6c90ff131615583BCD";
const TESTNET_REGISTRAR: &str = "0x49aE3cC2e3AA768B1e5654f5D3C6002144A59581";
const TESTNET_RESOLVER: &str = "0x6533C94869D28fAA8dF77cc63f9e2b2D6Cf77eBA";

/// One year, in seconds
const REGISTRATION_DURATION: &str = "31557600";

const DEFAULT_AMOUNT: &str = "0.002";

fn register_abi() -> Value {
    json!([{
        "type": "function",
        "name": "register",
        "stateMutability": "payable",
        "inputs": [{
            "name": "request",
            "type": "tuple",
            "internalType": "struct RegistrarController.RegisterRequest",
            "components": [
                {"name": "name", "type": "string", "internalType": "string"},
                {"name": "owner", "type": "address", "internalType": "address"},
                {"name": "duration", "type": "uint256", "internalType": "uint256"},
                {"name": "resolver", "type": "address", "internalType": "address"},
                {"name": "data", "type": "bytes[]", "internalType": "bytes[]"},
                {"name": "reverseRecord", "type": "bool", "internalType": "bool"}
            ]
        }],
        "outputs": []
    }])
}

/// Full name with the network's suffix, and the bare label
fn split_basename(basename: &str, mainnet: bool) -> Result<(String, String)> {
    let suffix = if mainnet { ".base.eth" } else { ".basetest.eth" };
    let basename = basename.trim().to_lowercase();

    let label = basename.strip_suffix(suffix).unwrap_or(&basename);
    if label.is_empty() || label.contains('.') {
        return Err(Error::InvalidInput(format!(
            "Basename '{}' must be a single label, optionally ending in {}",
            basename, suffix
        )));
    }

    Ok((format!("{}{}", label, suffix), label.to_string()))
}

#[derive(Debug, Deserialize)]
struct RegisterBasenameInput {
    basename: String,
    #[serde(default)]
    amount: Option<String>,
}

pub struct RegisterBasenameTool {
    wallet: Arc<dyn WalletProvider>,
}

impl RegisterBasenameTool {
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl Tool for RegisterBasenameTool {
    fn name(&self) -> &str {
        "register_basename"
    }

    fn description(&self) -> &str {
        "
This tool will register a Basename for the agent. The agent should have a wallet associated to \
register a Basename. When your network ID is 'base-mainnet' (also sometimes known simply as \
'base'), the name must end with .base.eth, and when your network ID is 'base-sepolia', it must \
end with .basetest.eth. Do not suggest any alternatives and never try to register a Basename \
with another postfix. The prefix of the name must be unique so if the registration of the \
Basename fails, you should prompt to try again with a more unique name.
"
    }

    fn parameters(&self) -> Value {
        object_schema(
            &[
                (
                    "basename",
                    "string",
                    "The Basename to assign to the agent, e.g. `example.base.eth` or `example.basetest.eth`",
                ),
                (
                    "amount",
                    "string",
                    "The amount of ETH to pay for registration. The default is set to 0.002.",
                ),
            ],
            &["basename"],
        )
    }

    async fn call(&self, args: Value) -> Result<String> {
        let input: RegisterBasenameInput = parse_args(self.name(), args)?;
        let amount = input
            .amount
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AMOUNT.to_string());
        if !is_positive(&amount) {
            return Err(Error::InvalidInput(format!(
                "Amount '{}' must be a positive decimal number",
                amount
            )));
        }

        let mainnet = is_base_mainnet(self.wallet.network_id());
        let (basename, label) = split_basename(&input.basename, mainnet)?;
        let (registrar, resolver) = if mainnet {
            (MAINNET_REGISTRAR, MAINNET_RESOLVER)
        } else {
            (TESTNET_REGISTRAR, TESTNET_RESOLVER)
        };
        let owner = self.wallet.default_address().to_string();

        info!(basename = %basename, owner = %owner, "Registering basename");

        self.wallet
            .invoke_contract(ContractCall {
                contract_address: registrar.to_string(),
                method: "register".to_string(),
                args: json!({
                    "request": [label, owner, REGISTRATION_DURATION, resolver, [], true]
                }),
                abi: Some(register_abi()),
                amount: Some(amount),
                asset_id: Some("eth".to_string()),
            })
            .await?;

        Ok(format!(
            "Successfully registered basename {} for address {}",
            basename,
            self.wallet.default_address()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::testing::{FakeWallet, Recorded};

    #[test]
    fn test_split_basename_adds_suffix() {
        assert_eq!(
            split_basename("Example", false).unwrap(),
            ("example.basetest.eth".to_string(), "example".to_string())
        );
        assert_eq!(
            split_basename("example.base.eth", true).unwrap(),
            ("example.base.eth".to_string(), "example".to_string())
        );
        assert!(split_basename("example.base.eth", false).is_err());
        assert!(split_basename("", true).is_err());
    }

    #[tokio::test]
    async fn test_register_on_testnet() {
        let wallet = Arc::new(FakeWallet::on("base-sepolia"));
        let out = RegisterBasenameTool::new(wallet.clone())
            .call(json!({"basename": "agent"}))
            .await
            .unwrap();
        assert_eq!(
            out,
            "Successfully registered basename agent.basetest.eth for address 0xagent"
        );

        match &wallet.calls()[0] {
            Recorded::Invoke(call) => {
                assert_eq!(call.contract_address, TESTNET_REGISTRAR);
                assert_eq!(call.method, "register");
                assert_eq!(call.amount.as_deref(), Some("0.002"));
                assert_eq!(
                    call.args["request"],
                    json!(["agent", "0xagent", "31557600", TESTNET_RESOLVER, [], true])
                );
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_on_mainnet_uses_mainnet_contracts() {
        let wallet = Arc::new(FakeWallet::on("base-mainnet"));
        RegisterBasenameTool::new(wallet.clone())
            .call(json!({"basename": "agent.base.eth", "amount": "0.01"}))
            .await
            .unwrap();

        match &wallet.calls()[0] {
            Recorded::Invoke(call) => {
                assert_eq!(call.contract_address, MAINNET_REGISTRAR);
                assert_eq!(call.amount.as_deref(), Some("0.01"));
                assert_eq!(call.args["request"][3], MAINNET_RESOLVER);
            }
            other => panic!("unexpected call {:?}", other),
        }
    }
}
