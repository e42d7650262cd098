//! Wiring an agent from configuration and environment credentials

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::Agent;
use crate::actions::wallet_tools;
use crate::config::{Config, Credential};
use crate::error::Result;
use crate::llm::LlmClient;
use crate::market::{MoralisClient, market_tools};
use crate::social::{client_from_config, social_tools};
use crate::tools::ToolRegistry;
use crate::wallet::{CdpWallet, WalletProvider, open_wallet};

/// A ready agent plus the wallet it acts for
#[derive(Debug)]
pub struct AgentSetup {
    pub agent: Agent,
    pub wallet: Arc<CdpWallet>,
}

/// Build the model client, restore or create the wallet, and register every tool
pub async fn initialize(config: &Config) -> Result<AgentSetup> {
    let api_key = Credential::OpenAi.require()?;
    let timeout = Duration::from_secs(config.llm.timeout_secs);

    let model = LlmClient::new(config.llm.clone(), api_key)?;
    let wallet = Arc::new(open_wallet(&config.wallet, timeout).await?);

    let mut tools = ToolRegistry::new();
    tools.register_all(wallet_tools(wallet.clone()))?;

    if let Some(client) = client_from_config(&config.social, timeout)? {
        tools.register_all(social_tools(Arc::new(client)))?;
    }

    let market = MoralisClient::from_config(&config.market, wallet.network_id(), timeout)?;
    tools.register_all(market_tools(Arc::new(market)))?;

    info!(
        wallet_id = %wallet.wallet_id(),
        network = %wallet.network_id(),
        address = %wallet.default_address(),
        tools = tools.len(),
        "Agent initialized"
    );

    let agent = Agent::builder(Arc::new(model))
        .tools(tools)
        .max_iterations(config.agent.max_iterations)
        .build()?;

    Ok(AgentSetup { agent, wallet })
}
