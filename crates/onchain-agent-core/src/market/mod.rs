//! Market data tools backed by the Moralis API
//!
//! Token metadata, wallet holdings, trading pairs and trending tokens on
//! Base. Responses are rendered as one `Label: value` line per field.

mod client;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::tools::{Tool, object_schema, parse_args};

pub use client::{MoralisClient, chain_for_network};

/// The queries exposed as tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketQuery {
    TokenMetadata,
    WalletTokens,
    TokenDetails,
    WalletNfts,
    TokenPairs,
    TrendingTokens,
}

impl MarketQuery {
    pub const ALL: [MarketQuery; 6] = [
        MarketQuery::TokenMetadata,
        MarketQuery::TokenPairs,
        MarketQuery::WalletTokens,
        MarketQuery::TokenDetails,
        MarketQuery::WalletNfts,
        MarketQuery::TrendingTokens,
    ];
}

/// All market tools sharing one client
pub fn market_tools(client: Arc<MoralisClient>) -> Vec<Arc<dyn Tool>> {
    MarketQuery::ALL
        .iter()
        .map(|&query| Arc::new(MarketTool::new(client.clone(), query)) as Arc<dyn Tool>)
        .collect()
}

#[derive(Debug, Deserialize)]
struct TokenAddressInput {
    token_address: String,
}

#[derive(Debug, Deserialize)]
struct WalletAddressInput {
    wallet_address: String,
}

fn default_security_score() -> i64 {
    80
}

fn default_min_market_cap() -> i64 {
    100_000
}

#[derive(Debug, Deserialize)]
struct TrendingInput {
    #[serde(default = "default_security_score")]
    security_score: i64,
    #[serde(default = "default_min_market_cap")]
    min_market_cap: i64,
}

pub struct MarketTool {
    client: Arc<MoralisClient>,
    query: MarketQuery,
}

impl MarketTool {
    pub fn new(client: Arc<MoralisClient>, query: MarketQuery) -> Self {
        Self { client, query }
    }
}

#[async_trait]
impl Tool for MarketTool {
    fn name(&self) -> &str {
        match self.query {
            MarketQuery::TokenMetadata => "get_token_metadata",
            MarketQuery::WalletTokens => "get_wallet_tokens",
            MarketQuery::TokenDetails => "get_token_details",
            MarketQuery::WalletNfts => "get_wallet_nfts",
            MarketQuery::TokenPairs => "get_token_pairs",
            MarketQuery::TrendingTokens => "get_trending_tokens",
        }
    }

    fn description(&self) -> &str {
        match self.query {
            MarketQuery::TokenMetadata => {
                "Fetch metadata for an ERC-20 token using the Moralis API. Provides comprehensive \
                 information about a specific token, including name, symbol, decimals, total supply, \
                 and verification status."
            }
            MarketQuery::WalletTokens => {
                "Fetch the list of ERC-20 tokens held by a wallet using the Moralis API. This action \
                 retrieves token balances, contract details, and optional USD price information."
            }
            MarketQuery::TokenDetails => {
                "This tool fetches detailed information about an ERC-20 token on the Base blockchain, \
                 including key metrics like token name, symbol, price, market cap, security score, \
                 and historical performance indicators using the Moralis API."
            }
            MarketQuery::WalletNfts => {
                "Fetch the raw response of NFTs held by a wallet on the Base blockchain. This action \
                 retrieves NFT information using the Moralis API, automatically determining the \
                 correct network (mainnet or testnet) based on the wallet's network ID."
            }
            MarketQuery::TokenPairs => {
                "Retrieve trading pairs for a specific ERC-20 token on the Base blockchain. Returns \
                 detailed information about token trading pairs, including liquidity, price, and \
                 exchange details."
            }
            MarketQuery::TrendingTokens => {
                "Discover trending tokens on the Base blockchain with optional filtering by security \
                 score and market capitalization. Provides comprehensive information about \
                 top-performing tokens using the Moralis API."
            }
        }
    }

    fn parameters(&self) -> Value {
        match self.query {
            MarketQuery::TokenMetadata | MarketQuery::TokenDetails | MarketQuery::TokenPairs => {
                object_schema(
                    &[(
                        "token_address",
                        "string",
                        "Contract address of the ERC-20 token, e.g. `0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913`",
                    )],
                    &["token_address"],
                )
            }
            MarketQuery::WalletTokens | MarketQuery::WalletNfts => object_schema(
                &[(
                    "wallet_address",
                    "string",
                    "Wallet address, e.g. `0x0dc74cabcfb00ab5fdeef60088685a71fef97003`",
                )],
                &["wallet_address"],
            ),
            MarketQuery::TrendingTokens => json!({
                "type": "object",
                "properties": {
                    "security_score": {
                        "type": "integer",
                        "description": "Minimum security score for tokens",
                        "minimum": 0,
                        "maximum": 100,
                        "default": 80
                    },
                    "min_market_cap": {
                        "type": "integer",
                        "description": "Minimum market cap for tokens",
                        "minimum": 0,
                        "default": 100000
                    }
                },
                "required": []
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<String> {
        match self.query {
            MarketQuery::TokenMetadata => {
                let input: TokenAddressInput = parse_args(self.name(), args)?;
                let metadata = self.client.token_metadata(&input.token_address).await?;
                Ok(format_token_metadata(&metadata))
            }
            MarketQuery::WalletTokens => {
                let input: WalletAddressInput = parse_args(self.name(), args)?;
                let tokens = self.client.wallet_tokens(&input.wallet_address).await?;
                Ok(format_wallet_tokens(&input.wallet_address, &tokens))
            }
            MarketQuery::TokenDetails => {
                let input: TokenAddressInput = parse_args(self.name(), args)?;
                let details = self.client.token_details(&input.token_address).await?;
                Ok(format_token_details(&details))
            }
            MarketQuery::WalletNfts => {
                let input: WalletAddressInput = parse_args(self.name(), args)?;
                self.client.wallet_nfts(&input.wallet_address).await
            }
            MarketQuery::TokenPairs => {
                let input: TokenAddressInput = parse_args(self.name(), args)?;
                let pairs = self.client.token_pairs(&input.token_address).await?;
                Ok(format_token_pairs(&input.token_address, &pairs))
            }
            MarketQuery::TrendingTokens => {
                let input: TrendingInput = parse_args(self.name(), args)?;
                let score = u8::try_from(input.security_score)
                    .ok()
                    .filter(|s| *s <= 100)
                    .ok_or_else(|| {
                        Error::InvalidInput(format!(
                            "security_score must be between 0 and 100, got {}",
                            input.security_score
                        ))
                    })?;
                let cap = u64::try_from(input.min_market_cap).map_err(|_| {
                    Error::InvalidInput(format!(
                        "min_market_cap must not be negative, got {}",
                        input.min_market_cap
                    ))
                })?;

                let tokens = self.client.trending_tokens(score, cap).await?;
                Ok(format_trending_tokens(&tokens))
            }
        }
    }
}

/// Render a JSON field for display; missing and null fields show as `N/A`
fn field(value: &Value, key: &str) -> String {
    render(value.get(key))
}

fn nested(value: &Value, outer: &str, key: &str) -> String {
    render(value.get(outer).and_then(|v| v.get(key)))
}

fn render(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "N/A".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn items<'a>(value: &'a Value, key: Option<&str>) -> &'a [Value] {
    let list = match key {
        Some(key) => value.get(key),
        None => Some(value),
    };
    list.and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

fn format_token_metadata(metadata: &Value) -> String {
    let Some(token) = items(metadata, None).first() else {
        return "No metadata found for the provided token address.".to_string();
    };

    format!(
        "Token Name: {}\nSymbol: {}\nDecimals: {}\nTotal Supply: {}\nContract Address: {}\nVerified: {}\nLogo URL: {}\n",
        field(token, "name"),
        field(token, "symbol"),
        field(token, "decimals"),
        field(token, "total_supply_formatted"),
        field(token, "address"),
        field(token, "verified_contract"),
        field(token, "logo"),
    )
}

fn format_wallet_tokens(wallet_address: &str, response: &Value) -> String {
    let tokens = items(response, Some("result"));
    if tokens.is_empty() {
        return format!("No tokens found for wallet {}.", wallet_address);
    }

    let list: Vec<String> = tokens
        .iter()
        .map(|token| {
            let symbol = field(token, "symbol");
            let verified = token
                .get("verified_contract")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            format!(
                "Token: {} ({})\nBalance: {} {}\nContract Address: {}\nVerified: {}\nPrice (USD): {}\n",
                field(token, "name"),
                symbol,
                field(token, "balance_formatted"),
                symbol,
                field(token, "token_address"),
                if verified { "Yes" } else { "No" },
                field(token, "usd_price"),
            )
        })
        .collect();

    format!("Tokens held by {}:\n{}", wallet_address, list.join("\n"))
}

fn format_token_details(token: &Value) -> String {
    format!(
        "Token Name: {}\nSymbol: {}\nPrice (USD): {}\nMarket Cap: {}\nSecurity Score: {}\n\
         Token Age (days): {}\nOn-Chain Strength Index: {}\n1-Day Holders Change: {}\n\
         1-Day Volume Change (USD): {}\n1-Month Price Change (%): {}\nLogo: {}\n",
        field(token, "token_name"),
        field(token, "token_symbol"),
        field(token, "price_usd"),
        field(token, "market_cap"),
        field(token, "security_score"),
        field(token, "token_age_in_days"),
        field(token, "on_chain_strength_index"),
        nested(token, "holders_change", "1d"),
        nested(token, "volume_change_usd", "1d"),
        nested(token, "price_percent_change_usd", "1M"),
        field(token, "token_logo"),
    )
}

fn format_token_pairs(token_address: &str, response: &Value) -> String {
    let pairs = items(response, Some("pairs"));
    if pairs.is_empty() {
        return format!("No trading pairs found for token {}.", token_address);
    }

    let side = |pair: &Value, index: usize| {
        let token = pair.get("pair").and_then(|p| p.get(index));
        format!(
            "{} ({})",
            render(token.and_then(|t| t.get("token_name"))),
            render(token.and_then(|t| t.get("token_symbol")))
        )
    };

    let list: Vec<String> = pairs
        .iter()
        .map(|pair| {
            format!(
                "Pair: {}\nPrice (USD): {}\n24hr Price Change (%): {}\nLiquidity (USD): {}\n\
                 Exchange Address: {}\nBase Token: {}\nQuote Token: {}\n",
                field(pair, "pair_label"),
                field(pair, "usd_price"),
                field(pair, "usd_price_24hr_percent_change"),
                field(pair, "liquidity_usd"),
                field(pair, "exchange_address"),
                side(pair, 0),
                side(pair, 1),
            )
        })
        .collect();

    format!("Trading pairs for token {}:\n{}", token_address, list.join("\n"))
}

fn format_trending_tokens(response: &Value) -> String {
    let tokens = items(response, None);
    if tokens.is_empty() {
        return "No trending tokens found.".to_string();
    }

    let list: Vec<String> = tokens
        .iter()
        .map(|token| {
            format!(
                "Token Name: {} ({})\nPrice (USD): {}\nMarket Cap: {}\nSecurity Score: {}\nLogo: {}\n",
                field(token, "token_name"),
                field(token, "token_symbol"),
                field(token, "price_usd"),
                field(token, "market_cap"),
                field(token, "security_score"),
                field(token, "token_logo"),
            )
        })
        .collect();

    format!("Trending Tokens:\n{}", list.join("\n"))
}
