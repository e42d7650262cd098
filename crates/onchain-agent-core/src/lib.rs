//! Onchain Agent Core Library
//!
//! This crate provides the core functionality for the onchain agent, including:
//! - Tool-calling agent loop with in-memory conversation threads
//! - LLM integration (OpenAI-compatible chat completions)
//! - Wallet access through the developer platform in server-signer mode
//! - Wallet tools (transfers, trades, token and NFT deployment, basenames)
//! - Market data tools (Moralis)
//! - Social tools (X API v2)

pub mod actions;
pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod market;
pub mod social;
pub mod tools;
pub mod wallet;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::{Agent, AgentEvent};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::tools::{Tool, ToolRegistry};
    pub use crate::wallet::WalletProvider;
}
