//! Configuration management with file persistence
//!
//! Non-secret settings live in a TOML file. Credentials are only ever read
//! from the environment, see [`Credential`].

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Onchain agent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub wallet: WalletConfig,
    pub market: MarketConfig,
    pub social: SocialConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    #[serde(skip)]
    pub api_key: Option<String>,
    pub default_model: String,
    pub fallback_models: Vec<String>,
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout_secs: u64,
    pub base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: "gpt-4o-mini".to_string(),
            fallback_models: Vec::new(),
            temperature: 0.7,
            max_tokens: 4096,
            timeout_secs: 120,
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub network_id: String,
    pub data_file: PathBuf,
    pub api_base_url: String,
    pub poll_interval_ms: u64,
    pub poll_timeout_secs: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            network_id: "base-sepolia".to_string(),
            data_file: PathBuf::from("wallet_data.txt"),
            api_base_url: "https://api.cdp.coinbase.com/platform".to_string(),
            poll_interval_ms: 1000,
            poll_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub base_url: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_url: "https://deep-index.moralis.io/api/v2.2".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialConfig {
    pub enabled: bool,
    pub base_url: String,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.twitter.com/2".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub thread_id: String,
    pub max_iterations: usize,
    pub autonomous_interval_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            thread_id: "onchain-agent".to_string(),
            max_iterations: 25,
            autonomous_interval_secs: 10,
        }
    }
}

/// A secret that must come from the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    OpenAi,
    CdpKeyName,
    CdpPrivateKey,
    Moralis,
    Twitter,
}

impl Credential {
    pub const ALL: [Credential; 5] = [
        Credential::OpenAi,
        Credential::CdpKeyName,
        Credential::CdpPrivateKey,
        Credential::Moralis,
        Credential::Twitter,
    ];

    pub fn env_var(self) -> &'static str {
        match self {
            Credential::OpenAi => "OPENAI_API_KEY",
            Credential::CdpKeyName => "CDP_API_KEY_NAME",
            Credential::CdpPrivateKey => "CDP_API_KEY_PRIVATE_KEY",
            Credential::Moralis => "MORALIS_API_KEY",
            Credential::Twitter => "TWITTER_ACCESS_TOKEN",
        }
    }

    /// Read the credential, treating an empty variable as unset
    pub fn resolve(self) -> Option<String> {
        env::var(self.env_var())
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn require(self) -> crate::Result<String> {
        self.resolve()
            .ok_or(crate::Error::MissingCredential(self.env_var()))
    }

    pub fn redacted(self) -> Option<String> {
        self.resolve().map(|key| redact(&key))
    }
}

/// Show only the last four characters of a secret
pub fn redact(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        "***".to_string()
    } else {
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("***{}", suffix)
    }
}

/// Pick the network override from `NETWORK_ID` when present
pub fn resolve_network_id(env_override: Option<String>, configured: &str) -> String {
    env_override
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| configured.to_string())
}

impl LlmConfig {
    pub fn enforce_env_only(&self) -> anyhow::Result<()> {
        if self.api_key.is_some() {
            return Err(anyhow!(
                "LLM API keys must be provided via environment variables, not stored in configuration"
            ));
        }
        Ok(())
    }
}

impl WalletConfig {
    /// The network to operate on, honouring `NETWORK_ID`
    pub fn effective_network_id(&self) -> String {
        resolve_network_id(env::var("NETWORK_ID").ok(), &self.network_id)
    }
}

const KEYS: [&str; 17] = [
    "llm.default_model",
    "llm.fallback_models",
    "llm.temperature",
    "llm.max_tokens",
    "llm.timeout_secs",
    "llm.base_url",
    "wallet.network_id",
    "wallet.data_file",
    "wallet.api_base_url",
    "wallet.poll_interval_ms",
    "wallet.poll_timeout_secs",
    "market.base_url",
    "social.enabled",
    "social.base_url",
    "agent.thread_id",
    "agent.max_iterations",
    "agent.autonomous_interval_secs",
];

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("ONCHAIN_AGENT_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("onchain-agent")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or use defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let raw: toml::Value = toml::from_str(contents)?;
        reject_stored_secrets(&raw)?;
        let config: Config = raw.try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.llm.enforce_env_only()?;
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(anyhow!("Temperature must be between 0.0 and 2.0"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(anyhow!("llm.timeout_secs must be at least 1"));
        }
        if self.wallet.poll_interval_ms == 0 {
            return Err(anyhow!("wallet.poll_interval_ms must be at least 1"));
        }
        if self.agent.max_iterations == 0 {
            return Err(anyhow!("agent.max_iterations must be at least 1"));
        }
        if self.agent.autonomous_interval_secs == 0 {
            return Err(anyhow!("agent.autonomous_interval_secs must be at least 1"));
        }
        if self.wallet.network_id.trim().is_empty() {
            return Err(anyhow!("wallet.network_id must not be empty"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "llm.default_model" => Ok(self.llm.default_model.clone()),
            "llm.fallback_models" => Ok(self.llm.fallback_models.join(", ")),
            "llm.temperature" => Ok(self.llm.temperature.to_string()),
            "llm.max_tokens" => Ok(self.llm.max_tokens.to_string()),
            "llm.timeout_secs" => Ok(self.llm.timeout_secs.to_string()),
            "llm.base_url" => Ok(self.llm.base_url.clone()),

            "wallet.network_id" => Ok(self.wallet.network_id.clone()),
            "wallet.data_file" => Ok(self.wallet.data_file.display().to_string()),
            "wallet.api_base_url" => Ok(self.wallet.api_base_url.clone()),
            "wallet.poll_interval_ms" => Ok(self.wallet.poll_interval_ms.to_string()),
            "wallet.poll_timeout_secs" => Ok(self.wallet.poll_timeout_secs.to_string()),

            "market.base_url" => Ok(self.market.base_url.clone()),

            "social.enabled" => Ok(self.social.enabled.to_string()),
            "social.base_url" => Ok(self.social.base_url.clone()),

            "agent.thread_id" => Ok(self.agent.thread_id.clone()),
            "agent.max_iterations" => Ok(self.agent.max_iterations.to_string()),
            "agent.autonomous_interval_secs" => {
                Ok(self.agent.autonomous_interval_secs.to_string())
            }

            _ => match secret_for_key(key) {
                Some(credential) => Ok(credential.redacted().unwrap_or_else(|| {
                    format!("(not set - use {} env var)", credential.env_var())
                })),
                None => Err(unknown_key(key)),
            },
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "llm.default_model" => {
                self.llm.default_model = value.to_string();
            }
            "llm.fallback_models" => {
                self.llm.fallback_models = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            "llm.temperature" => {
                let temp: f32 = value
                    .parse()
                    .with_context(|| format!("Invalid temperature value: {}", value))?;
                if !(0.0..=2.0).contains(&temp) {
                    return Err(anyhow!("Temperature must be between 0.0 and 2.0"));
                }
                self.llm.temperature = temp;
            }
            "llm.max_tokens" => {
                self.llm.max_tokens = value
                    .parse()
                    .with_context(|| format!("Invalid max_tokens value: {}", value))?;
            }
            "llm.timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid timeout_secs value: {}", value))?;
                if secs == 0 {
                    return Err(anyhow!("llm.timeout_secs must be at least 1"));
                }
                self.llm.timeout_secs = secs;
            }
            "llm.base_url" => {
                self.llm.base_url = value.trim_end_matches('/').to_string();
            }

            "wallet.network_id" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("wallet.network_id must not be empty"));
                }
                self.wallet.network_id = value.trim().to_string();
            }
            "wallet.data_file" => {
                self.wallet.data_file = PathBuf::from(value);
            }
            "wallet.api_base_url" => {
                self.wallet.api_base_url = value.trim_end_matches('/').to_string();
            }
            "wallet.poll_interval_ms" => {
                let ms: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid poll_interval_ms value: {}", value))?;
                if ms == 0 {
                    return Err(anyhow!("wallet.poll_interval_ms must be at least 1"));
                }
                self.wallet.poll_interval_ms = ms;
            }
            "wallet.poll_timeout_secs" => {
                self.wallet.poll_timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid poll_timeout_secs value: {}", value))?;
            }

            "market.base_url" => {
                self.market.base_url = value.trim_end_matches('/').to_string();
            }

            "social.enabled" => {
                self.social.enabled = value
                    .parse()
                    .with_context(|| format!("Invalid boolean value: {}", value))?;
            }
            "social.base_url" => {
                self.social.base_url = value.trim_end_matches('/').to_string();
            }

            "agent.thread_id" => {
                self.agent.thread_id = value.to_string();
            }
            "agent.max_iterations" => {
                let n: usize = value
                    .parse()
                    .with_context(|| format!("Invalid max_iterations value: {}", value))?;
                if n == 0 {
                    return Err(anyhow!("agent.max_iterations must be at least 1"));
                }
                self.agent.max_iterations = n;
            }
            "agent.autonomous_interval_secs" => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid interval value: {}", value))?;
                if secs == 0 {
                    return Err(anyhow!("agent.autonomous_interval_secs must be at least 1"));
                }
                self.agent.autonomous_interval_secs = secs;
            }

            _ => {
                if let Some(credential) = secret_for_key(key) {
                    return Err(anyhow!(
                        "Secrets cannot be stored in configuration. \
                         Set the {} environment variable instead.",
                        credential.env_var()
                    ));
                }
                return Err(unknown_key(key));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values, secrets redacted
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let mut items = KEYS
            .iter()
            .map(|key| Ok((key.to_string(), self.get(key)?)))
            .collect::<anyhow::Result<Vec<_>>>()?;

        for credential in Credential::ALL {
            let value = credential
                .redacted()
                .unwrap_or_else(|| "(not set)".to_string());
            items.push((credential.env_var().to_string(), value));
        }

        Ok(items)
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

fn secret_for_key(key: &str) -> Option<Credential> {
    match key {
        "llm.api_key" | "api_key" => Some(Credential::OpenAi),
        "wallet.api_key_name" => Some(Credential::CdpKeyName),
        "wallet.api_key_private_key" | "wallet.private_key" => Some(Credential::CdpPrivateKey),
        "market.api_key" => Some(Credential::Moralis),
        "social.access_token" => Some(Credential::Twitter),
        _ => None,
    }
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow!(
        "Unknown configuration key: {}. Use `onchain-agent config list` to see available keys.",
        key
    )
}

fn reject_stored_secrets(raw: &toml::Value) -> anyhow::Result<()> {
    let Some(table) = raw.as_table() else {
        return Ok(());
    };
    for (section, value) in table {
        let Some(fields) = value.as_table() else {
            continue;
        };
        for field in fields.keys() {
            let key = format!("{}.{}", section, field);
            if let Some(credential) = secret_for_key(&key) {
                return Err(anyhow!(
                    "'{}' must not be stored in the config file; use the {} environment variable",
                    key,
                    credential.env_var()
                ));
            }
        }
    }
    Ok(())
}
