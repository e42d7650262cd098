//! Error types for the onchain agent

use thiserror::Error;

/// Result type alias using the agent's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Agent error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Network errors (E100-E199)
    #[error("Network error: {0}. Check your internet connection.")]
    NetworkError(#[from] reqwest::Error),

    #[error("LLM API error: {0}. Check that OPENAI_API_KEY is set.")]
    LLMError(String),

    #[error("Rate limited. Waiting {0} seconds before retry.")]
    RateLimited(u64),

    #[error("{service} API returned {status}: {body}")]
    ApiError {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("No suitable model found: {0}")]
    NoSuitableModel(String),

    // Wallet errors (E200-E299)
    #[error("Wallet error: {0}")]
    WalletError(String),

    #[error("{operation} is only available on {required}, current network is '{network}'")]
    UnsupportedNetwork {
        operation: &'static str,
        required: &'static str,
        network: String,
    },

    #[error("Timed out after {0} seconds waiting for {1} to complete")]
    OperationTimeout(u64, String),

    #[error("Platform authentication failed: {0}")]
    AuthError(String),

    // Tool errors (E300-E399)
    #[error("Tool '{0}' not found")]
    ToolNotFound(String),

    #[error("Invalid arguments for tool '{0}': {1}")]
    InvalidToolInput(String, String),

    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    // Agent errors (E400-E499)
    #[error("Agent stopped after {0} iterations without a final answer")]
    MaxIterations(usize),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing credential: set the {0} environment variable")]
    MissingCredential(&'static str),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::NetworkError(_) => "E100",
            Self::LLMError(_) => "E101",
            Self::RateLimited(_) => "E102",
            Self::ApiError { .. } => "E103",
            Self::NoSuitableModel(_) => "E104",
            Self::WalletError(_) => "E200",
            Self::UnsupportedNetwork { .. } => "E201",
            Self::OperationTimeout(..) => "E202",
            Self::AuthError(_) => "E203",
            Self::ToolNotFound(_) => "E300",
            Self::InvalidToolInput(..) => "E301",
            Self::DuplicateTool(_) => "E302",
            Self::MaxIterations(_) => "E400",
            Self::ConfigError(_) => "E600",
            Self::MissingCredential(_) => "E601",
            Self::InvalidInput(_) => "E800",
            Self::Serialization(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::NetworkError(_) => Some("Check internet connection".to_string()),
            Self::LLMError(_) => Some("export OPENAI_API_KEY=...".to_string()),
            Self::MissingCredential(var) => Some(format!("export {}=...", var)),
            Self::AuthError(_) => {
                Some("Check CDP_API_KEY_NAME and CDP_API_KEY_PRIVATE_KEY".to_string())
            }
            Self::UnsupportedNetwork { required, .. } => {
                Some(format!("onchain-agent config set wallet.network_id {}", required))
            }
            Self::MaxIterations(_) => {
                Some("onchain-agent config set agent.max_iterations <n>".to_string())
            }
            _ => None,
        }
    }
}
