//! Onchain Agent CLI - chat with or run an autonomous onchain agent

mod runner;

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use onchain_agent_core::agent;
use onchain_agent_core::config::{Config, Credential};
use onchain_agent_core::wallet::{WalletProvider, WalletStore, open_wallet};
use rustyline::DefaultEditor;
use tracing::{info, warn};

use runner::Mode;

#[derive(Parser)]
#[command(name = "onchain-agent")]
#[command(author, version, about = "Autonomous onchain agent on Base", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the agent and choose a mode interactively
    Run,

    /// Interactive chat mode
    Chat,

    /// Autonomous action mode
    Auto {
        /// Seconds to wait between actions
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Inspect the agent's wallet
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum WalletAction {
    /// Restore or create the wallet and show its details
    Show,
    /// Print the persisted wallet data
    Export,
    /// Show the wallet data file path
    Path,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing .env is fine; credentials may already be exported
    let _ = dotenvy::dotenv();

    let default_level = if cli.quiet {
        "onchain_agent=warn"
    } else {
        "onchain_agent=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.parse()?),
        )
        .init();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cmd_run(None, None, cli.quiet).await,
        Commands::Chat => cmd_run(Some(Mode::Chat), None, cli.quiet).await,
        Commands::Auto { interval } => cmd_run(Some(Mode::Auto), interval, cli.quiet).await,
        Commands::Wallet { action } => cmd_wallet(action, cli.quiet).await,
        Commands::Config { action } => cmd_config(action, cli.quiet),
        Commands::Doctor => cmd_doctor(cli.quiet),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_run(mode: Option<Mode>, interval: Option<u64>, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;

    if !quiet {
        println!("Starting Agent...");
    }
    let setup = agent::initialize(&config)
        .await
        .context("Failed to initialize agent")?;

    let mut editor = DefaultEditor::new()?;
    let mode = match mode {
        Some(mode) => mode,
        None => match runner::choose_mode(&mut editor)? {
            Some(mode) => mode,
            None => {
                println!("Goodbye Agent!");
                return Ok(());
            }
        },
    };

    let thread_id = config.agent.thread_id.as_str();
    match mode {
        Mode::Chat => runner::chat(&setup.agent, thread_id, &mut editor).await,
        Mode::Auto => {
            let secs = interval.unwrap_or(config.agent.autonomous_interval_secs);
            if secs == 0 {
                anyhow::bail!("--interval must be at least 1 second");
            }
            runner::autonomous(&setup.agent, thread_id, Duration::from_secs(secs)).await
        }
    }
}

async fn cmd_wallet(action: WalletAction, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;

    match action {
        WalletAction::Show => {
            let timeout = Duration::from_secs(config.llm.timeout_secs);
            let wallet = open_wallet(&config.wallet, timeout).await?;
            info!(wallet_id = %wallet.wallet_id(), "Wallet ready");

            if quiet {
                println!("{}", wallet.default_address());
            } else {
                println!("Wallet: {}", wallet.wallet_id());
                println!("  Network: {}", wallet.network_id());
                println!("  Default address: {}", wallet.default_address());
                println!("  Data file: {}", config.wallet.data_file.display());
            }
        }
        WalletAction::Export => {
            let store = WalletStore::new(&config.wallet.data_file);
            match store.load()? {
                Some(data) => println!("{}", serde_json::to_string_pretty(&data)?),
                None => anyhow::bail!(
                    "No wallet data at {}; run `onchain-agent wallet show` to create a wallet",
                    store.path().display()
                ),
            }
        }
        WalletAction::Path => {
            println!("{}", config.wallet.data_file.display());
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn cmd_doctor(quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("Onchain Agent Health Check");
        println!("==========================");
        println!();
    }

    let mut all_ok = true;

    let config = match Config::load() {
        Ok(config) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }
            Some(config)
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Configuration: Error - {:#}", e);
            }
            None
        }
    };

    for credential in Credential::ALL {
        let optional = matches!(credential, Credential::Moralis | Credential::Twitter);
        match credential.redacted() {
            Some(redacted) => {
                if !quiet {
                    println!("[OK] {}: Configured ({})", credential.env_var(), redacted);
                }
            }
            None if optional => {
                if !quiet {
                    println!("[--] {}: Not set (related tools unavailable)", credential.env_var());
                }
            }
            None => {
                all_ok = false;
                warn!(env = credential.env_var(), "Credential not configured");
                if !quiet {
                    println!("[!!] {}: Not configured", credential.env_var());
                }
            }
        }
    }

    if !quiet {
        match Config::config_path() {
            Ok(path) if path.exists() => println!("[OK] Config file: {}", path.display()),
            Ok(path) => println!("[--] Config file: {} (using defaults)", path.display()),
            Err(e) => println!("[!!] Config file: Error - {}", e),
        }

        if let Some(config) = &config {
            println!("[OK] Network: {}", config.wallet.effective_network_id());
            let store = WalletStore::new(&config.wallet.data_file);
            match store.load() {
                Ok(Some(data)) => println!(
                    "[OK] Wallet data: {} ({})",
                    store.path().display(),
                    data.wallet_id
                ),
                Ok(None) => println!(
                    "[--] Wallet data: {} (a new wallet will be created)",
                    store.path().display()
                ),
                Err(e) => {
                    all_ok = false;
                    println!("[!!] Wallet data: {}", e);
                }
            }
        }

        println!();
        if all_ok {
            println!("All checks passed!");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }

    Ok(())
}
