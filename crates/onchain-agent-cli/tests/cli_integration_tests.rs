//! CLI integration tests for onchain-agent
//!
//! Exercises commands that need no network access, with config and working
//! directory isolated in temp dirs.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CREDENTIALS: [&str; 5] = [
    "OPENAI_API_KEY",
    "CDP_API_KEY_NAME",
    "CDP_API_KEY_PRIVATE_KEY",
    "MORALIS_API_KEY",
    "TWITTER_ACCESS_TOKEN",
];

/// Command with its own config dir and working dir, and no credentials
#[allow(deprecated)]
fn agent_cmd(config_dir: &TempDir, work_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("onchain-agent").unwrap();
    cmd.env("ONCHAIN_AGENT_CONFIG_DIR", config_dir.path())
        .env_remove("NETWORK_ID")
        .env_remove("RUST_LOG")
        .current_dir(work_dir.path());
    for var in CREDENTIALS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_commands() {
    let (config, work) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    agent_cmd(&config, &work)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("auto"))
        .stdout(predicate::str::contains("wallet"))
        .stdout(predicate::str::contains("doctor"));
}

#[test]
fn test_config_path_uses_override_dir() {
    let (config, work) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    agent_cmd(&config, &work)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            config.path().join("config.toml").display().to_string(),
        ));
}

#[test]
fn test_config_set_then_get() {
    let (config, work) = (TempDir::new().unwrap(), TempDir::new().unwrap());

    agent_cmd(&config, &work)
        .args(["config", "set", "wallet.network_id", "base-mainnet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set wallet.network_id = base-mainnet"));

    agent_cmd(&config, &work)
        .args(["config", "get", "wallet.network_id"])
        .assert()
        .success()
        .stdout("base-mainnet\n");

    assert!(config.path().join("config.toml").exists());
}

#[test]
fn test_config_rejects_secrets_and_bad_values() {
    let (config, work) = (TempDir::new().unwrap(), TempDir::new().unwrap());

    agent_cmd(&config, &work)
        .args(["config", "set", "llm.api_key", "sk-test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));

    agent_cmd(&config, &work)
        .args(["config", "set", "agent.max_iterations", "0"])
        .assert()
        .failure();

    agent_cmd(&config, &work)
        .args(["config", "get", "nope.nothing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_config_list_redacts_credentials() {
    let (config, work) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    agent_cmd(&config, &work)
        .env("MORALIS_API_KEY", "moralis-secret-1234")
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MORALIS_API_KEY = ***1234"))
        .stdout(predicate::str::contains("moralis-secret").not())
        .stdout(predicate::str::contains("OPENAI_API_KEY = (not set)"));
}

#[test]
fn test_config_reset() {
    let (config, work) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    agent_cmd(&config, &work)
        .args(["config", "set", "agent.max_iterations", "7"])
        .assert()
        .success();

    agent_cmd(&config, &work)
        .args(["config", "reset"])
        .assert()
        .success();

    agent_cmd(&config, &work)
        .args(["config", "get", "agent.max_iterations"])
        .assert()
        .success()
        .stdout("25\n");
}

#[test]
fn test_stored_secret_in_file_is_rejected() {
    let (config, work) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    std::fs::write(
        config.path().join("config.toml"),
        "[market]\napi_key = \"leaked\"\n",
    )
    .unwrap();

    agent_cmd(&config, &work)
        .args(["config", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("MORALIS_API_KEY"));
}

#[test]
fn test_chat_without_llm_key_fails_fast() {
    let (config, work) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    agent_cmd(&config, &work)
        .arg("chat")
        .write_stdin("exit\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn test_wallet_path_and_missing_export() {
    let (config, work) = (TempDir::new().unwrap(), TempDir::new().unwrap());

    agent_cmd(&config, &work)
        .args(["wallet", "path"])
        .assert()
        .success()
        .stdout("wallet_data.txt\n");

    agent_cmd(&config, &work)
        .args(["wallet", "export"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No wallet data"));
}

#[test]
fn test_wallet_export_prints_persisted_data() {
    let (config, work) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    std::fs::write(
        work.path().join("wallet_data.txt"),
        r#"{"wallet_id":"w-123","network_id":"base-sepolia","default_address":"0xabc"}"#,
    )
    .unwrap();

    agent_cmd(&config, &work)
        .args(["wallet", "export"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"wallet_id\": \"w-123\""));
}

#[test]
fn test_doctor_reports_missing_credentials() {
    let (config, work) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    agent_cmd(&config, &work)
        .env("NETWORK_ID", "base-mainnet")
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("[!!] OPENAI_API_KEY: Not configured"))
        .stdout(predicate::str::contains("[--] TWITTER_ACCESS_TOKEN"))
        .stdout(predicate::str::contains("[OK] Network: base-mainnet"))
        .stdout(predicate::str::contains("Some checks failed"));
}
