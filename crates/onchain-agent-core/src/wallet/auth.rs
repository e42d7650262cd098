//! Platform API authentication
//!
//! Every request carries a short-lived JWT signed with the API key's
//! Ed25519 secret. The token is bound to a single method and URI.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use ed25519_dalek::{Signer, SigningKey};
use serde_json::json;
use zeroize::Zeroizing;

use crate::config::Credential;
use crate::error::{Error, Result};

/// Lifetime of a request token in seconds
const TOKEN_TTL_SECS: i64 = 120;

const ISSUER: &str = "cdp";

/// API key name plus Ed25519 signing key
pub struct CdpCredentials {
    key_name: String,
    signing_key: SigningKey,
}

impl std::fmt::Debug for CdpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpCredentials")
            .field("key_name", &self.key_name)
            .field("signing_key", &"***")
            .finish()
    }
}

impl CdpCredentials {
    /// Parse a key given as base64 of a 32-byte seed or 64-byte keypair
    pub fn new(key_name: impl Into<String>, private_key: &str) -> Result<Self> {
        let key_name = key_name.into();
        if key_name.trim().is_empty() {
            return Err(Error::AuthError("API key name is empty".to_string()));
        }

        let private_key = private_key.trim();
        if private_key.contains("BEGIN EC PRIVATE KEY") {
            return Err(Error::AuthError(
                "ECDSA keys are not supported; create an Ed25519 API key".to_string(),
            ));
        }

        let bytes = Zeroizing::new(
            STANDARD
                .decode(private_key)
                .map_err(|e| Error::AuthError(format!("API private key is not base64: {}", e)))?,
        );

        let signing_key = match bytes.len() {
            32 => {
                let mut seed = Zeroizing::new([0u8; 32]);
                seed.copy_from_slice(&bytes);
                SigningKey::from_bytes(&seed)
            }
            64 => {
                let mut pair = Zeroizing::new([0u8; 64]);
                pair.copy_from_slice(&bytes);
                SigningKey::from_keypair_bytes(&pair)
                    .map_err(|e| Error::AuthError(format!("Invalid Ed25519 keypair: {}", e)))?
            }
            n => {
                return Err(Error::AuthError(format!(
                    "Ed25519 private key must be 32 or 64 bytes, got {}",
                    n
                )));
            }
        };

        Ok(Self {
            key_name,
            signing_key,
        })
    }

    /// Read `CDP_API_KEY_NAME` and `CDP_API_KEY_PRIVATE_KEY`
    pub fn from_env() -> Result<Self> {
        let name = Credential::CdpKeyName.require()?;
        let key = Zeroizing::new(Credential::CdpPrivateKey.require()?);
        Self::new(name, &key)
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Token for one request, e.g. `("POST", "api.cdp.coinbase.com", "/platform/v1/wallets")`
    pub fn bearer_token(&self, method: &str, host: &str, path: &str) -> Result<String> {
        let nonce = hex::encode(rand::random::<[u8; 16]>());
        let uri = format!("{} {}{}", method.to_uppercase(), host, path);
        self.sign_token(&uri, chrono::Utc::now().timestamp(), &nonce)
    }

    fn sign_token(&self, uri: &str, now: i64, nonce: &str) -> Result<String> {
        let header = json!({
            "alg": "EdDSA",
            "kid": self.key_name,
            "typ": "JWT",
            "nonce": nonce,
        });
        let claims = json!({
            "sub": self.key_name,
            "iss": ISSUER,
            "nbf": now,
            "exp": now + TOKEN_TTL_SECS,
            "uri": uri,
        });

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let signature = self.signing_key.sign(signing_input.as_bytes());

        Ok(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }
}
