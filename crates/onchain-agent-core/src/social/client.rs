//! X API v2 client authenticated with an OAuth 2.0 user token

use std::time::Duration;

use reqwest::{Client as HttpClient, Method};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::{Error, Result};

const SERVICE: &str = "X";

/// Maximum post length accepted by the API
pub const MAX_POST_CHARS: usize = 280;

#[derive(Debug, Clone, Deserialize)]
pub struct AccountModel {
    pub id: String,
    pub name: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

pub struct TwitterClient {
    http_client: HttpClient,
    base_url: String,
    access_token: String,
    me: OnceCell<AccountModel>,
}

impl std::fmt::Debug for TwitterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterClient")
            .field("base_url", &self.base_url)
            .field("access_token", &"***")
            .finish()
    }
}

impl TwitterClient {
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::NetworkError)?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            me: OnceCell::new(),
        })
    }

    /// The authenticated account, fetched once
    pub async fn me(&self) -> Result<&AccountModel> {
        self.me
            .get_or_try_init(|| async {
                let envelope: DataEnvelope<AccountModel> =
                    serde_json::from_value(self.send(Method::GET, "users/me", None).await?)?;
                Ok::<_, Error>(envelope.data)
            })
            .await
    }

    pub async fn mentions(&self, account_id: &str) -> Result<Value> {
        self.send(Method::GET, &format!("users/{}/mentions", account_id), None)
            .await
    }

    pub async fn post(&self, text: &str) -> Result<Value> {
        check_length(text)?;
        self.send(Method::POST, "tweets", Some(json!({"text": text})))
            .await
    }

    pub async fn reply(&self, tweet_id: &str, text: &str) -> Result<Value> {
        check_length(text)?;
        self.send(
            Method::POST,
            "tweets",
            Some(json!({
                "text": text,
                "reply": {"in_reply_to_tweet_id": tweet_id}
            })),
        )
        .await
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(method = %method, url = %url, "Sending X API request");

        let mut request = self
            .http_client
            .request(method, &url)
            .bearer_auth(&self.access_token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(Error::NetworkError)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => Error::RateLimited(60),
                code => Error::ApiError {
                    service: SERVICE,
                    status: code,
                    body,
                },
            });
        }

        response.json().await.map_err(Error::NetworkError)
    }
}

fn check_length(text: &str) -> Result<()> {
    let chars = text.chars().count();
    if chars > MAX_POST_CHARS {
        return Err(Error::InvalidInput(format!(
            "Post is {} characters, the limit is {}",
            chars, MAX_POST_CHARS
        )));
    }
    if text.trim().is_empty() {
        return Err(Error::InvalidInput("Post must not be empty".to_string()));
    }
    Ok(())
}
