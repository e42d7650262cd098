//! Social media tools for the agent's X account

mod client;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::{Credential, SocialConfig};
use crate::error::Result;
use crate::tools::{Tool, object_schema, parse_args};

pub use client::{AccountModel, MAX_POST_CHARS, TwitterClient};

/// Client for the configured account, `None` when posting is disabled or no token is set
pub fn client_from_config(config: &SocialConfig, timeout: Duration) -> Result<Option<TwitterClient>> {
    if !config.enabled {
        debug!("Social tools disabled in config");
        return Ok(None);
    }
    match Credential::Twitter.resolve() {
        Some(token) => Ok(Some(TwitterClient::new(&config.base_url, token, timeout)?)),
        None => {
            info!(
                env = Credential::Twitter.env_var(),
                "No social access token; social tools not registered"
            );
            Ok(None)
        }
    }
}

pub fn social_tools(client: Arc<TwitterClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(AccountDetailsTool {
            client: client.clone(),
        }),
        Arc::new(AccountMentionsTool {
            client: client.clone(),
        }),
        Arc::new(PostTweetTool {
            client: client.clone(),
        }),
        Arc::new(PostTweetReplyTool { client }),
    ]
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub struct AccountDetailsTool {
    client: Arc<TwitterClient>,
}

#[async_trait]
impl Tool for AccountDetailsTool {
    fn name(&self) -> &str {
        "account_details"
    }

    fn description(&self) -> &str {
        "This tool will return account details for the currently authenticated Twitter (X) user context."
    }

    fn parameters(&self) -> Value {
        object_schema(&[], &[])
    }

    async fn call(&self, _args: Value) -> Result<String> {
        let me = self.client.me().await?;
        let details = json!({
            "id": me.id,
            "name": me.name,
            "username": me.username,
            "url": format!("https://x.com/{}", me.username),
        });
        Ok(format!(
            "Successfully retrieved authenticated user account details:\n{}",
            pretty(&details)
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
struct MentionsInput {
    #[serde(default)]
    account_id: Option<String>,
}

pub struct AccountMentionsTool {
    client: Arc<TwitterClient>,
}

#[async_trait]
impl Tool for AccountMentionsTool {
    fn name(&self) -> &str {
        "account_mentions"
    }

    fn description(&self) -> &str {
        "This tool will return mentions for the specified Twitter (X) user id. \
         When no account id is given the authenticated account is used."
    }

    fn parameters(&self) -> Value {
        object_schema(
            &[(
                "account_id",
                "string",
                "The Twitter (X) user id to return mentions for",
            )],
            &[],
        )
    }

    async fn call(&self, args: Value) -> Result<String> {
        let input: MentionsInput = parse_args(self.name(), args)?;
        let account_id = match input.account_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => id,
            None => self.client.me().await?.id.clone(),
        };

        let mentions = self.client.mentions(&account_id).await?;
        Ok(format!(
            "Successfully retrieved account mentions:\n{}",
            pretty(&mentions)
        ))
    }
}

#[derive(Debug, Deserialize)]
struct PostTweetInput {
    tweet: String,
}

pub struct PostTweetTool {
    client: Arc<TwitterClient>,
}

#[async_trait]
impl Tool for PostTweetTool {
    fn name(&self) -> &str {
        "post_tweet"
    }

    fn description(&self) -> &str {
        "This tool will post a tweet on Twitter. The tool takes the text of the tweet as input. \
         Tweets can be maximum 280 characters."
    }

    fn parameters(&self) -> Value {
        object_schema(&[("tweet", "string", "The text of the tweet")], &["tweet"])
    }

    async fn call(&self, args: Value) -> Result<String> {
        let input: PostTweetInput = parse_args(self.name(), args)?;
        let posted = self.client.post(&input.tweet).await?;
        info!(id = %posted["data"]["id"], "Posted tweet");
        Ok(format!("Successfully posted to Twitter:\n{}", pretty(&posted)))
    }
}

#[derive(Debug, Deserialize)]
struct PostTweetReplyInput {
    tweet_id: String,
    tweet_reply: String,
}

pub struct PostTweetReplyTool {
    client: Arc<TwitterClient>,
}

#[async_trait]
impl Tool for PostTweetReplyTool {
    fn name(&self) -> &str {
        "post_tweet_reply"
    }

    fn description(&self) -> &str {
        "This tool will post a tweet on Twitter in reply to another tweet. The tool takes the \
         tweet id to reply to and the text of the reply as input. Replies can be maximum 280 characters."
    }

    fn parameters(&self) -> Value {
        object_schema(
            &[
                ("tweet_id", "string", "The id of the tweet to reply to"),
                ("tweet_reply", "string", "The text of the reply"),
            ],
            &["tweet_id", "tweet_reply"],
        )
    }

    async fn call(&self, args: Value) -> Result<String> {
        let input: PostTweetReplyInput = parse_args(self.name(), args)?;
        let posted = self
            .client
            .reply(&input.tweet_id, &input.tweet_reply)
            .await?;
        Ok(format!(
            "Successfully posted reply to Twitter:\n{}",
            pretty(&posted)
        ))
    }
}
