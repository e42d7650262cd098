//! LLM integration - OpenAI-compatible chat completions
//!
//! This module provides:
//! - HTTP client for chat completions with function calling
//! - Request/response types matching the OpenAI API
//! - Model fallback with automatic retry
//! - The [`ChatModel`] seam the agent loop is written against

mod client;
mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use client::{LlmClient, LlmClientBuilder};
pub use types::{
    ChatRequest, ChatResponse, Choice, FinishReason, FunctionCall, FunctionDefinition,
    LlmResponse, Message, MessageRole, ToolCall, ToolDefinition, Usage,
};

/// A chat model that can answer with text or tool calls
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<LlmResponse>;

    fn model_name(&self) -> &str;
}
