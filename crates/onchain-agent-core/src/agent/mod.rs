//! Tool-calling agent loop
//!
//! Each turn sends the system prompt, the thread history and the new user
//! message to the model. Requested tool calls are executed in order and
//! their results fed back until the model answers in plain text. Every step
//! is streamed as an [`AgentEvent`]; the thread is only updated once the
//! turn completes.

mod prompt;
mod setup;
mod thread;

use std::sync::Arc;

use futures_core::Stream;
use futures_util::StreamExt;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::llm::{ChatModel, Message, ToolCall};
use crate::tools::ToolRegistry;

pub use prompt::{AUTONOMOUS_PROMPT, DEFAULT_SYSTEM_PROMPT};
pub use setup::{AgentSetup, initialize};
pub use thread::ThreadStore;

/// One step of an agent turn
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// A model reply, possibly requesting tools
    Agent {
        content: String,
        tool_calls: Vec<ToolCall>,
    },
    /// Output of one tool call
    Tool { name: String, content: String },
}

impl AgentEvent {
    /// Text shown to the user for this step
    pub fn content(&self) -> &str {
        match self {
            Self::Agent { content, .. } | Self::Tool { content, .. } => content,
        }
    }
}

pub struct Agent {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    system_prompt: String,
    max_iterations: usize,
    threads: ThreadStore,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("model", &self.model.model_name())
            .field("tools", &self.tools)
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

/// Builder for [`Agent`]
pub struct AgentBuilder {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    system_prompt: Option<String>,
    max_iterations: usize,
}

impl AgentBuilder {
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn build(self) -> Result<Agent> {
        if self.max_iterations == 0 {
            return Err(Error::InvalidInput(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        Ok(Agent {
            model: self.model,
            tools: self.tools,
            system_prompt: self
                .system_prompt
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            max_iterations: self.max_iterations,
            threads: ThreadStore::new(),
        })
    }
}

impl Agent {
    pub fn builder(model: Arc<dyn ChatModel>) -> AgentBuilder {
        AgentBuilder {
            model,
            tools: ToolRegistry::new(),
            system_prompt: None,
            max_iterations: 25,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn threads(&self) -> &ThreadStore {
        &self.threads
    }

    /// Run one turn, streaming each model reply and tool result
    pub fn stream<'a>(
        &'a self,
        thread_id: &'a str,
        input: &'a str,
    ) -> impl Stream<Item = Result<AgentEvent>> + Send + 'a {
        async_stream::stream! {
            let mut history = self.threads.history(thread_id).await;
            history.push(Message::user(input));

            let definitions = self.tools.definitions();
            info!(thread = %thread_id, history = history.len(), "Starting agent turn");

            for iteration in 1..=self.max_iterations {
                let mut messages = Vec::with_capacity(history.len() + 1);
                messages.push(Message::system(self.system_prompt.as_str()));
                messages.extend(history.iter().cloned());

                let response = match self.model.chat(&messages, &definitions).await {
                    Ok(response) => response,
                    Err(e) => {
                        warn!(thread = %thread_id, error = %e, "Model call failed");
                        yield Err(e);
                        return;
                    }
                };

                let reply = response.message;
                let calls = reply.tool_calls.clone();
                debug!(
                    iteration,
                    model = %response.model,
                    tokens = response.tokens_used,
                    tool_calls = calls.len(),
                    "Model replied"
                );

                yield Ok(AgentEvent::Agent {
                    content: reply.text().to_string(),
                    tool_calls: calls.clone(),
                });
                history.push(reply);

                if calls.is_empty() {
                    self.threads.replace(thread_id, history).await;
                    info!(thread = %thread_id, iterations = iteration, "Agent turn complete");
                    return;
                }

                for call in &calls {
                    let output = self
                        .tools
                        .dispatch(&call.function.name, &call.function.arguments)
                        .await;
                    history.push(Message::tool(call.id.as_str(), output.as_str()));
                    yield Ok(AgentEvent::Tool {
                        name: call.function.name.clone(),
                        content: output,
                    });
                }
            }

            warn!(thread = %thread_id, max = self.max_iterations, "Agent turn hit iteration limit");
            yield Err(Error::MaxIterations(self.max_iterations));
        }
    }

    /// Run one turn to completion, collecting its events
    pub async fn run(&self, thread_id: &str, input: &str) -> Result<Vec<AgentEvent>> {
        let mut events = Vec::new();
        let stream = self.stream(thread_id, input);
        futures_util::pin_mut!(stream);
        while let Some(event) = stream.next().await {
            events.push(event?);
        }
        Ok(events)
    }
}
