//! Tool abstraction shared by the wallet, market and social integrations
//!
//! A [`Tool`] is a named async function with a JSON schema the model can
//! call. The [`ToolRegistry`] owns the set offered to the model and turns
//! every outcome, including failures, into text for the conversation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::llm::ToolDefinition;

/// A capability the agent can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the model uses to call the tool
    fn name(&self) -> &str;

    /// Instructions shown to the model
    fn description(&self) -> &str;

    /// JSON schema of the arguments object
    fn parameters(&self) -> Value;

    /// Run the tool with already-decoded arguments
    async fn call(&self, args: Value) -> Result<String>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(self.name(), self.description().trim(), self.parameters())
    }
}

/// Ordered collection of tools, unique by name
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool; names must be unique
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(Error::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn register_all(&mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Result<()> {
        for tool in tools {
            self.register(tool)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions advertised to the model, in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Invoke a tool by name with raw JSON arguments
    pub async fn invoke(&self, name: &str, raw_args: &str) -> Result<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))?;

        let args = if raw_args.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(raw_args)
                .map_err(|e| Error::InvalidToolInput(name.to_string(), e.to_string()))?
        };

        debug!(tool = %name, "Invoking tool");
        tool.call(args).await
    }

    /// Invoke a tool and render any failure as text for the model
    pub async fn dispatch(&self, name: &str, raw_args: &str) -> String {
        match self.invoke(name, raw_args).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = %name, code = e.code(), error = %e, "Tool call failed");
                format!("Error: {}", e)
            }
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

/// Decode tool arguments into a typed input
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| Error::InvalidToolInput(tool.to_string(), e.to_string()))
}

/// Build an object schema from `(name, type, description)` triples
pub fn object_schema(properties: &[(&str, &str, &str)], required: &[&str]) -> Value {
    let props: serde_json::Map<String, Value> = properties
        .iter()
        .map(|(name, ty, description)| {
            (
                name.to_string(),
                json!({"type": ty, "description": description}),
            )
        })
        .collect();

    json!({
        "type": "object",
        "properties": props,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    struct Echo;

    #[derive(Deserialize)]
    struct EchoInput {
        text: String,
    }

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "\n  Echo the text back.\n"
        }

        fn parameters(&self) -> Value {
            object_schema(&[("text", "string", "Text to echo")], &["text"])
        }

        async fn call(&self, args: Value) -> Result<String> {
            let input: EchoInput = parse_args(self.name(), args)?;
            Ok(input.text)
        }
    }

    struct Failing;

    #[async_trait]
    impl Tool for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn parameters(&self) -> Value {
            object_schema(&[], &[])
        }

        async fn call(&self, _args: Value) -> Result<String> {
            Err(Error::WalletError("no funds".to_string()))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo)).unwrap();
        registry.register(Arc::new(Failing)).unwrap();
        registry
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = registry();
        let err = registry.register(Arc::new(Echo)).unwrap_err();
        assert!(matches!(err, Error::DuplicateTool(name) if name == "echo"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_definitions_keep_order_and_trim() {
        let defs = registry().definitions();
        assert_eq!(defs[0].function.name, "echo");
        assert_eq!(defs[0].function.description, "Echo the text back.");
        assert_eq!(defs[0].function.parameters["required"][0], "text");
        assert_eq!(defs[1].function.name, "failing");
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let out = registry().dispatch("echo", r#"{"text":"gm"}"#).await;
        assert_eq!(out, "gm");
    }

    #[tokio::test]
    async fn test_dispatch_renders_errors() {
        let registry = registry();
        assert_eq!(
            registry.dispatch("missing", "{}").await,
            "Error: Tool 'missing' not found"
        );
        assert!(
            registry
                .dispatch("echo", "{not json")
                .await
                .starts_with("Error: Invalid arguments for tool 'echo'")
        );
        assert!(
            registry
                .dispatch("echo", r#"{"other":1}"#)
                .await
                .contains("missing field `text`")
        );
        assert_eq!(
            registry.dispatch("failing", "").await,
            "Error: Wallet error: no funds"
        );
    }
}
