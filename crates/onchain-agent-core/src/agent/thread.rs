//! In-memory conversation threads

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::llm::Message;

/// Conversation history keyed by thread id, kept for the life of the process
#[derive(Debug, Default)]
pub struct ThreadStore {
    threads: Mutex<HashMap<String, Vec<Message>>>,
}

impl ThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of a thread's history, empty for unknown threads
    pub async fn history(&self, thread_id: &str) -> Vec<Message> {
        self.threads
            .lock()
            .await
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn replace(&self, thread_id: &str, messages: Vec<Message>) {
        self.threads
            .lock()
            .await
            .insert(thread_id.to_string(), messages);
    }

    pub async fn clear(&self, thread_id: &str) {
        self.threads.lock().await.remove(thread_id);
    }
}
