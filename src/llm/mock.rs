//! Mock LLM client for testing.
//!
//! Speaks the agent's Action / Final Answer format with deterministic
//! replies: scripted replies first, then pattern-based defaults.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{ChatError, Result};
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Reply used when no pattern matches the question.
pub const UNKNOWN_QUESTION_REPLY: &str =
    "Final Answer: I don't understand that question. Could you please rephrase it?";

/// Mock LLM client that returns canned agent replies.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    /// Replies returned in order before falling back to patterns.
    script: Mutex<VecDeque<String>>,
    /// Custom response mappings (question pattern -> reply).
    custom_responses: Vec<(String, String)>,
    /// When set, every call fails with this LLM error.
    failure: Option<String>,
    calls: AtomicUsize,
    last_request: Mutex<Vec<Message>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues replies that are returned one per call, in order.
    pub fn with_script<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut script) = self.script.lock() {
            script.extend(replies.into_iter().map(Into::into));
        }
        self
    }

    /// Adds a custom response mapping.
    ///
    /// When the question contains `pattern`, the mock returns `response`.
    pub fn with_response(mut self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        self.custom_responses.push((pattern.into(), response.into()));
        self
    }

    /// Makes every call fail with an LLM error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Number of completion calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages of the most recent call.
    pub fn last_request(&self) -> Vec<Message> {
        self.last_request
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    fn next_scripted(&self) -> Option<String> {
        self.script.lock().ok().and_then(|mut s| s.pop_front())
    }

    /// Default reply for a question when nothing is scripted.
    fn mock_response(&self, question: &str) -> String {
        let q = question.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if q.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        let action = |sql: &str| {
            format!("Thought: I should query the database.\nAction: sql_db_query\nAction Input: {sql}")
        };

        if q.contains("tables") {
            return "Thought: I should look at the tables in the database.\nAction: sql_db_list_tables\nAction Input: "
                .to_string();
        }
        if q.contains("delete") && q.contains("user") {
            return action("DELETE FROM users WHERE id = 3");
        }
        if q.contains("update") && q.contains("user") {
            return action("UPDATE users SET name = 'Updated Name' WHERE id = 1");
        }
        if q.contains("how many") && q.contains("orders") {
            return action("SELECT COUNT(*) FROM orders");
        }
        if q.contains("how many") && q.contains("users") {
            return action("SELECT COUNT(*) FROM users");
        }
        if q.contains("users") {
            return action("SELECT * FROM users LIMIT 5");
        }
        if q.contains("orders") {
            return action("SELECT * FROM orders LIMIT 5");
        }

        UNKNOWN_QUESTION_REPLY.to_string()
    }

    fn default_reply(&self, messages: &[Message]) -> String {
        let last_user = messages.iter().rev().find(|m| m.role == Role::User);

        if let Some(observation) = last_user.and_then(|m| m.content.strip_prefix("Observation:")) {
            return format!(
                "Thought: I now know the final answer.\nFinal Answer: {}",
                observation.trim()
            );
        }

        let question = messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.trim_start_matches("Question:").trim())
            .unwrap_or_default();

        self.mock_response(question)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.complete_with_stop(messages, &[]).await
    }

    async fn complete_with_stop(&self, messages: &[Message], stop: &[&str]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = messages.to_vec();
        }

        if let Some(message) = &self.failure {
            return Err(ChatError::llm(message.clone()));
        }

        let mut reply = self
            .next_scripted()
            .unwrap_or_else(|| self.default_reply(messages));

        // Emulate the API cutting generation at a stop sequence.
        for s in stop {
            if let Some(idx) = reply.find(s) {
                reply.truncate(idx);
            }
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(q: &str) -> Vec<Message> {
        vec![Message::system("prefix"), Message::user(format!("Question: {q}"))]
    }

    #[tokio::test]
    async fn test_default_patterns() {
        let client = MockLlmClient::new();

        let reply = client.complete(&question("Show me the users")).await.unwrap();
        assert!(reply.contains("Action: sql_db_query"));
        assert!(reply.contains("SELECT * FROM users LIMIT 5"));

        let reply = client.complete(&question("What is love?")).await.unwrap();
        assert_eq!(reply, UNKNOWN_QUESTION_REPLY);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_observation_becomes_final_answer() {
        let client = MockLlmClient::new();
        let mut messages = question("How many users?");
        messages.push(Message::assistant("Action: sql_db_query\nAction Input: SELECT 1"));
        messages.push(Message::user("Observation: count\n3"));

        let reply = client.complete(&messages).await.unwrap();
        assert!(reply.ends_with("Final Answer: count\n3"));
    }

    #[tokio::test]
    async fn test_script_then_fallback() {
        let client = MockLlmClient::new().with_script(["first", "second"]);

        assert_eq!(client.complete(&question("x")).await.unwrap(), "first");
        assert_eq!(client.complete(&question("x")).await.unwrap(), "second");
        assert_eq!(
            client.complete(&question("x")).await.unwrap(),
            UNKNOWN_QUESTION_REPLY
        );
    }

    #[tokio::test]
    async fn test_custom_response_and_stop() {
        let client = MockLlmClient::new().with_response(
            "revenue",
            "Final Answer: lots\nObservation: should be cut",
        );

        let reply = client
            .complete_with_stop(&question("Total revenue?"), &["\nObservation:"])
            .await
            .unwrap();
        assert_eq!(reply, "Final Answer: lots");
        assert_eq!(client.last_request().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_client() {
        let client = MockLlmClient::failing("Rate limited. Please wait and try again.");
        let err = client.complete(&question("x")).await.unwrap_err();
        assert!(matches!(err, ChatError::Llm(_)));
    }
}
