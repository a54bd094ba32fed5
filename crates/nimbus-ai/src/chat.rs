//! Assistant panel conversation

use parking_lot::RwLock;
use std::sync::Arc;

use crate::client::AiClient;
use crate::types::{ChatMessage, UserLocation};

/// Reply appended when the request fails for any reason
pub const CHAT_ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Default)]
struct ChatState {
    messages: Vec<ChatMessage>,
    is_loading: bool,
}

/// Append-only message list shared by every clone of the session
#[derive(Default)]
pub struct ChatSession {
    state: Arc<RwLock<ChatState>>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state.read().messages.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading
    }

    pub fn len(&self) -> usize {
        self.state.read().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().messages.is_empty()
    }

    /// Send a user message and append the model's reply. Blank messages are
    /// ignored. Failures are logged and answered with [`CHAT_ERROR_REPLY`].
    pub async fn send(
        &self,
        client: &AiClient,
        text: &str,
        location: Option<UserLocation>,
    ) -> Option<ChatMessage> {
        if text.trim().is_empty() {
            return None;
        }

        {
            let mut state = self.state.write();
            state.messages.push(ChatMessage::user(text));
            state.is_loading = true;
        }

        let reply = match client.chat(text, location).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, "Chat request failed");
                ChatMessage::model(CHAT_ERROR_REPLY, Vec::new())
            }
        };

        let mut state = self.state.write();
        state.messages.push(reply.clone());
        state.is_loading = false;

        Some(reply)
    }
}

impl Clone for ChatSession {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiConfig;
    use crate::types::Role;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AiClient {
        AiClient::new(
            AiConfig::default()
                .with_api_key("k")
                .with_base_url(server.uri()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_appends_user_and_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Hi!"}]}}]
            })))
            .mount(&server)
            .await;

        let chat = ChatSession::new();
        let reply = chat.send(&client_for(&server), "hello", None).await.unwrap();
        assert_eq!(reply.text, "Hi!");

        let messages = chat.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text, "hello");
        assert_eq!(messages[1].role, Role::Model);
        assert!(!chat.is_loading());
    }

    #[tokio::test]
    async fn test_failure_appends_apology() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let chat = ChatSession::new();
        let reply = chat.send(&client_for(&server), "hello", None).await.unwrap();
        assert_eq!(reply.text, CHAT_ERROR_REPLY);
        assert!(reply.sources.is_empty());
        assert_eq!(chat.len(), 2);
        assert!(!chat.is_loading());
    }

    #[tokio::test]
    async fn test_blank_message_is_ignored() {
        let server = MockServer::start().await;
        let chat = ChatSession::new();
        assert!(chat.send(&client_for(&server), "   ", None).await.is_none());
        assert!(chat.is_empty());
    }
}
