use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default mount point of the backend's health API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/health";

#[derive(Serialize)]
struct ChatRequest {
    message: String,
    sender: &'static str,
}

/// Payload returned by the assistant backend for one chat turn.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub intent: Option<String>,
    pub confidence: Option<f64>,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one user message. Fails only on transport errors; the HTTP
    /// status is judged in [`read_chat_reply`].
    pub async fn dispatch_chat(&self, message: &str) -> Result<reqwest::Response> {
        let url = format!("{}/chat", self.base_url);

        let request = ChatRequest {
            message: message.to_string(),
            sender: "user",
        };

        debug!(url = %url, "dispatching chat message");
        let response = self.client.post(&url).json(&request).send().await?;
        Ok(response)
    }

    /// Judge the backend's answer: non-2xx status or an unparseable body is
    /// a response failure.
    pub async fn read_chat_reply(response: reqwest::Response) -> Result<ChatReply> {
        if !response.status().is_success() {
            return Err(anyhow!(
                "chat request failed with status: {}",
                response.status()
            ));
        }

        let reply: ChatReply = response.json().await?;
        Ok(reply)
    }

    /// Full round trip: dispatch, then read.
    pub async fn send_chat(&self, message: &str) -> Result<ChatReply> {
        let response = self.dispatch_chat(message).await?;
        Self::read_chat_reply(response).await
    }

    /// Primary reachability check. Any 2xx means reachable.
    pub async fn probe_primary(&self) -> bool {
        self.probe(&format!("{}/health-tips", self.base_url)).await
    }

    /// Fallback reachability check, only meant to run after the primary
    /// probe failed.
    pub async fn probe_fallback(&self) -> bool {
        self.probe(&format!("{}/test", self.base_url)).await
    }

    async fn probe(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(response) => {
                let ok = response.status().is_success();
                debug!(url = %url, status = %response.status(), "probe completed");
                ok
            }
            Err(err) => {
                debug!(url = %url, error = %err, "probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:8000/api/health/");
        assert_eq!(client.base_url(), "http://localhost:8000/api/health");
    }

    #[test]
    fn test_chat_reply_optional_fields() {
        let reply: ChatReply = serde_json::from_str(r#"{"response":"hi"}"#).unwrap();
        assert_eq!(reply.response, "hi");
        assert!(reply.intent.is_none());
        assert!(reply.confidence.is_none());

        let reply: ChatReply =
            serde_json::from_str(r#"{"response":"hi","intent":"greet","confidence":0.9}"#).unwrap();
        assert_eq!(reply.intent.as_deref(), Some("greet"));
        assert_eq!(reply.confidence, Some(0.9));
    }

    #[test]
    fn test_chat_request_wire_shape() {
        let request = ChatRequest {
            message: "I have a fever".to_string(),
            sender: "user",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["message"], "I have a fever");
        assert_eq!(json["sender"], "user");
    }
}
