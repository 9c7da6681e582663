use anyhow::Result;
use reqwest::Client;
use triage_chat_agent::TurnOutcome;
use triage_chat_providers::ChatMessage;
use triage_chat_server::SymptomRequest;

/// Client for a running `triage-chat serve` instance
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| "http://127.0.0.1:3000/api".to_string());
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Run one stateless turn on the server.
    ///
    /// Error outcomes come back as `TurnOutcome::Error` with whatever status the
    /// server chose; only transport failures are returned as `Err`.
    pub async fn check(&self, message: &str, history: Vec<ChatMessage>) -> Result<TurnOutcome> {
        let url = format!("{}/symptom-checker", self.base_url);
        let request = SymptomRequest {
            message: message.to_string(),
            history,
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        match response.json::<TurnOutcome>().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => anyhow::bail!("Server returned {} with an unreadable body: {}", status, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_check_posts_message_and_history() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/symptom-checker")
            .match_body(Matcher::Json(json!({
                "message": "cough",
                "history": [{"role": "user", "content": "earlier"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"reply":"<p>Rest</p>\n"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(Some(format!("{}/api/", server.url())));
        let outcome = client
            .check("cough", vec![ChatMessage::user("earlier")])
            .await
            .unwrap();

        assert_eq!(outcome, TurnOutcome::Reply("<p>Rest</p>\n".to_string()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_check_reads_error_outcome() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/symptom-checker")
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Something went wrong"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(Some(format!("{}/api", server.url())));
        let outcome = client.check("cough", Vec::new()).await.unwrap();
        assert!(outcome.is_error());
    }
}
