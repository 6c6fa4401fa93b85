use crate::config::CompletionConfig;
use crate::relay::types::{
    ChatMessage, CompletionRequest, CompletionResponse, RelayError, RelayResult,
};
use reqwest::Client;
use std::time::Duration;
use tracing::log::{debug, error};

/// Client for a hosted chat-completion endpoint (OpenRouter/OpenAI wire
/// shape: `{model, messages}` in, `{choices: [{message}]}` out).
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    config: CompletionConfig,
}
impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build completion Reqwest client!");

        Self { client, config }
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// Requests a completion for the given turns, with the configured system
    /// prompt prepended. Returns the first choice's message content.
    pub async fn complete(&self, turns: Vec<ChatMessage>) -> RelayResult<String> {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        if let Some(system_prompt) = &self.config.system_prompt {
            messages.push(ChatMessage::system(system_prompt.clone()));
        }
        messages.extend(turns);

        let request_body = CompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let mut request = self.client.post(&self.config.url).json(&request_body);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        debug!("Requesting completion from {}", self.config.url);
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Completion API error: {status} - {error_text}");
            return Err(RelayError::Completion(format!("{status}: {error_text}")));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to parse completion response: {e}");
            RelayError::Completion(format!("Parse error: {e}"))
        })?;

        match completion.choices.into_iter().next() {
            Some(choice) if !choice.message.content.is_empty() => {
                debug!("Received completion response");
                Ok(choice.message.content)
            }
            Some(_) => Err(RelayError::Completion("Empty completion content".to_string())),
            None => Err(RelayError::Completion("No choices in response".to_string())),
        }
    }
}
