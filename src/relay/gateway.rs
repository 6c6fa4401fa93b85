use crate::config::GatewayConfig;
use crate::relay::types::{GatewaySendRequest, GatewaySendResponse, RelayError, RelayResult};
use reqwest::Client;
use std::time::Duration;
use tracing::log::{debug, error};

/// Submits generated replies to the messaging gateway's send endpoint.
/// Failures here are reported to the caller for logging only; they must
/// never reach the inbound webhook response.
#[derive(Clone)]
pub struct GatewaySender {
    client: Client,
    config: GatewayConfig,
}
impl GatewaySender {
    pub fn new(config: GatewayConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build gateway Reqwest client!");

        Self { client, config }
    }

    pub async fn send(&self, destination: &str, message: &str) -> RelayResult<()> {
        let request_body = GatewaySendRequest {
            route: self.config.route.as_deref(),
            message,
            numbers: destination,
        };

        let mut request = self.client.post(&self.config.send_url).json(&request_body);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("authorization", api_key);
        }

        debug!("Sending reply to {destination} via {}", self.config.send_url);
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Gateway API error: {status} - {error_text}");
            return Err(RelayError::Gateway(format!("{status}: {error_text}")));
        }

        let acknowledgment: GatewaySendResponse = response.json().await.map_err(|e| {
            error!("Failed to parse gateway response: {e}");
            RelayError::Gateway(format!("Parse error: {e}"))
        })?;

        if !acknowledgment.success {
            let detail = acknowledgment
                .message
                .map(|m| m.to_string())
                .unwrap_or_else(|| "no detail".to_string());
            return Err(RelayError::Gateway(format!("Send rejected: {detail}")));
        }

        debug!("Successfully sent reply to {destination}");
        Ok(())
    }
}
