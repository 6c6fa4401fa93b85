use crate::http::types::{WebhookAck, WebhookPayload};
use crate::http::HttpState;
use axum::body::Bytes;
use axum::extract::State;
use tracing::log::{debug, info};

pub async fn health() -> &'static str {
    "WhatsApp relay running"
}

/// Gateway notification entrypoint. Every outcome maps to HTTP 200: parse
/// failures and incomplete reports are acknowledged no-ops, and downstream
/// errors are logged inside the relay manager rather than surfaced here.
pub async fn webhook(State(state): State<HttpState>, body: Bytes) -> WebhookAck {
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            debug!("Discarding unparseable webhook body: {e}");
            return WebhookAck::Empty;
        }
    };

    if payload.is_verification() {
        info!("Acknowledging gateway webhook verification");
        return WebhookAck::Verified;
    }

    let (from, text) = match payload.first_message() {
        Some(message) => message,
        None => {
            debug!("Webhook payload carries no usable report, acknowledging without processing");
            return WebhookAck::Empty;
        }
    };

    info!("Incoming message from {from}");
    state.relay.handle_incoming(from, text.trim()).await;

    WebhookAck::Empty
}

#[cfg(test)]
mod webhook_route_tests {
    use super::*;
    use crate::config::{AppConfig, ReplyConfig};
    use crate::relay::RelayManager;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    /// Greeting-mode state: the no-op paths below never touch the network.
    fn greeting_state() -> HttpState {
        let config = AppConfig {
            http: Default::default(),
            reply: ReplyConfig::Greeting,
            gateway: Default::default(),
        };
        HttpState {
            relay: RelayManager::new(&config),
        }
    }

    async fn status_for(body: &str) -> StatusCode {
        webhook(State(greeting_state()), Bytes::from(body.to_string()))
            .await
            .into_response()
            .status()
    }

    #[tokio::test]
    async fn test_unparseable_body_is_acked() {
        assert_eq!(status_for("not json at all").await, StatusCode::OK);
        assert_eq!(status_for("").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unexpected_shapes_are_acked() {
        assert_eq!(status_for(r#"{"other":"shape"}"#).await, StatusCode::OK);
        assert_eq!(status_for(r#"{"whatsapp_reports":[]}"#).await, StatusCode::OK);
        assert_eq!(
            status_for(r#"{"whatsapp_reports":[{"from":"918928417703"}]}"#).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_verification_event_returns_success_body() {
        let response = webhook(
            State(greeting_state()),
            Bytes::from(r#"{"event":"webhook_verify"}"#),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"status": "success"}));
    }

    #[tokio::test]
    async fn test_non_greeting_message_is_acked_without_reply() {
        // Greeting mode produces no reply here, so no outbound call is made
        // and the gateway still gets its 200.
        let status =
            status_for(r#"{"whatsapp_reports":[{"from":"918928417703","body":"order status?"}]}"#)
                .await;
        assert_eq!(status, StatusCode::OK);
    }
}
