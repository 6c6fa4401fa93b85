use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

pub const VERIFY_EVENT: &str = "webhook_verify";

/// Inbound gateway notification. Every field is optional so that any JSON
/// object parses: the handler decides what to do with missing pieces
/// instead of letting the gateway see a 4xx.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub event: Option<String>,

    #[serde(default)]
    pub whatsapp_reports: Vec<WhatsappReport>,
}
impl WebhookPayload {
    pub fn is_verification(&self) -> bool {
        self.event.as_deref() == Some(VERIFY_EVENT)
    }

    /// The `(from, body)` pair of the first report, if one is fully present.
    pub fn first_message(&self) -> Option<(&str, &str)> {
        let report = self.whatsapp_reports.first()?;
        match (report.from.as_deref(), report.body.as_deref()) {
            (Some(from), Some(body)) if !from.is_empty() && !body.is_empty() => Some((from, body)),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WhatsappReport {
    #[serde(default)]
    pub from: Option<String>,

    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub status: &'static str,
}

/// The webhook's only responses. Both are 200: the upstream gateway must
/// never see a failure, or it re-delivers the notification.
pub enum WebhookAck {
    Empty,
    Verified,
}
impl IntoResponse for WebhookAck {
    fn into_response(self) -> Response {
        match self {
            WebhookAck::Empty => StatusCode::OK.into_response(),
            WebhookAck::Verified => {
                (StatusCode::OK, Json(VerifyResponse { status: "success" })).into_response()
            }
        }
    }
}
