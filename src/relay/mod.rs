pub mod completion;
pub mod gateway;
pub mod history;
pub mod reply;
pub mod types;

use crate::config::AppConfig;
use crate::relay::completion::CompletionClient;
use crate::relay::gateway::GatewaySender;
use crate::relay::history::ConversationStore;
use crate::relay::reply::ReplyGenerator;
use std::sync::Arc;
use tracing::log::{debug, warn};

/// One linear pass per inbound message: generate a reply (remote completion
/// or greeting rule), then hand it to the gateway. Downstream failures are
/// logged and swallowed so the webhook always acknowledges.
#[derive(Clone)]
pub struct RelayManager {
    generator: Arc<ReplyGenerator>,
    gateway: GatewaySender,
}
impl RelayManager {
    pub fn new(config: &AppConfig) -> Self {
        let generator = match &config.reply {
            crate::config::ReplyConfig::Completion(completion) => {
                let history = (completion.history_limit > 0).then(|| {
                    ConversationStore::new(completion.history_limit, completion.max_senders)
                });
                ReplyGenerator::Completion {
                    client: CompletionClient::new(completion.clone()),
                    history,
                }
            }
            crate::config::ReplyConfig::Greeting => ReplyGenerator::Greeting,
        };

        Self {
            generator: Arc::new(generator),
            gateway: GatewaySender::new(config.gateway.clone()),
        }
    }

    pub async fn handle_incoming(&self, sender: &str, text: &str) {
        debug!("Handling message from {sender}");

        let reply = match self.generator.generate(sender, text).await {
            Some(reply) => reply,
            None => return,
        };

        debug!("Reply for {sender}: {reply}");
        if let Err(e) = self.gateway.send(sender, &reply).await {
            warn!("Failed to deliver reply to {sender}: {e}");
        }
    }
}
