use crate::relay::completion::CompletionClient;
use crate::relay::history::ConversationStore;
use crate::relay::types::ChatMessage;
use tracing::log::{debug, error};

const GREETING_KEYWORDS: [&str; 3] = ["hi", "hello", "hey"];
const THANKS_KEYWORD: &str = "thank";

const GREETING_REPLY: &str = "hello";
const FALLBACK_GREETING: &str = "Hello! How can I help you today?";
const FALLBACK_THANKS: &str = "You're welcome!";
const FALLBACK_GENERIC: &str = "Sorry, something went wrong. Please try again later.";

/// Produces reply text for inbound messages. `None` means no reply should
/// be sent at all (rule-only mode with a non-greeting message).
pub enum ReplyGenerator {
    /// Remote chat-completion backed, with optional multi-turn context.
    Completion {
        client: CompletionClient,
        history: Option<ConversationStore>,
    },

    /// Fixed greeting rule, no remote call.
    Greeting,
}
impl ReplyGenerator {
    pub async fn generate(&self, sender: &str, text: &str) -> Option<String> {
        match self {
            ReplyGenerator::Greeting => {
                if contains_greeting(text) {
                    Some(GREETING_REPLY.to_string())
                } else {
                    debug!("No greeting in message from {sender}, skipping reply");
                    None
                }
            }
            ReplyGenerator::Completion { client, history } => {
                Some(Self::generate_completion(client, history.as_ref(), sender, text).await)
            }
        }
    }

    /// Completion replies always produce text: any remote failure degrades
    /// to a canned fallback chosen by keyword match on the inbound message.
    async fn generate_completion(
        client: &CompletionClient,
        history: Option<&ConversationStore>,
        sender: &str,
        text: &str,
    ) -> String {
        let turns = match history {
            Some(store) => {
                store
                    .push_and_snapshot(sender, ChatMessage::user(text))
                    .await
            }
            None => vec![ChatMessage::user(text)],
        };

        let reply = match client.complete(turns).await {
            Ok(content) => truncate_reply(&content, client.config().max_reply_chars),
            Err(e) => {
                error!("Failed to get completion reply for {sender}: {e}");
                fallback_reply(text).to_string()
            }
        };

        if let Some(store) = history {
            store.push(sender, ChatMessage::assistant(reply.clone())).await;
        }

        reply
    }
}

pub fn contains_greeting(text: &str) -> bool {
    let lowered = text.to_lowercase();
    GREETING_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// Static reply used when the completion call fails.
pub fn fallback_reply(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    if GREETING_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
    {
        FALLBACK_GREETING
    } else if lowered.contains(THANKS_KEYWORD) {
        FALLBACK_THANKS
    } else {
        FALLBACK_GENERIC
    }
}

/// Caps the reply at `max_chars` characters, replacing the tail with an
/// ellipsis. Counts chars rather than bytes so multi-byte replies never
/// split a codepoint. Caps too small to hold the ellipsis itself are a
/// hard cut: the output never exceeds `max_chars`.
pub fn truncate_reply(reply: &str, max_chars: usize) -> String {
    if reply.chars().count() <= max_chars {
        return reply.to_string();
    }

    if max_chars <= 3 {
        return reply.chars().take(max_chars).collect();
    }

    let mut truncated: String = reply.chars().take(max_chars - 3).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod reply_tests {
    use super::*;

    #[test]
    fn test_greeting_detection_case_insensitive() {
        assert!(contains_greeting("Hi there"));
        assert!(contains_greeting("HELLO"));
        assert!(contains_greeting("hey, anyone home?"));
        assert!(!contains_greeting("what time is it"));
        assert!(!contains_greeting(""));
    }

    #[test]
    fn test_fallback_selection() {
        assert_eq!(fallback_reply("Hi there"), FALLBACK_GREETING);
        assert_eq!(fallback_reply("thanks a lot!"), FALLBACK_THANKS);
        assert_eq!(fallback_reply("Thank you"), FALLBACK_THANKS);
        assert_eq!(fallback_reply("what is the weather"), FALLBACK_GENERIC);
    }

    #[test]
    fn test_truncation_at_cap() {
        let short = "short reply";
        assert_eq!(truncate_reply(short, 1000), short);

        let long = "a".repeat(1200);
        let truncated = truncate_reply(&long, 1000);
        assert_eq!(truncated.chars().count(), 1000);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let long = "é".repeat(20);
        let truncated = truncate_reply(&long, 10);
        assert_eq!(truncated.chars().count(), 10);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncation_never_exceeds_tiny_caps() {
        // Caps smaller than the ellipsis still bound the output.
        for cap in 0..=3 {
            let truncated = truncate_reply("abcdefgh", cap);
            assert!(truncated.chars().count() <= cap, "cap {cap} exceeded");
        }
        assert_eq!(truncate_reply("abcdefgh", 2), "ab");
        assert_eq!(truncate_reply("abcdefgh", 0), "");
    }

    #[test]
    fn test_exact_cap_is_untouched() {
        let exact = "b".repeat(300);
        assert_eq!(truncate_reply(&exact, 300), exact);
    }

    #[tokio::test]
    async fn test_greeting_generator_replies_hello_only_to_greetings() {
        let generator = ReplyGenerator::Greeting;
        assert_eq!(
            generator.generate("918928417703", "Hi there").await,
            Some("hello".to_string())
        );
        assert_eq!(generator.generate("918928417703", "order status?").await, None);
    }
}
