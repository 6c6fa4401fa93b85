use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tracing::log::warn;

const OPENROUTER_KEY_VAR: &str = "OPENROUTER_API_KEY";
const GATEWAY_KEY_VAR: &str = "FAST2SMS_API_KEY";

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub reply: ReplyConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}
impl AppConfig {
    pub fn load(config_filepath: Option<PathBuf>) -> Result<Self> {
        let config_path = config_filepath.unwrap_or_else(|| PathBuf::from("config.toml"));

        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {config_path:?}"))?;

        let mut config: AppConfig = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse TOML config file: {config_path:?}"))?;

        config.resolve_credentials();
        Ok(config)
    }

    /// Fills missing API keys from the environment. Absent credentials are a
    /// warning rather than an error: the affected downstream call fails and
    /// is logged, while the webhook keeps acknowledging inbound requests.
    fn resolve_credentials(&mut self) {
        if let ReplyConfig::Completion(completion) = &mut self.reply {
            if completion.api_key.is_none() {
                completion.api_key = env::var(OPENROUTER_KEY_VAR).ok();
            }
            if completion.api_key.is_none() {
                warn!("No completion API key in config or {OPENROUTER_KEY_VAR}, completion requests will be rejected upstream!");
            }
        }

        if self.gateway.api_key.is_none() {
            self.gateway.api_key = env::var(GATEWAY_KEY_VAR).ok();
        }
        if self.gateway.api_key.is_none() {
            warn!("No gateway API key in config or {GATEWAY_KEY_VAR}, outbound sends will be rejected upstream!");
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_address")]
    pub address: SocketAddr,

    #[serde(default)]
    pub tls: Option<TLSConfig>,
}
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: default_http_address(),
            tls: None,
        }
    }
}

#[cfg_attr(
    not(any(feature = "tls-rustls", feature = "tls-native")),
    allow(dead_code)
)]
#[derive(Debug, Clone, Deserialize)]
pub struct TLSConfig {
    #[serde(deserialize_with = "deserialize_existing_file")]
    pub certificate_path: PathBuf,

    #[serde(deserialize_with = "deserialize_existing_file")]
    pub key_path: PathBuf,
}

/// Selects how replies are produced for inbound messages.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReplyConfig {
    /// Forward the message to a hosted chat-completion API.
    Completion(CompletionConfig),

    /// No remote call: reply "hello" to greetings, ignore everything else.
    Greeting,
}
impl Default for ReplyConfig {
    fn default() -> Self {
        ReplyConfig::Completion(CompletionConfig::default())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_completion_url")]
    pub url: String,

    #[serde(default = "default_completion_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub system_prompt: Option<String>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub temperature: Option<f32>,

    /// Replies longer than this are truncated with a trailing ellipsis.
    #[serde(default = "default_max_reply_chars")]
    pub max_reply_chars: usize,

    /// Prior turns kept per sender for multi-turn context. 0 disables
    /// history entirely; each request then carries only the new message.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Distinct senders tracked before the least-recently-active
    /// conversation is evicted.
    #[serde(default = "default_max_senders")]
    pub max_senders: usize,

    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
}
impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            url: default_completion_url(),
            model: default_completion_model(),
            api_key: None,
            system_prompt: None,
            max_tokens: None,
            temperature: None,
            max_reply_chars: default_max_reply_chars(),
            history_limit: default_history_limit(),
            max_senders: default_max_senders(),
            timeout_secs: default_completion_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_send_url")]
    pub send_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Optional gateway routing parameter, passed through verbatim.
    #[serde(default)]
    pub route: Option<String>,

    #[serde(default = "default_gateway_timeout_secs")]
    pub timeout_secs: u64,
}
impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            send_url: default_gateway_send_url(),
            api_key: None,
            route: None,
            timeout_secs: default_gateway_timeout_secs(),
        }
    }
}

fn default_http_address() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 3000)
}
fn default_completion_url() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}
fn default_completion_model() -> String {
    "deepseek/deepseek-r1-0528:free".to_string()
}
fn default_gateway_send_url() -> String {
    "https://www.fast2sms.com/dev/whatsapp/send".to_string()
}
fn default_max_reply_chars() -> usize {
    1000
}
fn default_history_limit() -> usize {
    10
}
fn default_max_senders() -> usize {
    1024
}
fn default_completion_timeout_secs() -> u64 {
    30
}
fn default_gateway_timeout_secs() -> u64 {
    10
}

fn deserialize_existing_file<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let path = PathBuf::deserialize(deserializer)?;
    if !path.exists() {
        return Err(serde::de::Error::custom(format!(
            "File does not exist: {}",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(serde::de::Error::custom(format!(
            "Path is not a file: {}",
            path.display()
        )));
    }
    Ok(path)
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_config() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.http.address, default_http_address());
        assert!(config.http.tls.is_none());
        assert_eq!(config.gateway.send_url, default_gateway_send_url());
        assert_eq!(config.gateway.timeout_secs, 10);

        match config.reply {
            ReplyConfig::Completion(completion) => {
                assert_eq!(completion.url, default_completion_url());
                assert_eq!(completion.max_reply_chars, 1000);
                assert_eq!(completion.history_limit, 10);
            }
            ReplyConfig::Greeting => panic!("Expected completion default!"),
        }
    }

    #[test]
    fn test_greeting_mode() {
        let config: AppConfig = toml::from_str(
            r#"
            [reply]
            mode = "greeting"
            "#,
        )
        .unwrap();
        assert!(matches!(config.reply, ReplyConfig::Greeting));
    }

    #[test]
    fn test_completion_overrides() {
        let config: AppConfig = toml::from_str(
            r#"
            [http]
            address = "0.0.0.0:8080"

            [reply]
            mode = "completion"
            model = "gpt-4.1-mini"
            max_reply_chars = 300
            history_limit = 0
            temperature = 0.8

            [gateway]
            route = "whatsapp"
            api_key = "abc123"
            "#,
        )
        .unwrap();

        assert_eq!(config.http.address.port(), 8080);
        assert_eq!(config.gateway.route.as_deref(), Some("whatsapp"));
        assert_eq!(config.gateway.api_key.as_deref(), Some("abc123"));

        match config.reply {
            ReplyConfig::Completion(completion) => {
                assert_eq!(completion.model, "gpt-4.1-mini");
                assert_eq!(completion.max_reply_chars, 300);
                assert_eq!(completion.history_limit, 0);
                assert_eq!(completion.temperature, Some(0.8));
            }
            ReplyConfig::Greeting => panic!("Expected completion mode!"),
        }
    }
}
