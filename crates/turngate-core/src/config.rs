use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Hard ceiling on tool-loop iterations for chat/WhatsApp turns (§4.10).
pub const DEFAULT_MAX_TOOL_ITERATIONS_CHAT: u32 = 6;
/// Source default for email turns, which tolerate fewer round-trips (§4.10).
pub const DEFAULT_MAX_TOOL_ITERATIONS_EMAIL: u32 = 3;

/// Top-level config (config.toml + TURNGATE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurngateConfig {
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub businesses: Vec<BusinessConfig>,
    #[serde(default)]
    pub webhooks: WebhooksConfig,
}

impl Default for TurngateConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig {
                port: DEFAULT_PORT,
                bind: DEFAULT_BIND.to_string(),
                auth: AuthConfig {
                    mode: AuthMode::Token,
                    token: Some("change-me".to_string()),
                },
            },
            database: DatabaseConfig::default(),
            llm: LlmConfig::default(),
            sessions: SessionsConfig::default(),
            tools: ToolsConfig::default(),
            businesses: Vec::new(),
            webhooks: WebhooksConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    Token,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub anthropic_api_key: Option<String>,
    #[serde(default = "default_anthropic_base_url")]
    pub anthropic_base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            anthropic_base_url: default_anthropic_base_url(),
            model: default_model(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    #[serde(default = "default_state_ttl_secs")]
    pub state_ttl_secs: i64,
    #[serde(default = "default_pii_lock_ttl_secs")]
    pub pii_lock_ttl_secs: i64,
    #[serde(default = "default_enumeration_lock_ttl_secs")]
    pub enumeration_lock_ttl_secs: i64,
    #[serde(default = "default_enumeration_threshold")]
    pub enumeration_threshold: u32,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            state_ttl_secs: default_state_ttl_secs(),
            pii_lock_ttl_secs: default_pii_lock_ttl_secs(),
            enumeration_lock_ttl_secs: default_enumeration_lock_ttl_secs(),
            enumeration_threshold: default_enumeration_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_tool_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_tool_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_tool_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_tool_timeout_ms(),
            max_attempts: default_tool_max_attempts(),
            backoff_base_ms: default_tool_backoff_base_ms(),
        }
    }
}

/// Per-business feature flags and identity. `channel_proof_autoverify` is the
/// sole gate for the Autoverify Gate (§4.6, §9 open question #3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub channel_proof_autoverify: bool,
    #[serde(default = "default_language")]
    pub default_language: String,
}

fn default_language() -> String {
    "tr".to_string()
}

/// Authentication mode for an incoming webhook source (WhatsApp/email providers).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WebhookAuthMode {
    HmacSha256,
    BearerToken,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSourceConfig {
    pub name: String,
    pub secret: Option<String>,
    pub auth_mode: WebhookAuthMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WebhooksConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub sources: Vec<WebhookSourceConfig>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_model() -> String {
    "claude-sonnet-4-6".to_string()
}
fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}
fn default_request_timeout_ms() -> u64 {
    30_000
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.turngate/turngate.db", home)
}
fn default_state_ttl_secs() -> i64 {
    24 * 3600
}
fn default_pii_lock_ttl_secs() -> i64 {
    3600
}
fn default_enumeration_lock_ttl_secs() -> i64 {
    3600
}
fn default_enumeration_threshold() -> u32 {
    3
}
fn default_tool_timeout_ms() -> u64 {
    8_000
}
fn default_tool_max_attempts() -> u32 {
    3
}
fn default_tool_backoff_base_ms() -> u64 {
    200
}

impl TurngateConfig {
    /// Load config from a TOML file with TURNGATE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.turngate/turngate.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: TurngateConfig = Figment::from(figment::providers::Serialized::defaults(
            TurngateConfig::default(),
        ))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("TURNGATE_").split("__"))
        .extract()
        .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.turngate/turngate.toml", home)
}
