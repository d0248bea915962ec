use anyhow::{anyhow, Result};
use serde::{Deserialize, Deserializer};
use std::fmt;

use crate::notice::request::NoticeLimits;
use crate::sources::fetch::Credentials;
use crate::utils::constants::*;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    pub notice: NoticeConfig,
}

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    /// subtracted from upstream token lifetime
    pub safety_margin_seconds: Option<u64>,
    /// per outbound request (token exchange, message send)
    pub http_timeout_ms: Option<u64>,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub logging: Option<LoggingConfig>
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { path: default_metrics_path(), is_enabled: false }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host", deserialize_with = "string_or_number")]
    pub host: String,
    #[serde(default = "default_port", deserialize_with = "string_or_number")]
    pub port: String
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

/// ================================
/// Upstream credentials
/// ================================
#[derive(Deserialize, Clone)]
pub struct CredentialsConfig {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub secret: String,
    /// numeric upstream agent id
    #[serde(default, deserialize_with = "string_or_number")]
    pub agent_id: String,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("id", &self.id)
            .field("secret", &"***")
            .field("agent_id", &self.agent_id)
            .finish()
    }
}

impl CredentialsConfig {
    pub fn to_credentials(&self) -> Result<Credentials> {
        let agent_id = self
            .agent_id
            .trim()
            .parse::<i64>()
            .map_err(|e| anyhow!("credentials.agent_id '{}' is not numeric: {}", self.agent_id, e))?;
        Ok(Credentials {
            id: self.id.to_owned(),
            secret: self.secret.to_owned(),
            agent_id,
        })
    }
}

/// ================================
/// Upstream endpoints
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct EndpointsConfig {
    /// `{{id}}` and `{{secret}}` are substituted
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// `{{access_token}}` is substituted
    #[serde(default = "default_message_url")]
    pub message_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self { token_url: default_token_url(), message_url: default_message_url() }
    }
}

/// ================================
/// Inbound notices
/// ================================
#[derive(Deserialize, Clone)]
pub struct NoticeConfig {
    /// shared token clients must present
    #[serde(default, deserialize_with = "string_or_number")]
    pub auth_token: String,
    #[serde(default = "default_max_content_bytes")]
    pub max_content_bytes: usize,
    #[serde(default = "default_max_recipients")]
    pub max_recipients: usize,
}

impl fmt::Debug for NoticeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoticeConfig")
            .field("auth_token", &"***")
            .field("max_content_bytes", &self.max_content_bytes)
            .field("max_recipients", &self.max_recipients)
            .finish()
    }
}

impl NoticeConfig {
    pub fn limits(&self) -> NoticeLimits {
        NoticeLimits {
            max_recipients: self.max_recipients,
            max_content_bytes: self.max_content_bytes,
        }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new (level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

/// Env expansion can leave values unquoted (`agent_id: 1000002`) or empty.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => String::new(),
        Some(Raw::Int(v)) => v.to_string(),
        Some(Raw::Float(v)) => v.to_string(),
        Some(Raw::Bool(v)) => v.to_string(),
        Some(Raw::Text(v)) => v,
    })
}

fn default_metrics_path() -> String {
    DEFAULT_METRICS_PATH.to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> String {
    DEFAULT_PORT.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_message_url() -> String {
    DEFAULT_MESSAGE_URL.to_string()
}

fn default_max_content_bytes() -> usize {
    DEFAULT_MAX_CONTENT_BYTES
}

fn default_max_recipients() -> usize {
    DEFAULT_MAX_RECIPIENTS
}
