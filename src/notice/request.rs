use serde::{Deserialize, Serialize};

use crate::errors::NoticeError;
use crate::parser::parser::split_recipients;

/// Inbound `POST /notice` body as sent by clients.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeBody {
    #[serde(default, alias = "users")]
    pub recipients: Option<String>,
    #[serde(default, alias = "type")]
    pub message_type: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "text" => Some(MessageType::Text),
            _ => None,
        }
    }
}

/// Size limits applied to inbound notices.
#[derive(Debug, Clone, Copy)]
pub struct NoticeLimits {
    pub max_recipients: usize,
    pub max_content_bytes: usize,
}

/// Validated notice, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeRequest {
    /// `user1|user2`, normalized
    pub recipients: String,
    pub message_type: MessageType,
    pub content: String,
}

impl NoticeRequest {
    pub fn validate(body: NoticeBody, limits: &NoticeLimits) -> Result<Self, NoticeError> {
        let recipients = body
            .recipients
            .as_deref()
            .map(split_recipients)
            .unwrap_or_default();
        if recipients.is_empty() {
            return Err(NoticeError::Validation("\"recipients\" is required".to_owned()));
        }
        if recipients.len() > limits.max_recipients {
            return Err(NoticeError::Validation(format!(
                "\"recipients\" must contain at most {} entries, got {}",
                limits.max_recipients,
                recipients.len()
            )));
        }

        let message_type = match body.message_type.as_deref().filter(|t| !t.trim().is_empty()) {
            None => MessageType::default(),
            Some(raw) => MessageType::parse(raw).ok_or_else(|| {
                NoticeError::Validation(format!("\"messageType\" '{}' is not supported", raw))
            })?,
        };

        let content = body.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(NoticeError::Validation("\"content\" is required".to_owned()));
        }
        if content.len() > limits.max_content_bytes {
            return Err(NoticeError::Validation(format!(
                "\"content\" must be at most {} bytes, got {}",
                limits.max_content_bytes,
                content.len()
            )));
        }

        Ok(Self {
            recipients: recipients.join("|"),
            message_type,
            content,
        })
    }
}

/// Compare the caller supplied auth token with the configured one.
pub fn authenticate(provided: Option<&str>, expected: &str) -> Result<(), NoticeError> {
    match provided {
        Some(provided) if constant_time_eq(provided.as_bytes(), expected.as_bytes()) => Ok(()),
        _ => Err(NoticeError::Auth),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
