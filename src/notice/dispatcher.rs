use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::token_cache::TokenCache;
use crate::errors::NoticeError;
use crate::helpers::time::get_instant;
use crate::notice::request::NoticeRequest;
use crate::observability::metrics::get_metrics;
use crate::parser::{parser, template::render_url};
use crate::sources::fetch::FetchToken;

/// Result of a send that upstream accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeOutcome {
    /// recipients upstream rejected without failing the whole send
    pub invalid_recipients: Vec<String>,
}

impl NoticeOutcome {
    pub fn is_partial(&self) -> bool {
        !self.invalid_recipients.is_empty()
    }
}

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    touser: &'a str,
    msgtype: &'a str,
    agentid: i64,
    text: OutboundText<'a>,
}

#[derive(Debug, Serialize)]
struct OutboundText<'a> {
    content: &'a str,
}

/// Sends validated notices upstream with a token taken from the shared cache.
pub struct NoticeDispatcher<F> {
    cache: Arc<TokenCache<F>>,
    client: Client,
    message_url: String,
}

impl<F: FetchToken> NoticeDispatcher<F> {
    pub fn new(cache: Arc<TokenCache<F>>, client: Client, message_url: impl Into<String>) -> Self {
        Self { cache, client, message_url: message_url.into() }
    }

    pub fn cache(&self) -> &Arc<TokenCache<F>> {
        &self.cache
    }

    pub async fn send(&self, request: &NoticeRequest) -> Result<NoticeOutcome, NoticeError> {
        let token = self
            .cache
            .get_token()
            .await
            .map_err(NoticeError::TokenUnavailable)?;

        let ctx = HashMap::from([("access_token", token.as_str())]);
        let url = render_url(&self.message_url, &ctx).map_err(|e| NoticeError::InvalidUrl(e.to_string()))?;

        let payload = OutboundMessage {
            touser: &request.recipients,
            msgtype: request.message_type.as_str(),
            agentid: self.cache.credentials().agent_id,
            text: OutboundText { content: &request.content },
        };

        let metrics = get_metrics().await;
        let start = get_instant();
        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(NoticeError::Transport);
        let body = match response {
            Ok(r) => r.text().await.map_err(NoticeError::Transport),
            Err(e) => Err(e),
        };
        metrics.notice_send_duration.observe(start.elapsed().as_secs_f64());

        let invalid_recipients = parser::parse_send_response(&body?)?;
        if invalid_recipients.is_empty() {
            info!(recipients = %request.recipients, "notice sent");
        } else {
            metrics.notice_invalid_recipients.inc_by(invalid_recipients.len() as u64);
            warn!(invalid = ?invalid_recipients, "notice sent, some recipients were rejected");
        }

        Ok(NoticeOutcome { invalid_recipients })
    }
}
