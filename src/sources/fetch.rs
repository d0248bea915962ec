use std::collections::HashMap;
use std::fmt;

use reqwest::Client;
use tracing::debug;

use crate::errors::FetchError;
use crate::parser::{parser, template::render_url};

/// Shared secret exchanged for access tokens, plus the agent notices are sent as.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub id: String,
    pub secret: String,
    pub agent_id: i64,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("secret", &"***")
            .field("agent_id", &self.agent_id)
            .finish()
    }
}

/// Result of one successful token exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedToken {
    pub access_token: String,
    /// nominal lifetime in seconds, as reported upstream
    pub expires_in: i64,
}

/// One round trip exchanging credentials for a fresh token. No caching, no retries.
pub trait FetchToken: Send + Sync {
    fn fetch_token(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<FetchedToken, FetchError>> + Send;
}

/// Fetches tokens with `GET <token_url>` where the url template carries
/// `{{id}}` and `{{secret}}` placeholders.
#[derive(Debug, Clone)]
pub struct HttpTokenFetcher {
    client: Client,
    token_url: String,
}

impl HttpTokenFetcher {
    pub fn new(client: Client, token_url: impl Into<String>) -> Self {
        Self { client, token_url: token_url.into() }
    }
}

impl FetchToken for HttpTokenFetcher {
    async fn fetch_token(&self, credentials: &Credentials) -> Result<FetchedToken, FetchError> {
        let ctx = HashMap::from([("id", credentials.id.as_str()), ("secret", credentials.secret.as_str())]);
        let url = render_url(&self.token_url, &ctx).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        debug!(host = url.host_str().unwrap_or_default(), path = url.path(), "requesting access token");
        let response = self.client.get(url).send().await.map_err(FetchError::Transport)?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }
        let body = response.text().await.map_err(FetchError::Transport)?;
        parser::parse_token_response(&body)
    }
}
