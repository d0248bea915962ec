//! Typed failures of the token exchange and the notice send path.

use http::StatusCode;
use thiserror::Error;

/// Failure of a single token exchange round trip.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("token request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("token request returned HTTP {0}")]
    Status(StatusCode),

    #[error("token endpoint rejected credentials: {code} {message}")]
    Upstream { code: i64, message: String },

    #[error("token response is missing '{0}'")]
    MissingField(&'static str),

    #[error("token response is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("token url is invalid: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::Transport(e) if e.is_timeout() => "timeout",
            FetchError::Transport(_) => "transport",
            FetchError::Status(_) => "status",
            FetchError::Upstream { .. } => "upstream",
            FetchError::MissingField(_) => "missing_field",
            FetchError::Decode(_) => "decode",
            FetchError::InvalidUrl(_) => "invalid_url",
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Upstream issued a token whose lifetime is already over.
    #[error("token issued with non-positive ttl {ttl}")]
    Unusable { ttl: i64 },
}

#[derive(Debug, Error)]
pub enum NoticeError {
    #[error("{0}")]
    Validation(String),

    #[error("token is invalid")]
    Auth,

    #[error("access token unavailable: {0}")]
    TokenUnavailable(#[source] TokenError),

    #[error("send message failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("send message failed: {code} {message}")]
    Upstream { code: i64, message: String },

    #[error("send response is not valid: {0}")]
    Decode(String),

    #[error("message url is invalid: {0}")]
    InvalidUrl(String),
}

impl NoticeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            NoticeError::Validation(_) => StatusCode::BAD_REQUEST,
            NoticeError::Auth => StatusCode::UNAUTHORIZED,
            NoticeError::TokenUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            NoticeError::Transport(_) | NoticeError::Upstream { .. } | NoticeError::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
            NoticeError::InvalidUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            NoticeError::Validation(_) => "validation",
            NoticeError::Auth => "auth",
            NoticeError::TokenUnavailable(_) => "token_unavailable",
            NoticeError::Transport(_) => "transport",
            NoticeError::Upstream { .. } => "upstream",
            NoticeError::Decode(_) => "decode",
            NoticeError::InvalidUrl(_) => "invalid_url",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_carries_upstream_message() {
        let err = NoticeError::Upstream { code: 40014, message: "invalid access_token".into() };
        assert!(err.to_string().contains("invalid access_token"));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn token_unavailable_wraps_fetch_reason() {
        let err = NoticeError::TokenUnavailable(TokenError::Fetch(FetchError::MissingField("expires_in")));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.to_string().contains("expires_in"));
    }
}
