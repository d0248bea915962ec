use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::token::CachedToken;
use crate::errors::TokenError;
use crate::helpers::time::{get_instant, Clock, SystemClock};
use crate::observability::metrics::{get_metrics, LOOKUP_FAST, LOOKUP_LOCKED, LOOKUP_REFRESH};
use crate::sources::fetch::{Credentials, FetchToken};

static UNUSABLE_MSG: &str = "unusable";

/// Single-scope access token cache with lazy, double-checked refresh.
///
/// Readers load the current token without locking. Only a caller that sees
/// no valid token takes `refresh_lock`, re-checks, and fetches; so at most
/// one fetch is in flight per cache at any time.
pub struct TokenCache<F> {
    fetcher: F,
    credentials: Arc<Credentials>,
    clock: Arc<dyn Clock>,
    safety_margin_seconds: i64,
    current: ArcSwapOption<CachedToken>,
    refresh_lock: Mutex<()>,
}

impl<F: FetchToken> TokenCache<F> {
    pub fn new(fetcher: F, credentials: Arc<Credentials>, safety_margin_seconds: u64) -> Self {
        Self {
            fetcher,
            credentials,
            clock: Arc::new(SystemClock),
            safety_margin_seconds: i64::try_from(safety_margin_seconds).unwrap_or(i64::MAX),
            current: ArcSwapOption::empty(),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Snapshot of the installed token, valid or not.
    pub fn current(&self) -> Option<CachedToken> {
        self.current.load_full().map(|token| token.as_ref().clone())
    }

    /// Return a valid access token, fetching a new one if needed.
    pub async fn get_token(&self) -> Result<String, TokenError> {
        let metrics = get_metrics().await;

        if let Some(value) = self.valid_token() {
            metrics.token_lookups.with_label_values(&[LOOKUP_FAST]).inc();
            return Ok(value);
        }

        let _guard = self.refresh_lock.lock().await;

        // another caller may have refreshed while this one was waiting
        if let Some(value) = self.valid_token() {
            metrics.token_lookups.with_label_values(&[LOOKUP_LOCKED]).inc();
            debug!("token refreshed by concurrent caller");
            return Ok(value);
        }

        metrics.token_lookups.with_label_values(&[LOOKUP_REFRESH]).inc();
        self.refresh().await
    }

    fn valid_token(&self) -> Option<String> {
        let now = self.clock.now_unix_ts();
        self.current
            .load_full()
            .filter(|token| token.is_valid_at(now))
            .map(|token| token.value.clone())
    }

    /// Must be called with `refresh_lock` held. Leaves the cache untouched on failure.
    async fn refresh(&self) -> Result<String, TokenError> {
        let metrics = get_metrics().await;
        let start = get_instant();
        let fetched_at = self.clock.now_unix_ts();

        metrics.token_fetch_requests.inc();
        let fetched = self
            .fetcher
            .fetch_token(&self.credentials)
            .await
            .inspect_err(|e| {
                metrics.token_fetch_failures.with_label_values(&[e.reason()]).inc();
                warn!(error = %e, "token refresh failed, previous token kept");
            });
        metrics.token_fetch_duration.observe(start.elapsed().as_secs_f64());
        let fetched = fetched?;

        if fetched.expires_in <= 0 {
            metrics.token_fetch_failures.with_label_values(&[UNUSABLE_MSG]).inc();
            warn!(expires_in = fetched.expires_in, "token issued already expired");
            return Err(TokenError::Unusable { ttl: fetched.expires_in });
        }

        if fetched.expires_in <= self.safety_margin_seconds {
            warn!(
                expires_in = fetched.expires_in,
                safety_margin_seconds = self.safety_margin_seconds,
                "token lifetime does not exceed the safety margin, keeping it for one second"
            );
        }

        let token = CachedToken::from_ttl(
            fetched.access_token,
            fetched_at,
            fetched.expires_in,
            self.safety_margin_seconds,
        );
        metrics.token_expiry_unix.set(token.expires_at_unix_ts);
        info!(
            expires_in = fetched.expires_in,
            expires_at = token.expires_at_unix_ts,
            "access token refreshed"
        );

        let value = token.value.clone();
        self.current.store(Some(Arc::new(token)));
        Ok(value)
    }
}
