// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::cache::token_cache::TokenCache;
use crate::errors::FetchError;
use crate::helpers::time::manual::ManualClock;
use crate::sources::fetch::{Credentials, FetchToken, FetchedToken};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

pub fn test_credentials() -> Arc<Credentials> {
    Arc::new(Credentials {
        id: "corp-1".to_owned(),
        secret: "s3cr3t".to_owned(),
        agent_id: 1000002,
    })
}

type Respond = dyn Fn(usize) -> Result<FetchedToken, FetchError> + Send + Sync;

/// Scripted token fetcher: answers call `n` (starting at 1) with `respond(n)`
/// after `delay`, and records how many fetches overlapped.
pub struct FakeFetcher {
    pub calls: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
    in_flight: AtomicUsize,
    delay: Duration,
    respond: Box<Respond>,
}

impl FakeFetcher {
    pub fn new<R>(delay: Duration, respond: R) -> Self
    where
        R: Fn(usize) -> Result<FetchedToken, FetchError> + Send + Sync + 'static,
    {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            in_flight: AtomicUsize::new(0),
            delay,
            respond: Box::new(respond),
        }
    }

    /// Issues `T<n>` on call `n`, each valid for `ttl` seconds.
    pub fn issuing(ttl: i64, delay: Duration) -> Self {
        Self::new(delay, move |n| Ok(token(&format!("T{}", n), ttl)))
    }

    pub fn failing(delay: Duration) -> Self {
        Self::new(delay, |_| Err(FetchError::MissingField("access_token")))
    }
}

impl FetchToken for FakeFetcher {
    async fn fetch_token(&self, _credentials: &Credentials) -> Result<FetchedToken, FetchError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.respond)(n)
    }
}

pub fn token(value: &str, expires_in: i64) -> FetchedToken {
    FetchedToken { access_token: value.to_owned(), expires_in }
}

/// Cache driven by a manual clock, with handles to the clock and the fetch counters.
pub struct CacheFixture {
    pub cache: Arc<TokenCache<FakeFetcher>>,
    pub clock: Arc<ManualClock>,
    pub calls: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl CacheFixture {
    pub fn new(fetcher: FakeFetcher, now: i64, safety_margin_seconds: u64) -> Self {
        let clock = Arc::new(ManualClock::at(now));
        let calls = fetcher.calls.clone();
        let max_in_flight = fetcher.max_in_flight.clone();
        let cache = TokenCache::new(fetcher, test_credentials(), safety_margin_seconds)
            .with_clock(clock.clone());
        Self { cache: Arc::new(cache), clock, calls, max_in_flight }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}
