use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tracing::info;

use crate::cache::token_cache::TokenCache;
use crate::config::settings::{MetricsConfig, NoticeConfig, ServiceConfig, SettingsConfig};
use crate::notice::dispatcher::NoticeDispatcher;
use crate::observability::metrics::get_metrics;
use crate::observability::routes::MetricsState;
use crate::server::routes::{handle_notice, handle_ping};
use crate::sources::build_client;
use crate::sources::fetch::{FetchToken, HttpTokenFetcher};
use crate::utils::constants::{DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_SAFETY_MARGIN_SECS, NOTICE_PATH, PING_PATH};

pub struct AppState<F> {
    pub dispatcher: Arc<NoticeDispatcher<F>>,
    pub notice: Arc<NoticeConfig>,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            notice: self.notice.clone(),
        }
    }
}

impl<F> AppState<F> {
    pub fn new(dispatcher: Arc<NoticeDispatcher<F>>, notice: NoticeConfig) -> Self {
        Self { dispatcher, notice: Arc::new(notice) }
    }
}

/// Wire the token cache and dispatcher from a validated config.
pub fn build_state(service_config: &ServiceConfig) -> Result<AppState<HttpTokenFetcher>> {
    let settings = &service_config.settings;
    let client = build_client(settings.http_timeout_ms.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS))?;
    let credentials = Arc::new(service_config.credentials.to_credentials()?);

    let fetcher = HttpTokenFetcher::new(client.clone(), service_config.endpoints.token_url.to_owned());
    let cache = Arc::new(TokenCache::new(
        fetcher,
        credentials,
        settings.safety_margin_seconds.unwrap_or(DEFAULT_SAFETY_MARGIN_SECS),
    ));
    let dispatcher = NoticeDispatcher::new(cache, client, service_config.endpoints.message_url.to_owned());

    Ok(AppState::new(Arc::new(dispatcher), service_config.notice.clone()))
}

/// Service routes plus the metrics endpoint when enabled.
pub async fn router<F: FetchToken + 'static>(state: AppState<F>, metrics_config: &MetricsConfig) -> Router {
    let metrics = get_metrics().await;
    let metrics_state = MetricsState::new(metrics.registry.clone());

    Router::new()
        .route(NOTICE_PATH, post(handle_notice::<F>))
        .route(PING_PATH, get(handle_ping))
        .merge(metrics_state.router::<AppState<F>>(metrics_config))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Start the HTTP server and serve until ctrl-c / SIGTERM.
pub async fn start<F: FetchToken + 'static>(settings_config: &SettingsConfig, state: AppState<F>) -> Result<()> {
    let metrics = get_metrics().await;
    let app = router(state, &settings_config.metrics).await;

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("server is listening on {}", listener.local_addr()?);
    metrics.up.set(1);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    metrics.up.set(0);
    info!("server stopped");
    Ok(())
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let response = next.run(request).await;
    info!(%method, %path, status = response.status().as_u16(), "request served");
    response
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
