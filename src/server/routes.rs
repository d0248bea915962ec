use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{info, warn};

use crate::errors::NoticeError;
use crate::notice::dispatcher::NoticeOutcome;
use crate::notice::request::{authenticate, NoticeBody, NoticeRequest};
use crate::observability::metrics::{get_metrics, OUTCOME_PARTIAL, OUTCOME_SENT};
use crate::server::server::AppState;
use crate::sources::fetch::FetchToken;
use crate::utils::constants::AUTH_TOKEN_HEADER;

static PONG: &str = "pong";

pub async fn handle_ping() -> &'static str {
    PONG
}

/// `POST /notice`: parse, authenticate, validate, dispatch.
pub async fn handle_notice<F: FetchToken + 'static>(
    State(state): State<AppState<F>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let metrics = get_metrics().await;

    match process_notice(&state, &headers, &body).await {
        Ok(outcome) if outcome.is_partial() => {
            metrics.notice_requests.with_label_values(&[OUTCOME_PARTIAL]).inc();
            (StatusCode::CREATED, Json(outcome)).into_response()
        }
        Ok(_) => {
            metrics.notice_requests.with_label_values(&[OUTCOME_SENT]).inc();
            StatusCode::CREATED.into_response()
        }
        Err(err) => {
            metrics.notice_requests.with_label_values(&[err.kind()]).inc();
            error_response(err)
        }
    }
}

async fn process_notice<F: FetchToken>(
    state: &AppState<F>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<NoticeOutcome, NoticeError> {
    let body: NoticeBody = serde_json::from_slice(body)
        .map_err(|e| NoticeError::Validation(format!("request body is not valid JSON: {}", e)))?;

    let header_token = headers.get(AUTH_TOKEN_HEADER).and_then(|v| v.to_str().ok());
    authenticate(body.auth_token.as_deref().or(header_token), &state.notice.auth_token)?;

    let request = NoticeRequest::validate(body, &state.notice.limits())?;
    info!(recipients = %request.recipients, message_type = request.message_type.as_str(), "notice accepted");

    state.dispatcher.send(&request).await
}

fn error_response(err: NoticeError) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        warn!(error = %err, kind = err.kind(), "notice failed");
    } else {
        info!(error = %err, kind = err.kind(), "notice rejected");
    }
    (status, Json(json!({ "message": err.to_string() }))).into_response()
}
