use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{FetchError, NoticeError};
use crate::sources::fetch::FetchedToken;

static ACCESS_TOKEN_FIELD: &str = "access_token";
static EXPIRES_IN_FIELD: &str = "expires_in";
static RECIPIENT_SEPARATOR: char = '|';

/// Parse the token exchange response body.
///
/// `{"errcode":0,"errmsg":"ok","access_token":"...","expires_in":7200}`
pub fn parse_token_response(body: &str) -> Result<FetchedToken, FetchError> {
    let json: Value = serde_json::from_str(body).map_err(FetchError::Decode)?;

    if let Some(code) = json.get("errcode").and_then(Value::as_i64) {
        if code != 0 {
            let message = json.get("errmsg").and_then(Value::as_str).unwrap_or("unknown error").to_owned();
            return Err(FetchError::Upstream { code, message });
        }
    }

    let access_token = json
        .get(ACCESS_TOKEN_FIELD)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .ok_or(FetchError::MissingField("access_token"))?
        .to_owned();

    let expires_in = json
        .get(EXPIRES_IN_FIELD)
        .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())))
        .ok_or(FetchError::MissingField("expires_in"))?;

    debug!(expires_in, "token response parsed");
    Ok(FetchedToken { access_token, expires_in })
}

#[derive(Debug, Deserialize)]
struct SendResponseBody {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
    #[serde(default)]
    invaliduser: Option<String>,
}

/// Parse the message send response body.
///
/// Returns the recipients rejected by upstream; an empty list means every
/// recipient was accepted.
pub fn parse_send_response(body: &str) -> Result<Vec<String>, NoticeError> {
    let response: SendResponseBody =
        serde_json::from_str(body).map_err(|e| NoticeError::Decode(e.to_string()))?;

    if response.errcode != 0 {
        warn!(errcode = response.errcode, errmsg = %response.errmsg, "message rejected upstream");
        return Err(NoticeError::Upstream { code: response.errcode, message: response.errmsg });
    }

    Ok(response
        .invaliduser
        .as_deref()
        .map(split_recipients)
        .unwrap_or_default())
}

/// Split a `user1|user2` recipient list, dropping empty entries.
pub fn split_recipients(raw: &str) -> Vec<String> {
    raw.split(RECIPIENT_SEPARATOR)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_owned)
        .collect()
}
