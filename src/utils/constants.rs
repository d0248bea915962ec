//! Shared constants and defaults

pub const DEFAULT_CONFIG_PATH: &str = "notice-relay.yaml";

pub const DEFAULT_SAFETY_MARGIN_SECS: u64 = 300;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "3011";
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

pub const DEFAULT_TOKEN_URL: &str =
    "https://qyapi.weixin.qq.com/cgi-bin/gettoken?corpid={{id}}&corpsecret={{secret}}";
pub const DEFAULT_MESSAGE_URL: &str =
    "https://qyapi.weixin.qq.com/cgi-bin/message/send?access_token={{access_token}}";

// upstream text message limits
pub const DEFAULT_MAX_CONTENT_BYTES: usize = 2048;
pub const DEFAULT_MAX_RECIPIENTS: usize = 1000;

// routes
pub const NOTICE_PATH: &str = "/notice";
pub const PING_PATH: &str = "/ping";
pub const AUTH_TOKEN_HEADER: &str = "x-token";
