//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - credentials present, agent id numeric
//! - endpoint templates parse and reference the placeholders they need
//! - server / metrics / logging invariants

use reqwest::Url;
use tracing::{error, info};

use crate::config::settings::{CredentialsConfig, EndpointsConfig, NoticeConfig, ServiceConfig, SettingsConfig};
use crate::observability::metrics::get_metrics;
use crate::parser::template::placeholders;
use crate::utils::constants::{NOTICE_PATH, PING_PATH};

const MAX_SAFETY_MARGIN_SECS: u64 = 60 * 60 * 24;

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_credentials(&cfg.credentials, &mut errors);
    validate_endpoints(&cfg.endpoints, &mut errors);
    validate_notice(&cfg.notice, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        get_metrics().await.config_validation_errors.inc_by(errors.len() as u64);
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if let Some(s) = settings.safety_margin_seconds {
        if s > MAX_SAFETY_MARGIN_SECS {
            errors.push(format!(
                "settings.safety_margin_seconds ({}) is unreasonably large",
                s
            ));
        }
    }

    if settings.http_timeout_ms == Some(0) {
        errors.push("settings.http_timeout_ms must be greater than 0".to_string());
    }

    if settings.server.host.is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be an integer in range 0-65535",
            settings.server.port
        ));
    }

    // metrics endpoint start with '/'
    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }
    if metrics.is_enabled && (metrics.path == NOTICE_PATH || metrics.path == PING_PATH) {
        errors.push(format!(
            "settings.metrics.path '{}' collides with a service route",
            metrics.path
        ));
    }

    // logging level
    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

fn validate_credentials(credentials: &CredentialsConfig, errors: &mut Vec<String>) {
    if credentials.id.trim().is_empty() {
        errors.push("credentials.id must not be empty".to_string());
    }
    if credentials.secret.trim().is_empty() {
        errors.push("credentials.secret must not be empty".to_string());
    }
    if let Err(e) = credentials.to_credentials() {
        errors.push(e.to_string());
    }
}

fn validate_endpoints(endpoints: &EndpointsConfig, errors: &mut Vec<String>) {
    validate_url_template("endpoints.token_url", &endpoints.token_url, &["id", "secret"], errors);
    validate_url_template("endpoints.message_url", &endpoints.message_url, &["access_token"], errors);
}

fn validate_url_template(path: &str, template: &str, required: &[&str], errors: &mut Vec<String>) {
    match Url::parse(template) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(format!("{} scheme '{}' must be http or https", path, url.scheme())),
        Err(e) => {
            errors.push(format!("{} '{}' is not a valid url: {}", path, template, e));
            return;
        }
    }

    let used = placeholders(template);
    for name in required {
        if !used.iter().any(|u| u == name) {
            errors.push(format!("{} must reference '{{{{{}}}}}'", path, name));
        }
    }
    for name in &used {
        if !required.contains(&name.as_str()) {
            errors.push(format!("{} references unknown placeholder '{{{{{}}}}}'", path, name));
        }
    }
    let before_query = &template[..template.find('?').unwrap_or(template.len())];
    if !placeholders(before_query).is_empty() {
        errors.push(format!("{} placeholders are only supported in query values", path));
    }
}

fn validate_notice(notice: &NoticeConfig, errors: &mut Vec<String>) {
    if notice.auth_token.trim().is_empty() {
        errors.push("notice.auth_token must not be empty".to_string());
    }
    if notice.max_content_bytes == 0 {
        errors.push("notice.max_content_bytes must be greater than 0".to_string());
    }
    if notice.max_recipients == 0 {
        errors.push("notice.max_recipients must be greater than 0".to_string());
    }
}
