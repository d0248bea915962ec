use std::{fs, path::Path};
use std::sync::LazyLock;
use crate::config::settings::{LogFormat, LoggingConfig, ServiceConfig};
use crate::config::proc_validator;
use crate::observability::metrics::get_metrics;
use crate::utils::constants::{DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_SAFETY_MARGIN_SECS};
use anyhow::{anyhow, Result};
use regex::Regex;
use tracing::{debug, error};

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}").expect("env var regex"));

static WHOLE_VALUE_ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([ \t]*(?:-[ \t]+)?(?:[\w.-]+:[ \t]+)?)\$\{(\w+)(?::([^\}]+))?\}([ \t]*\r?\n?)$")
        .expect("whole value env var regex")
});

/// Load and validate config from YAML file
pub async fn file_to_config(path: &Path) -> Result<ServiceConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| anyhow!("cannot read config {}: {}", path.display(), e))?;

    let expanded = expand_env_vars(&content);
    parse_config(expanded).await
}

pub async fn parse_config(content: String) -> Result<ServiceConfig> {
    let metrics = get_metrics().await;
    let mut service_config: ServiceConfig = serde_yaml::from_str(&content)
        .inspect_err(|e| {
            error!("parse config error: {}", e);
            metrics.config_parse_failures.inc();
        })?;

    // Apply defaults
    if service_config.settings.logging.is_none() {
        service_config.settings.logging = Some(LoggingConfig::new("info".to_owned(), LogFormat::Compact));
    }
    if service_config.settings.safety_margin_seconds.is_none() {
        service_config.settings.safety_margin_seconds = Some(DEFAULT_SAFETY_MARGIN_SECS);
    }
    if service_config.settings.http_timeout_ms.is_none() {
        service_config.settings.http_timeout_ms = Some(DEFAULT_HTTP_TIMEOUT_MS);
    }

    debug!("validation config ...");
    proc_validator::validate_service_config(&service_config)
        .await
        .map_err(|errors| anyhow!("config is not valid: {}", errors.join("; ")))?;

    Ok(service_config)
}

/// `${NAME}` and `${NAME:default}` are replaced from the environment.
///
/// A placeholder that is a whole scalar value (`secret: ${SECRET}`) is emitted
/// as a quoted string unless the value is a plain integer or boolean, so YAML
/// never reinterprets values such as `1.50` or long digit runs.
pub fn expand_env_vars(input: &str) -> String {
    input
        .split_inclusive('\n')
        .map(|line| match WHOLE_VALUE_ENV_VAR.captures(line) {
            Some(caps) => {
                let value = resolve_env_var(&caps[2], caps.get(3).map(|m| m.as_str()));
                format!("{}{}{}", &caps[1], yaml_scalar(&value), &caps[4])
            }
            None => ENV_VAR
                .replace_all(line, |caps: &regex::Captures| {
                    resolve_env_var(&caps[1], caps.get(2).map(|m| m.as_str()))
                })
                .into_owned(),
        })
        .collect()
}

fn resolve_env_var(name: &str, default: Option<&str>) -> String {
    std::env::var(name).unwrap_or_else(|_| default.unwrap_or("").to_string())
}

/// Integers and booleans stay plain so numeric and flag settings keep their type.
fn yaml_scalar(value: &str) -> String {
    let plain = value.is_empty()
        || value == "true"
        || value == "false"
        || value.parse::<i64>().is_ok_and(|n| n.to_string() == value);
    if plain {
        value.to_owned()
    } else {
        serde_json::Value::String(value.to_owned()).to_string()
    }
}
