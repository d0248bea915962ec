use anyhow::{anyhow, Result};
use regex::Regex;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([a-zA-Z0-9_]+)\s*\}\}").expect("placeholder regex"));

/// Render an endpoint URL template.
///
/// template: "https://host/gettoken?corpid={{id}}&corpsecret={{secret}}"
/// ctx: { "id" => "...", "secret" => "..." }
///
/// Placeholders are only allowed in query values; substituted values are
/// percent-encoded by the URL serializer.
pub fn render_url(template: &str, ctx: &HashMap<&str, &str>) -> Result<Url> {
    let mut url = Url::parse(template)?;

    let prefix = &template[..template.find('?').unwrap_or(template.len())];
    if PLACEHOLDER.is_match(prefix) {
        return Err(anyhow!("placeholders are only supported in query values: {}", template));
    }

    let mut pairs = Vec::new();
    for (key, value) in url.query_pairs() {
        let mut missing = None;
        let rendered = PLACEHOLDER.replace_all(&value, |caps: &regex::Captures| {
            let name = &caps[1];
            match ctx.get(name) {
                Some(v) => v.to_string(),
                None => {
                    missing.get_or_insert_with(|| name.to_owned());
                    String::new()
                }
            }
        });
        if let Some(name) = missing {
            return Err(anyhow!("template placeholder '{{{{{}}}}}' has no value", name));
        }
        pairs.push((key.into_owned(), rendered.into_owned()));
    }

    if !pairs.is_empty() {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    Ok(url)
}

/// Names of all placeholders referenced by a template.
pub fn placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|caps| caps[1].to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_url_basic() {
        let ctx = HashMap::from([("id", "corp-1"), ("secret", "s3cr3t")]);
        let url = render_url("http://127.0.0.1:8080/gettoken?id={{id}}&secret={{secret}}", &ctx).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/gettoken?id=corp-1&secret=s3cr3t");
    }

    #[test]
    fn test_render_url_encodes_values() {
        let ctx = HashMap::from([("access_token", "a&b=c d")]);
        let url = render_url("https://example.com/send?access_token={{access_token}}", &ctx).unwrap();
        let token: Vec<(String, String)> = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        assert_eq!(token, vec![("access_token".to_owned(), "a&b=c d".to_owned())]);
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn test_render_url_keeps_static_params() {
        let ctx = HashMap::from([("access_token", "tok")]);
        let url = render_url("https://example.com/send?debug=1&access_token={{ access_token }}", &ctx).unwrap();
        assert_eq!(url.query(), Some("debug=1&access_token=tok"));
    }

    #[test]
    fn test_render_url_missing_value_fails() {
        let ctx = HashMap::from([("id", "corp-1")]);
        let err = render_url("https://example.com/gettoken?id={{id}}&secret={{secret}}", &ctx).unwrap_err();
        assert!(err.to_string().contains("secret"));
    }

    #[test]
    fn test_render_url_rejects_path_placeholder() {
        let ctx = HashMap::from([("id", "corp-1")]);
        assert!(render_url("https://example.com/{{id}}/token", &ctx).is_err());
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            placeholders("https://example.com/gettoken?corpid={{id}}&corpsecret={{secret}}"),
            vec!["id".to_owned(), "secret".to_owned()]
        );
    }
}
