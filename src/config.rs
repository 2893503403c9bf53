use thiserror::Error;

use std::time::Duration;

use crate::constant::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a valid {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStyle {
    Plain,
    Decorated,
}

#[derive(Debug, Clone)]
pub struct Config {
    // Feed configuration
    pub feed_url: Option<String>,
    pub keywords: Vec<String>,
    pub fetch_timeout: Duration,

    // Page configuration
    pub page_id: Option<String>,
    pub page_access_token: Option<String>,
    pub graph_api_base: String,
    pub publish_timeout: Duration,

    // Message configuration
    pub message_style: MessageStyle,
    pub post_prefix: String,
    pub hashtags: Vec<String>,

    // Run behaviour
    pub dry_run: bool,
    pub fail_on_error: bool,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let feed_url = var("FEED_URL").or_else(|| var("RSS_URL"));
        let keywords = var("KEYWORDS")
            .map(|list| split_list(&list).map(|k| k.to_lowercase()).collect())
            .unwrap_or_default();
        let fetch_timeout = match var("FETCH_TIMEOUT_SECS") {
            Some(value) => parse_secs("FETCH_TIMEOUT_SECS", value)?,
            None => DEFAULT_FETCH_TIMEOUT,
        };

        let page_id = var("PAGE_ID");
        let page_access_token = var("PAGE_ACCESS_TOKEN");
        let graph_api_base = var("GRAPH_API_BASE")
            .unwrap_or_else(|| GRAPH_API_BASE.into())
            .trim_end_matches('/')
            .to_string();
        let publish_timeout = match var("PUBLISH_TIMEOUT_SECS") {
            Some(value) => parse_secs("PUBLISH_TIMEOUT_SECS", value)?,
            None => DEFAULT_PUBLISH_TIMEOUT,
        };

        let message_style = match var("MESSAGE_STYLE") {
            None => MessageStyle::Plain,
            Some(value) => match value.trim().to_lowercase().as_str() {
                "plain" => MessageStyle::Plain,
                "decorated" => MessageStyle::Decorated,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "MESSAGE_STYLE",
                        expected: "style (plain or decorated)",
                        value,
                    })
                }
            },
        };
        // An explicitly empty POST_PREFIX disables the prefix.
        let post_prefix = lookup("POST_PREFIX").unwrap_or_else(|| DEFAULT_POST_PREFIX.into());
        let hashtags = var("POST_HASHTAGS")
            .map(|list| split_list(&list).map(str::to_string).collect())
            .unwrap_or_else(|| DEFAULT_HASHTAGS.iter().map(|h| h.to_string()).collect());

        let dry_run = match var("DRY_RUN") {
            Some(value) => parse_bool("DRY_RUN", value)?,
            None => false,
        };
        let fail_on_error = match var("FAIL_ON_ERROR") {
            Some(value) => parse_bool("FAIL_ON_ERROR", value)?,
            None => false,
        };

        Ok(Config {
            feed_url,
            keywords,
            fetch_timeout,
            page_id,
            page_access_token,
            graph_api_base,
            publish_timeout,
            message_style,
            post_prefix,
            hashtags,
            dry_run,
            fail_on_error,
        })
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_secs(var: &'static str, value: String) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::Invalid {
            var,
            expected: "number of seconds",
            value,
        })
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim() {
        "1" | "true" | "True" | "TRUE" | "yes" => Ok(true),
        "0" | "false" | "False" | "FALSE" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            expected: "boolean",
            value,
        }),
    }
}

#[cfg(test)]
pub(crate) fn config_from_pairs(pairs: &[(&str, &str)]) -> Config {
    let map: std::collections::HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| map.get(key).cloned()).unwrap()
}

#[test]
fn test_defaults_when_environment_is_empty() {
    let config = config_from_pairs(&[]);
    assert!(config.feed_url.is_none());
    assert!(config.page_id.is_none());
    assert!(config.page_access_token.is_none());
    assert!(config.keywords.is_empty());
    assert_eq!(config.graph_api_base, "https://graph.facebook.com");
    assert_eq!(config.fetch_timeout, Duration::from_secs(15));
    assert_eq!(config.publish_timeout, Duration::from_secs(30));
    assert_eq!(config.message_style, MessageStyle::Plain);
    assert_eq!(config.post_prefix, DEFAULT_POST_PREFIX);
    assert_eq!(config.hashtags.len(), DEFAULT_HASHTAGS.len());
    assert!(!config.dry_run);
    assert!(!config.fail_on_error);
}

#[test]
fn test_reads_values_and_normalises_lists() {
    let config = config_from_pairs(&[
        ("FEED_URL", "https://example.com/rss"),
        ("PAGE_ID", "123"),
        ("PAGE_ACCESS_TOKEN", "tok"),
        ("KEYWORDS", " Funny, MEME ,,lol "),
        ("GRAPH_API_BASE", "http://localhost:9000/"),
        ("MESSAGE_STYLE", "Decorated"),
        ("POST_PREFIX", ""),
        ("POST_HASHTAGS", "#A, #B"),
        ("DRY_RUN", "true"),
    ]);
    assert_eq!(config.feed_url.as_deref(), Some("https://example.com/rss"));
    assert_eq!(config.keywords, vec!["funny", "meme", "lol"]);
    assert_eq!(config.graph_api_base, "http://localhost:9000");
    assert_eq!(config.message_style, MessageStyle::Decorated);
    assert_eq!(config.post_prefix, "");
    assert_eq!(config.hashtags, vec!["#A", "#B"]);
    assert!(config.dry_run);
}

#[test]
fn test_legacy_rss_url_and_empty_values() {
    let config = config_from_pairs(&[
        ("RSS_URL", "https://example.com/legacy"),
        ("PAGE_ID", "  "),
        ("PAGE_ACCESS_TOKEN", ""),
    ]);
    assert_eq!(config.feed_url.as_deref(), Some("https://example.com/legacy"));
    assert!(config.page_id.is_none());
    assert!(config.page_access_token.is_none());
}

#[test]
fn test_rejects_malformed_values() {
    let lookup = |key: &str| match key {
        "FETCH_TIMEOUT_SECS" => Some("soon".to_string()),
        _ => None,
    };
    let err = Config::from_lookup(lookup).unwrap_err();
    assert!(err.to_string().contains("FETCH_TIMEOUT_SECS"));

    let lookup = |key: &str| match key {
        "MESSAGE_STYLE" => Some("fancy".to_string()),
        _ => None,
    };
    assert!(Config::from_lookup(lookup).is_err());

    let lookup = |key: &str| match key {
        "FAIL_ON_ERROR" => Some("maybe".to_string()),
        _ => None,
    };
    assert!(Config::from_lookup(lookup).is_err());
}
