use async_trait::async_trait;

use std::time::Duration;

use crate::client::new_http_client;
use crate::config::Config;
use crate::constant::*;
use crate::error::PostError;

use super::parser::parse_feed;
use super::{Feed, FeedEntry};

/// A feed retrieved over HTTP(S).
pub struct RemoteFeed {
    client: reqwest::Client,
    url: Option<String>,
    timeout: Duration,
}

impl RemoteFeed {
    pub fn new(config: &Config) -> Self {
        Self {
            client: new_http_client(),
            url: config.feed_url.clone(),
            timeout: config.fetch_timeout,
        }
    }

    #[cfg(test)]
    pub fn from_url(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: new_http_client(),
            url: Some(url.into()),
            timeout,
        }
    }

    async fn fetch_raw(&self, url: &str) -> Result<Vec<u8>, PostError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PostError::FeedFetchFailed(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PostError::FeedFetchFailed(format!(
                "{}: HTTP status {}",
                url, status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PostError::FeedFetchFailed(format!("{}: {}", url, e)))?;

        let preview: String = String::from_utf8_lossy(&body)
            .chars()
            .take(FEED_PREVIEW_CHARS)
            .collect();
        tracing::info!(
            "Fetched feed content from {}. Length: {} bytes. First {} chars: '{}'",
            url,
            body.len(),
            FEED_PREVIEW_CHARS,
            preview
        );

        Ok(body.to_vec())
    }
}

#[async_trait]
impl Feed for RemoteFeed {
    async fn fetch(&self) -> Result<Vec<FeedEntry>, PostError> {
        let url = self
            .url
            .as_deref()
            .ok_or(PostError::ConfigurationMissing("FEED_URL"))?;

        tracing::info!("Fetching feed from {}", url);
        let body = self.fetch_raw(url).await?;

        let raw_entries =
            parse_feed(&body).map_err(|e| PostError::FeedParseFailed(format!("{:#}", e)))?;

        let entries = raw_entries
            .into_iter()
            .enumerate()
            .filter_map(|(i, raw)| {
                let entry = raw.into_entry();
                if entry.is_none() {
                    tracing::warn!("Skipping feed item #{} without a title or link", i);
                }
                entry
            })
            .collect::<Vec<_>>();

        tracing::info!("Parsed {} entries from {}", entries.len(), url);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MEME_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/"><channel>
<title>Memes</title><link>http://example.com</link><description>memes</description>
<item><title>Funny Cat</title><link>http://example.com/cat</link>
<media:content url="http://img/x.jpg" type="image/jpeg"/></item>
<item><title>No link here</title></item>
<item><title>Plain Joke</title><link>http://example.com/joke</link></item>
</channel></rss>"#;

    fn feed_for(server: &MockServer) -> RemoteFeed {
        RemoteFeed::from_url(format!("{}/rss", server.uri()), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_fetch_parses_entries_and_skips_incomplete_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MEME_RSS))
            .expect(1)
            .mount(&server)
            .await;

        let entries = feed_for(&server).fetch().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Funny Cat");
        assert_eq!(entries[0].image_url.as_deref(), Some("http://img/x.jpg"));
        assert_eq!(entries[1].link, "http://example.com/joke");
        assert_eq!(entries[1].image_url, None);
    }

    #[tokio::test]
    async fn test_fetch_http_error_is_fetch_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = feed_for(&server).fetch().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FeedFetchFailed);
    }

    #[tokio::test]
    async fn test_fetch_malformed_body_is_parse_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<not valid xml"))
            .mount(&server)
            .await;

        let err = feed_for(&server).fetch().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FeedParseFailed);
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(MEME_RSS)
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let feed = RemoteFeed::from_url(server.uri(), Duration::from_millis(200));
        let err = feed.fetch().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FeedFetchFailed);
    }

    #[tokio::test]
    async fn test_missing_url_is_configuration_error() {
        let config = crate::config::config_from_pairs(&[]);
        let err = RemoteFeed::new(&config).fetch().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationMissing);
    }

    #[tokio::test]
    async fn test_empty_channel_yields_no_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<?xml version="1.0"?><rss version="2.0"><channel><title>t</title><link>l</link><description>d</description></channel></rss>"#,
            ))
            .mount(&server)
            .await;

        let entries = feed_for(&server).fetch().await.unwrap();
        assert!(entries.is_empty());
    }
}
