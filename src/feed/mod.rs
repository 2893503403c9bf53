pub mod parser;
pub mod remote;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PostError;

pub use remote::RemoteFeed;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub image_url: Option<String>,
}

#[async_trait]
pub trait Feed: Send + Sync {
    /// Every entry of the feed, in feed order.
    async fn fetch(&self) -> Result<Vec<FeedEntry>, PostError>;
}

/// Case-insensitive title filter. An empty keyword set accepts everything.
#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    pub fn new(keywords: &[impl AsRef<str>]) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn matches(&self, title: &str) -> bool {
        if self.keywords.is_empty() {
            return true;
        }
        let title = title.to_lowercase();
        self.keywords.iter().any(|k| title.contains(k.as_str()))
    }
}

/// Fetches the feed and keeps the entries passing the filter, in feed order.
///
/// Fetch and parse errors are logged here; callers treat them as an empty
/// collection and only look at the kind.
pub async fn collect(
    feed: &dyn Feed,
    filter: &KeywordFilter,
) -> Result<Vec<FeedEntry>, PostError> {
    let entries = feed.fetch().await.inspect_err(|e| tracing::error!("{}", e))?;

    let mut kept = Vec::with_capacity(entries.len());
    for entry in entries {
        if !filter.matches(&entry.title) {
            tracing::info!("Skipping entry '{}' - no matching keywords.", entry.title);
            continue;
        }

        tracing::info!(
            "Found entry: '{}' (Link: {}, Image: {})",
            entry.title,
            entry.link,
            entry.image_url.as_deref().unwrap_or("N/A")
        );
        kept.push(entry);
    }

    Ok(kept)
}

#[cfg(test)]
pub(crate) struct StaticFeed(pub Result<Vec<FeedEntry>, PostError>);

#[cfg(test)]
#[async_trait]
impl Feed for StaticFeed {
    async fn fetch(&self) -> Result<Vec<FeedEntry>, PostError> {
        match &self.0 {
            Ok(entries) => Ok(entries.clone()),
            Err(e) => Err(PostError::FeedFetchFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
pub(crate) fn entry(title: &str, link: &str, image_url: Option<&str>) -> FeedEntry {
    FeedEntry {
        title: title.to_string(),
        link: link.to_string(),
        image_url: image_url.map(str::to_string),
    }
}

#[test]
fn test_keyword_filter_is_case_insensitive_substring() {
    let filter = KeywordFilter::new(&["Funny", "lol"]);
    assert!(filter.matches("A FUNNY cat"));
    assert!(filter.matches("lollipop"));
    assert!(!filter.matches("Serious news"));
    assert!(KeywordFilter::default().matches("anything"));
    assert!(KeywordFilter::new(&[""]).matches("anything"));
}

#[tokio::test]
async fn test_collect_keeps_feed_order_after_filtering() {
    let feed = StaticFeed(Ok(vec![
        entry("Funny Cat", "http://a", None),
        entry("Tax news", "http://b", None),
        entry("Relatable meme", "http://c", Some("http://img/c.jpg")),
    ]));
    let filter = KeywordFilter::new(&["funny", "meme"]);

    let entries = collect(&feed, &filter).await.unwrap();
    let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Funny Cat", "Relatable meme"]);
}

#[tokio::test]
async fn test_collect_all_filtered_is_empty() {
    let feed = StaticFeed(Ok(vec![entry("Tax news", "http://b", None)]));
    let entries = collect(&feed, &KeywordFilter::new(&["meme"])).await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_collect_reports_fetch_errors() {
    let feed = StaticFeed(Err(PostError::FeedFetchFailed("boom".into())));
    let err = collect(&feed, &KeywordFilter::default()).await.unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::FeedFetchFailed);
}
