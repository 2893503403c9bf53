pub mod client;
pub mod message;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::PostError;
use crate::feed::FeedEntry;

pub use client::GraphClient;
pub use message::MessageFormatter;

#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub page_id: String,
    pub access_token: String,
}

impl Credentials {
    pub fn new(page_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            access_token: access_token.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, PostError> {
        match (&config.page_id, &config.page_access_token) {
            (Some(page_id), Some(access_token)) => Ok(Self::new(page_id, access_token)),
            _ => Err(PostError::CredentialsMissing),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PostContent {
    Photo { url: String, caption: String },
    Link { message: String, link: String },
    Text { message: String },
}

impl PostContent {
    /// An image post when the entry carries an image, a link post otherwise.
    pub fn for_entry(entry: &FeedEntry, message: String) -> Self {
        match &entry.image_url {
            Some(url) => PostContent::Photo {
                url: url.clone(),
                caption: message,
            },
            None => PostContent::Link {
                message,
                link: entry.link.clone(),
            },
        }
    }

    pub fn edge(&self) -> &'static str {
        match self {
            PostContent::Photo { .. } => "photos",
            PostContent::Link { .. } | PostContent::Text { .. } => "feed",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            PostContent::Photo { caption, .. } => caption,
            PostContent::Link { message, .. } | PostContent::Text { message } => message,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    pub content: PostContent,
    pub credentials: Credentials,
}

impl PublishRequest {
    pub fn endpoint(&self, base: &str) -> String {
        format!(
            "{}/{}/{}",
            base,
            self.credentials.page_id,
            self.content.edge()
        )
    }

    /// Form fields in the order they are sent.
    pub fn form(&self) -> Vec<(&'static str, &str)> {
        let access_token = ("access_token", self.credentials.access_token.as_str());
        match &self.content {
            PostContent::Photo { url, caption } => {
                vec![("url", url.as_str()), ("caption", caption.as_str()), access_token]
            }
            PostContent::Link { message, link } => {
                vec![("message", message.as_str()), ("link", link.as_str()), access_token]
            }
            PostContent::Text { message } => vec![("message", message.as_str()), access_token],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedPost {
    pub id: Option<String>,
    pub response: Value,
}

impl PublishedPost {
    pub fn from_response(response: Value) -> Self {
        let id = response
            .get("id")
            .or_else(|| response.get("post_id"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Self { id, response }
    }
}

pub type PublishResult = Result<PublishedPost, PostError>;
