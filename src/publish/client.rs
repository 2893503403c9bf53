use serde_json::Value;

use std::time::Duration;

use crate::client::new_http_client;
use crate::config::Config;
use crate::error::PostError;
use crate::feed::FeedEntry;

use super::{
    Credentials, MessageFormatter, PostContent, PublishRequest, PublishResult, PublishedPost,
};

/// Publishes posts on a page through the Graph API.
pub struct GraphClient {
    client: reqwest::Client,
    base: String,
    credentials: Option<Credentials>,
    timeout: Duration,
    dry_run: bool,
}

impl GraphClient {
    pub fn new(config: &Config) -> Self {
        Self::with_credentials(
            config.graph_api_base.clone(),
            Credentials::from_config(config).ok(),
            config.publish_timeout,
        )
        .dry_run(config.dry_run)
    }

    pub fn with_credentials(
        base: impl Into<String>,
        credentials: Option<Credentials>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: new_http_client(),
            base: base.into(),
            credentials,
            timeout,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn credentials(&self) -> Result<Credentials, PostError> {
        self.credentials.clone().ok_or_else(|| {
            let err = PostError::CredentialsMissing;
            tracing::error!("Cannot post: {}", err);
            err
        })
    }

    /// Posts the entry as an image when it has one, as a link otherwise.
    pub async fn publish(&self, entry: &FeedEntry, formatter: &MessageFormatter) -> PublishResult {
        let credentials = self.credentials()?;
        let message = formatter.format(&entry.title);

        let content = PostContent::for_entry(entry, message);
        match &content {
            PostContent::Photo { url, caption } => {
                tracing::info!("Attempting to post image: '{}' from {}", caption, url)
            }
            PostContent::Link { message, link } => {
                tracing::info!("Attempting to post link: '{}' to {}", message, link)
            }
            PostContent::Text { message } => {
                tracing::info!("Attempting to post message: '{}'", message)
            }
        }

        self.send(PublishRequest {
            content,
            credentials,
        })
        .await
    }

    /// Posts a plain text message on the page feed.
    pub async fn post_text(&self, message: &str) -> PublishResult {
        let credentials = self.credentials()?;
        tracing::info!(
            "Attempting to post test message: '{}' to page ID {}",
            message,
            credentials.page_id
        );

        self.send(PublishRequest {
            content: PostContent::Text {
                message: message.to_string(),
            },
            credentials,
        })
        .await
    }

    pub async fn send(&self, request: PublishRequest) -> PublishResult {
        let endpoint = request.endpoint(&self.base);

        if self.dry_run {
            tracing::info!(
                "Dry run, not posting to {}: '{}'",
                endpoint,
                request.content.message()
            );
            return Ok(PublishedPost {
                id: Some("dry-run".to_string()),
                response: serde_json::json!({ "dry_run": true }),
            });
        }

        self.post_form(&endpoint, &request.form())
            .await
            .inspect_err(log_failure)
    }

    async fn post_form(&self, endpoint: &str, form: &[(&'static str, &str)]) -> PublishResult {
        let response = self
            .client
            .post(endpoint)
            .timeout(self.timeout)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // A body that cannot be read must not hide the status.
            let body = response.text().await.unwrap_or_default();
            return Err(PostError::PublishHttp {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;

        let json: Value = serde_json::from_str(&body).map_err(|e| {
            PostError::PublishResponseUnparsable {
                detail: e.to_string(),
                body: body.clone(),
            }
        })?;

        tracing::info!(
            "Successfully posted (status: {}). Response: {}",
            status.as_u16(),
            json
        );
        Ok(PublishedPost::from_response(json))
    }
}

fn log_failure(err: &PostError) {
    match err {
        PostError::PublishHttp { .. } => tracing::error!("HTTP error posting to page: {}", err),
        PostError::PublishTimeout => tracing::error!("Timeout error posting to page: {}", err),
        PostError::PublishTransport(_) => {
            tracing::error!("Connection error posting to page: {}", err)
        }
        PostError::PublishResponseUnparsable { .. } => {
            tracing::error!("Unparsable response from page: {}", err)
        }
        _ => tracing::error!("Failed to post to page: {}", err),
    }
}
