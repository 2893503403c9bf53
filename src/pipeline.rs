use rand::Rng;

use crate::error::PostError;
use crate::feed::{collect, Feed, KeywordFilter};
use crate::publish::{GraphClient, MessageFormatter, PublishedPost};
use crate::select::select;

#[derive(Debug)]
pub enum RunOutcome {
    Published(PublishedPost),
    NothingToPost,
    Failed(PostError),
}

impl RunOutcome {
    pub fn exit_code(&self, fail_on_error: bool) -> u8 {
        match self {
            RunOutcome::Failed(err) if fail_on_error => err.kind().exit_code(),
            _ => 0,
        }
    }
}

/// Collect, select, publish. One pass, no retries.
pub struct Pipeline {
    feed: Box<dyn Feed>,
    filter: KeywordFilter,
    formatter: MessageFormatter,
    publisher: GraphClient,
}

impl Pipeline {
    pub async fn run_once<R: Rng + ?Sized>(&self, rng: &mut R) -> RunOutcome {
        tracing::info!("Starting meme posting process...");
        let outcome = self.run_inner(rng).await;
        tracing::info!("Meme posting process finished.");
        outcome
    }

    async fn run_inner<R: Rng + ?Sized>(&self, rng: &mut R) -> RunOutcome {
        let entries = match collect(self.feed.as_ref(), &self.filter).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::info!("No entries collected. Skipping post.");
                return RunOutcome::Failed(e);
            }
        };

        let Some(entry) = select(&entries, rng) else {
            tracing::info!("{}. Skipping post.", PostError::NoEntriesAfterFilter);
            return RunOutcome::NothingToPost;
        };

        match self.publisher.publish(entry, &self.formatter).await {
            Ok(post) => RunOutcome::Published(post),
            Err(e) => RunOutcome::Failed(e),
        }
    }
}

pub struct PipelineBuilder {
    feed: Box<dyn Feed>,
    filter: KeywordFilter,
    formatter: MessageFormatter,
}

impl PipelineBuilder {
    pub fn new(feed: impl Feed + 'static) -> Self {
        Self {
            feed: Box::new(feed),
            filter: KeywordFilter::default(),
            formatter: MessageFormatter::Plain,
        }
    }

    pub fn with_filter(mut self, filter: KeywordFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_formatter(mut self, formatter: MessageFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn build(self, publisher: GraphClient) -> Pipeline {
        Pipeline {
            feed: self.feed,
            filter: self.filter,
            formatter: self.formatter,
            publisher,
        }
    }
}
