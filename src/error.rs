use thiserror::Error;

/// Everything that can go wrong during a single run.
///
/// Each variant is handled where it happens: logged, then turned into an
/// empty collection or a failed [`crate::publish::PublishResult`].
#[derive(Debug, Error)]
pub enum PostError {
    #[error("{0} environment variable is not set")]
    ConfigurationMissing(&'static str),

    #[error("failed to fetch feed: {0}")]
    FeedFetchFailed(String),

    #[error("failed to parse feed: {0}")]
    FeedParseFailed(String),

    #[error("no entries found or matched the filter")]
    NoEntriesAfterFilter,

    #[error("PAGE_ACCESS_TOKEN or PAGE_ID environment variable is not set")]
    CredentialsMissing,

    #[error("connection error: {0}")]
    PublishTransport(String),

    #[error("request timed out")]
    PublishTimeout,

    #[error("HTTP error {status}: {body}")]
    PublishHttp { status: u16, body: String },

    #[error("JSON decoding error: {detail} - raw response: {body}")]
    PublishResponseUnparsable { detail: String, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConfigurationMissing,
    FeedFetchFailed,
    FeedParseFailed,
    NoEntriesAfterFilter,
    CredentialsMissing,
    PublishTransport,
    PublishTimeout,
    PublishHttp,
    PublishResponseUnparsable,
}

impl PostError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PostError::ConfigurationMissing(_) => ErrorKind::ConfigurationMissing,
            PostError::FeedFetchFailed(_) => ErrorKind::FeedFetchFailed,
            PostError::FeedParseFailed(_) => ErrorKind::FeedParseFailed,
            PostError::NoEntriesAfterFilter => ErrorKind::NoEntriesAfterFilter,
            PostError::CredentialsMissing => ErrorKind::CredentialsMissing,
            PostError::PublishTransport(_) => ErrorKind::PublishTransport,
            PostError::PublishTimeout => ErrorKind::PublishTimeout,
            PostError::PublishHttp { .. } => ErrorKind::PublishHttp,
            PostError::PublishResponseUnparsable { .. } => ErrorKind::PublishResponseUnparsable,
        }
    }
}

impl ErrorKind {
    /// Process exit code used when `FAIL_ON_ERROR` is enabled (sysexits.h values).
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::NoEntriesAfterFilter => 0,
            ErrorKind::ConfigurationMissing | ErrorKind::CredentialsMissing => 78,
            ErrorKind::FeedFetchFailed => 69,
            ErrorKind::FeedParseFailed => 65,
            ErrorKind::PublishTransport => 75,
            ErrorKind::PublishTimeout => 74,
            ErrorKind::PublishHttp => 76,
            ErrorKind::PublishResponseUnparsable => 70,
        }
    }
}

impl From<reqwest::Error> for PostError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PostError::PublishTimeout
        } else {
            PostError::PublishTransport(err.to_string())
        }
    }
}

#[test]
fn test_exit_codes_are_distinct_per_failure() {
    let kinds = [
        ErrorKind::FeedFetchFailed,
        ErrorKind::FeedParseFailed,
        ErrorKind::CredentialsMissing,
        ErrorKind::PublishTransport,
        ErrorKind::PublishTimeout,
        ErrorKind::PublishHttp,
        ErrorKind::PublishResponseUnparsable,
    ];
    let mut codes: Vec<u8> = kinds.iter().map(|k| k.exit_code()).collect();
    assert!(codes.iter().all(|c| *c != 0));
    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), kinds.len());
    assert_eq!(ErrorKind::NoEntriesAfterFilter.exit_code(), 0);
}

#[test]
fn test_kind_tags_http_error() {
    let err = PostError::PublishHttp {
        status: 500,
        body: "oops".to_string(),
    };
    assert_eq!(err.kind(), ErrorKind::PublishHttp);
    assert_eq!(err.to_string(), "HTTP error 500: oops");
}
