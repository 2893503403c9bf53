use crate::constant::USER_AGENT;

/// HTTP client shared by one collaborator. Timeouts are set per request since
/// the feed fetch and the publish call use different limits.
pub fn new_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to build HTTP client, using defaults: {}", e);
            reqwest::Client::new()
        })
}
