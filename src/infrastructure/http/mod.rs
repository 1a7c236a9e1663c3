use crate::domain::feed::Feed;
use crate::domain::ingest::{ErrorContext, IngestError};
use crate::error::{AppError, AppResult};
use crate::infrastructure::config::IngestSettings;
use async_trait::async_trait;
use reqwest::Client;

/// Maximum feed size in bytes (5MB).
pub const MAX_FEED_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Retrieves the raw bytes of one feed.
///
/// No retries: a failed fetch is retried by the next cycle.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, feed: &Feed) -> Result<Vec<u8>, IngestError>;
}

/// Plain HTTP GET fetcher with a total request timeout and a fixed User-Agent.
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(settings: &IngestSettings) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| AppError::HttpClient(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, feed: &Feed) -> Result<Vec<u8>, IngestError> {
        let context = || ErrorContext::new().with("url", &feed.url);

        let mut response = self
            .client
            .get(&feed.url)
            .send()
            .await
            .map_err(|e| IngestError::fetch(transport_message(&e), context()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::fetch(
                format!("HTTP error: {}", status),
                context().with("status", status.as_u16()),
            ));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > MAX_FEED_SIZE {
                return Err(IngestError::fetch(
                    format!(
                        "feed too large: {} bytes (max {} bytes)",
                        content_length, MAX_FEED_SIZE
                    ),
                    context(),
                ));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| IngestError::fetch(transport_message(&e), context()))?
        {
            if (body.len() + chunk.len()) as u64 > MAX_FEED_SIZE {
                return Err(IngestError::fetch(
                    format!("feed too large: more than {} bytes", MAX_FEED_SIZE),
                    context(),
                ));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

fn transport_message(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {}", err)
    } else {
        format!("failed to fetch feed: {}", err)
    }
}
