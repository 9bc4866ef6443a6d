use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// Anything that can turn an article URL into body text. `None` means
/// "nothing usable there"; the enricher drops those items and moves on.
#[async_trait]
pub trait BodyFetcher: Send + Sync {
    async fn fetch_body(&self, url: &str) -> Result<Option<String>>;
}

/// Fetches full article bodies as plain text.
///
/// Domains on the skip list (paywalls, consent walls, aggressive anti-bot
/// setups) are filtered before any request goes out. Everything else gets a
/// bounded-timeout fetch, retried a few times, and an HTML-to-text pass.
pub struct ContentFetcher {
    client: Client,
    skip_domains: Vec<String>,
}

impl ContentFetcher {
    pub fn new(skip_domains: Vec<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (compatible; AINewsSatirist/1.0)")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            skip_domains,
        })
    }

    /// Known-unfetchable domains are skipped before any request.
    pub fn is_skipped(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return true;
        };
        let Some(host) = parsed.host_str() else {
            return true;
        };

        self.skip_domains
            .iter()
            .any(|d| host == d || host.ends_with(&format!(".{}", d)))
    }

    async fn fetch_with_retries(&self, url: &str) -> Result<Option<String>> {
        if self.is_skipped(url) {
            return Ok(None);
        }

        for attempt in 0..3 {
            match self.try_fetch(url).await {
                Ok(content) => return Ok(content),
                Err(e) => {
                    if attempt == 2 {
                        eprintln!("Failed to fetch {}: {}", url, e);
                        return Ok(None);
                    }
                    let backoff = std::time::Duration::from_millis(500 * (2_u64.pow(attempt)));
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        Ok(None)
    }

    async fn try_fetch(&self, url: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send HTTP request")?;

        let status = response.status();
        if status == 401 || status == 403 || status == 404 {
            return Ok(None);
        }

        if !status.is_success() {
            anyhow::bail!("HTTP error: {}", status);
        }

        let html = response.text().await.context("Failed to read response body")?;

        let text = html2text::from_read(html.as_bytes(), 100);

        // Too little text means a cookie wall or an empty shell page
        if text.trim().is_empty() || text.len() < 100 {
            return Ok(None);
        }

        Ok(Some(text))
    }
}

#[async_trait]
impl BodyFetcher for ContentFetcher {
    async fn fetch_body(&self, url: &str) -> Result<Option<String>> {
        self.fetch_with_retries(url).await
    }
}
