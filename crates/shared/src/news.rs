use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::models::Article;

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    source: NewsApiSource,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

/// Thin client for the NewsAPI `everything` endpoint.
pub struct NewsClient {
    client: Client,
    api_key: String,
}

impl NewsClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("AINewsSatirist/1.0")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, api_key })
    }

    pub async fn fetch_headlines(&self, query: &str, page_size: usize) -> Result<Vec<Article>> {
        let page_size = page_size.min(100).to_string();
        let response = self
            .client
            .get("https://newsapi.org/v2/everything")
            .query(&[
                ("q", query),
                ("language", "en"),
                ("sortBy", "popularity"),
                ("pageSize", page_size.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("Failed to fetch headlines from NewsAPI")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("NewsAPI returned error: {} - {}", status, error_text);
        }

        let parsed = response
            .json::<NewsApiResponse>()
            .await
            .context("Failed to parse NewsAPI response")?;

        if parsed.status != "ok" {
            anyhow::bail!(
                "NewsAPI returned error status: {}",
                parsed.message.unwrap_or_else(|| "unknown".to_string())
            );
        }

        Ok(parsed
            .articles
            .into_iter()
            .filter_map(Self::to_article)
            .filter(Self::is_worth_scoring)
            .collect())
    }

    fn to_article(raw: NewsApiArticle) -> Option<Article> {
        Some(Article {
            url: raw.url?,
            title: raw.title?,
            description: raw.description,
            source: raw.source.name,
            published_at: raw.published_at,
        })
    }

    /// Junk filter: short titles and crypto spam never score well enough
    /// to be worth a generative call.
    fn is_worth_scoring(article: &Article) -> bool {
        let title_lower = article.title.to_lowercase();
        let is_crypto = title_lower
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .any(|w| matches!(w, "bitcoin" | "nft" | "crypto"));

        article.title.len() > 20 && article.url.starts_with("http") && !is_crypto
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, url: &str) -> Article {
        Article {
            url: url.to_string(),
            title: title.to_string(),
            description: Some("desc".to_string()),
            source: None,
            published_at: None,
        }
    }

    #[test]
    fn filters_short_titles() {
        assert!(!NewsClient::is_worth_scoring(&article(
            "AI news",
            "https://ex.com/a"
        )));
    }

    #[test]
    fn filters_crypto_headlines() {
        assert!(!NewsClient::is_worth_scoring(&article(
            "Bitcoin miners pivot to artificial intelligence",
            "https://ex.com/a"
        )));
    }

    #[test]
    fn keeps_ordinary_tech_headlines() {
        assert!(NewsClient::is_worth_scoring(&article(
            "AI Startup Claims Breakthrough in Sentient Toasters",
            "https://ex.com/a"
        )));
    }
}
