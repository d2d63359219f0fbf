use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use hype_core::stats::stable_hash;
use hype_core::{DataSource, NewsArticle, NewsProvider, ProviderError};
use serde::Deserialize;
use serde_json::Value;

use crate::fields::text;
use crate::http::{decode, require_key, HttpClient, BROWSER_USER_AGENT};

const BASE_URL: &str = "https://newsdata.io/api/1/news";
pub const SOURCE_ID: &str = "newsdata";

/// NewsData.io caps free-tier page size at 10.
const MAX_PAGE_SIZE: usize = 10;

#[derive(Clone)]
pub struct NewsDataClient {
    api_key: Option<String>,
    base_url: String,
    http: HttpClient,
}

impl NewsDataClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            api_key,
            base_url: BASE_URL.to_string(),
            http: HttpClient::new(timeout, BROWSER_USER_AGENT),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    status: String,
    /// An article list on success, an error object otherwise.
    #[serde(default)]
    results: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    #[serde(default)]
    article_id: Option<String>,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    source_id: Option<String>,
    link: String,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(rename = "pubDate", default)]
    pub_date: Option<String>,
}

pub(crate) fn parse_news(data: Value, limit: usize) -> Result<Vec<NewsArticle>, ProviderError> {
    let response: NewsResponse = decode(data)?;
    if response.status != "success" {
        let detail = response
            .results
            .as_ref()
            .and_then(|r| r.get("message"))
            .and_then(Value::as_str)
            .unwrap_or(response.status.as_str())
            .to_string();
        return Err(ProviderError::RateLimited(format!("newsdata: {detail}")));
    }
    let Some(results) = response.results.filter(|r| !r.is_null()) else {
        return Err(ProviderError::RateLimited(
            "newsdata: response carried no results".to_string(),
        ));
    };
    let results: Vec<RawArticle> = decode(results)?;

    let articles: Vec<NewsArticle> = results
        .into_iter()
        .take(limit)
        .map(|raw| NewsArticle {
            id: text(raw.article_id)
                .unwrap_or_else(|| format!("{:016x}", stable_hash(&raw.link))),
            published_at: raw
                .pub_date
                .as_deref()
                .and_then(|d| NaiveDateTime::parse_from_str(d, "%Y-%m-%d %H:%M:%S").ok())
                .map(|d| d.and_utc()),
            title: raw.title,
            description: text(raw.description),
            source: text(raw.source_id).unwrap_or_else(|| SOURCE_ID.to_string()),
            url: raw.link,
            image_url: text(raw.image_url),
        })
        .collect();

    if articles.is_empty() {
        return Err(ProviderError::Empty("newsdata returned no articles".to_string()));
    }
    Ok(articles)
}

impl DataSource for NewsDataClient {
    fn source(&self) -> &str {
        SOURCE_ID
    }
}

#[async_trait]
impl NewsProvider for NewsDataClient {
    #[tracing::instrument(skip(self), fields(provider = SOURCE_ID))]
    async fn news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsArticle>, ProviderError> {
        let key = require_key(&self.api_key, SOURCE_ID)?;
        let size = limit.clamp(1, MAX_PAGE_SIZE).to_string();
        let data = self
            .http
            .get_json(
                &self.base_url,
                &[
                    ("apikey", key),
                    ("q", symbol),
                    ("category", "business"),
                    ("language", "en"),
                    ("size", size.as_str()),
                ],
            )
            .await?;
        parse_news(data, limit)
    }
}
