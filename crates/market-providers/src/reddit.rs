use std::time::{Duration, Instant};

use async_trait::async_trait;
use hype_core::stats::stable_hash;
use hype_core::{DataSource, Engagement, Post, PostProvider, ProviderError};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::fields::unix_datetime;
use crate::http::{decode, HttpClient};

const PUBLIC_SEARCH_URL: &str = "https://www.reddit.com/search.json";
const OAUTH_SEARCH_URL: &str = "https://oauth.reddit.com/search";
const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const PERMALINK_BASE: &str = "https://www.reddit.com";

pub const PUBLIC_SOURCE_ID: &str = "reddit";
pub const OAUTH_SOURCE_ID: &str = "reddit_oauth";

/// Reddit exposes no follower counts; estimates never go below this.
const MIN_FOLLOWERS: i64 = 100;
const FOLLOWER_JITTER: u64 = 5_000;

/// Refresh the OAuth token this long before Reddit expires it.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Follower estimate: `max(100, score * 10 + jitter)` with a jitter derived
/// from the post id, so the same post always gets the same estimate.
pub fn estimate_followers(post_id: &str, score: i64) -> u64 {
    let jitter = (stable_hash(post_id) % FOLLOWER_JITTER) as i64;
    score
        .saturating_mul(10)
        .saturating_add(jitter)
        .max(MIN_FOLLOWERS) as u64
}

fn search_query(symbol: &str) -> String {
    format!("{symbol} stock")
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: RawPost,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    id: String,
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: u64,
    created_utc: f64,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    subreddit: Option<String>,
}

/// Map a search listing into posts, newest first.
pub(crate) fn parse_listing(data: Value) -> Result<Vec<Post>, ProviderError> {
    let listing: Listing = decode(data)?;
    let mut posts: Vec<Post> = listing
        .data
        .children
        .into_iter()
        .filter_map(|child| {
            let raw = child.data;
            let created_at = unix_datetime(raw.created_utc as i64)?;
            let text = if raw.selftext.trim().is_empty() {
                raw.title.clone()
            } else {
                format!("{} {}", raw.title, raw.selftext)
            };
            Some(Post {
                author_followers: estimate_followers(&raw.id, raw.score),
                url: (!raw.permalink.is_empty())
                    .then(|| format!("{PERMALINK_BASE}{}", raw.permalink)),
                id: raw.id,
                author: raw.author,
                text,
                created_at,
                engagement: Engagement {
                    score: raw.score,
                    comment_count: raw.num_comments,
                },
                community: raw.subreddit,
            })
        })
        .collect();

    if posts.is_empty() {
        return Err(ProviderError::Empty("no posts in listing".to_string()));
    }
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(posts)
}

/// Unauthenticated `search.json` endpoint.
#[derive(Clone)]
pub struct RedditClient {
    search_url: String,
    http: HttpClient,
}

impl RedditClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        Self {
            search_url: PUBLIC_SEARCH_URL.to_string(),
            http: HttpClient::new(timeout, user_agent),
        }
    }
}

impl DataSource for RedditClient {
    fn source(&self) -> &str {
        PUBLIC_SOURCE_ID
    }
}

#[async_trait]
impl PostProvider for RedditClient {
    #[tracing::instrument(skip(self), fields(provider = PUBLIC_SOURCE_ID))]
    async fn posts(&self, symbol: &str, limit: usize) -> Result<Vec<Post>, ProviderError> {
        let query = search_query(symbol);
        let limit = limit.to_string();
        let data = self
            .http
            .get_json(
                &self.search_url,
                &[("q", query.as_str()), ("sort", "relevance"), ("limit", limit.as_str())],
            )
            .await?;
        parse_listing(data)
    }
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

/// Application-only OAuth (client credentials) search.
pub struct RedditOAuthClient {
    client_id: Option<String>,
    client_secret: Option<String>,
    http: HttpClient,
    token: Mutex<Option<AccessToken>>,
}

impl RedditOAuthClient {
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            http: HttpClient::new(timeout, user_agent),
            token: Mutex::new(None),
        }
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        let (Some(id), Some(secret)) = (self.client_id.as_deref(), self.client_secret.as_deref())
        else {
            return Err(ProviderError::Unauthorized(
                "no Reddit client credentials configured".to_string(),
            ));
        };

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.expires_at > Instant::now()) {
            return Ok(token.value.clone());
        }

        let request = self
            .http
            .client()
            .post(TOKEN_URL)
            .basic_auth(id, Some(secret))
            .form(&[("grant_type", "client_credentials")]);
        let response: TokenResponse = decode(self.http.send_json(request).await?)?;

        let Some(value) = response.access_token else {
            return Err(ProviderError::Unauthorized(
                response.error.unwrap_or_else(|| "no access token".to_string()),
            ));
        };
        let lifetime = Duration::from_secs(response.expires_in.unwrap_or(3_600));
        let expires_at = Instant::now() + lifetime.saturating_sub(TOKEN_EXPIRY_MARGIN);
        tracing::debug!(expires_in = lifetime.as_secs(), "obtained Reddit access token");

        *cached = Some(AccessToken {
            value: value.clone(),
            expires_at,
        });
        Ok(value)
    }
}

impl DataSource for RedditOAuthClient {
    fn source(&self) -> &str {
        OAUTH_SOURCE_ID
    }
}

#[async_trait]
impl PostProvider for RedditOAuthClient {
    #[tracing::instrument(skip(self), fields(provider = OAUTH_SOURCE_ID))]
    async fn posts(&self, symbol: &str, limit: usize) -> Result<Vec<Post>, ProviderError> {
        let token = self.access_token().await?;
        let query = search_query(symbol);
        let limit = limit.to_string();
        let request = self
            .http
            .client()
            .get(OAUTH_SEARCH_URL)
            .bearer_auth(token)
            .query(&[("q", query.as_str()), ("sort", "relevance"), ("limit", limit.as_str())]);
        parse_listing(self.http.send_json(request).await?)
    }
}
