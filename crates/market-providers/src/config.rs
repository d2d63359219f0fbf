use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use hype_core::Capability;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every adapter this crate ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    AlphaVantage,
    Finnhub,
    Yahoo,
    Reddit,
    RedditOAuth,
    NewsData,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider '{0}'")]
pub struct UnknownProvider(pub String);

impl ProviderKind {
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::AlphaVantage,
        ProviderKind::Finnhub,
        ProviderKind::Yahoo,
        ProviderKind::Reddit,
        ProviderKind::RedditOAuth,
        ProviderKind::NewsData,
    ];

    /// Source id reported in `FetchResult::source`.
    pub fn id(self) -> &'static str {
        match self {
            ProviderKind::AlphaVantage => crate::alpha_vantage::SOURCE_ID,
            ProviderKind::Finnhub => crate::finnhub::SOURCE_ID,
            ProviderKind::Yahoo => crate::yahoo::SOURCE_ID,
            ProviderKind::Reddit => crate::reddit::PUBLIC_SOURCE_ID,
            ProviderKind::RedditOAuth => crate::reddit::OAUTH_SOURCE_ID,
            ProviderKind::NewsData => crate::news_data::SOURCE_ID,
        }
    }

    pub fn supports(self, capability: Capability) -> bool {
        use Capability::*;
        match self {
            ProviderKind::AlphaVantage => matches!(capability, PriceHistory | Quote | Profile | Search),
            ProviderKind::Finnhub => {
                matches!(capability, PriceHistory | Quote | Profile | News | Search)
            }
            ProviderKind::Yahoo => matches!(capability, PriceHistory | Quote | Search),
            ProviderKind::Reddit | ProviderKind::RedditOAuth => capability == Posts,
            ProviderKind::NewsData => capability == News,
        }
    }

    /// Order used when the capability's variable is unset.
    pub fn default_order(capability: Capability) -> &'static [ProviderKind] {
        use ProviderKind::*;
        match capability {
            Capability::PriceHistory => &[AlphaVantage, Finnhub, Yahoo],
            Capability::Quote => &[Finnhub, Yahoo, AlphaVantage],
            Capability::Profile => &[Finnhub, AlphaVantage],
            Capability::Posts => &[Reddit, RedditOAuth],
            Capability::News => &[NewsData, Finnhub],
            Capability::Search => &[AlphaVantage, Finnhub, Yahoo],
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.id() == wanted)
            .ok_or_else(|| UnknownProvider(s.trim().to_string()))
    }
}

fn order_variable(capability: Capability) -> &'static str {
    match capability {
        Capability::PriceHistory => "PRICE_PROVIDERS",
        Capability::Quote => "QUOTE_PROVIDERS",
        Capability::Profile => "PROFILE_PROVIDERS",
        Capability::Posts => "POST_PROVIDERS",
        Capability::News => "NEWS_PROVIDERS",
        Capability::Search => "SEARCH_PROVIDERS",
    }
}

/// Credentials, provider order and limits for the resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    // Credentials
    pub alpha_vantage_api_key: String,
    pub finnhub_api_key: Option<String>,
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_user_agent: String,
    pub newsdata_api_key: Option<String>,

    /// Priority order per capability, first entry tried first.
    pub provider_order: BTreeMap<Capability, Vec<ProviderKind>>,

    pub provider_timeout_secs: u64,
    pub post_limit: usize,
    pub news_limit: usize,
    pub cache_ttl_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            alpha_vantage_api_key: "demo".to_string(),
            finnhub_api_key: None,
            reddit_client_id: None,
            reddit_client_secret: None,
            reddit_user_agent: "web:hypewatch:v0.1".to_string(),
            newsdata_api_key: None,
            provider_order: Capability::ALL
                .into_iter()
                .map(|cap| (cap, ProviderKind::default_order(cap).to_vec()))
                .collect(),
            provider_timeout_secs: 8,
            post_limit: 20,
            news_limit: 10,
            cache_ttl_secs: 300,
        }
    }
}

impl ProvidersConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let mut provider_order = BTreeMap::new();
        for capability in Capability::ALL {
            let variable = order_variable(capability);
            let order = match get(variable) {
                Some(raw) => parse_order(&raw, capability)
                    .with_context(|| format!("invalid {variable}"))?,
                None => ProviderKind::default_order(capability).to_vec(),
            };
            provider_order.insert(capability, order);
        }

        let config = Self {
            alpha_vantage_api_key: get("ALPHA_VANTAGE_API_KEY")
                .unwrap_or(defaults.alpha_vantage_api_key),
            finnhub_api_key: get("FINNHUB_API_KEY"),
            reddit_client_id: get("REDDIT_CLIENT_ID"),
            reddit_client_secret: get("REDDIT_CLIENT_SECRET"),
            reddit_user_agent: get("REDDIT_USER_AGENT").unwrap_or(defaults.reddit_user_agent),
            newsdata_api_key: get("NEWSDATA_API_KEY"),
            provider_order,
            provider_timeout_secs: get("PROVIDER_TIMEOUT_SECS")
                .unwrap_or_else(|| defaults.provider_timeout_secs.to_string())
                .parse()
                .context("PROVIDER_TIMEOUT_SECS must be a whole number of seconds")?,
            post_limit: get("POST_LIMIT")
                .unwrap_or_else(|| defaults.post_limit.to_string())
                .parse()
                .context("POST_LIMIT must be a positive integer")?,
            news_limit: get("NEWS_LIMIT")
                .unwrap_or_else(|| defaults.news_limit.to_string())
                .parse()
                .context("NEWS_LIMIT must be a positive integer")?,
            cache_ttl_secs: get("CACHE_TTL_SECS")
                .unwrap_or_else(|| defaults.cache_ttl_secs.to_string())
                .parse()
                .context("CACHE_TTL_SECS must be a whole number of seconds")?,
        };

        if config.provider_timeout_secs == 0 {
            bail!("PROVIDER_TIMEOUT_SECS must be greater than zero");
        }
        if config.post_limit == 0 || config.news_limit == 0 {
            bail!("POST_LIMIT and NEWS_LIMIT must be greater than zero");
        }

        Ok(config)
    }

    pub fn providers_for(&self, capability: Capability) -> &[ProviderKind] {
        self.provider_order
            .get(&capability)
            .map(Vec::as_slice)
            .unwrap_or_else(|| ProviderKind::default_order(capability))
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Comma-separated provider names; duplicates keep their first position.
fn parse_order(raw: &str, capability: Capability) -> Result<Vec<ProviderKind>> {
    let mut order = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let kind: ProviderKind = name.parse()?;
        if !kind.supports(capability) {
            bail!("provider '{kind}' cannot serve {capability}");
        }
        if !order.contains(&kind) {
            order.push(kind);
        }
    }
    Ok(order)
}
