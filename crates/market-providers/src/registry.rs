use std::sync::Arc;

use hype_core::{
    Capability, NewsProvider, PostProvider, PriceHistoryProvider, ProfileProvider, QuoteProvider,
    SymbolSearchProvider,
};

use crate::alpha_vantage::AlphaVantageClient;
use crate::config::{ProviderKind, ProvidersConfig};
use crate::finnhub::FinnhubClient;
use crate::news_data::NewsDataClient;
use crate::reddit::{RedditClient, RedditOAuthClient};
use crate::yahoo::YahooClient;

/// One shared client per adapter, handed out per capability in the
/// configured priority order.
#[derive(Clone)]
pub struct ProviderSet {
    price_history: Vec<Arc<dyn PriceHistoryProvider>>,
    quote: Vec<Arc<dyn QuoteProvider>>,
    profile: Vec<Arc<dyn ProfileProvider>>,
    posts: Vec<Arc<dyn PostProvider>>,
    news: Vec<Arc<dyn NewsProvider>>,
    search: Vec<Arc<dyn SymbolSearchProvider>>,
}

impl ProviderSet {
    pub fn from_config(config: &ProvidersConfig) -> Self {
        let timeout = config.provider_timeout();
        let alpha_vantage = Arc::new(AlphaVantageClient::new(
            config.alpha_vantage_api_key.clone(),
            timeout,
        ));
        let finnhub = Arc::new(FinnhubClient::new(config.finnhub_api_key.clone(), timeout));
        let yahoo = Arc::new(YahooClient::new(timeout));
        let reddit = Arc::new(RedditClient::new(&config.reddit_user_agent, timeout));
        let reddit_oauth = Arc::new(RedditOAuthClient::new(
            config.reddit_client_id.clone(),
            config.reddit_client_secret.clone(),
            &config.reddit_user_agent,
            timeout,
        ));
        let news_data = Arc::new(NewsDataClient::new(config.newsdata_api_key.clone(), timeout));

        let kinds = |capability| config.providers_for(capability).iter().copied();

        let price_history = kinds(Capability::PriceHistory)
            .filter_map(|kind| -> Option<Arc<dyn PriceHistoryProvider>> {
                match kind {
                    ProviderKind::AlphaVantage => Some(alpha_vantage.clone()),
                    ProviderKind::Finnhub => Some(finnhub.clone()),
                    ProviderKind::Yahoo => Some(yahoo.clone()),
                    _ => None,
                }
            })
            .collect();
        let quote = kinds(Capability::Quote)
            .filter_map(|kind| -> Option<Arc<dyn QuoteProvider>> {
                match kind {
                    ProviderKind::AlphaVantage => Some(alpha_vantage.clone()),
                    ProviderKind::Finnhub => Some(finnhub.clone()),
                    ProviderKind::Yahoo => Some(yahoo.clone()),
                    _ => None,
                }
            })
            .collect();
        let profile = kinds(Capability::Profile)
            .filter_map(|kind| -> Option<Arc<dyn ProfileProvider>> {
                match kind {
                    ProviderKind::AlphaVantage => Some(alpha_vantage.clone()),
                    ProviderKind::Finnhub => Some(finnhub.clone()),
                    _ => None,
                }
            })
            .collect();
        let posts = kinds(Capability::Posts)
            .filter_map(|kind| -> Option<Arc<dyn PostProvider>> {
                match kind {
                    ProviderKind::Reddit => Some(reddit.clone()),
                    ProviderKind::RedditOAuth => Some(reddit_oauth.clone()),
                    _ => None,
                }
            })
            .collect();
        let news = kinds(Capability::News)
            .filter_map(|kind| -> Option<Arc<dyn NewsProvider>> {
                match kind {
                    ProviderKind::NewsData => Some(news_data.clone()),
                    ProviderKind::Finnhub => Some(finnhub.clone()),
                    _ => None,
                }
            })
            .collect();
        let search = kinds(Capability::Search)
            .filter_map(|kind| -> Option<Arc<dyn SymbolSearchProvider>> {
                match kind {
                    ProviderKind::AlphaVantage => Some(alpha_vantage.clone()),
                    ProviderKind::Finnhub => Some(finnhub.clone()),
                    ProviderKind::Yahoo => Some(yahoo.clone()),
                    _ => None,
                }
            })
            .collect();

        Self {
            price_history,
            quote,
            profile,
            posts,
            news,
            search,
        }
    }

    pub fn price_history(&self) -> Vec<Arc<dyn PriceHistoryProvider>> {
        self.price_history.clone()
    }

    pub fn quote(&self) -> Vec<Arc<dyn QuoteProvider>> {
        self.quote.clone()
    }

    pub fn profile(&self) -> Vec<Arc<dyn ProfileProvider>> {
        self.profile.clone()
    }

    pub fn posts(&self) -> Vec<Arc<dyn PostProvider>> {
        self.posts.clone()
    }

    pub fn news(&self) -> Vec<Arc<dyn NewsProvider>> {
        self.news.clone()
    }

    pub fn search(&self) -> Vec<Arc<dyn SymbolSearchProvider>> {
        self.search.clone()
    }
}
