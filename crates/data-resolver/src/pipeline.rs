use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use hype_core::{
    Capability, CompanyDetails, CompanyProfile, FetchResult, HypeResult, IndicatorBar,
    NewsArticle, NewsProvider, Post, PostProvider, PriceHistoryProvider, PriceSeries,
    ProfileProvider, Quote, QuoteProvider, ScoredPost, SymbolSearchProvider, TickerMatch,
    TimeRange,
};
use market_providers::{ProviderSet, ProvidersConfig};
use sentiment_analysis::{aggregate, LexiconScorer};
use serde::Serialize;
use technical_analysis::{window_bars, IndicatorEngine, IndicatorSnapshot};

use crate::cache::{CacheKey, ResolutionCache, DEFAULT_CACHE_TTL};
use crate::chain::ProviderChain;
use crate::supersede::RequestGate;
use crate::synthetic;

/// One chain per capability.
#[derive(Clone)]
pub struct PipelineChains {
    pub price_history: ProviderChain<dyn PriceHistoryProvider>,
    pub quote: ProviderChain<dyn QuoteProvider>,
    pub profile: ProviderChain<dyn ProfileProvider>,
    pub posts: ProviderChain<dyn PostProvider>,
    pub news: ProviderChain<dyn NewsProvider>,
    pub search: ProviderChain<dyn SymbolSearchProvider>,
}

impl PipelineChains {
    pub fn from_provider_set(set: &ProviderSet, timeout: Duration) -> Self {
        Self {
            price_history: ProviderChain::new(Capability::PriceHistory, set.price_history())
                .with_timeout(timeout),
            quote: ProviderChain::new(Capability::Quote, set.quote()).with_timeout(timeout),
            profile: ProviderChain::new(Capability::Profile, set.profile()).with_timeout(timeout),
            posts: ProviderChain::new(Capability::Posts, set.posts()).with_timeout(timeout),
            news: ProviderChain::new(Capability::News, set.news()).with_timeout(timeout),
            search: ProviderChain::new(Capability::Search, set.search()).with_timeout(timeout),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub post_limit: usize,
    pub news_limit: usize,
    pub cache_ttl: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            post_limit: 20,
            news_limit: 10,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

/// Everything the dashboard shows for one ticker.
#[derive(Debug, Clone, Serialize)]
pub struct TickerReport {
    pub symbol: String,
    pub range: TimeRange,
    pub generated_at: DateTime<Utc>,
    pub prices: FetchResult<PriceSeries>,
    /// Indicators computed over the full series, windowed to `range`.
    pub indicators: FetchResult<Vec<IndicatorBar>>,
    pub snapshot: Option<IndicatorSnapshot>,
    pub details: CompanyDetails,
    pub posts: FetchResult<Vec<ScoredPost>>,
    pub hype: HypeResult,
    pub news: FetchResult<Vec<NewsArticle>>,
}

impl TickerReport {
    /// Drives the "simulated data" notice.
    pub fn has_synthetic_data(&self) -> bool {
        self.prices.is_synthetic
            || self.details.is_synthetic()
            || self.posts.is_synthetic
            || self.news.is_synthetic
    }

    pub fn synthetic_capabilities(&self) -> Vec<Capability> {
        [
            (Capability::PriceHistory, self.prices.is_synthetic),
            (Capability::Quote, self.details.quote.is_synthetic),
            (Capability::Profile, self.details.profile.is_synthetic),
            (Capability::Posts, self.posts.is_synthetic),
            (Capability::News, self.news.is_synthetic),
        ]
        .into_iter()
        .filter_map(|(capability, synthetic)| synthetic.then_some(capability))
        .collect()
    }
}

/// Resolves every capability for a ticker and derives the metrics.
pub struct TickerPipeline {
    chains: PipelineChains,
    settings: PipelineSettings,
    engine: IndicatorEngine,
    scorer: LexiconScorer,
    gate: RequestGate,
    generations: AtomicU64,
    series_cache: ResolutionCache<PriceSeries>,
    quote_cache: ResolutionCache<Quote>,
    profile_cache: ResolutionCache<CompanyProfile>,
    posts_cache: ResolutionCache<Vec<Post>>,
    news_cache: ResolutionCache<Vec<NewsArticle>>,
    search_cache: ResolutionCache<Vec<TickerMatch>>,
}

impl TickerPipeline {
    pub fn new(chains: PipelineChains, settings: PipelineSettings) -> Self {
        let ttl = settings.cache_ttl;
        Self {
            chains,
            settings,
            engine: IndicatorEngine::default(),
            scorer: LexiconScorer::default(),
            gate: RequestGate::new(),
            generations: AtomicU64::new(0),
            series_cache: ResolutionCache::new(ttl),
            quote_cache: ResolutionCache::new(ttl),
            profile_cache: ResolutionCache::new(ttl),
            posts_cache: ResolutionCache::new(ttl),
            news_cache: ResolutionCache::new(ttl),
            search_cache: ResolutionCache::new(ttl),
        }
    }

    pub fn from_config(config: &ProvidersConfig) -> Self {
        let set = ProviderSet::from_config(config);
        Self::new(
            PipelineChains::from_provider_set(&set, config.provider_timeout()),
            PipelineSettings {
                post_limit: config.post_limit,
                news_limit: config.news_limit,
                cache_ttl: config.cache_ttl(),
            },
        )
    }

    pub fn with_engine(mut self, engine: IndicatorEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_scorer(mut self, scorer: LexiconScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Request generation shared by every cache; later requests get larger ones.
    pub fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub async fn price_series(&self, symbol: &str, generation: u64) -> FetchResult<PriceSeries> {
        let key = CacheKey::new(symbol, Capability::PriceHistory, "");
        self.series_cache
            .get_or_resolve(
                key,
                generation,
                self.chains.price_history.resolve(
                    symbol,
                    move |p| async move { p.daily_series(symbol).await },
                    || synthetic::price_series(symbol, Utc::now().date_naive()),
                ),
            )
            .await
    }

    pub async fn company_details(&self, symbol: &str, generation: u64) -> CompanyDetails {
        let profile = self.profile_cache.get_or_resolve(
            CacheKey::new(symbol, Capability::Profile, ""),
            generation,
            self.chains.profile.resolve_merged(
                symbol,
                move |p| async move { p.profile(symbol).await },
                || synthetic::profile(symbol),
            ),
        );
        let quote = self.quote_cache.get_or_resolve(
            CacheKey::new(symbol, Capability::Quote, ""),
            generation,
            self.chains.quote.resolve(
                symbol,
                move |p| async move { p.quote(symbol).await },
                || synthetic::quote(symbol, Utc::now().date_naive()),
            ),
        );
        let (profile, quote) = tokio::join!(profile, quote);
        CompanyDetails { profile, quote }
    }

    pub async fn posts(&self, symbol: &str, generation: u64) -> FetchResult<Vec<Post>> {
        let limit = self.settings.post_limit;
        self.posts_cache
            .get_or_resolve(
                CacheKey::new(symbol, Capability::Posts, limit.to_string()),
                generation,
                self.chains.posts.resolve(
                    symbol,
                    move |p| async move { p.posts(symbol, limit).await },
                    || synthetic::posts(symbol, Utc::now()),
                ),
            )
            .await
    }

    pub async fn news(&self, symbol: &str, generation: u64) -> FetchResult<Vec<NewsArticle>> {
        let limit = self.settings.news_limit;
        self.news_cache
            .get_or_resolve(
                CacheKey::new(symbol, Capability::News, limit.to_string()),
                generation,
                self.chains.news.resolve(
                    symbol,
                    move |p| async move { p.news(symbol, limit).await },
                    || synthetic::news(symbol, Utc::now()),
                ),
            )
            .await
    }

    /// Resolve and derive everything for one ticker.
    pub async fn report(&self, symbol: &str, range: TimeRange) -> TickerReport {
        let symbol = symbol.trim().to_uppercase();
        let symbol = symbol.as_str();
        let generation = self.next_generation();
        tracing::info!(symbol, range = %range, "building ticker report");

        let (prices, details, posts, news) = tokio::join!(
            self.price_series(symbol, generation),
            self.company_details(symbol, generation),
            self.posts(symbol, generation),
            self.news(symbol, generation),
        );

        let all_bars: Vec<IndicatorBar> = self.engine.compute(&prices.data).collect();
        let snapshot = IndicatorSnapshot::from_bars(&all_bars);
        let indicators = FetchResult {
            data: window_bars(&all_bars, range).to_vec(),
            source: prices.source.clone(),
            is_synthetic: prices.is_synthetic,
        };

        let posts = posts.map(|posts| self.scorer.score_posts(posts));
        let hype = aggregate(&posts.data);

        let report = TickerReport {
            symbol: symbol.to_string(),
            range,
            generated_at: Utc::now(),
            prices,
            indicators,
            snapshot,
            details,
            posts,
            hype,
            news,
        };
        if report.has_synthetic_data() {
            tracing::warn!(
                symbol,
                synthetic = ?report.synthetic_capabilities(),
                "report contains simulated data"
            );
        }
        report
    }

    /// `report` under "last request wins" for `slot`; `None` when a newer
    /// request for the same slot started first.
    pub async fn report_for_slot(
        &self,
        slot: &str,
        symbol: &str,
        range: TimeRange,
    ) -> Option<TickerReport> {
        self.gate.run(slot, self.report(symbol, range)).await
    }

    pub async fn search(&self, query: &str) -> FetchResult<Vec<TickerMatch>> {
        let query = query.trim();
        let generation = self.next_generation();
        self.search_cache
            .get_or_resolve(
                CacheKey::new("", Capability::Search, query.to_lowercase()),
                generation,
                self.chains.search.resolve(
                    query,
                    move |p| async move { p.search(query).await },
                    || synthetic::search(query),
                ),
            )
            .await
    }
}
