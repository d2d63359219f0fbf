use async_trait::async_trait;

use crate::{CompanyProfile, NewsArticle, Post, PriceSeries, ProviderError, Quote, TickerMatch};

/// Anything that can serve data and name itself for provenance.
pub trait DataSource: Send + Sync {
    /// Stable identifier reported in `FetchResult::source`.
    fn source(&self) -> &str;
}

/// Daily price history
#[async_trait]
pub trait PriceHistoryProvider: DataSource {
    async fn daily_series(&self, symbol: &str) -> Result<PriceSeries, ProviderError>;
}

#[async_trait]
pub trait QuoteProvider: DataSource {
    async fn quote(&self, symbol: &str) -> Result<Quote, ProviderError>;
}

/// Company metadata. Providers may return partially filled profiles.
#[async_trait]
pub trait ProfileProvider: DataSource {
    async fn profile(&self, symbol: &str) -> Result<CompanyProfile, ProviderError>;
}

/// Social posts mentioning a ticker
#[async_trait]
pub trait PostProvider: DataSource {
    async fn posts(&self, symbol: &str, limit: usize) -> Result<Vec<Post>, ProviderError>;
}

#[async_trait]
pub trait NewsProvider: DataSource {
    async fn news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsArticle>, ProviderError>;
}

#[async_trait]
pub trait SymbolSearchProvider: DataSource {
    async fn search(&self, query: &str) -> Result<Vec<TickerMatch>, ProviderError>;
}

/// Whether a successfully parsed payload actually carries data.
pub trait Usable {
    fn is_usable(&self) -> bool;
}

impl<T> Usable for Vec<T> {
    fn is_usable(&self) -> bool {
        !self.is_empty()
    }
}

impl Usable for PriceSeries {
    fn is_usable(&self) -> bool {
        !self.is_empty()
    }
}

impl Usable for Quote {
    fn is_usable(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}

impl Usable for CompanyProfile {
    fn is_usable(&self) -> bool {
        self.populated_fields() > 0
    }
}
