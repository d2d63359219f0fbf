use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ProviderError, UnknownTimeRange};
use crate::sentiment::SentimentLabel;

/// Provenance label attached to generated placeholder data.
pub const SYNTHETIC_SOURCE: &str = "synthetic";

/// Daily OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// Prices must be finite, non-negative and satisfy `low <= open,close <= high`.
    pub fn validate(&self) -> Result<(), ProviderError> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(ProviderError::InvalidData(format!(
                "non-finite or negative price on {}",
                self.date
            )));
        }
        if self.low > self.open.min(self.close) || self.high < self.open.max(self.close) {
            return Err(ProviderError::InvalidData(format!(
                "OHLC out of order on {}: o={} h={} l={} c={}",
                self.date, self.open, self.high, self.low, self.close
            )));
        }
        Ok(())
    }
}

/// Chronological daily bars for one symbol. Dates are strictly increasing;
/// non-trading days are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Sorts `bars` by date and rejects duplicates and malformed bars.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Result<Self, ProviderError> {
        bars.sort_by_key(|b| b.date);
        for bar in &bars {
            bar.validate()?;
        }
        if let Some(pair) = bars.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(ProviderError::InvalidData(format!(
                "duplicate bar for {}",
                pair[0].date
            )));
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn into_bars(self) -> Vec<PriceBar> {
        self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Trailing window of at most `n` bars.
    pub fn last_n(&self, n: usize) -> &[PriceBar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }

    /// Percent change of the last close against the one before it.
    pub fn change_percent(&self) -> Option<f64> {
        match self.last_n(2) {
            [prev, last] if prev.close != 0.0 => Some((last.close - prev.close) / prev.close * 100.0),
            _ => None,
        }
    }
}

/// A price bar with derived indicators. `None` means not enough history yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorBar {
    #[serde(flatten)]
    pub bar: PriceBar,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub ema: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub upper_band: Option<f64>,
    pub lower_band: Option<f64>,
}

impl IndicatorBar {
    pub fn date(&self) -> NaiveDate {
        self.bar.date
    }

    pub fn close(&self) -> f64 {
        self.bar.close
    }

    pub fn volume(&self) -> u64 {
        self.bar.volume
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    pub score: i64,
    pub comment_count: u64,
}

/// A social or forum post about a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author: String,
    pub author_followers: u64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub engagement: Engagement,
    #[serde(default)]
    pub url: Option<String>,
    /// Subreddit, channel or board the post came from.
    #[serde(default)]
    pub community: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPost {
    #[serde(flatten)]
    pub post: Post,
    pub sentiment: f64,
    pub sentiment_label: SentimentLabel,
}

/// Per-bucket statistics of a hype aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: SentimentLabel,
    pub avg_sentiment: f64,
    pub weight: f64,
    pub weighted_score: f64,
    pub total_followers: u64,
    pub post_count: usize,
}

impl CategoryStats {
    pub fn empty(category: SentimentLabel) -> Self {
        Self {
            category,
            avg_sentiment: 0.0,
            weight: 0.0,
            weighted_score: 0.0,
            total_followers: 0,
            post_count: 0,
        }
    }
}

/// Follower-weighted hype score in `[0, 100]`, 50 being neutral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypeResult {
    pub score: f64,
    /// Always positive, neutral, negative in that order.
    pub breakdown: [CategoryStats; 3],
}

impl HypeResult {
    pub const NEUTRAL_SCORE: f64 = 50.0;

    pub fn neutral() -> Self {
        Self {
            score: Self::NEUTRAL_SCORE,
            breakdown: SentimentLabel::ALL.map(CategoryStats::empty),
        }
    }

    /// The hype score mapped onto `[-1, 1]`.
    pub fn normalized_sentiment(&self) -> f64 {
        (self.score - Self::NEUTRAL_SCORE) / Self::NEUTRAL_SCORE
    }

    pub fn sentiment_label(&self) -> SentimentLabel {
        SentimentLabel::from_score(self.normalized_sentiment())
    }

    pub fn category(&self, label: SentimentLabel) -> &CategoryStats {
        match label {
            SentimentLabel::Positive => &self.breakdown[0],
            SentimentLabel::Neutral => &self.breakdown[1],
            SentimentLabel::Negative => &self.breakdown[2],
        }
    }

    pub fn total_posts(&self) -> usize {
        self.breakdown.iter().map(|c| c.post_count).sum()
    }
}

/// Data plus the provider that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult<T> {
    pub data: T,
    pub source: String,
    pub is_synthetic: bool,
}

impl<T> FetchResult<T> {
    pub fn live(data: T, source: impl Into<String>) -> Self {
        Self {
            data,
            source: source.into(),
            is_synthetic: false,
        }
    }

    pub fn synthetic(data: T) -> Self {
        Self {
            data,
            source: SYNTHETIC_SOURCE.to_string(),
            is_synthetic: true,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchResult<U> {
        FetchResult {
            data: f(self.data),
            source: self.source,
            is_synthetic: self.is_synthetic,
        }
    }
}

/// Latest trade snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub previous_close: f64,
}

/// Company metadata. Every field but `symbol` is optional so that several
/// providers can each fill in what they know.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub exchange: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    /// USD
    pub market_cap: Option<f64>,
    pub ceo: Option<String>,
    pub headquarters: Option<String>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub eps: Option<f64>,
    pub analyst_rating: Option<String>,
    pub description: Option<String>,
}

macro_rules! fill_missing {
    ($dst:ident, $src:ident, $($field:ident),+ $(,)?) => {{
        let mut filled = 0usize;
        $(
            if $dst.$field.is_none() && $src.$field.is_some() {
                $dst.$field = $src.$field;
                filled += 1;
            }
        )+
        filled
    }};
}

macro_rules! count_present {
    ($p:ident, $($field:ident),+ $(,)?) => {
        0usize $(+ usize::from($p.$field.is_some()))+
    };
}

impl CompanyProfile {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    /// Fill fields that are still `None` from `other`. Returns how many were filled.
    pub fn merge_missing(&mut self, other: CompanyProfile) -> usize {
        fill_missing!(
            self, other, name, sector, industry, exchange, country, currency, market_cap, ceo,
            headquarters, pe_ratio, dividend_yield, eps, analyst_rating, description,
        )
    }

    pub fn populated_fields(&self) -> usize {
        count_present!(
            self, name, sector, industry, exchange, country, currency, market_cap, ceo,
            headquarters, pe_ratio, dividend_yield, eps, analyst_rating, description,
        )
    }

    pub fn is_complete(&self) -> bool {
        self.populated_fields() == 14
    }
}

/// Profile and quote, each with its own provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyDetails {
    pub profile: FetchResult<CompanyProfile>,
    pub quote: FetchResult<Quote>,
}

impl CompanyDetails {
    pub fn is_synthetic(&self) -> bool {
        self.profile.is_synthetic || self.quote.is_synthetic
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub source: String,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Symbol search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerMatch {
    pub symbol: String,
    pub name: String,
    pub kind: Option<String>,
    pub region: Option<String>,
    pub currency: Option<String>,
}

/// A kind of data a provider chain resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    PriceHistory,
    Quote,
    Profile,
    Posts,
    News,
    Search,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::PriceHistory,
        Capability::Quote,
        Capability::Profile,
        Capability::Posts,
        Capability::News,
        Capability::Search,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::PriceHistory => "price_history",
            Capability::Quote => "quote",
            Capability::Profile => "profile",
            Capability::Posts => "posts",
            Capability::News => "news",
            Capability::Search => "search",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display window for price history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1W")]
    OneWeek,
    #[default]
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "1Y")]
    OneYear,
}

impl TimeRange {
    pub fn days(&self) -> usize {
        match self {
            TimeRange::OneDay => 1,
            TimeRange::OneWeek => 7,
            TimeRange::OneMonth => 30,
            TimeRange::ThreeMonths => 90,
            TimeRange::OneYear => 365,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::OneDay => "1D",
            TimeRange::OneWeek => "1W",
            TimeRange::OneMonth => "1M",
            TimeRange::ThreeMonths => "3M",
            TimeRange::OneYear => "1Y",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeRange {
    type Err = UnknownTimeRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1D" => Ok(TimeRange::OneDay),
            "1W" => Ok(TimeRange::OneWeek),
            "1M" => Ok(TimeRange::OneMonth),
            "3M" => Ok(TimeRange::ThreeMonths),
            "1Y" => Ok(TimeRange::OneYear),
            _ => Err(UnknownTimeRange(s.to_string())),
        }
    }
}
