use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, Utc};
use hype_core::{
    CompanyProfile, DataSource, NewsArticle, NewsProvider, PriceBar, PriceHistoryProvider,
    PriceSeries, ProfileProvider, ProviderError, Quote, QuoteProvider, SymbolSearchProvider,
    TickerMatch,
};
use serde::Deserialize;
use serde_json::Value;

use crate::fields::{text, unix_date, unix_datetime, volume};
use crate::http::{decode, require_key, HttpClient};

const BASE_URL: &str = "https://finnhub.io/api/v1";
pub const SOURCE_ID: &str = "finnhub";

/// Calendar days of candles requested for the daily series.
const CANDLE_LOOKBACK_DAYS: u64 = 180;
const NEWS_LOOKBACK_DAYS: u64 = 7;

/// Finnhub REST client.
#[derive(Clone)]
pub struct FinnhubClient {
    api_key: Option<String>,
    base_url: String,
    http: HttpClient,
}

impl FinnhubClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            api_key,
            base_url: BASE_URL.to_string(),
            http: HttpClient::new(timeout, "hypewatch"),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, ProviderError> {
        let token = require_key(&self.api_key, SOURCE_ID)?;
        let mut query = params.to_vec();
        query.push(("token", token));
        let url = format!("{}/{}", self.base_url, path);
        let data = self.http.get_json(&url, &query).await?;
        check_limited(&data)?;
        Ok(data)
    }
}

/// Finnhub signals throttling and bad symbols with `{}` or an `error` field.
pub(crate) fn check_limited(data: &Value) -> Result<(), ProviderError> {
    match data.as_object() {
        Some(object) if object.is_empty() => {
            Err(ProviderError::RateLimited("empty response".to_string()))
        }
        Some(object) => match object.get("error") {
            Some(err) => Err(ProviderError::RateLimited(
                err.as_str().unwrap_or("error").to_string(),
            )),
            None => Ok(()),
        },
        None => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    c: f64,
    d: Option<f64>,
    dp: Option<f64>,
    h: f64,
    l: f64,
    o: f64,
    pc: f64,
}

pub(crate) fn parse_quote(symbol: &str, data: Value) -> Result<Quote, ProviderError> {
    let q: QuoteResponse = decode(data)?;
    // Unknown symbols come back as all zeros
    if q.c == 0.0 {
        return Err(ProviderError::Empty(format!("no quote for {symbol}")));
    }
    let change = q.d.unwrap_or(q.c - q.pc);
    let change_percent = q
        .dp
        .unwrap_or_else(|| if q.pc != 0.0 { change / q.pc * 100.0 } else { 0.0 });

    Ok(Quote {
        symbol: symbol.to_string(),
        price: q.c,
        change,
        change_percent,
        high: q.h,
        low: q.l,
        open: q.o,
        previous_close: q.pc,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProfileResponse {
    name: Option<String>,
    country: Option<String>,
    currency: Option<String>,
    exchange: Option<String>,
    /// Millions of `currency`
    market_capitalization: Option<f64>,
    finnhub_industry: Option<String>,
}

pub(crate) fn parse_profile(symbol: &str, data: Value) -> Result<CompanyProfile, ProviderError> {
    let p: ProfileResponse = decode(data)?;
    let industry = text(p.finnhub_industry);

    Ok(CompanyProfile {
        symbol: symbol.to_string(),
        name: text(p.name),
        // Finnhub only reports an industry; it doubles as the sector.
        sector: industry.clone(),
        industry,
        exchange: text(p.exchange),
        country: text(p.country),
        currency: text(p.currency),
        market_cap: p
            .market_capitalization
            .filter(|cap| *cap > 0.0)
            .map(|millions| millions * 1_000_000.0),
        ..CompanyProfile::new(symbol)
    })
}

#[derive(Debug, Deserialize)]
struct CandleResponse {
    s: String,
    #[serde(default)]
    t: Vec<i64>,
    #[serde(default)]
    o: Vec<f64>,
    #[serde(default)]
    h: Vec<f64>,
    #[serde(default)]
    l: Vec<f64>,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    v: Vec<f64>,
}

pub(crate) fn parse_candles(symbol: &str, data: Value) -> Result<PriceSeries, ProviderError> {
    let candles: CandleResponse = decode(data)?;
    if candles.s != "ok" {
        return Err(ProviderError::Empty(format!("candle status '{}'", candles.s)));
    }
    let n = candles.t.len();
    if [candles.o.len(), candles.h.len(), candles.l.len(), candles.c.len(), candles.v.len()]
        .iter()
        .any(|len| *len != n)
    {
        return Err(ProviderError::Malformed("candle arrays differ in length".to_string()));
    }

    let mut bars = Vec::with_capacity(n);
    for i in 0..n {
        let date = unix_date(candles.t[i])
            .ok_or_else(|| ProviderError::Malformed(format!("bad timestamp {}", candles.t[i])))?;
        bars.push(PriceBar {
            date,
            open: candles.o[i],
            high: candles.h[i],
            low: candles.l[i],
            close: candles.c[i],
            volume: volume(candles.v[i])?,
        });
    }
    PriceSeries::new(symbol, bars)
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    id: i64,
    headline: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    source: Option<String>,
    url: String,
    #[serde(default)]
    image: Option<String>,
    datetime: i64,
}

pub(crate) fn parse_news(data: Value, limit: usize) -> Result<Vec<NewsArticle>, ProviderError> {
    let items: Vec<NewsItem> = decode(data)?;
    Ok(items
        .into_iter()
        .take(limit)
        .map(|item| NewsArticle {
            id: item.id.to_string(),
            title: item.headline,
            description: text(item.summary),
            source: text(item.source).unwrap_or_else(|| SOURCE_ID.to_string()),
            url: item.url,
            image_url: text(item.image),
            published_at: unix_datetime(item.datetime),
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    description: String,
    symbol: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

pub(crate) fn parse_search(data: Value) -> Result<Vec<TickerMatch>, ProviderError> {
    let response: SearchResponse = decode(data)?;
    Ok(response
        .result
        .into_iter()
        .map(|item| TickerMatch {
            symbol: item.symbol,
            name: item.description,
            kind: text(item.kind),
            region: None,
            currency: None,
        })
        .collect())
}

impl DataSource for FinnhubClient {
    fn source(&self) -> &str {
        SOURCE_ID
    }
}

#[async_trait]
impl QuoteProvider for FinnhubClient {
    #[tracing::instrument(skip(self), fields(provider = SOURCE_ID))]
    async fn quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let data = self.get("quote", &[("symbol", symbol)]).await?;
        parse_quote(symbol, data)
    }
}

#[async_trait]
impl ProfileProvider for FinnhubClient {
    #[tracing::instrument(skip(self), fields(provider = SOURCE_ID))]
    async fn profile(&self, symbol: &str) -> Result<CompanyProfile, ProviderError> {
        let data = self.get("stock/profile2", &[("symbol", symbol)]).await?;
        parse_profile(symbol, data)
    }
}

#[async_trait]
impl PriceHistoryProvider for FinnhubClient {
    #[tracing::instrument(skip(self), fields(provider = SOURCE_ID))]
    async fn daily_series(&self, symbol: &str) -> Result<PriceSeries, ProviderError> {
        let now = Utc::now();
        let from = now - chrono::Duration::days(CANDLE_LOOKBACK_DAYS as i64);
        let (from, to) = (from.timestamp().to_string(), now.timestamp().to_string());
        let data = self
            .get(
                "stock/candle",
                &[("symbol", symbol), ("resolution", "D"), ("from", &from), ("to", &to)],
            )
            .await?;
        parse_candles(symbol, data)
    }
}

#[async_trait]
impl NewsProvider for FinnhubClient {
    #[tracing::instrument(skip(self), fields(provider = SOURCE_ID))]
    async fn news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsArticle>, ProviderError> {
        let today = Utc::now().date_naive();
        let from = today
            .checked_sub_days(Days::new(NEWS_LOOKBACK_DAYS))
            .unwrap_or(today)
            .to_string();
        let to = today.to_string();
        let data = self
            .get("company-news", &[("symbol", symbol), ("from", &from), ("to", &to)])
            .await?;
        parse_news(data, limit)
    }
}

#[async_trait]
impl SymbolSearchProvider for FinnhubClient {
    #[tracing::instrument(skip(self), fields(provider = SOURCE_ID))]
    async fn search(&self, query: &str) -> Result<Vec<TickerMatch>, ProviderError> {
        let data = self.get("search", &[("q", query.trim())]).await?;
        parse_search(data)
    }
}
