use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use hype_core::{
    CompanyProfile, DataSource, PriceBar, PriceHistoryProvider, PriceSeries, ProfileProvider,
    ProviderError, Quote, QuoteProvider, SymbolSearchProvider, TickerMatch,
};
use serde::Deserialize;
use serde_json::Value;

use crate::fields::{date, number, required_number, text, volume};
use crate::http::{decode, HttpClient};

const BASE_URL: &str = "https://www.alphavantage.co/query";
pub const SOURCE_ID: &str = "alpha_vantage";

/// Sentinel phrases Alpha Vantage puts in `Information` when throttling.
const LIMIT_PHRASES: [&str; 2] = ["API rate limit", "Thank you for using Alpha Vantage"];

/// Alpha Vantage REST client (daily series, quote, overview, symbol search).
#[derive(Clone)]
pub struct AlphaVantageClient {
    api_key: String,
    base_url: String,
    http: HttpClient,
}

impl AlphaVantageClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
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

    async fn query(&self, params: &[(&str, &str)]) -> Result<Value, ProviderError> {
        let mut query = params.to_vec();
        query.push(("apikey", self.api_key.as_str()));
        let data = self.http.get_json(&self.base_url, &query).await?;
        check_limited(&data)?;
        Ok(data)
    }
}

/// Rejects throttled, empty or error payloads before any parsing happens.
pub(crate) fn check_limited(data: &Value) -> Result<(), ProviderError> {
    let Some(object) = data.as_object() else {
        return Err(ProviderError::Malformed("expected a JSON object".to_string()));
    };
    if object.is_empty() {
        return Err(ProviderError::RateLimited("empty response".to_string()));
    }
    if let Some(note) = object.get("Note") {
        return Err(ProviderError::RateLimited(note.as_str().unwrap_or("Note").to_string()));
    }
    if let Some(info) = object.get("Information").and_then(Value::as_str) {
        if LIMIT_PHRASES.iter().any(|phrase| info.contains(phrase)) {
            return Err(ProviderError::RateLimited(info.to_string()));
        }
    }
    if let Some(message) = object.get("Error Message").and_then(Value::as_str) {
        return Err(ProviderError::Empty(message.to_string()));
    }
    if object
        .get("bestMatches")
        .and_then(Value::as_array)
        .is_some_and(|matches| matches.is_empty())
    {
        return Err(ProviderError::Empty("no symbol matches".to_string()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    series: BTreeMap<String, DailyBar>,
}

#[derive(Debug, Deserialize)]
struct DailyBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

pub(crate) fn parse_daily_series(symbol: &str, data: Value) -> Result<PriceSeries, ProviderError> {
    let response: DailyResponse = decode(data)?;
    let mut bars = Vec::with_capacity(response.series.len());
    for (day, raw) in response.series {
        bars.push(PriceBar {
            date: date(&day)?,
            open: required_number(&raw.open, "open")?,
            high: required_number(&raw.high, "high")?,
            low: required_number(&raw.low, "low")?,
            close: required_number(&raw.close, "close")?,
            volume: volume(required_number(&raw.volume, "volume")?)?,
        });
    }
    // Keys arrive newest first; PriceSeries::new sorts them.
    PriceSeries::new(symbol, bars)
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    quote: BTreeMap<String, String>,
}

pub(crate) fn parse_global_quote(symbol: &str, data: Value) -> Result<Quote, ProviderError> {
    let response: GlobalQuoteResponse = decode(data)?;
    if response.quote.is_empty() {
        return Err(ProviderError::Empty(format!("no quote for {symbol}")));
    }
    let field = |key: &str| -> Result<f64, ProviderError> {
        let raw = response
            .quote
            .get(key)
            .ok_or_else(|| ProviderError::Malformed(format!("missing '{key}'")))?;
        required_number(raw, key)
    };

    Ok(Quote {
        symbol: symbol.to_string(),
        price: field("05. price")?,
        change: field("09. change")?,
        change_percent: field("10. change percent")?,
        high: field("03. high")?,
        low: field("04. low")?,
        open: field("02. open")?,
        previous_close: field("08. previous close")?,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Overview {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "Exchange")]
    exchange: Option<String>,
    #[serde(rename = "Currency")]
    currency: Option<String>,
    #[serde(rename = "Country")]
    country: Option<String>,
    #[serde(rename = "Sector")]
    sector: Option<String>,
    #[serde(rename = "Industry")]
    industry: Option<String>,
    #[serde(rename = "Address")]
    address: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    market_cap: Option<String>,
    #[serde(rename = "PERatio")]
    pe_ratio: Option<String>,
    #[serde(rename = "DividendYield")]
    dividend_yield: Option<String>,
    #[serde(rename = "EPS")]
    eps: Option<String>,
    #[serde(rename = "AnalystRatingStrongBuy")]
    strong_buy: Option<String>,
    #[serde(rename = "AnalystRatingBuy")]
    buy: Option<String>,
    #[serde(rename = "AnalystRatingHold")]
    hold: Option<String>,
    #[serde(rename = "AnalystRatingSell")]
    sell: Option<String>,
    #[serde(rename = "AnalystRatingStrongSell")]
    strong_sell: Option<String>,
}

fn opt_number(raw: &Option<String>) -> Option<f64> {
    raw.as_deref().and_then(number)
}

/// Most common analyst rating; ties go to the more bullish rating.
fn consensus_rating(overview: &Overview) -> Option<String> {
    let counts = [
        ("Strong Buy", &overview.strong_buy),
        ("Buy", &overview.buy),
        ("Hold", &overview.hold),
        ("Sell", &overview.sell),
        ("Strong Sell", &overview.strong_sell),
    ];
    let mut best: Option<(&str, f64)> = None;
    for (label, raw) in counts {
        let count = opt_number(raw).unwrap_or(0.0);
        if count > 0.0 && best.map_or(true, |(_, top)| count > top) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label.to_string())
}

pub(crate) fn parse_overview(symbol: &str, data: Value) -> Result<CompanyProfile, ProviderError> {
    let overview: Overview = decode(data)?;
    let analyst_rating = consensus_rating(&overview);

    Ok(CompanyProfile {
        symbol: symbol.to_string(),
        market_cap: opt_number(&overview.market_cap),
        pe_ratio: opt_number(&overview.pe_ratio),
        // Reported as a fraction
        dividend_yield: opt_number(&overview.dividend_yield).map(|y| y * 100.0),
        eps: opt_number(&overview.eps),
        analyst_rating,
        name: text(overview.name),
        sector: text(overview.sector),
        industry: text(overview.industry),
        exchange: text(overview.exchange),
        country: text(overview.country),
        currency: text(overview.currency),
        headquarters: text(overview.address),
        description: text(overview.description),
        ceo: None,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    best_matches: Vec<SearchMatch>,
}

#[derive(Debug, Deserialize)]
struct SearchMatch {
    #[serde(rename = "1. symbol")]
    symbol: String,
    #[serde(rename = "2. name")]
    name: String,
    #[serde(rename = "3. type")]
    kind: Option<String>,
    #[serde(rename = "4. region")]
    region: Option<String>,
    #[serde(rename = "8. currency")]
    currency: Option<String>,
}

pub(crate) fn parse_search(data: Value) -> Result<Vec<TickerMatch>, ProviderError> {
    let response: SearchResponse = decode(data)?;
    Ok(response
        .best_matches
        .into_iter()
        .map(|m| TickerMatch {
            symbol: m.symbol,
            name: m.name,
            kind: text(m.kind),
            region: text(m.region),
            currency: text(m.currency),
        })
        .collect())
}

impl DataSource for AlphaVantageClient {
    fn source(&self) -> &str {
        SOURCE_ID
    }
}

#[async_trait]
impl PriceHistoryProvider for AlphaVantageClient {
    #[tracing::instrument(skip(self), fields(provider = SOURCE_ID))]
    async fn daily_series(&self, symbol: &str) -> Result<PriceSeries, ProviderError> {
        let data = self
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", "compact"),
            ])
            .await?;
        parse_daily_series(symbol, data)
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageClient {
    #[tracing::instrument(skip(self), fields(provider = SOURCE_ID))]
    async fn quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let data = self.query(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol)]).await?;
        parse_global_quote(symbol, data)
    }
}

#[async_trait]
impl ProfileProvider for AlphaVantageClient {
    #[tracing::instrument(skip(self), fields(provider = SOURCE_ID))]
    async fn profile(&self, symbol: &str) -> Result<CompanyProfile, ProviderError> {
        let data = self.query(&[("function", "OVERVIEW"), ("symbol", symbol)]).await?;
        parse_overview(symbol, data)
    }
}

#[async_trait]
impl SymbolSearchProvider for AlphaVantageClient {
    #[tracing::instrument(skip(self), fields(provider = SOURCE_ID))]
    async fn search(&self, query: &str) -> Result<Vec<TickerMatch>, ProviderError> {
        if query.trim().chars().count() < 2 {
            return Err(ProviderError::Empty("query shorter than 2 characters".to_string()));
        }
        let data = self
            .query(&[("function", "SYMBOL_SEARCH"), ("keywords", query.trim())])
            .await?;
        parse_search(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rate_limit_sentinels() {
        let note = json!({"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute"});
        assert!(matches!(check_limited(&note), Err(ProviderError::RateLimited(_))));

        let info = json!({"Information": "We have detected your API key as demo. API rate limit is 25 requests per day."});
        assert!(matches!(check_limited(&info), Err(ProviderError::RateLimited(_))));

        let thanks = json!({"Information": "Thank you for using Alpha Vantage! Please upgrade."});
        assert!(matches!(check_limited(&thanks), Err(ProviderError::RateLimited(_))));

        assert!(matches!(check_limited(&json!({})), Err(ProviderError::RateLimited(_))));
        assert!(matches!(
            check_limited(&json!({"bestMatches": []})),
            Err(ProviderError::Empty(_))
        ));
        assert!(matches!(
            check_limited(&json!({"Error Message": "Invalid API call."})),
            Err(ProviderError::Empty(_))
        ));
        assert!(matches!(check_limited(&json!([])), Err(ProviderError::Malformed(_))));
    }

    #[test]
    fn test_other_information_passes_check() {
        let data = json!({"Information": "Premium endpoint", "Symbol": "IBM"});
        assert!(check_limited(&data).is_ok());
    }

    #[test]
    fn test_parse_daily_series_is_chronological() {
        let data = json!({
            "Meta Data": {"2. Symbol": "IBM"},
            "Time Series (Daily)": {
                "2024-03-04": {"1. open": "187.0", "2. high": "188.5", "3. low": "185.1", "4. close": "186.2", "5. volume": "4200000"},
                "2024-03-01": {"1. open": "185.0", "2. high": "187.9", "3. low": "184.7", "4. close": "187.5", "5. volume": "3900000"}
            }
        });
        let series = parse_daily_series("IBM", data).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].date.to_string(), "2024-03-01");
        assert_eq!(series.bars()[1].close, 186.2);
        assert_eq!(series.bars()[1].volume, 4_200_000);
    }

    #[test]
    fn test_parse_daily_series_rejects_bad_ohlc() {
        let data = json!({
            "Time Series (Daily)": {
                "2024-03-01": {"1. open": "185.0", "2. high": "180.0", "3. low": "184.7", "4. close": "187.5", "5. volume": "1"}
            }
        });
        assert!(matches!(
            parse_daily_series("IBM", data),
            Err(ProviderError::InvalidData(_))
        ));
    }

    #[test]
    fn test_parse_daily_series_rejects_negative_volume() {
        let data = json!({
            "Time Series (Daily)": {
                "2024-03-01": {"1. open": "185.0", "2. high": "187.9", "3. low": "184.7", "4. close": "187.5", "5. volume": "-100"}
            }
        });
        assert!(matches!(
            parse_daily_series("IBM", data),
            Err(ProviderError::InvalidData(_))
        ));
    }

    #[test]
    fn test_parse_daily_series_missing_key() {
        assert!(matches!(
            parse_daily_series("IBM", json!({"Meta Data": {}})),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_global_quote() {
        let data = json!({"Global Quote": {
            "01. symbol": "IBM", "02. open": "187.00", "03. high": "188.50", "04. low": "185.10",
            "05. price": "186.20", "06. volume": "4200000", "07. latest trading day": "2024-03-04",
            "08. previous close": "187.50", "09. change": "-1.30", "10. change percent": "-0.6933%"
        }});
        let quote = parse_global_quote("IBM", data).unwrap();
        assert_eq!(quote.price, 186.2);
        assert_eq!(quote.change, -1.3);
        assert_eq!(quote.change_percent, -0.6933);
        assert_eq!(quote.previous_close, 187.5);

        assert!(matches!(
            parse_global_quote("NOPE", json!({"Global Quote": {}})),
            Err(ProviderError::Empty(_))
        ));
    }

    #[test]
    fn test_parse_overview() {
        let data = json!({
            "Symbol": "IBM", "Name": "International Business Machines", "Exchange": "NYSE",
            "Currency": "USD", "Country": "USA", "Sector": "TECHNOLOGY",
            "Industry": "COMPUTER & OFFICE EQUIPMENT", "Address": "1 NEW ORCHARD ROAD, ARMONK, NY, US",
            "MarketCapitalization": "170000000000", "PERatio": "22.5", "DividendYield": "0.0355",
            "EPS": "8.14", "AnalystRatingStrongBuy": "3", "AnalystRatingBuy": "7",
            "AnalystRatingHold": "7", "AnalystRatingSell": "2", "AnalystRatingStrongSell": "0",
            "Description": "None"
        });
        let profile = parse_overview("IBM", data).unwrap();
        assert_eq!(profile.name.as_deref(), Some("International Business Machines"));
        assert_eq!(profile.market_cap, Some(170_000_000_000.0));
        assert!((profile.dividend_yield.unwrap() - 3.55).abs() < 1e-9);
        // Buy and Hold tie; the bullish one wins
        assert_eq!(profile.analyst_rating.as_deref(), Some("Buy"));
        assert_eq!(profile.description, None);
        assert_eq!(profile.ceo, None);
    }

    #[test]
    fn test_parse_search() {
        let data = json!({"bestMatches": [
            {"1. symbol": "TSCO.LON", "2. name": "Tesco PLC", "3. type": "Equity",
             "4. region": "United Kingdom", "5. marketOpen": "08:00", "6. marketClose": "16:30",
             "7. timezone": "UTC+01", "8. currency": "GBX", "9. matchScore": "0.7273"}
        ]});
        let matches = parse_search(data).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].symbol, "TSCO.LON");
        assert_eq!(matches[0].currency.as_deref(), Some("GBX"));
    }

    #[tokio::test]
    async fn test_short_search_query_skips_request() {
        let client = AlphaVantageClient::new("demo".into(), Duration::from_secs(1))
            .with_base_url("http://127.0.0.1:9");
        let result = client.search("a").await;
        assert!(matches!(result, Err(ProviderError::Empty(_))));
    }
}
