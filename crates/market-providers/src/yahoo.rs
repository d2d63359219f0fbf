use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use hype_core::{
    DataSource, PriceBar, PriceHistoryProvider, PriceSeries, ProviderError, Quote, QuoteProvider,
    SymbolSearchProvider, TickerMatch,
};
use serde::Deserialize;
use serde_json::Value;

use crate::fields::{text, unix_date};
use crate::http::{decode, HttpClient, BROWSER_USER_AGENT};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SEARCH_URL: &str = "https://query1.finance.yahoo.com/v1/finance/search";
pub const SOURCE_ID: &str = "yahoo";

/// Yahoo Finance chart and search endpoints. No credential needed.
#[derive(Clone)]
pub struct YahooClient {
    chart_url: String,
    search_url: String,
    http: HttpClient,
}

impl YahooClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            chart_url: CHART_URL.to_string(),
            search_url: SEARCH_URL.to_string(),
            http: HttpClient::new(timeout, BROWSER_USER_AGENT),
        }
    }

    async fn chart(&self, symbol: &str, range: &str) -> Result<Value, ProviderError> {
        let url = format!("{}/{}", self.chart_url, symbol);
        self.http
            .get_json(&url, &[("interval", "1d"), ("range", range)])
            .await
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Meta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Meta {
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    previous_close: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<OhlcArrays>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OhlcArrays {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

fn chart_result(symbol: &str, data: Value) -> Result<ChartResult, ProviderError> {
    let response: ChartResponse = decode(data)?;
    if let Some(error) = response.chart.error.filter(|e| !e.is_null()) {
        return Err(ProviderError::Empty(format!("chart error for {symbol}: {error}")));
    }
    response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ProviderError::Empty(format!("no chart result for {symbol}")))
}

/// Bars with a missing or inconsistent field are skipped; Yahoo pads
/// halted sessions and the live session with nulls.
fn bars_from_chart(result: &ChartResult) -> Vec<PriceBar> {
    let timestamps = result.timestamp.as_deref().unwrap_or_default();
    let Some(ohlc) = result.indicators.quote.first() else {
        return Vec::new();
    };

    // Keyed by date so a duplicated live bar replaces the earlier one.
    let mut by_date = BTreeMap::new();
    for (i, ts) in timestamps.iter().enumerate() {
        let at = |values: &[Option<f64>]| values.get(i).copied().flatten();
        let (Some(date), Some(open), Some(high), Some(low), Some(close)) = (
            unix_date(*ts),
            at(ohlc.open.as_slice()),
            at(ohlc.high.as_slice()),
            at(ohlc.low.as_slice()),
            at(ohlc.close.as_slice()),
        ) else {
            continue;
        };
        let bar = PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume: ohlc.volume.get(i).copied().flatten().unwrap_or(0),
        };
        match bar.validate() {
            Ok(()) => {
                by_date.insert(date, bar);
            }
            Err(e) => tracing::debug!(%date, error = %e, "skipping malformed Yahoo bar"),
        }
    }
    by_date.into_values().collect()
}

pub(crate) fn parse_chart_series(symbol: &str, data: Value) -> Result<PriceSeries, ProviderError> {
    let result = chart_result(symbol, data)?;
    PriceSeries::new(symbol, bars_from_chart(&result))
}

pub(crate) fn parse_chart_quote(symbol: &str, data: Value) -> Result<Quote, ProviderError> {
    let result = chart_result(symbol, data)?;
    let bars = bars_from_chart(&result);
    let last = bars.last();
    let meta = &result.meta;

    let price = meta
        .regular_market_price
        .or(last.map(|b| b.close))
        .ok_or_else(|| ProviderError::Empty(format!("no price for {symbol}")))?;
    let previous_close = meta
        .chart_previous_close
        .or(meta.previous_close)
        .or_else(|| bars.iter().rev().nth(1).map(|b| b.close))
        .unwrap_or(price);
    let change = price - previous_close;
    let change_percent = if previous_close != 0.0 {
        change / previous_close * 100.0
    } else {
        0.0
    };

    Ok(Quote {
        symbol: symbol.to_string(),
        price,
        change,
        change_percent,
        high: meta.regular_market_day_high.or(last.map(|b| b.high)).unwrap_or(price),
        low: meta.regular_market_day_low.or(last.map(|b| b.low)).unwrap_or(price),
        open: last.map(|b| b.open).unwrap_or(price),
        previous_close,
    })
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Debug, Deserialize)]
struct SearchQuote {
    symbol: String,
    shortname: Option<String>,
    longname: Option<String>,
    #[serde(rename = "quoteType")]
    quote_type: Option<String>,
    exchange: Option<String>,
}

pub(crate) fn parse_search(data: Value) -> Result<Vec<TickerMatch>, ProviderError> {
    let response: SearchResponse = decode(data)?;
    Ok(response
        .quotes
        .into_iter()
        .map(|q| TickerMatch {
            name: text(q.shortname)
                .or(text(q.longname))
                .unwrap_or_else(|| format!("{} Stock", q.symbol)),
            symbol: q.symbol,
            kind: text(q.quote_type),
            region: text(q.exchange),
            currency: None,
        })
        .collect())
}

impl DataSource for YahooClient {
    fn source(&self) -> &str {
        SOURCE_ID
    }
}

#[async_trait]
impl PriceHistoryProvider for YahooClient {
    #[tracing::instrument(skip(self), fields(provider = SOURCE_ID))]
    async fn daily_series(&self, symbol: &str) -> Result<PriceSeries, ProviderError> {
        let data = self.chart(symbol, "6mo").await?;
        parse_chart_series(symbol, data)
    }
}

#[async_trait]
impl QuoteProvider for YahooClient {
    #[tracing::instrument(skip(self), fields(provider = SOURCE_ID))]
    async fn quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let data = self.chart(symbol, "5d").await?;
        parse_chart_quote(symbol, data)
    }
}

#[async_trait]
impl SymbolSearchProvider for YahooClient {
    #[tracing::instrument(skip(self), fields(provider = SOURCE_ID))]
    async fn search(&self, query: &str) -> Result<Vec<TickerMatch>, ProviderError> {
        let data = self
            .http
            .get_json(
                &self.search_url,
                &[("q", query.trim()), ("quotesCount", "10"), ("newsCount", "0")],
            )
            .await?;
        parse_search(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn chart_fixture() -> Value {
        json!({"chart": {"result": [{
            "meta": {"symbol": "AAPL", "regularMarketPrice": 182.5, "chartPreviousClose": 180.0,
                     "regularMarketDayHigh": 183.0, "regularMarketDayLow": 181.0},
            "timestamp": [1_709_251_200, 1_709_510_400, 1_709_596_800, 1_709_683_200],
            "indicators": {"quote": [{
                "open":   [179.0, 180.5, null, 181.0],
                "high":   [181.0, 182.0, 183.0, 183.0],
                "low":    [178.5, 179.9, 180.0, 180.8],
                "close":  [180.0, 181.2, 182.0, 182.5],
                "volume": [5_000_000, null, 4_000_000, 3_000_000]
            }]}
        }], "error": null}})
    }

    #[test]
    fn test_parse_chart_skips_incomplete_bars() {
        let series = parse_chart_series("AAPL", chart_fixture()).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.bars()[1].volume, 0);
        assert_eq!(series.last().unwrap().close, 182.5);
    }

    #[test]
    fn test_parse_chart_error() {
        let data = json!({"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found"}}});
        assert!(matches!(parse_chart_series("NOPE", data), Err(ProviderError::Empty(_))));
    }

    #[test]
    fn test_duplicate_dates_keep_latest() {
        let data = json!({"chart": {"result": [{
            "meta": {},
            "timestamp": [1_709_251_200, 1_709_280_000],
            "indicators": {"quote": [{
                "open": [10.0, 10.0], "high": [11.0, 12.0], "low": [9.0, 9.0],
                "close": [10.5, 11.5], "volume": [1, 2]
            }]}
        }], "error": null}});
        let series = parse_chart_series("X", data).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.bars()[0].close, 11.5);
    }

    #[test]
    fn test_parse_chart_quote_uses_meta() {
        let quote = parse_chart_quote("AAPL", chart_fixture()).unwrap();
        assert_eq!(quote.price, 182.5);
        assert_eq!(quote.previous_close, 180.0);
        assert_eq!(quote.change, 2.5);
        assert_relative_eq!(quote.change_percent, 2.5 / 180.0 * 100.0, epsilon = 1e-12);
        assert_eq!(quote.high, 183.0);
        assert_eq!(quote.open, 181.0);
    }

    #[test]
    fn test_parse_search_falls_back_on_names() {
        let data = json!({"quotes": [
            {"symbol": "AAPL", "shortname": "Apple Inc.", "quoteType": "EQUITY", "exchange": "NMS"},
            {"symbol": "XYZ", "quoteType": "EQUITY"}
        ]});
        let matches = parse_search(data).unwrap();
        assert_eq!(matches[0].name, "Apple Inc.");
        assert_eq!(matches[1].name, "XYZ Stock");
    }
}
