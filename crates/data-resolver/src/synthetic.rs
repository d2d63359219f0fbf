//! Deterministic stand-in data for when every provider is unusable.
//!
//! Every generator seeds a `StdRng` from the FNV-1a hash of the upper-cased
//! key, so the same ticker always produces the same numbers. Only the dates
//! move with the reference time.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use hype_core::stats::{round2, round_to, stable_hash};
use hype_core::{
    CompanyProfile, Engagement, NewsArticle, Post, PriceBar, PriceSeries, Quote, TickerMatch,
};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Trading days in a synthetic series.
pub const SERIES_LENGTH: usize = 90;
const POST_COUNT: usize = 10;
const MAX_SEARCH_RESULTS: usize = 10;

/// Built-in ticker directory used for names and offline search.
pub const TICKER_DIRECTORY: [(&str, &str); 30] = [
    ("AAPL", "Apple Inc"),
    ("MSFT", "Microsoft Corporation"),
    ("AMZN", "Amazon.com Inc"),
    ("GOOGL", "Alphabet Inc"),
    ("META", "Meta Platforms Inc"),
    ("TSLA", "Tesla Inc"),
    ("NVDA", "NVIDIA Corporation"),
    ("JPM", "JPMorgan Chase & Co"),
    ("V", "Visa Inc"),
    ("JNJ", "Johnson & Johnson"),
    ("WMT", "Walmart Inc"),
    ("PG", "Procter & Gamble Co"),
    ("MA", "Mastercard Inc"),
    ("DIS", "Walt Disney Co"),
    ("NFLX", "Netflix Inc"),
    ("INTC", "Intel Corporation"),
    ("AMD", "Advanced Micro Devices Inc"),
    ("CSCO", "Cisco Systems Inc"),
    ("ADBE", "Adobe Inc"),
    ("PYPL", "PayPal Holdings Inc"),
    ("GOOG", "Alphabet Inc Class C"),
    ("BRK.A", "Berkshire Hathaway Inc"),
    ("BRK.B", "Berkshire Hathaway Inc Class B"),
    ("FB", "Meta Platforms Inc"),
    ("BABA", "Alibaba Group Holding Ltd"),
    ("TSM", "Taiwan Semiconductor Manufacturing Co Ltd"),
    ("KO", "Coca-Cola Co"),
    ("PEP", "PepsiCo Inc"),
    ("NKE", "Nike Inc"),
    ("MCD", "McDonald's Corp"),
];

const FALLBACK_SECTORS: [&str; 8] = [
    "Technology",
    "Financial Services",
    "Healthcare",
    "Consumer Cyclical",
    "Communication Services",
    "Consumer Defensive",
    "Industrials",
    "Energy",
];

const ANALYST_RATINGS: [(&str, u32); 5] = [
    ("Strong Buy", 30),
    ("Buy", 40),
    ("Hold", 20),
    ("Sell", 7),
    ("Strong Sell", 3),
];

fn normalize(key: &str) -> String {
    key.trim().to_uppercase()
}

fn rng_for(symbol: &str) -> StdRng {
    StdRng::seed_from_u64(stable_hash(symbol))
}

fn company_name(symbol: &str) -> String {
    TICKER_DIRECTORY
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("{symbol} Inc."))
}

/// Starting price for a ticker; unknown tickers land in `[100, 300)`.
pub fn base_price(symbol: &str) -> f64 {
    let symbol = normalize(symbol);
    match symbol.as_str() {
        "AAPL" => 170.0,
        "MSFT" => 320.0,
        "AMZN" => 180.0,
        "GOOGL" => 140.0,
        "META" => 330.0,
        "TSLA" => 215.0,
        "NVDA" => 420.0,
        "JPM" => 160.0,
        "V" => 240.0,
        "JNJ" => 150.0,
        "WMT" => 60.0,
        "PG" => 155.0,
        "MA" => 430.0,
        "DIS" => 105.0,
        "NFLX" => 520.0,
        "INTC" => 35.0,
        "AMD" => 95.0,
        "CSCO" => 48.0,
        "ADBE" => 435.0,
        "PYPL" => 75.0,
        other => 100.0 + (stable_hash(other) % 200) as f64,
    }
}

fn sector_and_industry(symbol: &str, rng: &mut StdRng) -> (String, String) {
    let known = match symbol {
        "AAPL" => Some(("Technology", "Consumer Electronics")),
        "MSFT" => Some(("Technology", "Software—Infrastructure")),
        "AMZN" => Some(("Consumer Cyclical", "Internet Retail")),
        "GOOGL" => Some(("Communication Services", "Internet Content & Information")),
        "META" => Some(("Communication Services", "Internet Content & Information")),
        "TSLA" => Some(("Consumer Cyclical", "Auto Manufacturers")),
        "NVDA" => Some(("Technology", "Semiconductors")),
        "JPM" => Some(("Financial Services", "Banks—Diversified")),
        "V" | "MA" => Some(("Financial Services", "Credit Services")),
        "JNJ" => Some(("Healthcare", "Drug Manufacturers—General")),
        "WMT" => Some(("Consumer Defensive", "Discount Stores")),
        "PG" => Some(("Consumer Defensive", "Household & Personal Products")),
        "DIS" | "NFLX" => Some(("Communication Services", "Entertainment")),
        _ => None,
    };
    match known {
        Some((sector, industry)) => (sector.to_string(), industry.to_string()),
        None => (
            FALLBACK_SECTORS[rng.gen_range(0..FALLBACK_SECTORS.len())].to_string(),
            "Software—Application".to_string(),
        ),
    }
}

fn market_cap(symbol: &str, rng: &mut StdRng) -> f64 {
    let billions = match symbol {
        "AAPL" => 3_000.0,
        "MSFT" => 3_100.0,
        "AMZN" => 1_800.0,
        "GOOGL" => 1_950.0,
        "META" => 1_200.0,
        "TSLA" => 850.0,
        "NVDA" => 2_200.0,
        "JPM" => 500.0,
        "V" => 550.0,
        "JNJ" => 400.0,
        "WMT" => 450.0,
        "PG" => 380.0,
        "MA" => 430.0,
        "DIS" => 200.0,
        "NFLX" => 250.0,
        _ => return (rng.gen_range(50e9..250e9_f64)).round(),
    };
    billions * 1e9
}

/// The `count` most recent weekdays up to and including `end`, oldest first.
fn trailing_weekdays(end: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(count);
    let mut day = end;
    while days.len() < count {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(day);
        }
        day -= Duration::days(1);
    }
    days.reverse();
    days
}

/// 90 weekday bars ending at `end`. Daily moves stay within 1% of the base
/// price and a close never falls below 70% of the previous one.
pub fn price_series(symbol: &str, end: NaiveDate) -> PriceSeries {
    let symbol = normalize(symbol);
    let mut rng = rng_for(&symbol);
    let base = base_price(&symbol);
    let band = base * 0.02;

    let mut previous_close = round_to(base, 4);
    let bars: Vec<PriceBar> = trailing_weekdays(end, SERIES_LENGTH)
        .into_iter()
        .map(|date| {
            let change = (rng.gen::<f64>() - 0.5) * band;
            let close = round_to((previous_close + change).max(previous_close * 0.7), 4);
            let open = round_to(
                (close - rng.gen::<f64>() * band * 0.5).max(previous_close * 0.7),
                4,
            );
            let high = round_to(open.max(close) + rng.gen::<f64>() * band * 0.3, 4);
            let low = round_to((open.min(close) - rng.gen::<f64>() * band * 0.3).max(0.0), 4);
            let volume = rng.gen_range(1_000_000..11_000_000);
            previous_close = close;
            PriceBar {
                date,
                open,
                high,
                low,
                close,
                volume,
            }
        })
        .collect();

    PriceSeries::new(&symbol, bars).unwrap_or_else(|e| {
        tracing::error!(%symbol, error = %e, "synthetic series failed validation");
        PriceSeries::empty(&symbol)
    })
}

/// Quote derived from the last two closes of the synthetic series.
pub fn quote(symbol: &str, end: NaiveDate) -> Quote {
    let series = price_series(symbol, end);
    let bars = series.bars();
    let (previous_close, last) = match bars {
        [.., prev, last] => (prev.close, last),
        [last] => (last.close, last),
        [] => {
            let price = round2(base_price(symbol));
            return Quote {
                symbol: normalize(symbol),
                price,
                change: 0.0,
                change_percent: 0.0,
                high: price,
                low: price,
                open: price,
                previous_close: price,
            };
        }
    };
    let change = last.close - previous_close;
    Quote {
        symbol: series.symbol().to_string(),
        price: round2(last.close),
        change: round2(change),
        change_percent: round2(change / previous_close * 100.0),
        high: round2(last.high),
        low: round2(last.low),
        open: round2(last.open),
        previous_close: round2(previous_close),
    }
}

pub fn profile(symbol: &str) -> CompanyProfile {
    let symbol = normalize(symbol);
    let mut rng = rng_for(&symbol);
    let name = company_name(&symbol);
    let (sector, industry) = sector_and_industry(&symbol, &mut rng);
    let market_cap = market_cap(&symbol, &mut rng);

    let ratings = WeightedIndex::new(ANALYST_RATINGS.iter().map(|(_, w)| *w));
    let analyst_rating = ratings
        .ok()
        .map(|dist| ANALYST_RATINGS[dist.sample(&mut rng)].0.to_string());

    CompanyProfile {
        description: Some(format!(
            "{name} is a leading company in its industry, providing innovative solutions to customers worldwide."
        )),
        name: Some(name),
        sector: Some(sector),
        industry: Some(industry),
        exchange: Some("NASDAQ".to_string()),
        country: Some("USA".to_string()),
        currency: Some("USD".to_string()),
        market_cap: Some(market_cap),
        ceo: Some("John Smith".to_string()),
        headquarters: Some("San Francisco, CA".to_string()),
        pe_ratio: Some(round2(rng.gen_range(15.0..45.0))),
        dividend_yield: Some(round2(rng.gen_range(0.0..3.0))),
        eps: Some(round2(rng.gen_range(2.0..12.0))),
        analyst_rating,
        symbol,
    }
}

/// Ten posts rotating bullish, bearish and neutral wording.
pub fn posts(symbol: &str, now: DateTime<Utc>) -> Vec<Post> {
    let symbol = normalize(symbol);
    let mut rng = rng_for(&symbol);
    let communities = ["wallstreetbets", "stocks", "investing", "StockMarket", symbol.as_str()];

    (0..POST_COUNT)
        .map(|i| {
            let title = if i % 2 == 0 {
                format!("DD: {symbol} looks undervalued")
            } else {
                format!("Discussion: {symbol} earnings expectations")
            };
            let body = match i % 3 {
                0 => "Strong growth and a great opportunity, bullish on the upside",
                1 => "Weak guidance, bearish and expecting a drop",
                _ => "Holding my position and waiting for the next report",
            };
            let community = communities[i % communities.len()];
            let score: i64 = rng.gen_range(0..2_000);
            let comment_count = rng.gen_range(0..200);
            let age_minutes = rng.gen_range(60..=24 * 60);
            Post {
                id: format!("synthetic-{}-{i}", symbol.to_lowercase()),
                author: format!("redditor{}", i + 1),
                author_followers: (score * 10).max(100) as u64,
                text: format!("{title} {body}"),
                created_at: now - Duration::minutes(age_minutes),
                engagement: Engagement {
                    score,
                    comment_count,
                },
                url: Some(format!(
                    "https://www.reddit.com/r/{community}/comments/synthetic/{}",
                    symbol.to_lowercase()
                )),
                community: Some(community.to_string()),
            }
        })
        .collect()
}

pub fn news(symbol: &str, now: DateTime<Utc>) -> Vec<NewsArticle> {
    let symbol = normalize(symbol);
    let name = company_name(&symbol);
    let headlines = [
        format!("{name} shares active as traders weigh outlook"),
        format!("Analysts revisit price targets for {symbol}"),
        format!("{name} to report quarterly results"),
        format!("What options activity says about {symbol}"),
        format!("{symbol} among most discussed tickers on social media"),
    ];

    headlines
        .into_iter()
        .enumerate()
        .map(|(i, title)| NewsArticle {
            id: format!("synthetic-{}-{i}", symbol.to_lowercase()),
            description: Some(format!("Market coverage of {name} ({symbol}).")),
            title,
            source: hype_core::SYNTHETIC_SOURCE.to_string(),
            url: format!("https://example.com/news/{}/{i}", symbol.to_lowercase()),
            image_url: None,
            published_at: Some(now - Duration::hours(3 * i as i64 + 1)),
        })
        .collect()
}

/// Case-insensitive match on symbol or name against the built-in directory.
pub fn search(query: &str) -> Vec<TickerMatch> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    TICKER_DIRECTORY
        .iter()
        .filter(|(symbol, name)| {
            symbol.to_lowercase().contains(&needle) || name.to_lowercase().contains(&needle)
        })
        .take(MAX_SEARCH_RESULTS)
        .map(|(symbol, name)| TickerMatch {
            symbol: symbol.to_string(),
            name: name.to_string(),
            kind: Some("Equity".to_string()),
            region: Some("United States".to_string()),
            currency: Some("USD".to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hype_core::Usable;

    fn end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_series_is_deterministic() {
        let a = price_series("aapl", end());
        let b = price_series("AAPL", end());
        assert_eq!(a.bars(), b.bars());
        assert_eq!(a.symbol(), "AAPL");
    }

    #[test]
    fn test_series_shape() {
        let series = price_series("TSLA", end());
        assert_eq!(series.len(), SERIES_LENGTH);
        assert_eq!(series.last().unwrap().date, end());
        for bar in series.bars() {
            assert!(bar.validate().is_ok(), "{bar:?}");
            assert!(!matches!(bar.date.weekday(), Weekday::Sat | Weekday::Sun));
            assert!((1_000_000..11_000_000).contains(&bar.volume));
        }
    }

    #[test]
    fn test_series_moves_are_bounded() {
        let series = price_series("NVDA", end());
        let base = base_price("NVDA");
        for pair in series.bars().windows(2) {
            let step = (pair[1].close - pair[0].close).abs();
            assert!(step <= base * 0.01 + 1e-3, "step {step}");
        }
    }

    #[test]
    fn test_unknown_ticker_base_price() {
        let price = base_price("ZZZZ");
        assert!((100.0..300.0).contains(&price));
        assert_eq!(price, base_price("zzzz"));
        assert!(price_series("ZZZZ", end()).is_usable());
    }

    #[test]
    fn test_quote_matches_series() {
        let series = price_series("MSFT", end());
        let quote = quote("MSFT", end());
        let last = series.last().unwrap();
        assert_eq!(quote.price, round2(last.close));
        assert!(quote.is_usable());
    }

    #[test]
    fn test_profile_is_complete() {
        let profile = profile("AAPL");
        assert!(profile.is_complete());
        assert_eq!(profile.name.as_deref(), Some("Apple Inc"));
        assert_eq!(profile.market_cap, Some(3_000e9));
        assert_eq!(profile, super::profile("aapl"));

        let unknown = super::profile("qqqq");
        assert_eq!(unknown.name.as_deref(), Some("QQQQ Inc."));
        assert_eq!(unknown.industry.as_deref(), Some("Software—Application"));
        let cap = unknown.market_cap.unwrap();
        assert!((50e9..250e9).contains(&cap));
    }

    #[test]
    fn test_posts() {
        let now = Utc::now();
        let posts = posts("gme", now);
        assert_eq!(posts.len(), POST_COUNT);
        assert_eq!(posts[4].community.as_deref(), Some("GME"));
        assert!(posts.iter().all(|p| p.created_at < now));
        assert!(posts.iter().all(|p| p.author_followers >= 100));
        assert_eq!(
            posts.iter().map(|p| p.engagement.score).collect::<Vec<_>>(),
            super::posts("GME", now).iter().map(|p| p.engagement.score).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_news() {
        let articles = news("AAPL", Utc::now());
        assert_eq!(articles.len(), 5);
        assert!(articles[0].title.contains("Apple Inc"));
    }

    #[test]
    fn test_search_directory() {
        let hits = search("alphabet");
        let symbols: Vec<_> = hits.iter().map(|m| m.symbol.as_str()).collect();
        assert_eq!(symbols, ["GOOGL", "GOOG"]);
        assert!(search("   ").is_empty());
        assert!(search("a").len() <= MAX_SEARCH_RESULTS);
    }
}
