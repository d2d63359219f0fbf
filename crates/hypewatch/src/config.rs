use anyhow::{Context, Result};
use hype_core::TimeRange;
use market_providers::ProvidersConfig;
use serde::Serialize;
use std::env;

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub watchlist: Vec<String>,
    pub time_range: TimeRange,
    /// Pretty-print each report instead of one JSON object per line.
    pub pretty: bool,
    #[serde(skip)]
    pub providers: ProvidersConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok(), env::args().skip(1).collect())
    }

    /// Symbols given as arguments replace `WATCHLIST`.
    pub fn from_lookup<F>(lookup: F, args: Vec<String>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let watchlist = if args.is_empty() {
            parse_watchlist(&lookup("WATCHLIST").unwrap_or_else(|| "AAPL,MSFT,TSLA".to_string()))
        } else {
            parse_watchlist(&args.join(","))
        };
        if watchlist.is_empty() {
            anyhow::bail!("watchlist is empty");
        }

        let time_range = lookup("TIME_RANGE")
            .unwrap_or_else(|| "1M".to_string())
            .parse::<TimeRange>()
            .context("TIME_RANGE must be one of 1D, 1W, 1M, 3M, 1Y")?;

        let pretty = lookup("OUTPUT_PRETTY")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            watchlist,
            time_range,
            pretty,
            providers: ProvidersConfig::from_lookup(&lookup)?,
        })
    }
}

fn parse_watchlist(raw: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in raw
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
    {
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(no_env, vec![]).unwrap();
        assert_eq!(config.watchlist, ["AAPL", "MSFT", "TSLA"]);
        assert_eq!(config.time_range, TimeRange::OneMonth);
        assert!(!config.pretty);
    }

    #[test]
    fn test_args_override_watchlist() {
        let config =
            AppConfig::from_lookup(no_env, vec!["nvda".into(), "amd, nvda".into()]).unwrap();
        assert_eq!(config.watchlist, ["NVDA", "AMD"]);
    }

    #[test]
    fn test_env_values() {
        let lookup = |name: &str| match name {
            "WATCHLIST" => Some(" gme , amc ,".to_string()),
            "TIME_RANGE" => Some("3m".to_string()),
            "OUTPUT_PRETTY" => Some("true".to_string()),
            _ => None,
        };
        let config = AppConfig::from_lookup(lookup, vec![]).unwrap();
        assert_eq!(config.watchlist, ["GME", "AMC"]);
        assert_eq!(config.time_range, TimeRange::ThreeMonths);
        assert!(config.pretty);
    }

    #[test]
    fn test_rejects_bad_range_and_empty_watchlist() {
        let bad_range = |name: &str| (name == "TIME_RANGE").then(|| "2W".to_string());
        assert!(AppConfig::from_lookup(bad_range, vec![]).is_err());

        let empty = |name: &str| (name == "WATCHLIST").then(|| " , ".to_string());
        assert!(AppConfig::from_lookup(empty, vec![]).is_err());
    }
}
