use anyhow::Result;
use data_resolver::{TickerPipeline, TickerReport};
use futures_util::future::join_all;
use hype_core::display::{format_market_cap, sentiment_percentage, sentiment_trend};

mod config;

use config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    // Reports go to stdout, so logs stay on stderr.
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    let config = AppConfig::from_env()?;
    tracing::info!(
        watchlist = ?config.watchlist,
        range = %config.time_range,
        "Starting HypeWatch"
    );
    for capability in hype_core::Capability::ALL {
        let order: Vec<&str> = config
            .providers
            .providers_for(capability)
            .iter()
            .map(|kind| kind.id())
            .collect();
        tracing::info!("  {capability}: {}", order.join(" -> "));
    }

    let pipeline = TickerPipeline::from_config(&config.providers);
    let reports = join_all(
        config
            .watchlist
            .iter()
            .map(|symbol| pipeline.report(symbol, config.time_range)),
    )
    .await;

    for report in &reports {
        log_summary(report);
        let line = if config.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        println!("{line}");
    }

    let simulated = reports.iter().filter(|r| r.has_synthetic_data()).count();
    if simulated > 0 {
        tracing::warn!(
            "{simulated} of {} reports include simulated data (provider limits or missing keys)",
            reports.len()
        );
    }

    Ok(())
}

fn log_summary(report: &TickerReport) {
    let normalized = report.hype.normalized_sentiment();
    let market_cap = report
        .details
        .profile
        .data
        .market_cap
        .map(format_market_cap)
        .unwrap_or_else(|| "n/a".to_string());

    tracing::info!(
        symbol = %report.symbol,
        price = report.details.quote.data.price,
        change_percent = report.details.quote.data.change_percent,
        market_cap = %market_cap,
        hype = report.hype.score,
        sentiment = %report.hype.sentiment_label(),
        bullish_pct = sentiment_percentage(normalized),
        trend = ?sentiment_trend(normalized),
        posts = report.hype.total_posts(),
        price_source = %report.prices.source,
        "report ready"
    );
}
