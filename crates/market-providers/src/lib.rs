//! HTTP adapters for the market and social data providers, plus the
//! configuration that decides which of them serve each capability.

pub mod alpha_vantage;
pub mod config;
mod fields;
pub mod finnhub;
pub mod http;
pub mod news_data;
pub mod reddit;
pub mod registry;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageClient;
pub use config::{ProviderKind, ProvidersConfig, UnknownProvider};
pub use finnhub::FinnhubClient;
pub use news_data::NewsDataClient;
pub use reddit::{RedditClient, RedditOAuthClient};
pub use registry::ProviderSet;
pub use yahoo::YahooClient;
