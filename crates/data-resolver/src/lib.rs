//! Provider fallback chains, deterministic synthetic data, memoization and
//! the per-ticker pipeline that ties the derived metrics together.

pub mod cache;
pub mod chain;
pub mod pipeline;
pub mod supersede;
pub mod synthetic;

pub use cache::{CacheKey, ResolutionCache};
pub use chain::{MergeFields, ProviderChain};
pub use pipeline::{PipelineChains, PipelineSettings, TickerPipeline, TickerReport};
pub use supersede::{RequestGate, Ticket};
