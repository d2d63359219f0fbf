use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hype_core::{Capability, CompanyProfile, DataSource, FetchResult, ProviderError, Usable};

/// Default per-attempt timeout.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(8);

/// Ordered providers for one capability. Attempts are sequential; the first
/// usable payload wins and total exhaustion falls back to synthetic data.
pub struct ProviderChain<P: ?Sized> {
    capability: Capability,
    providers: Vec<Arc<P>>,
    timeout: Duration,
}

impl<P: ?Sized> Clone for ProviderChain<P> {
    fn clone(&self) -> Self {
        Self {
            capability: self.capability,
            providers: self.providers.clone(),
            timeout: self.timeout,
        }
    }
}

impl<P: DataSource + ?Sized> ProviderChain<P> {
    pub fn new(capability: Capability, providers: Vec<Arc<P>>) -> Self {
        Self {
            capability,
            providers,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn sources(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.source()).collect()
    }

    /// One attempt with the chain's timeout applied.
    async fn attempt<T, F, Fut>(&self, key: &str, provider: &Arc<P>, fetch: &F) -> Option<T>
    where
        T: Usable,
        F: Fn(Arc<P>) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, fetch(provider.clone())).await {
            Ok(Ok(data)) if data.is_usable() => Ok(data),
            Ok(Ok(_)) => Err(ProviderError::Empty("payload carried no data".to_string())),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(data) => {
                tracing::debug!(
                    key,
                    capability = %self.capability,
                    provider = provider.source(),
                    elapsed_ms,
                    "provider attempt succeeded"
                );
                Some(data)
            }
            Err(e) => {
                tracing::warn!(
                    key,
                    capability = %self.capability,
                    provider = provider.source(),
                    class = %e.class(),
                    elapsed_ms,
                    error = %e,
                    "provider attempt unusable"
                );
                None
            }
        }
    }

    /// Try each provider in order. Never fails: when nothing is usable the
    /// `synthetic` generator is called instead.
    pub async fn resolve<T, F, Fut, S>(&self, key: &str, fetch: F, synthetic: S) -> FetchResult<T>
    where
        T: Usable,
        F: Fn(Arc<P>) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
        S: FnOnce() -> T,
    {
        for provider in &self.providers {
            if let Some(data) = self.attempt(key, provider, &fetch).await {
                tracing::info!(
                    key,
                    capability = %self.capability,
                    provider = provider.source(),
                    "resolved"
                );
                return FetchResult::live(data, provider.source());
            }
        }

        tracing::warn!(
            key,
            capability = %self.capability,
            attempted = self.providers.len(),
            "all providers unusable, serving synthetic data"
        );
        FetchResult::synthetic(synthetic())
    }
}

/// Entities that can be assembled field by field from several providers.
pub trait MergeFields: Usable {
    /// Fill empty fields from `other`, returning how many were filled.
    fn merge_from(&mut self, other: Self) -> usize;

    /// Nothing left for a lower-priority provider to add.
    fn is_complete(&self) -> bool;
}

impl MergeFields for CompanyProfile {
    fn merge_from(&mut self, other: Self) -> usize {
        self.merge_missing(other)
    }

    fn is_complete(&self) -> bool {
        CompanyProfile::is_complete(self)
    }
}

impl<P: DataSource + ?Sized> ProviderChain<P> {
    /// Walk the whole chain, keeping the first usable payload and filling its
    /// gaps from later providers. `source` lists every contributor joined
    /// with `+`.
    pub async fn resolve_merged<T, F, Fut, S>(
        &self,
        key: &str,
        fetch: F,
        synthetic: S,
    ) -> FetchResult<T>
    where
        T: MergeFields,
        F: Fn(Arc<P>) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
        S: FnOnce() -> T,
    {
        let mut merged: Option<T> = None;
        let mut contributors: Vec<&str> = Vec::new();

        for provider in &self.providers {
            if merged.as_ref().is_some_and(MergeFields::is_complete) {
                break;
            }
            let Some(data) = self.attempt(key, provider, &fetch).await else {
                continue;
            };
            match merged.as_mut() {
                None => {
                    merged = Some(data);
                    contributors.push(provider.source());
                }
                Some(current) => {
                    let filled = current.merge_from(data);
                    if filled > 0 {
                        tracing::debug!(
                            key,
                            provider = provider.source(),
                            filled,
                            "merged missing fields"
                        );
                        contributors.push(provider.source());
                    }
                }
            }
        }

        match merged {
            Some(data) => {
                let source = contributors.join("+");
                tracing::info!(key, capability = %self.capability, provider = %source, "resolved");
                FetchResult::live(data, source)
            }
            None => {
                tracing::warn!(
                    key,
                    capability = %self.capability,
                    attempted = self.providers.len(),
                    "all providers unusable, serving synthetic data"
                );
                FetchResult::synthetic(synthetic())
            }
        }
    }
}
