//! Per-operator source adapters.
//!
//! Every adapter turns one fetched page or payload into raw tariff records.
//! The markup/JSON layout each one expects is a scraper contract owned by that
//! adapter alone, so operator-side changes stay local to a single file.

mod beeline;
mod megafon;
mod mts;
mod t2;

pub use beeline::BeelineAdapter;
pub use megafon::MegafonAdapter;
pub use mts::MtsAdapter;
pub use t2::T2Adapter;

use crate::text::clean_fragment;
use async_trait::async_trait;
use scraper::{ElementRef, Selector};
use shared_types::{ExtractionError, FetchError, OperatorCode, RawTariffRecord};
use std::collections::HashMap;
use std::sync::Arc;

/// Network capability consumed by the adapters
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// Records found by an adapter plus anything worth reporting about the run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdapterReport {
    pub records: Vec<RawTariffRecord>,
    pub diagnostics: Vec<String>,
}

impl AdapterReport {
    pub fn failed(diagnostic: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            diagnostics: vec![diagnostic.into()],
        }
    }

    pub fn note(&mut self, diagnostic: impl Into<String>) {
        self.diagnostics.push(diagnostic.into());
    }
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn code(&self) -> OperatorCode;

    /// Version of the page layout this adapter understands.
    fn contract_version(&self) -> &'static str;

    fn parse(&self, body: &str) -> Result<AdapterReport, ExtractionError>;

    /// Fetch `url` and parse it. Never fails: transport and extraction errors
    /// yield an empty record list with a diagnostic.
    async fn fetch_and_parse(&self, fetcher: &dyn Fetcher, url: &str) -> AdapterReport {
        let body = match fetcher.get(url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(operator = %self.code(), "Fetch failed: {}", e);
                return AdapterReport::failed(format!("fetch failed: {e}"));
            }
        };

        match self.parse(&body) {
            Ok(report) => {
                tracing::debug!(
                    operator = %self.code(),
                    contract = self.contract_version(),
                    records = report.records.len(),
                    "Parsed operator payload"
                );
                report
            }
            Err(e) => {
                tracing::warn!(
                    operator = %self.code(),
                    contract = self.contract_version(),
                    "Extraction failed: {}",
                    e
                );
                AdapterReport::failed(format!(
                    "extraction failed (contract {}): {e}",
                    self.contract_version()
                ))
            }
        }
    }
}

/// Cleaned text of the first element under `card` matching `selector`.
fn first_text(card: &ElementRef, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(|el| clean_fragment(&el.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| !text.is_empty())
}

/// Adapters keyed by operator code
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<OperatorCode, Arc<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with an adapter for every known operator.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(MtsAdapter));
        registry.register(Arc::new(MegafonAdapter));
        registry.register(Arc::new(BeelineAdapter));
        registry.register(Arc::new(T2Adapter));
        registry
    }

    /// Returns the adapter previously registered for the same code, if any.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.insert(adapter.code(), adapter)
    }

    pub fn get(&self, code: OperatorCode) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.get(&code).cloned()
    }

    pub fn codes(&self) -> Vec<OperatorCode> {
        let mut codes: Vec<_> = self.adapters.keys().copied().collect();
        codes.sort();
        codes
    }
}

/// Serves canned bodies; used where the network must not be touched.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, Result<String, FetchError>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), Ok(body.into()));
        self
    }

    pub fn with_error(mut self, url: &str, error: FetchError) -> Self {
        self.pages.insert(url.to_string(), Err(error));
        self
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        self.pages.get(url).cloned().unwrap_or_else(|| {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        })
    }
}
