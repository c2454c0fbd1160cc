//! Extractors Crate
//!
//! Turns operator pages and payloads into raw tariff records.
//!
//! # Architecture
//!
//! - **Types**: records, allowances and error kinds live in the `shared-types` crate
//! - **Text**: pure extractors for prices, data volumes and call minutes
//! - **Adapters**: one `SourceAdapter` per operator, looked up by `OperatorCode`
//!   through the `AdapterRegistry`
//!
//! # Example
//!
//! ```rust,ignore
//! use extractors::{AdapterRegistry, Fetcher};
//! use shared_types::OperatorCode;
//!
//! let registry = AdapterRegistry::with_defaults();
//! let adapter = registry.get(OperatorCode::T2).unwrap();
//! let report = adapter.fetch_and_parse(&fetcher, "https://t2.ru/tariffs").await;
//! ```

pub mod adapters;
pub mod text;

pub use adapters::{
    AdapterRegistry, AdapterReport, BeelineAdapter, Fetcher, MegafonAdapter, MtsAdapter,
    SourceAdapter, StaticFetcher, T2Adapter,
};
pub use text::{extract_data_volume, extract_minutes, extract_price};
