//! # Travel Newsbot
//!
//! Collects news items from several travel news sites, filters out what was
//! already posted, and hands small ordered batches to a publisher.
//!
//! ## Architecture
//!
//! The core is a per-source pipeline driven by [`cycle::IngestionCycle`]:
//! 1. **Fetching**: Feed first ([`feed`]); listing page via [`scrapers`] as fallback
//! 2. **Normalizing**: Raw candidates validated into items ([`normalize`])
//! 3. **Filtering**: Previously delivered links skipped ([`store`])
//! 4. **Delivering**: Oldest five fresh items published oldest-first ([`publish`])
//!
//! Scheduling, configuration loading and logging setup live in the binary.

pub mod cli;
pub mod config;
pub mod cycle;
pub mod error;
pub mod feed;
pub mod http;
pub mod models;
pub mod normalize;
pub mod publish;
pub mod scrapers;
pub mod store;
pub mod utils;

pub use cycle::{CycleReport, CycleSettings, IngestionCycle, SourceReport, Via};
pub use error::{ConfigError, FetchError, PublishError, StoreError};
pub use models::{NewsItem, PublishedRecord, RawCandidate, Source};
