//! Ingest side of the product catalog: SKU-keyed upsert of scraped
//! candidates, enrichment, scoring passes and the run orchestrator.

pub mod enrich;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod rescore;
pub mod upsert;

pub use enrich::{compose_summary, compose_title, extract_features, value_indicator, MAX_FEATURES};
pub use error::IngestError;
pub use memory::{MemoryStore, MemoryStoreError};
pub use pipeline::{PageSource, Pipeline, ProcessedEntry};
pub use rescore::{rescore_all, score_product, RescoreReport};
pub use upsert::{SubmitOutcome, SubmitReport, UpsertCoordinator};
