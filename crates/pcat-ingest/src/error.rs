use pcat_core::Platform;
use pcat_scoring::ScoringError;
use pcat_scraper::ScraperError;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum IngestError {
    /// The candidate could not be turned into a storable record.
    #[error("cannot extract a product from {url}: {reason}")]
    Extraction { url: String, reason: String },

    /// Fetching or parsing the product page failed.
    #[error("failed to scrape {url}: {source}")]
    Scrape {
        url: String,
        #[source]
        source: ScraperError,
    },

    /// The SKU is already stored for a different platform.
    #[error("SKU {sku} is stored for {stored} but the candidate is from {incoming}")]
    StorageConflict {
        sku: String,
        stored: Platform,
        incoming: Platform,
    },

    /// An insert lost a race on the SKU but the winning row could not be
    /// read back.
    #[error("product {sku} was stored concurrently but cannot be read back")]
    MissingAfterConflict { sku: String },

    #[error("store error: {0}")]
    Store(#[source] BoxError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl IngestError {
    pub(crate) fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(err))
    }

    /// Errors raised before anything was written for the candidate.
    #[must_use]
    pub fn is_extraction(&self) -> bool {
        matches!(self, Self::Extraction { .. } | Self::Scrape { .. })
    }
}
