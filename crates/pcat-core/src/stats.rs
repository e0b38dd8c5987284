use std::fmt;

use serde::Serialize;

/// Aggregate counters for one ingest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub total_candidates: usize,
    pub created: usize,
    pub duplicate_link_added: usize,
    pub duplicate_noop: usize,
    /// Candidates that could not be turned into a storable record.
    pub extraction_errors: usize,
    /// Store failures and unresolvable SKU conflicts.
    pub storage_errors: usize,
    pub image_errors: usize,
    pub images_added: usize,
    /// Products stored but whose summary or features could not be written.
    pub enrichment_errors: usize,
    /// Products stored but skipped by the scoring pass.
    pub scoring_errors: usize,
}

impl RunStats {
    /// Candidates that ended up stored, whether new or already known.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.created + self.duplicate_link_added + self.duplicate_noop
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.extraction_errors + self.storage_errors
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={} created={} duplicate_link_added={} duplicate_noop={} \
             extraction_errors={} storage_errors={} image_errors={} images_added={} \
             enrichment_errors={} scoring_errors={}",
            self.total_candidates,
            self.created,
            self.duplicate_link_added,
            self.duplicate_noop,
            self.extraction_errors,
            self.storage_errors,
            self.image_errors,
            self.images_added,
            self.enrichment_errors,
            self.scoring_errors,
        )
    }
}
