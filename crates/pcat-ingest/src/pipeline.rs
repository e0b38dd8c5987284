//! Ingest run orchestration.
//!
//! Each input URL is processed in order: identify, fetch, parse, extract,
//! upsert, enrich, score. Per-URL failures are counted in [`RunStats`] and
//! never stop the run.

use std::future::Future;
use std::time::Duration;

use pcat_core::{
    Candidate, CatalogStore, ImageSink, NewAffiliateLink, RunStats, ScoringConfig, Vocabulary,
};
use pcat_scoring::Categorizer;
use pcat_scraper::{
    affiliate_source, identify, parse_product_page, Cooldown, FetchedPage, FieldExtractor,
    PageClient, ScraperError, UrlEntry,
};

use crate::enrich::{compose_summary, compose_title, extract_features};
use crate::error::IngestError;
use crate::rescore::score_product;
use crate::upsert::{SubmitOutcome, SubmitReport, UpsertCoordinator};

/// Where product pages come from.
pub trait PageSource {
    fn fetch_page(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<FetchedPage, ScraperError>> + Send;
}

impl PageSource for PageClient {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, ScraperError> {
        PageClient::fetch_page(self, url).await
    }
}

/// Result of processing one input URL that reached the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedEntry {
    pub report: SubmitReport,
    /// `false` if the summary or features could not be written.
    pub enriched: bool,
    /// `None` if the product could not be scored.
    pub score: Option<f64>,
}

pub struct Pipeline<'a, P, S, I> {
    pages: &'a P,
    store: &'a S,
    images: Option<&'a I>,
    extractor: FieldExtractor,
    categorizer: Categorizer,
    scoring: &'a ScoringConfig,
    /// Paces page fetches and image downloads alike.
    cooldown: Cooldown,
}

impl<'a, P, S, I> Pipeline<'a, P, S, I>
where
    P: PageSource,
    S: CatalogStore,
    I: ImageSink,
{
    /// Build a pipeline with no pause between requests; see
    /// [`Self::with_cooldown`].
    #[must_use]
    pub fn new(
        pages: &'a P,
        store: &'a S,
        images: Option<&'a I>,
        vocabulary: &Vocabulary,
        scoring: &'a ScoringConfig,
    ) -> Self {
        Self {
            pages,
            store,
            images,
            extractor: FieldExtractor::new(vocabulary.clone()),
            categorizer: Categorizer::new(vocabulary.clone()),
            scoring,
            cooldown: Cooldown::new(Duration::ZERO),
        }
    }

    /// Minimum pause between consecutive storefront requests, page fetches
    /// and image downloads included.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = Cooldown::new(cooldown);
        self
    }

    /// Process every entry in order and return the run's counters.
    pub async fn run(&self, entries: &[UrlEntry]) -> RunStats {
        let mut stats = RunStats::default();

        for (index, entry) in entries.iter().enumerate() {
            stats.total_candidates += 1;
            tracing::info!(
                url = %entry.url,
                position = index + 1,
                total = entries.len(),
                "processing url"
            );

            match self.process(entry).await {
                Ok(processed) => record(&mut stats, &processed),
                Err(e) if e.is_extraction() => {
                    tracing::warn!(url = %entry.url, error = %e, "could not extract product");
                    stats.extraction_errors += 1;
                }
                Err(e) => {
                    tracing::error!(url = %entry.url, error = %e, "could not store product");
                    stats.storage_errors += 1;
                }
            }
        }

        tracing::info!(
            total = stats.total_candidates,
            succeeded = stats.succeeded(),
            failed = stats.failed(),
            created = stats.created,
            duplicate_link_added = stats.duplicate_link_added,
            duplicate_noop = stats.duplicate_noop,
            images_added = stats.images_added,
            image_errors = stats.image_errors,
            "ingest run finished"
        );
        stats
    }

    /// Fetch, store, enrich and score one URL.
    ///
    /// # Errors
    ///
    /// Returns an extraction error (see [`IngestError::is_extraction`]) if
    /// the URL or page cannot be turned into a candidate, and a storage
    /// error if the upsert fails. Enrichment and scoring failures are
    /// reported in the returned [`ProcessedEntry`] instead.
    pub async fn process(&self, entry: &UrlEntry) -> Result<ProcessedEntry, IngestError> {
        let candidate = self.scrape(entry).await?;
        let report = UpsertCoordinator::new(self.store, self.images)
            .with_cooldown(&self.cooldown)
            .submit(&candidate)
            .await?;

        let enriched = match self.enrich(&report, &candidate.feature_bullets).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(sku = %report.product.sku, error = %e, "enrichment failed");
                false
            }
        };

        let score = match score_product(self.store, &report.product, self.scoring).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    sku = %report.product.sku,
                    method = %self.scoring.method,
                    error = %e,
                    "scoring failed"
                );
                None
            }
        };

        Ok(ProcessedEntry {
            report,
            enriched,
            score,
        })
    }

    async fn scrape(&self, entry: &UrlEntry) -> Result<Candidate, IngestError> {
        let scrape_error = |source| IngestError::Scrape {
            url: entry.url.clone(),
            source,
        };

        let identified = identify(&entry.url).map_err(scrape_error)?;
        self.cooldown.wait().await;
        let page = self
            .pages
            .fetch_page(&entry.url)
            .await
            .map_err(scrape_error)?;

        // Short links only reveal the product id after redirects.
        let external_id = match identified.external_id {
            Some(id) => Some(id),
            None => identify(&page.final_url)
                .ok()
                .filter(|resolved| resolved.platform == identified.platform)
                .and_then(|resolved| resolved.external_id),
        };

        let mut scraped = parse_product_page(&page.html, &page.final_url).map_err(scrape_error)?;
        self.extractor
            .fill_attributes(&mut scraped.attributes, &scraped.bullets);

        tracing::debug!(
            url = %entry.url,
            platform = %identified.platform,
            link_type = %identified.link_type,
            affiliate_source = affiliate_source(&entry.url),
            "page scraped"
        );

        Ok(Candidate {
            platform: identified.platform,
            external_id,
            source_url: entry.url.clone(),
            category: None,
            attributes: scraped.attributes,
            sub_scores: entry.sub_scores,
            link: NewAffiliateLink {
                platform: identified.platform,
                link_type: identified.link_type,
                url: entry.url.clone(),
                commission_rate: entry.commission_rate,
                notes: entry.notes.clone(),
            },
            images: scraped.images,
            feature_bullets: scraped.bullets,
        })
    }

    /// Regenerate the display title and summary, and replace the features
    /// when the page had bullets to build them from.
    async fn enrich(&self, report: &SubmitReport, bullets: &[String]) -> Result<(), IngestError> {
        let product = &report.product;
        if let Some(title) = compose_title(product, self.categorizer.vocabulary()) {
            self.store
                .set_pretty_title(product.id, &title)
                .await
                .map_err(IngestError::store)?;
        }
        if let Some(summary) = compose_summary(product) {
            self.store
                .set_summary(product.id, &summary)
                .await
                .map_err(IngestError::store)?;
        }

        let features = extract_features(&self.categorizer, bullets);
        if !features.is_empty() {
            self.store
                .replace_features(product.id, &features)
                .await
                .map_err(IngestError::store)?;
        }
        Ok(())
    }
}

fn record(stats: &mut RunStats, processed: &ProcessedEntry) {
    let report = &processed.report;
    match report.outcome {
        SubmitOutcome::Created => stats.created += 1,
        SubmitOutcome::DuplicateLinkAdded => stats.duplicate_link_added += 1,
        SubmitOutcome::DuplicateNoop => stats.duplicate_noop += 1,
    }
    stats.images_added += report.images_added;
    stats.image_errors += report.image_errors;
    if !processed.enriched {
        stats.enrichment_errors += 1;
    }
    if processed.score.is_none() {
        stats.scoring_errors += 1;
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
