//! SKU-keyed upsert of scraped candidates.
//!
//! A candidate either creates a product, adds a new affiliate link to an
//! existing product, or changes nothing beyond refreshing scalar fields.
//! Images are reconciled on every submission.

use std::collections::HashSet;

use pcat_core::{
    derive_sku, Candidate, CandidateImage, CatalogStore, ImageSink, InsertOutcome, NewProduct,
    NewProductImage, Product, ProductImage,
};
use pcat_scraper::Cooldown;

use crate::error::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    DuplicateLinkAdded,
    DuplicateNoop,
}

impl SubmitOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SubmitOutcome::Created => "created",
            SubmitOutcome::DuplicateLinkAdded => "duplicate_link_added",
            SubmitOutcome::DuplicateNoop => "duplicate_noop",
        }
    }
}

impl std::fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReport {
    pub outcome: SubmitOutcome,
    /// The stored product after the submission's writes.
    pub product: Product,
    /// Scalar fields and supplied sub-scores overwritten on an existing
    /// product.
    pub fields_refreshed: Vec<&'static str>,
    pub images_added: usize,
    pub image_errors: usize,
}

/// Writes candidates through a [`CatalogStore`], downloading images with
/// an optional [`ImageSink`]. Without a sink, images are left untouched.
pub struct UpsertCoordinator<'a, S, I> {
    store: &'a S,
    images: Option<&'a I>,
    cooldown: Option<&'a Cooldown>,
}

impl<'a, S, I> UpsertCoordinator<'a, S, I>
where
    S: CatalogStore,
    I: ImageSink,
{
    #[must_use]
    pub fn new(store: &'a S, images: Option<&'a I>) -> Self {
        Self {
            store,
            images,
            cooldown: None,
        }
    }

    /// Wait on `cooldown` before every image download.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: &'a Cooldown) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    /// Submit one candidate.
    ///
    /// # Errors
    ///
    /// - [`IngestError::Extraction`] if no SKU can be derived from the
    ///   candidate. Nothing is written in that case.
    /// - [`IngestError::StorageConflict`] if the SKU is already stored for
    ///   another platform.
    /// - [`IngestError::Store`] if the store fails. Image failures are not
    ///   errors; they are counted in the report.
    pub async fn submit(&self, candidate: &Candidate) -> Result<SubmitReport, IngestError> {
        let external_id = candidate
            .external_id
            .as_deref()
            .ok_or_else(|| IngestError::Extraction {
                url: candidate.source_url.clone(),
                reason: "no product identifier in URL".to_string(),
            })?;
        let sku =
            derive_sku(candidate.platform, external_id).map_err(|e| IngestError::Extraction {
                url: candidate.source_url.clone(),
                reason: e.to_string(),
            })?;

        let existing = self
            .store
            .find_product_by_sku(&sku)
            .await
            .map_err(IngestError::store)?;

        let (product, created) = match existing {
            Some(product) => (product, false),
            None => match self.insert(&sku, external_id, candidate).await? {
                Some(product) => (product, true),
                None => {
                    tracing::debug!(sku = %sku, "lost insert race; treating as existing");
                    let product = self
                        .store
                        .find_product_by_sku(&sku)
                        .await
                        .map_err(IngestError::store)?
                        .ok_or_else(|| IngestError::MissingAfterConflict { sku: sku.clone() })?;
                    (product, false)
                }
            },
        };

        if product.platform != candidate.platform {
            return Err(IngestError::StorageConflict {
                sku,
                stored: product.platform,
                incoming: candidate.platform,
            });
        }

        let (product, outcome, fields_refreshed) = if created {
            self.attach_link(&product, candidate).await?;
            (product, SubmitOutcome::Created, Vec::new())
        } else {
            let (product, refreshed) = self.refresh(product, candidate).await?;
            let outcome = if self.attach_link(&product, candidate).await? {
                SubmitOutcome::DuplicateLinkAdded
            } else {
                SubmitOutcome::DuplicateNoop
            };
            (product, outcome, refreshed)
        };

        let (images_added, image_errors) = match self.images {
            Some(sink) => self.sync_images(sink, &product, &candidate.images).await,
            None => (0, 0),
        };

        tracing::info!(
            sku = %product.sku,
            outcome = %outcome,
            refreshed = fields_refreshed.len(),
            images_added,
            image_errors,
            "candidate stored"
        );

        Ok(SubmitReport {
            outcome,
            product,
            fields_refreshed,
            images_added,
            image_errors,
        })
    }

    /// Returns `None` when another writer inserted the SKU first.
    async fn insert(
        &self,
        sku: &str,
        external_id: &str,
        candidate: &Candidate,
    ) -> Result<Option<Product>, IngestError> {
        let new_product = NewProduct {
            sku: sku.to_string(),
            platform: candidate.platform,
            external_id: external_id.trim().to_ascii_uppercase(),
            category: candidate.category.clone(),
            attributes: candidate.attributes.clone(),
            sub_scores: candidate.sub_scores,
        };
        match self
            .store
            .insert_product(&new_product)
            .await
            .map_err(IngestError::store)?
        {
            InsertOutcome::Inserted(product) => Ok(Some(product)),
            InsertOutcome::AlreadyExists => Ok(None),
        }
    }

    async fn refresh(
        &self,
        mut product: Product,
        candidate: &Candidate,
    ) -> Result<(Product, Vec<&'static str>), IngestError> {
        let mut refreshed = product.attributes.refresh_from(&candidate.attributes);
        if !refreshed.is_empty() {
            self.store
                .update_attributes(product.id, &product.attributes)
                .await
                .map_err(IngestError::store)?;
        }
        let scores = product.sub_scores.refresh_from(&candidate.sub_scores);
        if !scores.is_empty() {
            self.store
                .update_sub_scores(product.id, &product.sub_scores)
                .await
                .map_err(IngestError::store)?;
            refreshed.extend(scores);
        }
        if !refreshed.is_empty() {
            tracing::debug!(sku = %product.sku, fields = ?refreshed, "refreshed product fields");
        }
        Ok((product, refreshed))
    }

    /// Returns whether a new link row was written.
    async fn attach_link(&self, product: &Product, candidate: &Candidate) -> Result<bool, IngestError> {
        let inserted = self
            .store
            .insert_link(product.id, &candidate.link)
            .await
            .map_err(IngestError::store)?;
        if inserted.is_none() {
            tracing::debug!(
                sku = %product.sku,
                platform = %candidate.link.platform,
                link_type = %candidate.link.link_type,
                "affiliate link already present"
            );
        }
        Ok(inserted.is_some())
    }

    /// Download and record images not yet stored for `product`. Returns
    /// `(added, errors)`.
    ///
    /// An image is skipped when its URL or its content fingerprint is
    /// already known for the product. The first stored image becomes
    /// primary unless a candidate image is flagged primary.
    async fn sync_images(
        &self,
        sink: &I,
        product: &Product,
        images: &[CandidateImage],
    ) -> (usize, usize) {
        if images.is_empty() {
            return (0, 0);
        }

        let mut stored = match self.store.list_images(product.id).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(sku = %product.sku, error = %e, "failed to list product images");
                return (0, 1);
            }
        };
        let mut fingerprints: HashSet<String> =
            stored.iter().filter_map(|i| i.fingerprint.clone()).collect();
        let mut seen_urls: HashSet<&str> = HashSet::new();
        let mut added = 0;
        let mut errors = 0;

        for image in images {
            if !seen_urls.insert(image.url.as_str()) {
                continue;
            }

            if let Some(existing) = stored.iter().find(|i| i.source_url == image.url) {
                if image.primary && !existing.is_primary {
                    let image_id = existing.id;
                    if !self.promote(product, &mut stored, image_id).await {
                        errors += 1;
                    }
                }
                continue;
            }

            if let Some(cooldown) = self.cooldown {
                cooldown.wait().await;
            }
            let fetched = match sink.fetch(&image.url).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    tracing::warn!(sku = %product.sku, url = %image.url, error = %e, "image download failed");
                    errors += 1;
                    continue;
                }
            };
            let fingerprint = fetched.fingerprint();
            if fingerprints.contains(&fingerprint) {
                tracing::debug!(sku = %product.sku, url = %image.url, "identical image already stored");
                continue;
            }

            let ordinal = stored.len();
            let local_path = match sink.save(&product.sku, ordinal, &fetched).await {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(sku = %product.sku, url = %image.url, error = %e, "failed to save image");
                    errors += 1;
                    continue;
                }
            };

            let has_primary = stored.iter().any(|i| i.is_primary);
            let record = NewProductImage {
                source_url: image.url.clone(),
                local_path: Some(local_path),
                fingerprint: Some(fingerprint.clone()),
                is_primary: !has_primary,
                display_order: i32::try_from(ordinal).unwrap_or(i32::MAX),
            };
            let inserted = match self.store.insert_image(product.id, &record).await {
                Ok(Some(inserted)) => inserted,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(sku = %product.sku, url = %image.url, error = %e, "failed to record image");
                    errors += 1;
                    continue;
                }
            };
            fingerprints.insert(fingerprint);
            added += 1;

            let image_id = inserted.id;
            stored.push(inserted);
            if image.primary && has_primary && !self.promote(product, &mut stored, image_id).await {
                errors += 1;
            }
        }

        (added, errors)
    }

    /// Make `image_id` the product's primary image, mirroring the change in
    /// `stored`. Returns `false` if the store rejected it.
    async fn promote(&self, product: &Product, stored: &mut [ProductImage], image_id: i64) -> bool {
        match self.store.set_primary_image(product.id, image_id).await {
            Ok(()) => {
                for image in stored {
                    image.is_primary = image.id == image_id;
                }
                true
            }
            Err(e) => {
                tracing::warn!(sku = %product.sku, image_id, error = %e, "failed to set primary image");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "upsert_test.rs"]
mod tests;
