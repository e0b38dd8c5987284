//! In-memory [`CatalogStore`] used for dry runs and tests.
//!
//! Enforces the same uniqueness rules as the Postgres schema: one product
//! per SKU, one link per `(product, platform, link_type)`, one image per
//! `(product, source_url)` and at most one primary image per product.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use pcat_core::{
    AffiliateLink, CatalogStore, Feature, InsertOutcome, NewAffiliateLink, NewProduct,
    NewProductImage, Product, ProductAttributes, ProductImage, ScoringMethod, SubScores,
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryStoreError {
    #[error("product {0} not found")]
    ProductNotFound(i64),

    #[error("image {image_id} does not belong to product {product_id}")]
    ImageNotFound { product_id: i64, image_id: i64 },

    #[error("product {0} already has a primary image")]
    PrimaryImageExists(i64),
}

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    products: Vec<Product>,
    links: Vec<AffiliateLink>,
    images: Vec<ProductImage>,
    features: HashMap<i64, Vec<Feature>>,
    scores: HashMap<(i64, ScoringMethod), f64>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn product_mut(&mut self, product_id: i64) -> Result<&mut Product, MemoryStoreError> {
        self.products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or(MemoryStoreError::ProductNotFound(product_id))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn product_count(&self) -> usize {
        self.lock().products.len()
    }

    #[must_use]
    pub fn features(&self, product_id: i64) -> Vec<Feature> {
        self.lock()
            .features
            .get(&product_id)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn score(&self, product_id: i64, method: ScoringMethod) -> Option<f64> {
        self.lock().scores.get(&(product_id, method)).copied()
    }
}

impl CatalogStore for MemoryStore {
    type Error = MemoryStoreError;

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, MemoryStoreError> {
        Ok(self.lock().products.iter().find(|p| p.sku == sku).cloned())
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<InsertOutcome, MemoryStoreError> {
        let mut state = self.lock();
        if state.products.iter().any(|p| p.sku == product.sku) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        let stored = Product {
            id: state.next_id(),
            sku: product.sku.clone(),
            platform: product.platform,
            external_id: product.external_id.clone(),
            category: product.category.clone(),
            attributes: product.attributes.clone(),
            sub_scores: product.sub_scores,
            derived_sub_scores: SubScores::default(),
            product_summary: None,
            pretty_title: None,
        };
        state.products.push(stored.clone());
        Ok(InsertOutcome::Inserted(stored))
    }

    async fn update_attributes(
        &self,
        product_id: i64,
        attributes: &ProductAttributes,
    ) -> Result<(), MemoryStoreError> {
        self.lock().product_mut(product_id)?.attributes = attributes.clone();
        Ok(())
    }

    async fn update_sub_scores(
        &self,
        product_id: i64,
        sub_scores: &SubScores,
    ) -> Result<(), MemoryStoreError> {
        self.lock().product_mut(product_id)?.sub_scores = *sub_scores;
        Ok(())
    }

    async fn save_derived_sub_scores(
        &self,
        product_id: i64,
        sub_scores: &SubScores,
    ) -> Result<(), MemoryStoreError> {
        self.lock().product_mut(product_id)?.derived_sub_scores = *sub_scores;
        Ok(())
    }

    async fn set_summary(&self, product_id: i64, summary: &str) -> Result<(), MemoryStoreError> {
        self.lock().product_mut(product_id)?.product_summary = Some(summary.to_string());
        Ok(())
    }

    async fn set_pretty_title(&self, product_id: i64, title: &str) -> Result<(), MemoryStoreError> {
        self.lock().product_mut(product_id)?.pretty_title = Some(title.to_string());
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>, MemoryStoreError> {
        Ok(self.lock().products.clone())
    }

    async fn list_links(&self, product_id: i64) -> Result<Vec<AffiliateLink>, MemoryStoreError> {
        Ok(self
            .lock()
            .links
            .iter()
            .filter(|l| l.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn insert_link(
        &self,
        product_id: i64,
        link: &NewAffiliateLink,
    ) -> Result<Option<AffiliateLink>, MemoryStoreError> {
        let mut state = self.lock();
        state.product_mut(product_id)?;
        let duplicate = state.links.iter().any(|l| {
            l.product_id == product_id && l.platform == link.platform && l.link_type == link.link_type
        });
        if duplicate {
            return Ok(None);
        }
        let stored = AffiliateLink {
            id: state.next_id(),
            product_id,
            platform: link.platform,
            link_type: link.link_type,
            url: link.url.clone(),
            commission_rate: link.commission_rate,
            notes: link.notes.clone(),
        };
        state.links.push(stored.clone());
        Ok(Some(stored))
    }

    async fn list_images(&self, product_id: i64) -> Result<Vec<ProductImage>, MemoryStoreError> {
        let mut images: Vec<ProductImage> = self
            .lock()
            .images
            .iter()
            .filter(|i| i.product_id == product_id)
            .cloned()
            .collect();
        images.sort_by_key(|i| (i.display_order, i.id));
        Ok(images)
    }

    async fn insert_image(
        &self,
        product_id: i64,
        image: &NewProductImage,
    ) -> Result<Option<ProductImage>, MemoryStoreError> {
        let mut state = self.lock();
        state.product_mut(product_id)?;
        let duplicate = state
            .images
            .iter()
            .any(|i| i.product_id == product_id && i.source_url == image.source_url);
        if duplicate {
            return Ok(None);
        }
        if image.is_primary
            && state
                .images
                .iter()
                .any(|i| i.product_id == product_id && i.is_primary)
        {
            return Err(MemoryStoreError::PrimaryImageExists(product_id));
        }
        let stored = ProductImage {
            id: state.next_id(),
            product_id,
            source_url: image.source_url.clone(),
            local_path: image.local_path.clone(),
            fingerprint: image.fingerprint.clone(),
            is_primary: image.is_primary,
            display_order: image.display_order,
        };
        state.images.push(stored.clone());
        Ok(Some(stored))
    }

    async fn set_primary_image(&self, product_id: i64, image_id: i64) -> Result<(), MemoryStoreError> {
        let mut state = self.lock();
        if !state
            .images
            .iter()
            .any(|i| i.product_id == product_id && i.id == image_id)
        {
            return Err(MemoryStoreError::ImageNotFound {
                product_id,
                image_id,
            });
        }
        for image in state.images.iter_mut().filter(|i| i.product_id == product_id) {
            image.is_primary = image.id == image_id;
        }
        Ok(())
    }

    async fn replace_features(
        &self,
        product_id: i64,
        features: &[Feature],
    ) -> Result<(), MemoryStoreError> {
        let mut state = self.lock();
        state.product_mut(product_id)?;
        state.features.insert(product_id, features.to_vec());
        Ok(())
    }

    async fn save_score(
        &self,
        product_id: i64,
        method: ScoringMethod,
        value: f64,
    ) -> Result<(), MemoryStoreError> {
        let mut state = self.lock();
        state.product_mut(product_id)?;
        state.scores.insert((product_id, method), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pcat_core::{LinkType, Platform};

    use super::*;

    fn new_product(sku: &str) -> NewProduct {
        NewProduct {
            sku: sku.to_string(),
            platform: Platform::Amazon,
            external_id: "B08M9SMVSG".to_string(),
            category: None,
            attributes: ProductAttributes::default(),
            sub_scores: SubScores::default(),
        }
    }

    fn image(url: &str, is_primary: bool) -> NewProductImage {
        NewProductImage {
            source_url: url.to_string(),
            local_path: None,
            fingerprint: None,
            is_primary,
            display_order: 0,
        }
    }

    async fn inserted(store: &MemoryStore, sku: &str) -> Product {
        match store.insert_product(&new_product(sku)).await.unwrap() {
            InsertOutcome::Inserted(product) => product,
            InsertOutcome::AlreadyExists => panic!("{sku} already stored"),
        }
    }

    #[tokio::test]
    async fn sku_is_unique() {
        let store = MemoryStore::new();
        inserted(&store, "AMZ-B08M9SMVSG").await;
        let again = store.insert_product(&new_product("AMZ-B08M9SMVSG")).await.unwrap();
        assert_eq!(again, InsertOutcome::AlreadyExists);
        assert_eq!(store.product_count(), 1);
    }

    #[tokio::test]
    async fn link_key_is_platform_and_type() {
        let store = MemoryStore::new();
        let product = inserted(&store, "AMZ-B08M9SMVSG").await;
        let link = |link_type, url: &str| NewAffiliateLink {
            platform: Platform::Amazon,
            link_type,
            url: url.to_string(),
            commission_rate: None,
            notes: None,
        };

        let first = store
            .insert_link(product.id, &link(LinkType::Web, "https://a"))
            .await
            .unwrap();
        let same_key = store
            .insert_link(product.id, &link(LinkType::Web, "https://b"))
            .await
            .unwrap();
        let mobile = store
            .insert_link(product.id, &link(LinkType::Mobile, "https://m"))
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(same_key.is_none());
        assert!(mobile.is_some());
        assert_eq!(store.list_links(product.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn one_primary_image_per_product() {
        let store = MemoryStore::new();
        let product = inserted(&store, "AMZ-B08M9SMVSG").await;
        let a = store
            .insert_image(product.id, &image("https://img/a.jpg", true))
            .await
            .unwrap()
            .unwrap();
        let err = store
            .insert_image(product.id, &image("https://img/b.jpg", true))
            .await
            .unwrap_err();
        assert_eq!(err, MemoryStoreError::PrimaryImageExists(product.id));

        let b = store
            .insert_image(product.id, &image("https://img/b.jpg", false))
            .await
            .unwrap()
            .unwrap();
        store.set_primary_image(product.id, b.id).await.unwrap();
        let images = store.list_images(product.id).await.unwrap();
        let primaries: Vec<i64> = images.iter().filter(|i| i.is_primary).map(|i| i.id).collect();
        assert_eq!(primaries, vec![b.id]);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn primary_image_must_belong_to_product() {
        let store = MemoryStore::new();
        let product = inserted(&store, "AMZ-B08M9SMVSG").await;
        let err = store.set_primary_image(product.id, 99).await.unwrap_err();
        assert_eq!(
            err,
            MemoryStoreError::ImageNotFound {
                product_id: product.id,
                image_id: 99
            }
        );
    }

    #[tokio::test]
    async fn writes_to_unknown_product_fail() {
        let store = MemoryStore::new();
        let err = store.set_summary(7, "text").await.unwrap_err();
        assert_eq!(err, MemoryStoreError::ProductNotFound(7));
    }
}
