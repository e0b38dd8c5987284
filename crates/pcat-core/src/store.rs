//! Persistence seams used by the ingest pipeline.
//!
//! [`CatalogStore`] is implemented by the Postgres layer and by an in-memory
//! store for dry runs and tests. [`ImageSink`] abstracts downloading and
//! saving product images.

use std::future::Future;

use crate::features::Feature;
use crate::products::{
    AffiliateLink, FetchedImage, NewAffiliateLink, NewProduct, NewProductImage, Product,
    ProductAttributes, ProductImage, SubScores,
};
use crate::scoring_config::ScoringMethod;

/// Result of a SKU-keyed product insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(Product),
    /// Another writer stored the SKU first; the caller should re-read it.
    AlreadyExists,
}

pub trait CatalogStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn find_product_by_sku(
        &self,
        sku: &str,
    ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send;

    /// Insert a product unless its SKU is already present. Must be atomic
    /// with respect to the SKU uniqueness check.
    fn insert_product(
        &self,
        product: &NewProduct,
    ) -> impl Future<Output = Result<InsertOutcome, Self::Error>> + Send;

    fn update_attributes(
        &self,
        product_id: i64,
        attributes: &ProductAttributes,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Store the sub-scores supplied with the product's input. Scoring
    /// passes never call this.
    fn update_sub_scores(
        &self,
        product_id: i64,
        sub_scores: &SubScores,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Replace the sub-scores computed by the last scoring pass.
    fn save_derived_sub_scores(
        &self,
        product_id: i64,
        sub_scores: &SubScores,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn set_summary(
        &self,
        product_id: i64,
        summary: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn set_pretty_title(
        &self,
        product_id: i64,
        title: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send;

    fn list_links(
        &self,
        product_id: i64,
    ) -> impl Future<Output = Result<Vec<AffiliateLink>, Self::Error>> + Send;

    /// Attach a link. Returns `None` when the product already has a link for
    /// the same platform and link type.
    fn insert_link(
        &self,
        product_id: i64,
        link: &NewAffiliateLink,
    ) -> impl Future<Output = Result<Option<AffiliateLink>, Self::Error>> + Send;

    fn list_images(
        &self,
        product_id: i64,
    ) -> impl Future<Output = Result<Vec<ProductImage>, Self::Error>> + Send;

    /// Store an image record. Returns `None` when the product already has an
    /// image with the same source URL.
    fn insert_image(
        &self,
        product_id: i64,
        image: &NewProductImage,
    ) -> impl Future<Output = Result<Option<ProductImage>, Self::Error>> + Send;

    /// Make `image_id` the only primary image of `product_id`.
    fn set_primary_image(
        &self,
        product_id: i64,
        image_id: i64,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Replace the product's stored features with `features`.
    fn replace_features(
        &self,
        product_id: i64,
        features: &[Feature],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Store `value` as the product's score for `method`, overwriting any
    /// earlier value.
    fn save_score(
        &self,
        product_id: i64,
        method: ScoringMethod,
        value: f64,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

pub trait ImageSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn fetch(&self, url: &str)
        -> impl Future<Output = Result<FetchedImage, Self::Error>> + Send;

    /// Persist the image and return its local path. `ordinal` is the image's
    /// position among the product's images; `0` is the first.
    fn save(
        &self,
        sku: &str,
        ordinal: usize,
        image: &FetchedImage,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}
