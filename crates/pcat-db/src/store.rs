//! [`CatalogStore`] over a Postgres pool.

use pcat_core::{
    AffiliateLink, CatalogStore, Feature, InsertOutcome, NewAffiliateLink, NewProduct,
    NewProductImage, Product, ProductAttributes, ProductImage, ScoringMethod, SubScores,
};
use sqlx::PgPool;

use crate::{affiliate_links, features, images, products, scores, DbError};

#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl CatalogStore for PgCatalogStore {
    type Error = DbError;

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, DbError> {
        products::get_product_by_sku(&self.pool, sku)
            .await?
            .map(Product::try_from)
            .transpose()
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<InsertOutcome, DbError> {
        match products::insert_product(&self.pool, product).await? {
            Some(row) => Ok(InsertOutcome::Inserted(row.try_into()?)),
            None => Ok(InsertOutcome::AlreadyExists),
        }
    }

    async fn update_attributes(
        &self,
        product_id: i64,
        attributes: &ProductAttributes,
    ) -> Result<(), DbError> {
        products::update_product_attributes(&self.pool, product_id, attributes).await
    }

    async fn update_sub_scores(&self, product_id: i64, sub_scores: &SubScores) -> Result<(), DbError> {
        products::update_product_sub_scores(&self.pool, product_id, sub_scores).await
    }

    async fn save_derived_sub_scores(
        &self,
        product_id: i64,
        sub_scores: &SubScores,
    ) -> Result<(), DbError> {
        products::save_derived_sub_scores(&self.pool, product_id, sub_scores).await
    }

    async fn set_summary(&self, product_id: i64, summary: &str) -> Result<(), DbError> {
        products::set_product_summary(&self.pool, product_id, summary).await
    }

    async fn set_pretty_title(&self, product_id: i64, title: &str) -> Result<(), DbError> {
        products::set_product_pretty_title(&self.pool, product_id, title).await
    }

    async fn list_products(&self) -> Result<Vec<Product>, DbError> {
        products::list_products(&self.pool)
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    async fn list_links(&self, product_id: i64) -> Result<Vec<AffiliateLink>, DbError> {
        affiliate_links::list_affiliate_links(&self.pool, product_id)
            .await?
            .into_iter()
            .map(AffiliateLink::try_from)
            .collect()
    }

    async fn insert_link(
        &self,
        product_id: i64,
        link: &NewAffiliateLink,
    ) -> Result<Option<AffiliateLink>, DbError> {
        affiliate_links::insert_affiliate_link(&self.pool, product_id, link)
            .await?
            .map(AffiliateLink::try_from)
            .transpose()
    }

    async fn list_images(&self, product_id: i64) -> Result<Vec<ProductImage>, DbError> {
        Ok(images::list_images(&self.pool, product_id)
            .await?
            .into_iter()
            .map(ProductImage::from)
            .collect())
    }

    async fn insert_image(
        &self,
        product_id: i64,
        image: &NewProductImage,
    ) -> Result<Option<ProductImage>, DbError> {
        Ok(images::insert_image(&self.pool, product_id, image)
            .await?
            .map(ProductImage::from))
    }

    async fn set_primary_image(&self, product_id: i64, image_id: i64) -> Result<(), DbError> {
        images::set_primary_image(&self.pool, product_id, image_id).await
    }

    async fn replace_features(&self, product_id: i64, features: &[Feature]) -> Result<(), DbError> {
        features::replace_features(&self.pool, product_id, features).await
    }

    async fn save_score(
        &self,
        product_id: i64,
        method: ScoringMethod,
        value: f64,
    ) -> Result<(), DbError> {
        scores::upsert_score(&self.pool, product_id, method, value).await
    }
}
