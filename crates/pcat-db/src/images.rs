//! Database operations for `product_images`.

use chrono::{DateTime, Utc};
use pcat_core::{NewProductImage, ProductImage};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `product_images` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductImageRow {
    pub id: i64,
    pub product_id: i64,
    pub source_url: String,
    pub local_path: Option<String>,
    /// SHA-256 of the downloaded bytes.
    pub fingerprint: Option<String>,
    pub is_primary: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

impl From<ProductImageRow> for ProductImage {
    fn from(row: ProductImageRow) -> Self {
        ProductImage {
            id: row.id,
            product_id: row.product_id,
            source_url: row.source_url,
            local_path: row.local_path,
            fingerprint: row.fingerprint,
            is_primary: row.is_primary,
            display_order: row.display_order,
        }
    }
}

/// Stores an image record.
///
/// Returns `Ok(None)` when the product already has an image with the same
/// source URL. A second `is_primary = true` row for the product violates
/// `idx_product_images_one_primary`; use [`set_primary_image`] to move the
/// primary flag instead.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_image(
    pool: &PgPool,
    product_id: i64,
    image: &NewProductImage,
) -> Result<Option<ProductImageRow>, DbError> {
    let row = sqlx::query_as::<_, ProductImageRow>(
        "INSERT INTO product_images \
             (product_id, source_url, local_path, fingerprint, is_primary, display_order) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (product_id, source_url) DO NOTHING \
         RETURNING id, product_id, source_url, local_path, fingerprint, is_primary, \
                   display_order, created_at",
    )
    .bind(product_id)
    .bind(&image.source_url)
    .bind(&image.local_path)
    .bind(&image.fingerprint)
    .bind(image.is_primary)
    .bind(image.display_order)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Lists a product's images in display order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_images(pool: &PgPool, product_id: i64) -> Result<Vec<ProductImageRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductImageRow>(
        "SELECT id, product_id, source_url, local_path, fingerprint, is_primary, \
                display_order, created_at \
         FROM product_images \
         WHERE product_id = $1 \
         ORDER BY display_order, id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Makes `image_id` the only primary image of `product_id`.
///
/// Clears the old primary and sets the new one in one transaction so the
/// one-primary index is never violated.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the image does not belong to the
/// product, or [`DbError::Sqlx`] if either update fails.
pub async fn set_primary_image(pool: &PgPool, product_id: i64, image_id: i64) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE product_images SET is_primary = FALSE \
         WHERE product_id = $1 AND is_primary AND id <> $2",
    )
    .bind(product_id)
    .bind(image_id)
    .execute(&mut *tx)
    .await?;

    let result = sqlx::query(
        "UPDATE product_images SET is_primary = TRUE WHERE id = $1 AND product_id = $2",
    )
    .bind(image_id)
    .bind(product_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(DbError::NotFound);
    }

    tx.commit().await?;
    Ok(())
}
