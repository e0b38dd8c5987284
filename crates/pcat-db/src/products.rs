//! Database operations for `products`.

use chrono::{DateTime, Utc};
use pcat_core::{NewProduct, Product, ProductAttributes, SubScores};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

const PRODUCT_COLUMNS: &str = "id, sku, platform, external_id, category, title, price, rating, \
     review_count, brand, material, color, weave, thread_count, dimensions, description, \
     total_score, popularity_score, brand_reputation_score, overall_value_score, luxury_score, \
     price_value_score, commission_score, derived_sub_scores, product_summary, pretty_title, \
     created_at, updated_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub sku: String,
    pub platform: String,
    pub external_id: String,
    pub category: Option<String>,
    pub title: Option<String>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub brand: Option<String>,
    pub material: Option<String>,
    pub color: Option<String>,
    pub weave: Option<String>,
    pub thread_count: Option<i32>,
    pub dimensions: Option<String>,
    pub description: Option<String>,
    pub total_score: Option<f64>,
    pub popularity_score: Option<f64>,
    pub brand_reputation_score: Option<f64>,
    pub overall_value_score: Option<f64>,
    pub luxury_score: Option<f64>,
    pub price_value_score: Option<f64>,
    pub commission_score: Option<f64>,
    pub derived_sub_scores: Json<SubScores>,
    pub product_summary: Option<String>,
    pub pretty_title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: row.id,
            sku: row.sku,
            platform: row.platform.parse()?,
            external_id: row.external_id,
            category: row.category,
            attributes: ProductAttributes {
                title: row.title,
                price: row.price,
                rating: row.rating,
                review_count: row.review_count,
                brand: row.brand,
                material: row.material,
                color: row.color,
                weave: row.weave,
                thread_count: row.thread_count,
                dimensions: row.dimensions,
                description: row.description,
            },
            sub_scores: SubScores {
                total_score: row.total_score,
                popularity_score: row.popularity_score,
                brand_reputation_score: row.brand_reputation_score,
                overall_value_score: row.overall_value_score,
                luxury_score: row.luxury_score,
                price_value_score: row.price_value_score,
                commission_score: row.commission_score,
            },
            derived_sub_scores: row.derived_sub_scores.0,
            product_summary: row.product_summary,
            pretty_title: row.pretty_title,
        })
    }
}

// ---------------------------------------------------------------------------
// products operations
// ---------------------------------------------------------------------------

/// Fetches the product with the given SKU, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_by_sku(pool: &PgPool, sku: &str) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = $1"
    ))
    .bind(sku)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a product unless its SKU already exists.
///
/// Uses `ON CONFLICT (sku) DO NOTHING`, so a concurrent writer that stored
/// the SKU first makes this return `Ok(None)` instead of failing.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails for any other reason.
pub async fn insert_product(
    pool: &PgPool,
    product: &NewProduct,
) -> Result<Option<ProductRow>, DbError> {
    let a = &product.attributes;
    let s = &product.sub_scores;
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "INSERT INTO products \
             (sku, platform, external_id, category, title, price, rating, review_count, \
              brand, material, color, weave, thread_count, dimensions, description, \
              total_score, popularity_score, brand_reputation_score, overall_value_score, \
              luxury_score, price_value_score, commission_score) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                 $16, $17, $18, $19, $20, $21, $22) \
         ON CONFLICT (sku) DO NOTHING \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(&product.sku)
    .bind(product.platform.as_str())
    .bind(&product.external_id)
    .bind(&product.category)
    .bind(&a.title)
    .bind(a.price)
    .bind(a.rating)
    .bind(a.review_count)
    .bind(&a.brand)
    .bind(&a.material)
    .bind(&a.color)
    .bind(&a.weave)
    .bind(a.thread_count)
    .bind(&a.dimensions)
    .bind(&a.description)
    .bind(s.total_score)
    .bind(s.popularity_score)
    .bind(s.brand_reputation_score)
    .bind(s.overall_value_score)
    .bind(s.luxury_score)
    .bind(s.price_value_score)
    .bind(s.commission_score)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Overwrites the scalar attributes of a product and bumps `updated_at`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_product_attributes(
    pool: &PgPool,
    id: i64,
    attributes: &ProductAttributes,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE products SET \
             title = $1, price = $2, rating = $3, review_count = $4, brand = $5, \
             material = $6, color = $7, weave = $8, thread_count = $9, dimensions = $10, \
             description = $11, updated_at = NOW() \
         WHERE id = $12",
    )
    .bind(&attributes.title)
    .bind(attributes.price)
    .bind(attributes.rating)
    .bind(attributes.review_count)
    .bind(&attributes.brand)
    .bind(&attributes.material)
    .bind(&attributes.color)
    .bind(&attributes.weave)
    .bind(attributes.thread_count)
    .bind(&attributes.dimensions)
    .bind(&attributes.description)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Stores the sub-scores supplied with the product's input.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_product_sub_scores(
    pool: &PgPool,
    id: i64,
    sub_scores: &SubScores,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE products SET \
             total_score = $1, popularity_score = $2, brand_reputation_score = $3, \
             overall_value_score = $4, luxury_score = $5, price_value_score = $6, \
             commission_score = $7, updated_at = NOW() \
         WHERE id = $8",
    )
    .bind(sub_scores.total_score)
    .bind(sub_scores.popularity_score)
    .bind(sub_scores.brand_reputation_score)
    .bind(sub_scores.overall_value_score)
    .bind(sub_scores.luxury_score)
    .bind(sub_scores.price_value_score)
    .bind(sub_scores.commission_score)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Replaces the sub-scores computed by the last scoring pass.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn save_derived_sub_scores(
    pool: &PgPool,
    id: i64,
    sub_scores: &SubScores,
) -> Result<(), DbError> {
    let result =
        sqlx::query("UPDATE products SET derived_sub_scores = $1, updated_at = NOW() WHERE id = $2")
            .bind(Json(sub_scores))
            .bind(id)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Replaces the generated display title.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_product_pretty_title(pool: &PgPool, id: i64, title: &str) -> Result<(), DbError> {
    let result =
        sqlx::query("UPDATE products SET pretty_title = $1, updated_at = NOW() WHERE id = $2")
            .bind(title)
            .bind(id)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Replaces the generated product summary.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_product_summary(pool: &PgPool, id: i64, summary: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE products SET product_summary = $1, updated_at = NOW() WHERE id = $2",
    )
    .bind(summary)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Lists every product ordered by `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(pool: &PgPool) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
