//! Database operations for `product_scores`.

use chrono::{DateTime, Utc};
use pcat_core::ScoringMethod;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `product_scores` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductScoreRow {
    pub id: i64,
    pub product_id: i64,
    pub method: String,
    pub score: f64,
    pub computed_at: DateTime<Utc>,
}

/// Stores `score` as the product's value for `method`, overwriting any
/// earlier value.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_score(
    pool: &PgPool,
    product_id: i64,
    method: ScoringMethod,
    score: f64,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO product_scores (product_id, method, score) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (product_id, method) DO UPDATE SET \
             score       = EXCLUDED.score, \
             computed_at = NOW()",
    )
    .bind(product_id)
    .bind(method.as_str())
    .bind(score)
    .execute(pool)
    .await?;

    Ok(())
}

/// Lists every stored score of a product.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scores(pool: &PgPool, product_id: i64) -> Result<Vec<ProductScoreRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductScoreRow>(
        "SELECT id, product_id, method, score, computed_at \
         FROM product_scores \
         WHERE product_id = $1 \
         ORDER BY method",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
