//! Database operations for `product_features`.

use chrono::{DateTime, Utc};
use pcat_core::Feature;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `product_features` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeatureRow {
    pub id: i64,
    pub product_id: i64,
    pub feature_text: String,
    pub polarity: String,
    pub category: String,
    pub importance: String,
    pub impact_score: f64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<FeatureRow> for Feature {
    type Error = DbError;

    fn try_from(row: FeatureRow) -> Result<Self, Self::Error> {
        Ok(Feature {
            text: row.feature_text,
            polarity: row.polarity.parse()?,
            category: row.category.parse()?,
            importance: row.importance.parse()?,
            impact_score: row.impact_score,
        })
    }
}

/// Replaces a product's features with `features` in one transaction.
///
/// Readers see either the old set or the new set, never a mix.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction is
/// rolled back on drop.
pub async fn replace_features(
    pool: &PgPool,
    product_id: i64,
    features: &[Feature],
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM product_features WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

    for feature in features {
        sqlx::query(
            "INSERT INTO product_features \
                 (product_id, feature_text, polarity, category, importance, impact_score) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(product_id)
        .bind(&feature.text)
        .bind(feature.polarity.as_str())
        .bind(feature.category.as_str())
        .bind(feature.importance.as_str())
        .bind(feature.impact_score)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Lists a product's features in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_features(pool: &PgPool, product_id: i64) -> Result<Vec<FeatureRow>, DbError> {
    let rows = sqlx::query_as::<_, FeatureRow>(
        "SELECT id, product_id, feature_text, polarity, category, importance, impact_score, \
                created_at \
         FROM product_features \
         WHERE product_id = $1 \
         ORDER BY id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
