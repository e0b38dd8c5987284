//! Database operations for `affiliate_links`.

use chrono::{DateTime, Utc};
use pcat_core::{AffiliateLink, NewAffiliateLink};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `affiliate_links` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AffiliateLinkRow {
    pub id: i64,
    pub product_id: i64,
    pub platform: String,
    pub link_type: String,
    pub url: String,
    /// `NUMERIC(6,4)`: fractional commission, e.g. `0.0450` for 4.5 %.
    pub commission_rate: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AffiliateLinkRow> for AffiliateLink {
    type Error = DbError;

    fn try_from(row: AffiliateLinkRow) -> Result<Self, Self::Error> {
        Ok(AffiliateLink {
            id: row.id,
            product_id: row.product_id,
            platform: row.platform.parse()?,
            link_type: row.link_type.parse()?,
            url: row.url,
            commission_rate: row.commission_rate.and_then(|d| d.to_f64()),
            notes: row.notes,
        })
    }
}

/// Converts a fractional commission rate to the stored `NUMERIC(6,4)` value.
///
/// # Errors
///
/// Returns [`DbError::InvalidCommissionRate`] for non-finite values or
/// values outside `0..100`.
pub fn commission_to_decimal(rate: f64) -> Result<Decimal, DbError> {
    if !rate.is_finite() || !(0.0..100.0).contains(&rate) {
        return Err(DbError::InvalidCommissionRate(rate));
    }
    Decimal::try_from(rate)
        .map(|d| d.round_dp(4))
        .map_err(|_| DbError::InvalidCommissionRate(rate))
}

/// Attaches a link to a product.
///
/// Returns `Ok(None)` when the product already has a link with the same
/// platform and link type (`ON CONFLICT ... DO NOTHING`).
///
/// # Errors
///
/// Returns [`DbError::InvalidCommissionRate`] for an unstorable rate or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn insert_affiliate_link(
    pool: &PgPool,
    product_id: i64,
    link: &NewAffiliateLink,
) -> Result<Option<AffiliateLinkRow>, DbError> {
    let commission_rate = link
        .commission_rate
        .map(commission_to_decimal)
        .transpose()?;

    let row = sqlx::query_as::<_, AffiliateLinkRow>(
        "INSERT INTO affiliate_links \
             (product_id, platform, link_type, url, commission_rate, notes) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (product_id, platform, link_type) DO NOTHING \
         RETURNING id, product_id, platform, link_type, url, commission_rate, notes, created_at",
    )
    .bind(product_id)
    .bind(link.platform.as_str())
    .bind(link.link_type.as_str())
    .bind(&link.url)
    .bind(commission_rate)
    .bind(&link.notes)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Lists a product's links ordered by `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_affiliate_links(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<AffiliateLinkRow>, DbError> {
    let rows = sqlx::query_as::<_, AffiliateLinkRow>(
        "SELECT id, product_id, platform, link_type, url, commission_rate, notes, created_at \
         FROM affiliate_links \
         WHERE product_id = $1 \
         ORDER BY id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
