//! Database operations for `pipeline_runs`.
//!
//! A run moves `queued` → `running` → `succeeded` | `failed`. Each transition
//! is a guarded `UPDATE ... WHERE status = <expected>`; a run that is not in
//! the expected state yields [`DbError::InvalidRunTransition`].

use chrono::{DateTime, Utc};
use pcat_core::RunStats;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const RUN_COLUMNS: &str = "id, public_id, source, status, started_at, completed_at, \
     total_candidates, created, duplicate_link_added, duplicate_noop, extraction_errors, \
     storage_errors, image_errors, images_added, enrichment_errors, scoring_errors, \
     error_message, created_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `pipeline_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PipelineRunRow {
    pub id: i64,
    pub public_id: Uuid,
    /// Input file the run was started from.
    pub source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_candidates: i32,
    pub created: i32,
    pub duplicate_link_added: i32,
    pub duplicate_noop: i32,
    pub extraction_errors: i32,
    pub storage_errors: i32,
    pub image_errors: i32,
    pub images_added: i32,
    pub enrichment_errors: i32,
    pub scoring_errors: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn count(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Creates a new run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_pipeline_run(pool: &PgPool, source: &str) -> Result<PipelineRunRow, DbError> {
    let row = sqlx::query_as::<_, PipelineRunRow>(&format!(
        "INSERT INTO pipeline_runs (public_id, source, status) \
         VALUES ($1, $2, 'queued') \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `queued`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn start_pipeline_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE pipeline_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded` and records its final counters.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_pipeline_run(pool: &PgPool, id: i64, stats: &RunStats) -> Result<(), DbError> {
    finish_run(pool, id, "succeeded", stats, None).await
}

/// Marks a run as `failed` with `error_message` and the counters reached
/// before the failure.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn fail_pipeline_run(
    pool: &PgPool,
    id: i64,
    stats: &RunStats,
    error_message: &str,
) -> Result<(), DbError> {
    finish_run(pool, id, "failed", stats, Some(error_message)).await
}

async fn finish_run(
    pool: &PgPool,
    id: i64,
    status: &str,
    stats: &RunStats,
    error_message: Option<&str>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE pipeline_runs SET \
             status = $1, completed_at = NOW(), \
             total_candidates = $2, created = $3, duplicate_link_added = $4, \
             duplicate_noop = $5, extraction_errors = $6, storage_errors = $7, \
             image_errors = $8, images_added = $9, enrichment_errors = $10, \
             scoring_errors = $11, error_message = $12 \
         WHERE id = $13 AND status = 'running'",
    )
    .bind(status)
    .bind(count(stats.total_candidates))
    .bind(count(stats.created))
    .bind(count(stats.duplicate_link_added))
    .bind(count(stats.duplicate_noop))
    .bind(count(stats.extraction_errors))
    .bind(count(stats.storage_errors))
    .bind(count(stats.image_errors))
    .bind(count(stats.images_added))
    .bind(count(stats.enrichment_errors))
    .bind(count(stats.scoring_errors))
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Fetches a run by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no run has `id`, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_pipeline_run(pool: &PgPool, id: i64) -> Result<PipelineRunRow, DbError> {
    sqlx::query_as::<_, PipelineRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM pipeline_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Lists the most recent runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_pipeline_runs(pool: &PgPool, limit: i64) -> Result<Vec<PipelineRunRow>, DbError> {
    let rows = sqlx::query_as::<_, PipelineRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM pipeline_runs ORDER BY created_at DESC, id DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
