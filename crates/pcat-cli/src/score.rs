//! `pcat score`, `pcat methods` and `pcat categorize`.

use anyhow::Context;
use pcat_core::{AppConfig, Polarity, ScoringMethod};
use pcat_scoring::Categorizer;

/// Rescore every stored product with the configured method, or `method`
/// when given.
///
/// # Errors
///
/// Returns an error if the scoring config is missing, lacks what `method`
/// needs, or if the database is unreachable.
pub(crate) async fn run_score(
    config: &AppConfig,
    method: Option<ScoringMethod>,
) -> anyhow::Result<()> {
    let mut scoring = pcat_core::load_scoring_config(&config.scoring_config_path)
        .with_context(|| {
            format!(
                "failed to load scoring config from {}",
                config.scoring_config_path.display()
            )
        })?;
    if let Some(method) = method {
        scoring = scoring
            .with_method(method)
            .with_context(|| format!("scoring config cannot be used with {method}"))?;
    }

    let pool = pcat_db::connect_pool_from_config(config)
        .await
        .context("failed to connect to database")?;
    let store = pcat_db::PgCatalogStore::new(pool);
    let report = pcat_ingest::rescore_all(&store, &scoring).await?;

    println!(
        "method={} scored={} skipped={} failed={}",
        scoring.method, report.scored, report.skipped, report.failed
    );
    Ok(())
}

/// Print every scoring method with its formula, marking the configured one.
pub(crate) fn run_methods(config: &AppConfig) {
    let active = match pcat_core::load_scoring_config(&config.scoring_config_path) {
        Ok(scoring) => Some(scoring.method),
        Err(e) => {
            tracing::debug!(error = %e, "no usable scoring config; no active method shown");
            None
        }
    };
    for method in ScoringMethod::ALL {
        let marker = if Some(method) == active { "*" } else { " " };
        println!("{marker} {:<24} {}", method.as_str(), method.formula());
    }
}

/// Categorize `text` and print the resulting feature as JSON.
///
/// # Errors
///
/// Returns an error if the vocabulary cannot be loaded.
pub(crate) fn run_categorize(config: &AppConfig, text: &str, con: bool) -> anyhow::Result<()> {
    let vocabulary = pcat_core::load_vocabulary(config.vocabulary_path.as_deref())
        .context("failed to load vocabulary")?;
    let categorizer = Categorizer::new(vocabulary);
    let feature = if con {
        categorizer.categorize(text, Polarity::Con)
    } else {
        categorizer.categorize_inferred(text)
    };
    println!("{}", serde_json::to_string_pretty(&feature)?);
    Ok(())
}
