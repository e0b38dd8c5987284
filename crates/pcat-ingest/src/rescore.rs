//! Scoring pass over stored products.

use pcat_core::{CatalogStore, Product, ScoringConfig};
use pcat_scoring::{compute_score, derive_sub_scores, ScoreInput, ScoringError};

use crate::error::IngestError;

/// Counters for one [`rescore_all`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescoreReport {
    pub scored: usize,
    /// Products the active method cannot score (e.g. no price).
    pub skipped: usize,
    /// Products whose score could not be written.
    pub failed: usize,
}

/// Derive the product's sub-scores from its supplied values and current
/// attributes, persist them if they changed, then compute and store its
/// score for `config.method`.
///
/// Derived values live apart from supplied ones and are recomputed on every
/// pass, so a price or rating change moves the bands with it.
///
/// # Errors
///
/// Returns [`IngestError::Scoring`] if the product cannot be scored and
/// [`IngestError::Store`] if a write fails.
pub async fn score_product<S: CatalogStore>(
    store: &S,
    product: &Product,
    config: &ScoringConfig,
) -> Result<f64, IngestError> {
    let links = store
        .list_links(product.id)
        .await
        .map_err(IngestError::store)?;
    let mut input = ScoreInput::from(product);
    input.commission_rate = links
        .iter()
        .filter_map(|l| l.commission_rate)
        .filter(|r| r.is_finite())
        .reduce(f64::max);

    let derived = derive_sub_scores(&input, config);
    if derived != product.derived_sub_scores {
        store
            .save_derived_sub_scores(product.id, &derived)
            .await
            .map_err(IngestError::store)?;
    }
    input.sub_scores = derived;

    let value = compute_score(&input, config.method, config)?;
    store
        .save_score(product.id, config.method, value)
        .await
        .map_err(IngestError::store)?;
    tracing::debug!(sku = %product.sku, method = %config.method, score = value, "product scored");
    Ok(value)
}

/// Recompute and overwrite every stored product's score for
/// `config.method`.
///
/// # Errors
///
/// Returns [`IngestError::Scoring`] with a config error if the method's
/// configuration is incomplete, which would fail every product alike, and
/// [`IngestError::Store`] if the products cannot be listed.
pub async fn rescore_all<S: CatalogStore>(
    store: &S,
    config: &ScoringConfig,
) -> Result<RescoreReport, IngestError> {
    let products = store.list_products().await.map_err(IngestError::store)?;
    let mut report = RescoreReport::default();

    for product in &products {
        match score_product(store, product, config).await {
            Ok(_) => report.scored += 1,
            Err(IngestError::Scoring(e @ ScoringError::Validation { .. })) => {
                tracing::warn!(sku = %product.sku, error = %e, "skipping product");
                report.skipped += 1;
            }
            Err(IngestError::Scoring(e @ ScoringError::Config(_))) => {
                return Err(IngestError::Scoring(e));
            }
            Err(e) => {
                tracing::error!(sku = %product.sku, error = %e, "failed to store score");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        method = %config.method,
        scored = report.scored,
        skipped = report.skipped,
        failed = report.failed,
        "scoring pass complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pcat_core::{
        InsertOutcome, LinkType, NewAffiliateLink, NewProduct, Platform, ProductAttributes,
        ScoreComponent, ScoringMethod, SubScores,
    };

    use super::*;
    use crate::memory::MemoryStore;

    async fn seed(store: &MemoryStore, sku: &str, price: Option<f64>, rating: Option<f64>) -> i64 {
        let outcome = store
            .insert_product(&NewProduct {
                sku: sku.to_string(),
                platform: Platform::Amazon,
                external_id: sku.trim_start_matches("AMZ-").to_string(),
                category: None,
                attributes: ProductAttributes {
                    price,
                    rating,
                    ..ProductAttributes::default()
                },
                sub_scores: SubScores::default(),
            })
            .await
            .unwrap();
        match outcome {
            InsertOutcome::Inserted(product) => product.id,
            InsertOutcome::AlreadyExists => panic!("{sku} already stored"),
        }
    }

    #[tokio::test]
    async fn price_based_pass_skips_products_without_price() {
        let store = MemoryStore::new();
        let priced = seed(&store, "AMZ-B08M9SMVSG", Some(49.99), Some(4.5)).await;
        let unpriced = seed(&store, "AMZ-B000000001", None, Some(4.0)).await;

        let report = rescore_all(&store, &ScoringConfig::bare(ScoringMethod::PriceBased))
            .await
            .unwrap();

        assert_eq!(
            report,
            RescoreReport {
                scored: 1,
                skipped: 1,
                failed: 0
            }
        );
        assert_eq!(store.score(priced, ScoringMethod::PriceBased), Some(49.99));
        assert_eq!(store.score(unpriced, ScoringMethod::PriceBased), None);
    }

    #[tokio::test]
    async fn missing_weights_abort_the_pass() {
        let store = MemoryStore::new();
        seed(&store, "AMZ-B08M9SMVSG", Some(49.99), Some(4.5)).await;

        let err = rescore_all(&store, &ScoringConfig::bare(ScoringMethod::WeightedComposite))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Scoring(ScoringError::Config(_))));
    }

    #[tokio::test]
    async fn derived_sub_scores_are_persisted_before_scoring() {
        let store = MemoryStore::new();
        let id = seed(&store, "AMZ-B08M9SMVSG", Some(49.99), Some(4.5)).await;
        let mut config = ScoringConfig::bare(ScoringMethod::WeightedComposite);
        config.weights.insert(
            ScoringMethod::WeightedComposite,
            HashMap::from([
                (ScoreComponent::TotalScore, 1.0),
                (ScoreComponent::PopularityScore, 0.0),
                (ScoreComponent::BrandReputationScore, 0.0),
                (ScoreComponent::OverallValueScore, 0.0),
                (ScoreComponent::LuxuryScore, 0.0),
            ]),
        );

        rescore_all(&store, &config).await.unwrap();

        let product = store.list_products().await.unwrap().remove(0);
        let total = product
            .derived_sub_scores
            .total_score
            .expect("derived from rating");
        assert_eq!(
            store.score(id, ScoringMethod::WeightedComposite),
            Some(total)
        );
        assert_eq!(product.sub_scores, SubScores::default());
    }

    #[tokio::test]
    async fn price_change_moves_derived_luxury_score() {
        let store = MemoryStore::new();
        let id = seed(&store, "AMZ-B08M9SMVSG", Some(49.99), Some(4.5)).await;
        let config = ScoringConfig::bare(ScoringMethod::LuxuryPremium);

        rescore_all(&store, &config).await.unwrap();
        let before = store.score(id, ScoringMethod::LuxuryPremium).unwrap();
        let product = store.list_products().await.unwrap().remove(0);
        assert_eq!(product.derived_sub_scores.luxury_score, Some(2.5));
        // 2.5 * 2 + 5.0 * 1.5 + 5.0
        assert!((before - 17.5).abs() < 1e-9);

        let mut attributes = product.attributes.clone();
        attributes.price = Some(300.0);
        store.update_attributes(id, &attributes).await.unwrap();
        rescore_all(&store, &config).await.unwrap();

        let product = store.list_products().await.unwrap().remove(0);
        assert_eq!(product.derived_sub_scores.luxury_score, Some(5.0));
        let after = store.score(id, ScoringMethod::LuxuryPremium).unwrap();
        // 5.0 * 2 + 5.0 * 1.5 + 5.0
        assert!((after - 22.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn supplied_sub_scores_win_over_bands() {
        let store = MemoryStore::new();
        let id = seed(&store, "AMZ-B08M9SMVSG", Some(49.99), Some(4.5)).await;
        store
            .update_sub_scores(
                id,
                &SubScores {
                    luxury_score: Some(4.0),
                    ..SubScores::default()
                },
            )
            .await
            .unwrap();

        rescore_all(&store, &ScoringConfig::bare(ScoringMethod::LuxuryPremium))
            .await
            .unwrap();

        let product = store.list_products().await.unwrap().remove(0);
        assert_eq!(product.sub_scores.luxury_score, Some(4.0));
        assert_eq!(product.derived_sub_scores.luxury_score, Some(4.0));
    }

    #[tokio::test]
    async fn commission_score_reads_best_link_rate() {
        let store = MemoryStore::new();
        let id = seed(&store, "AMZ-B08M9SMVSG", Some(49.99), Some(4.5)).await;
        for (link_type, rate) in [(LinkType::Web, 0.04), (LinkType::Mobile, 0.16)] {
            store
                .insert_link(
                    id,
                    &NewAffiliateLink {
                        platform: Platform::Amazon,
                        link_type,
                        url: format!("https://amzn.to/{rate}"),
                        commission_rate: Some(rate),
                        notes: None,
                    },
                )
                .await
                .unwrap();
        }

        rescore_all(&store, &ScoringConfig::bare(ScoringMethod::PriceBased))
            .await
            .unwrap();

        let product = store.list_products().await.unwrap().remove(0);
        assert_eq!(product.derived_sub_scores.commission_score, Some(5.0));
    }
}
