//! Fallback bands for sub-scores a product does not carry yet.
//!
//! Freshly scraped products only have price, rating, review count and the
//! commission rate of their links; these bands turn those into the 0–5
//! sub-scores the composite methods read. Supplied values are never replaced.

use pcat_core::{ScoringConfig, SubScores};

use crate::engine::ScoreInput;

const DEFAULT_LUXURY_MIN: f64 = 250.0;
const DEFAULT_PREMIUM_MIN: f64 = 150.0;
const DEFAULT_MID_RANGE_MIN: f64 = 50.0;

/// Fill missing sub-scores of `input` from its price, rating, review count and
/// commission rate.
///
/// A band is only applied when its own inputs are present; otherwise the
/// sub-score stays `None`. The commission band falls back to the configured
/// default rate, so it is always filled.
#[must_use]
pub fn derive_sub_scores(input: &ScoreInput, config: &ScoringConfig) -> SubScores {
    let existing = input.sub_scores;
    let rating = input.rating.filter(|r| r.is_finite());
    let price = input.price.filter(|p| p.is_finite());

    SubScores {
        total_score: existing.total_score.or_else(|| rating.map(rating_band)),
        brand_reputation_score: existing
            .brand_reputation_score
            .or_else(|| rating.map(rating_band)),
        popularity_score: existing
            .popularity_score
            .or_else(|| input.review_count.map(|c| review_count_band(c, config))),
        overall_value_score: existing
            .overall_value_score
            .or_else(|| Some(price_rating_band(rating?, price?))),
        luxury_score: existing
            .luxury_score
            .or_else(|| price.map(|p| price_band(p, config))),
        price_value_score: existing
            .price_value_score
            .or_else(|| Some(price_rating_band(rating?, price?))),
        commission_score: existing
            .commission_score
            .or_else(|| Some(commission_band(input.commission_rate, config))),
    }
}

fn rating_band(rating: f64) -> f64 {
    if rating >= 4.5 {
        5.0
    } else if rating >= 4.0 {
        4.5
    } else if rating >= 3.5 {
        3.5
    } else if rating >= 3.0 {
        3.0
    } else {
        2.5
    }
}

fn review_count_band(review_count: i64, config: &ScoringConfig) -> f64 {
    let t = config.sub_scores.review_count_thresholds;
    if review_count >= t.very_high {
        5.0
    } else if review_count >= t.high {
        4.5
    } else if review_count >= t.moderate {
        4.0
    } else if review_count >= t.low {
        3.5
    } else {
        2.5
    }
}

pub(crate) fn price_rating_band(rating: f64, price: f64) -> f64 {
    if rating >= 4.0 && price < 100.0 {
        5.0
    } else if rating >= 4.0 && price < 150.0 {
        4.5
    } else if rating >= 3.5 && price < 200.0 {
        4.0
    } else {
        3.0
    }
}

fn commission_band(rate: Option<f64>, config: &ScoringConfig) -> f64 {
    let sub_scores = &config.sub_scores;
    let rate = rate
        .filter(|r| r.is_finite())
        .unwrap_or(sub_scores.default_commission_rate);
    let t = sub_scores.commission_thresholds;
    if rate >= t.excellent {
        5.0
    } else if rate >= t.good {
        4.5
    } else if rate >= t.fair {
        4.0
    } else {
        3.0
    }
}

fn tier_min(config: &ScoringConfig, name: &str, default: f64) -> f64 {
    config
        .price_tiers
        .tiers
        .get(name)
        .map_or(default, |t| t.min_price)
}

fn price_band(price: f64, config: &ScoringConfig) -> f64 {
    if price >= tier_min(config, "luxury", DEFAULT_LUXURY_MIN) {
        5.0
    } else if price >= tier_min(config, "premium", DEFAULT_PREMIUM_MIN) {
        4.5
    } else if price >= tier_min(config, "mid_range", DEFAULT_MID_RANGE_MIN) {
        3.5
    } else {
        2.5
    }
}

#[cfg(test)]
mod tests {
    use pcat_core::ScoringMethod;

    use super::*;

    fn config() -> ScoringConfig {
        ScoringConfig::bare(ScoringMethod::WeightedComposite)
    }

    #[test]
    fn fills_all_bands_from_scraped_fields() {
        let input = ScoreInput {
            price: Some(49.99),
            rating: Some(4.5),
            review_count: Some(1200),
            ..ScoreInput::default()
        };
        let scores = derive_sub_scores(&input, &config());
        assert_eq!(scores.total_score, Some(5.0));
        assert_eq!(scores.brand_reputation_score, Some(5.0));
        assert_eq!(scores.popularity_score, Some(4.0));
        assert_eq!(scores.overall_value_score, Some(5.0));
        assert_eq!(scores.luxury_score, Some(2.5));
        assert_eq!(scores.price_value_score, Some(5.0));
        assert_eq!(scores.commission_score, Some(4.5));
    }

    #[test]
    fn keeps_existing_values() {
        let input = ScoreInput {
            rating: Some(2.0),
            sub_scores: SubScores {
                total_score: Some(4.8),
                ..SubScores::default()
            },
            ..ScoreInput::default()
        };
        let scores = derive_sub_scores(&input, &config());
        assert_eq!(scores.total_score, Some(4.8));
        assert_eq!(scores.brand_reputation_score, Some(2.5));
    }

    #[test]
    fn missing_inputs_leave_only_commission_filled() {
        let scores = derive_sub_scores(&ScoreInput::default(), &config());
        assert_eq!(
            scores,
            SubScores {
                commission_score: Some(4.5),
                ..SubScores::default()
            }
        );
    }

    #[test]
    fn commission_band_edges() {
        let config = config();
        assert_eq!(commission_band(Some(0.20), &config), 5.0);
        assert_eq!(commission_band(Some(0.15), &config), 5.0);
        assert_eq!(commission_band(Some(0.12), &config), 4.5);
        assert_eq!(commission_band(Some(0.05), &config), 4.0);
        assert_eq!(commission_band(Some(0.01), &config), 3.0);
        assert_eq!(commission_band(None, &config), 4.5);
        assert_eq!(commission_band(Some(f64::NAN), &config), 4.5);
    }

    #[test]
    fn luxury_band_follows_price_changes() {
        let config = config();
        let cheap = ScoreInput {
            price: Some(49.99),
            ..ScoreInput::default()
        };
        let dear = ScoreInput {
            price: Some(300.0),
            ..ScoreInput::default()
        };
        assert_eq!(derive_sub_scores(&cheap, &config).luxury_score, Some(2.5));
        assert_eq!(derive_sub_scores(&dear, &config).luxury_score, Some(5.0));
    }

    #[test]
    fn value_band_needs_both_price_and_rating() {
        let input = ScoreInput {
            price: Some(20.0),
            ..ScoreInput::default()
        };
        assert!(derive_sub_scores(&input, &config())
            .overall_value_score
            .is_none());
    }

    #[test]
    fn luxury_band_uses_configured_tier_boundaries() {
        let mut config = config();
        config.price_tiers.tiers.insert(
            "luxury".to_string(),
            pcat_core::PriceTier {
                min_price: 400.0,
                max_price: None,
                luxury_multiplier: 1.5,
            },
        );
        assert_eq!(price_band(300.0, &config), 4.5);
        assert_eq!(price_band(400.0, &config), 5.0);
    }

    #[test]
    fn review_count_band_edges() {
        let config = config();
        assert_eq!(review_count_band(5000, &config), 5.0);
        assert_eq!(review_count_band(4999, &config), 4.5);
        assert_eq!(review_count_band(500, &config), 3.5);
        assert_eq!(review_count_band(0, &config), 2.5);
    }
}
