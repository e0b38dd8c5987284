//! Feature categorizer: assigns a category, importance tier and signed
//! impact score to a free-text pro or con.

use pcat_core::vocabulary::NormalizedText;
use pcat_core::{Feature, FeatureCategory, Importance, Polarity, Vocabulary};

/// Magnitude of the impact score for an importance tier.
#[must_use]
pub fn impact_magnitude(importance: Importance) -> f64 {
    match importance {
        Importance::Critical => 1.0,
        Importance::High => 0.75,
        Importance::Medium => 0.5,
        Importance::Low => 0.25,
        Importance::Minor => 0.1,
    }
}

/// Signed impact score: positive for pros, negative for cons.
#[must_use]
pub fn impact_score(importance: Importance, polarity: Polarity) -> f64 {
    let magnitude = impact_magnitude(importance);
    match polarity {
        Polarity::Pro => magnitude,
        Polarity::Con => -magnitude,
    }
}

#[derive(Debug, Clone)]
pub struct Categorizer {
    vocabulary: Vocabulary,
}

impl Categorizer {
    #[must_use]
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Categorize `text` as a feature of the given polarity.
    #[must_use]
    pub fn categorize(&self, text: &str, polarity: Polarity) -> Feature {
        let normalized = NormalizedText::new(text);
        let importance = self.importance_of(&normalized);
        Feature {
            text: text.trim().to_string(),
            polarity,
            category: self.category_of(&normalized),
            importance,
            impact_score: impact_score(importance, polarity),
        }
    }

    /// Categorize `text`, inferring its polarity from the pro/con markers.
    #[must_use]
    pub fn categorize_inferred(&self, text: &str) -> Feature {
        self.categorize(text, self.classify_polarity(text))
    }

    /// First category, in declaration order, with a keyword present in the
    /// text. Falls back to [`FeatureCategory::General`].
    #[must_use]
    pub fn category_of(&self, text: &NormalizedText) -> FeatureCategory {
        FeatureCategory::ALL
            .into_iter()
            .find(|c| text.contains_any(self.vocabulary.category_keywords(*c)))
            .unwrap_or(FeatureCategory::General)
    }

    /// Most important tier with a keyword present in the text. Falls back to
    /// [`Importance::Medium`].
    #[must_use]
    pub fn importance_of(&self, text: &NormalizedText) -> Importance {
        Importance::ALL
            .into_iter()
            .find(|i| text.contains_any(self.vocabulary.importance_keywords(*i)))
            .unwrap_or(Importance::Medium)
    }

    /// Count pro and con markers; con only wins with strictly more hits.
    #[must_use]
    pub fn classify_polarity(&self, text: &str) -> Polarity {
        let normalized = NormalizedText::new(text);
        let markers = &self.vocabulary.polarity;
        let pros = normalized.count_matches(&markers.pro);
        let cons = normalized.count_matches(&markers.con);
        if cons > pros {
            Polarity::Con
        } else {
            Polarity::Pro
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categorizer() -> Categorizer {
        Categorizer::new(Vocabulary::builtin().unwrap())
    }

    #[test]
    fn very_durable_stitching_is_medium_durability() {
        let feature = categorizer().categorize("very durable stitching", Polarity::Pro);
        assert_eq!(feature.category, FeatureCategory::Durability);
        assert_eq!(feature.importance, Importance::Medium);
        assert_eq!(feature.impact_score, impact_magnitude(Importance::Medium));
        assert!(feature.impact_score > 0.0);
    }

    #[test]
    fn unmatched_text_defaults_to_general_medium() {
        let feature = categorizer().categorize("zxqv", Polarity::Con);
        assert_eq!(feature.category, FeatureCategory::General);
        assert_eq!(feature.importance, Importance::Medium);
    }

    #[test]
    fn shipping_keywords() {
        let feature = categorizer().categorize("arrived on a tuesday", Polarity::Pro);
        assert_eq!(feature.category, FeatureCategory::Shipping);
    }

    #[test]
    fn first_category_in_declaration_order_wins() {
        // "price" (Price) and "soft" (Comfort) both match; Price is declared first.
        let feature = categorizer().categorize("soft sheets at a fair price", Polarity::Pro);
        assert_eq!(feature.category, FeatureCategory::Price);
    }

    #[test]
    fn critical_keywords_take_precedence() {
        let c = categorizer();
        let text = NormalizedText::new("a minor annoyance but a deal-breaker for hot sleepers");
        assert_eq!(c.importance_of(&text), Importance::Critical);
    }

    #[test]
    fn importance_tiers_from_keywords() {
        let c = categorizer();
        assert_eq!(
            c.importance_of(&NormalizedText::new("extremely breathable")),
            Importance::High
        );
        assert_eq!(
            c.importance_of(&NormalizedText::new("slightly thin")),
            Importance::Low
        );
        assert_eq!(
            c.importance_of(&NormalizedText::new("negligible lint")),
            Importance::Minor
        );
    }

    #[test]
    fn impact_sign_matches_polarity_for_every_combination() {
        for importance in Importance::ALL {
            assert!(impact_score(importance, Polarity::Pro) >= 0.0);
            assert!(impact_score(importance, Polarity::Con) <= 0.0);
            assert!(impact_score(importance, Polarity::Pro) <= 1.0);
            assert!(impact_score(importance, Polarity::Con) >= -1.0);
        }
        let c = categorizer();
        for category in FeatureCategory::ALL {
            let keyword = c
                .vocabulary()
                .category_keywords(category)
                .first()
                .cloned()
                .unwrap_or_default();
            for polarity in [Polarity::Pro, Polarity::Con] {
                let feature = c.categorize(&format!("terrible {keyword}"), polarity);
                match polarity {
                    Polarity::Pro => assert!(feature.impact_score >= 0.0),
                    Polarity::Con => assert!(feature.impact_score <= 0.0),
                }
            }
        }
    }

    #[test]
    fn impact_magnitude_is_monotonic() {
        let magnitudes: Vec<f64> = Importance::ALL.into_iter().map(impact_magnitude).collect();
        assert!(magnitudes.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(magnitudes[0], 1.0);
        assert_eq!(magnitudes[4], 0.1);
    }

    #[test]
    fn polarity_con_needs_strictly_more_con_markers() {
        let c = categorizer();
        assert_eq!(
            c.classify_polarity("sheets started pilling and feel scratchy"),
            Polarity::Con
        );
        assert_eq!(c.classify_polarity("soft but thin"), Polarity::Pro);
        assert_eq!(c.classify_polarity("queen size"), Polarity::Pro);
    }

    #[test]
    fn categorize_inferred_signs_cons_negative() {
        let feature = categorizer().categorize_inferred("Disappointed, the seams ripped");
        assert_eq!(feature.polarity, Polarity::Con);
        assert_eq!(feature.category, FeatureCategory::Durability);
        assert!(feature.impact_score < 0.0);
    }
}
