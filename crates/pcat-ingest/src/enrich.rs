//! Derived product text: the display title, the one-sentence summary and
//! categorized pros/cons. All are regenerated from stored attributes on
//! every pass.

use pcat_core::vocabulary::NormalizedText;
use pcat_core::{Feature, Product, Vocabulary};
use pcat_scoring::Categorizer;

/// Maximum number of features stored per product.
pub const MAX_FEATURES: usize = 10;

/// Brands at least this long are left out of the summary.
const MAX_BRAND_LEN: usize = 30;

const MAX_TITLE_WORDS: usize = 10;
/// Thread counts below this are not worth naming in a title.
const TITLE_THREAD_COUNT_MIN: i32 = 400;
/// Storefront placeholders that are not real brands.
const PLACEHOLDER_BRANDS: [&str; 3] = ["unknown", "generic", "amazon"];
const BRAND_SUFFIXES: [&str; 3] = ["collection", "home", "brand"];
/// Sizes too common to be worth naming in a title.
const UNMARKED_SIZES: [&str; 2] = ["Queen", "Standard"];

/// Review- or price-based phrase describing the product's value.
///
/// Review phrases need both a rating and a review count; when neither
/// review band applies, the price decides.
#[must_use]
pub fn value_indicator(
    price: Option<f64>,
    rating: Option<f64>,
    review_count: Option<i64>,
) -> Option<&'static str> {
    let (Some(rating), Some(reviews)) = (rating, review_count.filter(|n| *n > 0)) else {
        return None;
    };
    if rating >= 4.5 && reviews >= 1000 {
        return Some("with excellent reviews");
    }
    if rating >= 4.0 && reviews >= 500 {
        return Some("with great reviews");
    }
    if rating >= 3.5 && reviews >= 100 {
        return Some("with good reviews");
    }
    match price.filter(|p| *p > 0.0) {
        Some(p) if p < 30.0 => Some("at an affordable price"),
        Some(p) if p < 60.0 => Some("at a mid-range price"),
        Some(p) if p >= 100.0 => Some("at a premium price"),
        _ => None,
    }
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Compose a one-sentence summary from the product's material, weave,
/// color, dimensions, value indicator and brand. Returns `None` when the
/// product has neither a title nor any of those attributes.
#[must_use]
pub fn compose_summary(product: &Product) -> Option<String> {
    let attrs = &product.attributes;
    let noun = present(product.category.as_ref()).unwrap_or("product");
    let descriptors: Vec<&str> = [present(attrs.material.as_ref()), present(attrs.weave.as_ref())]
        .into_iter()
        .flatten()
        .collect();
    let color = present(attrs.color.as_ref());
    let dimensions = present(attrs.dimensions.as_ref());
    let value = value_indicator(attrs.price, attrs.rating, attrs.review_count);
    let brand = present(attrs.brand.as_ref()).filter(|b| b.chars().count() < MAX_BRAND_LEN);

    if descriptors.is_empty() && color.is_none() && dimensions.is_none() && value.is_none() {
        return present(attrs.title.as_ref()).map(|title| match brand {
            Some(brand) => format!("{title} by {brand}."),
            None => format!("{title}."),
        });
    }

    let mut sentence = if descriptors.is_empty() {
        format!("A {noun}")
    } else {
        format!("A {} {noun}", descriptors.join(" "))
    };
    if let Some(color) = color {
        sentence.push_str(&format!(" in {color}"));
    }
    if let Some(dimensions) = dimensions {
        sentence.push_str(&format!(", {dimensions}"));
    }
    if let Some(value) = value {
        sentence.push_str(&format!(" {value}"));
    }
    if let Some(brand) = brand {
        sentence.push_str(&format!(" by {brand}"));
    }
    sentence.push('.');
    Some(sentence)
}

fn title_brand(brand: &str) -> Option<String> {
    let brand = brand.trim();
    let lower = brand.to_lowercase();
    if brand.is_empty()
        || lower.starts_with("visit the")
        || PLACEHOLDER_BRANDS.contains(&lower.as_str())
    {
        return None;
    }
    let mut words: Vec<&str> = brand.split_whitespace().collect();
    if words.len() > 1
        && words
            .last()
            .is_some_and(|w| BRAND_SUFFIXES.contains(&w.to_lowercase().as_str()))
    {
        words.pop();
    }
    Some(words.join(" "))
}

/// Compose a short display title: brand, material, thread count, weave,
/// product type and size, capped at ten words.
///
/// Product type and size are looked up in the vocabulary against the
/// scraped title and category. Returns `None` when nothing beyond the brand
/// is known.
#[must_use]
pub fn compose_title(product: &Product, vocabulary: &Vocabulary) -> Option<String> {
    let attrs = &product.attributes;
    let text = NormalizedText::new(&format!(
        "{} {}",
        present(attrs.title.as_ref()).unwrap_or_default(),
        present(product.category.as_ref()).unwrap_or_default()
    ));

    let material = present(attrs.material.as_ref());
    let thread_count = attrs
        .thread_count
        .filter(|n| *n >= TITLE_THREAD_COUNT_MIN)
        .map(|n| format!("{n} Thread"));
    let weave = present(attrs.weave.as_ref()).filter(|weave| {
        !material.is_some_and(|m| m.to_lowercase().contains(&weave.to_lowercase()))
    });
    let product_type = text
        .first_group(&vocabulary.product_types)
        .map(|g| g.value.as_str());
    let size = text
        .first_group(&vocabulary.sizes)
        .map(|g| g.value.as_str())
        .filter(|size| !UNMARKED_SIZES.contains(size));

    let details: Vec<String> = [
        material.map(str::to_string),
        thread_count,
        weave.map(str::to_string),
        product_type.map(str::to_string),
        size.map(str::to_string),
    ]
    .into_iter()
    .flatten()
    .collect();
    if details.is_empty() {
        return None;
    }

    let brand = present(attrs.brand.as_ref()).and_then(title_brand);
    let words: Vec<String> = brand
        .into_iter()
        .chain(details)
        .flat_map(|part| {
            part.split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .take(MAX_TITLE_WORDS)
        .collect();
    Some(words.join(" "))
}

/// Categorize feature bullets as pros and cons, keeping at most
/// [`MAX_FEATURES`]. Blank and repeated bullets are skipped.
#[must_use]
pub fn extract_features(categorizer: &Categorizer, bullets: &[String]) -> Vec<Feature> {
    let mut features: Vec<Feature> = Vec::new();
    for bullet in bullets {
        let text = bullet.trim();
        if text.is_empty() || features.iter().any(|f| f.text.eq_ignore_ascii_case(text)) {
            continue;
        }
        features.push(categorizer.categorize_inferred(text));
        if features.len() == MAX_FEATURES {
            break;
        }
    }
    features
}

#[cfg(test)]
mod tests {
    use pcat_core::{Platform, Polarity, ProductAttributes, SubScores, Vocabulary};

    use super::*;

    fn product(attributes: ProductAttributes) -> Product {
        Product {
            id: 1,
            sku: "AMZ-B08M9SMVSG".to_string(),
            platform: Platform::Amazon,
            external_id: "B08M9SMVSG".to_string(),
            category: Some("sheet set".to_string()),
            attributes,
            sub_scores: SubScores::default(),
            derived_sub_scores: SubScores::default(),
            product_summary: None,
            pretty_title: None,
        }
    }

    #[test]
    fn review_bands_take_precedence_over_price() {
        assert_eq!(
            value_indicator(Some(20.0), Some(4.6), Some(1500)),
            Some("with excellent reviews")
        );
        assert_eq!(
            value_indicator(Some(20.0), Some(4.2), Some(600)),
            Some("with great reviews")
        );
        assert_eq!(
            value_indicator(Some(20.0), Some(3.6), Some(150)),
            Some("with good reviews")
        );
    }

    #[test]
    fn price_bands_apply_below_review_thresholds() {
        assert_eq!(
            value_indicator(Some(25.0), Some(3.0), Some(10)),
            Some("at an affordable price")
        );
        assert_eq!(
            value_indicator(Some(49.99), Some(3.0), Some(10)),
            Some("at a mid-range price")
        );
        assert_eq!(value_indicator(Some(80.0), Some(3.0), Some(10)), None);
        assert_eq!(
            value_indicator(Some(120.0), Some(3.0), Some(10)),
            Some("at a premium price")
        );
    }

    #[test]
    fn no_indicator_without_reviews() {
        assert_eq!(value_indicator(Some(25.0), Some(4.8), None), None);
        assert_eq!(value_indicator(Some(25.0), None, Some(5000)), None);
    }

    #[test]
    fn summary_joins_available_attributes() {
        let summary = compose_summary(&product(ProductAttributes {
            material: Some("Bamboo".to_string()),
            weave: Some("Sateen".to_string()),
            color: Some("Navy".to_string()),
            dimensions: Some("90 x 102 inches".to_string()),
            rating: Some(4.5),
            review_count: Some(1200),
            brand: Some("Cozy Earth".to_string()),
            ..ProductAttributes::default()
        }));
        assert_eq!(
            summary.as_deref(),
            Some("A Bamboo Sateen sheet set in Navy, 90 x 102 inches with excellent reviews by Cozy Earth.")
        );
    }

    #[test]
    fn long_brand_is_omitted() {
        let summary = compose_summary(&product(ProductAttributes {
            material: Some("Linen".to_string()),
            brand: Some("Visit the Extremely Long Brand Name Store".to_string()),
            ..ProductAttributes::default()
        }))
        .unwrap();
        assert_eq!(summary, "A Linen sheet set.");
    }

    #[test]
    fn title_only_product_falls_back_to_title() {
        let summary = compose_summary(&product(ProductAttributes {
            title: Some("Queen Sheet Set".to_string()),
            ..ProductAttributes::default()
        }));
        assert_eq!(summary.as_deref(), Some("Queen Sheet Set."));
        assert_eq!(compose_summary(&product(ProductAttributes::default())), None);
    }

    #[test]
    fn features_are_capped_and_deduplicated() {
        let categorizer = Categorizer::new(Vocabulary::builtin().unwrap());
        let mut bullets: Vec<String> = (0..15).map(|i| format!("bullet number {i}")).collect();
        bullets.insert(1, "Bullet Number 0".to_string());
        bullets.insert(2, "   ".to_string());

        let features = extract_features(&categorizer, &bullets);

        assert_eq!(features.len(), MAX_FEATURES);
        assert_eq!(features[0].text, "bullet number 0");
        assert_eq!(features[1].text, "bullet number 1");
    }

    #[test]
    fn features_carry_inferred_polarity() {
        let categorizer = Categorizer::new(Vocabulary::builtin().unwrap());
        let features = extract_features(&categorizer, &["very durable stitching".to_string()]);
        assert_eq!(features[0].polarity, Polarity::Pro);
        assert!(features[0].impact_score > 0.0);
    }

    #[test]
    fn title_orders_brand_material_threads_weave_type_size() {
        let vocabulary = Vocabulary::builtin().unwrap();
        let title = compose_title(
            &product(ProductAttributes {
                title: Some("Luxury 800 TC King Size Bed Sheet Set, Deep Pocket".to_string()),
                brand: Some("Threadmill Home".to_string()),
                material: Some("Egyptian Cotton".to_string()),
                weave: Some("Sateen".to_string()),
                thread_count: Some(800),
                ..ProductAttributes::default()
            }),
            &vocabulary,
        );
        assert_eq!(
            title.as_deref(),
            Some("Threadmill Egyptian Cotton 800 Thread Sateen Sheet Set King")
        );
    }

    #[test]
    fn title_skips_placeholder_brands_and_common_sizes() {
        let vocabulary = Vocabulary::builtin().unwrap();
        let mut p = product(ProductAttributes {
            title: Some("Queen Linen Duvet Cover".to_string()),
            brand: Some("Visit the Cozy Store".to_string()),
            material: Some("Linen".to_string()),
            thread_count: Some(300),
            ..ProductAttributes::default()
        });
        p.category = None;
        assert_eq!(
            compose_title(&p, &vocabulary).as_deref(),
            Some("Linen Duvet Cover")
        );
    }

    #[test]
    fn title_drops_weave_already_named_by_material() {
        let vocabulary = Vocabulary::builtin().unwrap();
        let mut p = product(ProductAttributes {
            material: Some("Cotton Sateen".to_string()),
            weave: Some("Sateen".to_string()),
            brand: Some("Generic".to_string()),
            ..ProductAttributes::default()
        });
        p.category = None;
        assert_eq!(
            compose_title(&p, &vocabulary).as_deref(),
            Some("Cotton Sateen")
        );
    }

    #[test]
    fn title_is_capped_at_ten_words() {
        let vocabulary = Vocabulary::builtin().unwrap();
        let title = compose_title(
            &product(ProductAttributes {
                title: Some("Twin XL Pillowcases".to_string()),
                brand: Some("The Very Long Name Of A Bedding Company".to_string()),
                material: Some("Bamboo".to_string()),
                thread_count: Some(1000),
                ..ProductAttributes::default()
            }),
            &vocabulary,
        )
        .unwrap();
        assert_eq!(title.split_whitespace().count(), 10);
        assert!(title.ends_with("Bamboo 1000"));
    }

    #[test]
    fn brand_alone_makes_no_title() {
        let vocabulary = Vocabulary::builtin().unwrap();
        let mut p = product(ProductAttributes {
            brand: Some("Cozy Earth".to_string()),
            ..ProductAttributes::default()
        });
        p.category = None;
        assert_eq!(compose_title(&p, &vocabulary), None);
    }
}
