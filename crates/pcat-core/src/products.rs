use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::scoring_config::ScoreComponent;
use crate::CoreError;

// ---------------------------------------------------------------------------
// Platforms and SKU derivation
// ---------------------------------------------------------------------------

/// Storefront a product or affiliate link comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Amazon,
    Walmart,
    Target,
    Wayfair,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Amazon,
        Platform::Walmart,
        Platform::Target,
        Platform::Wayfair,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Amazon => "amazon",
            Platform::Walmart => "walmart",
            Platform::Target => "target",
            Platform::Wayfair => "wayfair",
        }
    }

    /// Prefix placed in front of the external id when minting a SKU.
    ///
    /// Prefixes are pairwise distinct, so two platforms can never derive the
    /// same SKU from the same external id.
    #[must_use]
    pub fn sku_prefix(self) -> &'static str {
        match self {
            Platform::Amazon => "AMZ",
            Platform::Walmart => "WMT",
            Platform::Target => "TGT",
            Platform::Wayfair => "WFR",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownVariant {
                kind: "platform",
                value: s.to_string(),
            })
    }
}

/// Derive the canonical SKU for a product, e.g. `AMZ-B08M9SMVSG`.
///
/// The external id is trimmed and upper-cased so that the same listing
/// reached through differently-cased URLs always maps to one SKU.
///
/// # Errors
///
/// Returns [`CoreError::InvalidExternalId`] if the id is empty or contains
/// characters other than ASCII letters, digits, `-` and `_`.
pub fn derive_sku(platform: Platform, external_id: &str) -> Result<String, CoreError> {
    let id = external_id.trim();
    if id.is_empty() {
        return Err(CoreError::InvalidExternalId {
            value: external_id.to_string(),
            reason: "external id is empty",
        });
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CoreError::InvalidExternalId {
            value: external_id.to_string(),
            reason: "external id contains unsupported characters",
        });
    }
    Ok(format!(
        "{}-{}",
        platform.sku_prefix(),
        id.to_ascii_uppercase()
    ))
}

// ---------------------------------------------------------------------------
// Link types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Web,
    Mobile,
    Desktop,
}

impl LinkType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LinkType::Web => "web",
            LinkType::Mobile => "mobile",
            LinkType::Desktop => "desktop",
        }
    }
}

impl std::fmt::Display for LinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(LinkType::Web),
            "mobile" => Ok(LinkType::Mobile),
            "desktop" => Ok(LinkType::Desktop),
            _ => Err(CoreError::UnknownVariant {
                kind: "link type",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// Scalar attributes scraped for a product. Every field is optional because
/// storefront pages routinely omit some of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductAttributes {
    pub title: Option<String>,
    pub price: Option<f64>,
    /// Star rating on a 0–5 scale.
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub brand: Option<String>,
    pub material: Option<String>,
    pub color: Option<String>,
    pub weave: Option<String>,
    pub thread_count: Option<i32>,
    /// Free-form size string, e.g. `"90 x 80 inch"`.
    pub dimensions: Option<String>,
    pub description: Option<String>,
}

fn has_text(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn has_number(value: Option<f64>) -> bool {
    value.is_some_and(f64::is_finite)
}

impl ProductAttributes {
    /// Copy every populated incoming value over `self`, returning the names
    /// of the fields that changed.
    ///
    /// A null, blank or non-finite incoming value never replaces a stored
    /// one, so a thinner scrape cannot erase data gathered earlier.
    pub fn refresh_from(&mut self, incoming: &ProductAttributes) -> Vec<&'static str> {
        let mut changed = Vec::new();

        macro_rules! refresh_text {
            ($($field:ident),+) => {$(
                if has_text(incoming.$field.as_ref()) && incoming.$field != self.$field {
                    self.$field.clone_from(&incoming.$field);
                    changed.push(stringify!($field));
                }
            )+};
        }
        macro_rules! refresh_number {
            ($($field:ident),+) => {$(
                if has_number(incoming.$field) && incoming.$field != self.$field {
                    self.$field = incoming.$field;
                    changed.push(stringify!($field));
                }
            )+};
        }

        refresh_text!(title, brand, material, color, weave, dimensions, description);
        refresh_number!(price, rating);
        if incoming.review_count.is_some() && incoming.review_count != self.review_count {
            self.review_count = incoming.review_count;
            changed.push("review_count");
        }
        if incoming.thread_count.is_some() && incoming.thread_count != self.thread_count {
            self.thread_count = incoming.thread_count;
            changed.push("thread_count");
        }

        changed
    }

    /// Fill only the fields that are currently empty. Used when secondary
    /// extraction (e.g. keyword tables over the description) must not
    /// override values read from structured page markup.
    pub fn fill_missing(&mut self, other: &ProductAttributes) {
        macro_rules! fill {
            ($($field:ident),+) => {$(
                if self.$field.is_none() {
                    self.$field.clone_from(&other.$field);
                }
            )+};
        }
        fill!(
            title,
            price,
            rating,
            review_count,
            brand,
            material,
            color,
            weave,
            thread_count,
            dimensions,
            description
        );
    }
}

/// Per-product sub-scores feeding the composite scoring methods. Values are
/// on the 0–5 scale used by the fallback bands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub total_score: Option<f64>,
    pub popularity_score: Option<f64>,
    pub brand_reputation_score: Option<f64>,
    pub overall_value_score: Option<f64>,
    pub luxury_score: Option<f64>,
    pub price_value_score: Option<f64>,
    pub commission_score: Option<f64>,
}

impl SubScores {
    #[must_use]
    pub fn get(&self, component: ScoreComponent) -> Option<f64> {
        match component {
            ScoreComponent::TotalScore => self.total_score,
            ScoreComponent::PopularityScore => self.popularity_score,
            ScoreComponent::BrandReputationScore => self.brand_reputation_score,
            ScoreComponent::OverallValueScore => self.overall_value_score,
            ScoreComponent::LuxuryScore => self.luxury_score,
            ScoreComponent::PriceValueScore => self.price_value_score,
            ScoreComponent::CommissionScore => self.commission_score,
        }
    }

    pub fn set(&mut self, component: ScoreComponent, value: Option<f64>) {
        let slot = match component {
            ScoreComponent::TotalScore => &mut self.total_score,
            ScoreComponent::PopularityScore => &mut self.popularity_score,
            ScoreComponent::BrandReputationScore => &mut self.brand_reputation_score,
            ScoreComponent::OverallValueScore => &mut self.overall_value_score,
            ScoreComponent::LuxuryScore => &mut self.luxury_score,
            ScoreComponent::PriceValueScore => &mut self.price_value_score,
            ScoreComponent::CommissionScore => &mut self.commission_score,
        };
        *slot = value;
    }

    /// Copy every finite incoming value over `self`, returning the names of
    /// the components that changed. Absent incoming values keep the stored
    /// ones.
    pub fn refresh_from(&mut self, incoming: &SubScores) -> Vec<&'static str> {
        let mut changed = Vec::new();
        for component in ScoreComponent::ALL {
            let value = incoming.get(component);
            if has_number(value) && value != self.get(component) {
                self.set(component, value);
                changed.push(component.as_str());
            }
        }
        changed
    }
}

/// A stored product. `sku` is the dedup key across pipeline runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub platform: Platform,
    pub external_id: String,
    pub category: Option<String>,
    pub attributes: ProductAttributes,
    /// Sub-scores supplied with the input. Scoring passes never write them.
    pub sub_scores: SubScores,
    /// Sub-scores in effect at the last scoring pass: the supplied value
    /// where there is one, a fallback band otherwise. Rewritten every pass.
    pub derived_sub_scores: SubScores,
    /// Generated text; regenerated on every enrichment pass.
    pub product_summary: Option<String>,
    pub pretty_title: Option<String>,
}

/// Fields required to insert a new product row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub sku: String,
    pub platform: Platform,
    pub external_id: String,
    pub category: Option<String>,
    pub attributes: ProductAttributes,
    pub sub_scores: SubScores,
}

// ---------------------------------------------------------------------------
// Affiliate links
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliateLink {
    pub id: i64,
    pub product_id: i64,
    pub platform: Platform,
    pub link_type: LinkType,
    pub url: String,
    /// Fraction of the sale price, e.g. `0.04` for 4%.
    pub commission_rate: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAffiliateLink {
    pub platform: Platform,
    pub link_type: LinkType,
    pub url: String,
    pub commission_rate: Option<f64>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: i64,
    pub product_id: i64,
    pub source_url: String,
    pub local_path: Option<String>,
    /// Hex SHA-256 of the downloaded bytes.
    pub fingerprint: Option<String>,
    pub is_primary: bool,
    pub display_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProductImage {
    pub source_url: String,
    pub local_path: Option<String>,
    pub fingerprint: Option<String>,
    pub is_primary: bool,
    pub display_order: i32,
}

/// Raw image bytes returned by an image source, before they are persisted.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl FetchedImage {
    /// Hex-encoded SHA-256 digest of the image bytes.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        Sha256::digest(&self.bytes)
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    /// File extension (with leading dot) implied by the content type.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        let content_type = self
            .content_type
            .as_deref()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if content_type.contains("png") {
            ".png"
        } else if content_type.contains("webp") {
            ".webp"
        } else if content_type.contains("gif") {
            ".gif"
        } else {
            ".jpg"
        }
    }
}

// ---------------------------------------------------------------------------
// Scraped candidates
// ---------------------------------------------------------------------------

/// An image URL offered by a scrape, optionally flagged as the preferred
/// primary image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateImage {
    pub url: String,
    pub primary: bool,
}

/// One scraped record submitted to the upsert coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub platform: Platform,
    /// `None` when the source URL did not yield a recognizable identifier.
    pub external_id: Option<String>,
    pub source_url: String,
    pub category: Option<String>,
    pub attributes: ProductAttributes,
    /// Sub-scores supplied alongside the input URL.
    pub sub_scores: SubScores,
    pub link: NewAffiliateLink,
    pub images: Vec<CandidateImage>,
    /// Bullet-point feature text from the product page.
    pub feature_bullets: Vec<String>,
}
