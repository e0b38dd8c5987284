//! Scoring configuration: the active method, per-method weights, price
//! tiers and material bonuses.
//!
//! The document is loaded once at startup, validated, and then passed by
//! reference into every scoring call.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::vocabulary::normalize_words;
use crate::{ConfigError, CoreError};

/// Closed set of scoring methods. Unknown names fail at deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    PriceBased,
    WeightedComposite,
    ValueFocused,
    LuxuryPremium,
    ComprehensiveComposite,
    OverallValue,
}

const WEIGHTED_COMPOSITE_COMPONENTS: [ScoreComponent; 5] = [
    ScoreComponent::TotalScore,
    ScoreComponent::PopularityScore,
    ScoreComponent::BrandReputationScore,
    ScoreComponent::OverallValueScore,
    ScoreComponent::LuxuryScore,
];

const COMPREHENSIVE_COMPOSITE_COMPONENTS: [ScoreComponent; 4] = [
    ScoreComponent::PopularityScore,
    ScoreComponent::BrandReputationScore,
    ScoreComponent::PriceValueScore,
    ScoreComponent::CommissionScore,
];

impl ScoringMethod {
    pub const ALL: [ScoringMethod; 6] = [
        ScoringMethod::PriceBased,
        ScoringMethod::WeightedComposite,
        ScoringMethod::ValueFocused,
        ScoringMethod::LuxuryPremium,
        ScoringMethod::ComprehensiveComposite,
        ScoringMethod::OverallValue,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScoringMethod::PriceBased => "price_based",
            ScoringMethod::WeightedComposite => "weighted_composite",
            ScoringMethod::ValueFocused => "value_focused",
            ScoringMethod::LuxuryPremium => "luxury_premium",
            ScoringMethod::ComprehensiveComposite => "comprehensive_composite",
            ScoringMethod::OverallValue => "overall_value",
        }
    }

    /// Human-readable formula, shown by `pcat methods`.
    #[must_use]
    pub fn formula(self) -> &'static str {
        match self {
            ScoringMethod::PriceBased => "price",
            ScoringMethod::WeightedComposite => "sum(component * weight)",
            ScoringMethod::ValueFocused => "(rating * 20) / (price / 10)",
            ScoringMethod::LuxuryPremium => "luxury * 2 + brand_reputation * 1.5 + total",
            ScoringMethod::ComprehensiveComposite => {
                "sum(component * weight) over popularity, brand_reputation, price_value, commission"
            }
            ScoringMethod::OverallValue => "price/rating band (3.0 to 5.0)",
        }
    }

    /// Components a weighted method sums; empty for the fixed formulas.
    #[must_use]
    pub fn components(self) -> &'static [ScoreComponent] {
        match self {
            ScoringMethod::WeightedComposite => &WEIGHTED_COMPOSITE_COMPONENTS,
            ScoringMethod::ComprehensiveComposite => &COMPREHENSIVE_COMPOSITE_COMPONENTS,
            ScoringMethod::PriceBased
            | ScoringMethod::ValueFocused
            | ScoringMethod::LuxuryPremium
            | ScoringMethod::OverallValue => &[],
        }
    }

    /// Whether this method reads a weight map from the config.
    #[must_use]
    pub fn requires_weights(self) -> bool {
        !self.components().is_empty()
    }
}

impl std::fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScoringMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| CoreError::UnknownVariant {
                kind: "scoring method",
                value: s.to_string(),
            })
    }
}

/// Sub-score inputs of the composite methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreComponent {
    TotalScore,
    PopularityScore,
    BrandReputationScore,
    OverallValueScore,
    LuxuryScore,
    PriceValueScore,
    CommissionScore,
}

impl ScoreComponent {
    pub const ALL: [ScoreComponent; 7] = [
        ScoreComponent::TotalScore,
        ScoreComponent::PopularityScore,
        ScoreComponent::BrandReputationScore,
        ScoreComponent::OverallValueScore,
        ScoreComponent::LuxuryScore,
        ScoreComponent::PriceValueScore,
        ScoreComponent::CommissionScore,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreComponent::TotalScore => "total_score",
            ScoreComponent::PopularityScore => "popularity_score",
            ScoreComponent::BrandReputationScore => "brand_reputation_score",
            ScoreComponent::OverallValueScore => "overall_value_score",
            ScoreComponent::LuxuryScore => "luxury_score",
            ScoreComponent::PriceValueScore => "price_value_score",
            ScoreComponent::CommissionScore => "commission_score",
        }
    }
}

impl std::fmt::Display for ScoreComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    pub min_price: f64,
    /// Informational upper bound; membership is decided by `min_price`.
    #[serde(default)]
    pub max_price: Option<f64>,
    pub luxury_multiplier: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTierConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Methods the multiplier applies to. Empty means every method.
    #[serde(default)]
    pub apply_to: Vec<ScoringMethod>,
    #[serde(default)]
    pub tiers: BTreeMap<String, PriceTier>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BonusMode {
    #[default]
    Additive,
    Multiplicative,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialBonusConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub apply_to: Vec<ScoringMethod>,
    #[serde(default)]
    pub mode: BonusMode,
    /// Normalized material key to bonus value.
    #[serde(default)]
    pub bonuses: BTreeMap<String, f64>,
    /// Alternate spelling to canonical bonus key, e.g. `egyptian` to
    /// `egyptian cotton`.
    #[serde(default)]
    pub synonyms: BTreeMap<String, String>,
}

/// Review-count thresholds for the popularity fallback band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewCountThresholds {
    pub very_high: i64,
    pub high: i64,
    pub moderate: i64,
    pub low: i64,
}

impl Default for ReviewCountThresholds {
    fn default() -> Self {
        Self {
            very_high: 5000,
            high: 2000,
            moderate: 1000,
            low: 500,
        }
    }
}

/// Commission-rate thresholds for the commission fallback band, as
/// fractions of the sale price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionThresholds {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
}

impl Default for CommissionThresholds {
    fn default() -> Self {
        Self {
            excellent: 0.15,
            good: 0.10,
            fair: 0.05,
        }
    }
}

fn default_commission_rate() -> f64 {
    0.10
}

/// Inputs for deriving sub-scores a product does not carry yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScoreConfig {
    #[serde(default)]
    pub review_count_thresholds: ReviewCountThresholds,
    #[serde(default)]
    pub commission_thresholds: CommissionThresholds,
    /// Rate assumed for products whose links carry no commission rate.
    #[serde(default = "default_commission_rate")]
    pub default_commission_rate: f64,
}

impl Default for SubScoreConfig {
    fn default() -> Self {
        Self {
            review_count_thresholds: ReviewCountThresholds::default(),
            commission_thresholds: CommissionThresholds::default(),
            default_commission_rate: default_commission_rate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub method: ScoringMethod,
    #[serde(default)]
    pub weights: HashMap<ScoringMethod, HashMap<ScoreComponent, f64>>,
    #[serde(default)]
    pub price_tiers: PriceTierConfig,
    #[serde(default)]
    pub material_bonus: MaterialBonusConfig,
    #[serde(default)]
    pub sub_scores: SubScoreConfig,
}

impl ScoringConfig {
    /// A config for `method` with no weights and no adjustments enabled.
    #[must_use]
    pub fn bare(method: ScoringMethod) -> Self {
        Self {
            method,
            weights: HashMap::new(),
            price_tiers: PriceTierConfig::default(),
            material_bonus: MaterialBonusConfig::default(),
            sub_scores: SubScoreConfig::default(),
        }
    }

    /// Return a copy of this config with a different active method.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the config lacks what the new
    /// method needs.
    pub fn with_method(&self, method: ScoringMethod) -> Result<Self, ConfigError> {
        let mut config = self.clone();
        config.method = method;
        validate_scoring_config(&config)?;
        Ok(config)
    }

    /// Look up the weight map for `method`, checking that every component
    /// the method sums is present.
    ///
    /// # Errors
    ///
    /// Returns a description of the first missing entry.
    pub fn weights_for(
        &self,
        method: ScoringMethod,
    ) -> Result<&HashMap<ScoreComponent, f64>, String> {
        let weights = self
            .weights
            .get(&method)
            .ok_or_else(|| format!("no weights configured for method {method}"))?;
        for component in method.components() {
            if !weights.contains_key(component) {
                return Err(format!(
                    "weights for method {method} are missing component {component}"
                ));
            }
        }
        Ok(weights)
    }

    /// Tiers sorted by ascending `min_price`.
    #[must_use]
    pub fn sorted_tiers(&self) -> Vec<(&str, &PriceTier)> {
        let mut tiers: Vec<(&str, &PriceTier)> = self
            .price_tiers
            .tiers
            .iter()
            .map(|(name, tier)| (name.as_str(), tier))
            .collect();
        tiers.sort_by(|a, b| a.1.min_price.total_cmp(&b.1.min_price));
        tiers
    }
}

/// Load and validate the scoring configuration from a YAML or JSON file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_scoring_config(path: &Path) -> Result<ScoringConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_scoring_config(&content).map_err(|e| match e {
        ConfigError::FileParse { source, .. } => ConfigError::FileParse {
            path: path.display().to_string(),
            source,
        },
        other => other,
    })
}

/// Parse and validate a scoring configuration document.
///
/// # Errors
///
/// Returns `ConfigError::FileParse` for malformed documents (including unknown
/// method names) and `ConfigError::Validation` for semantic problems.
pub fn parse_scoring_config(content: &str) -> Result<ScoringConfig, ConfigError> {
    let config: ScoringConfig =
        serde_yaml::from_str(content).map_err(|e| ConfigError::FileParse {
            path: "<inline>".to_string(),
            source: e,
        })?;
    validate_scoring_config(&config)?;
    Ok(config)
}

/// Validate a parsed scoring configuration.
///
/// # Errors
///
/// Returns `ConfigError::Validation` on the first problem found.
pub fn validate_scoring_config(config: &ScoringConfig) -> Result<(), ConfigError> {
    if config.method.requires_weights() {
        config
            .weights_for(config.method)
            .map_err(ConfigError::Validation)?;
    }

    for (method, weights) in &config.weights {
        for (component, weight) in weights {
            if !weight.is_finite() {
                return Err(ConfigError::Validation(format!(
                    "weight {component} for method {method} must be a finite number"
                )));
            }
        }
    }

    if config.price_tiers.enabled {
        if config.price_tiers.tiers.is_empty() {
            return Err(ConfigError::Validation(
                "price tiers are enabled but no tiers are defined".to_string(),
            ));
        }
        let mut seen_min: Vec<f64> = Vec::new();
        for (name, tier) in &config.price_tiers.tiers {
            if !tier.min_price.is_finite() || tier.min_price < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "tier {name}: min_price must be a non-negative number"
                )));
            }
            if !tier.luxury_multiplier.is_finite() || tier.luxury_multiplier <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "tier {name}: luxury_multiplier must be positive"
                )));
            }
            if let Some(max) = tier.max_price {
                if !max.is_finite() || max <= tier.min_price {
                    return Err(ConfigError::Validation(format!(
                        "tier {name}: max_price must be greater than min_price"
                    )));
                }
            }
            if seen_min.iter().any(|m| m.total_cmp(&tier.min_price).is_eq()) {
                return Err(ConfigError::Validation(format!(
                    "tier {name}: another tier already starts at {}",
                    tier.min_price
                )));
            }
            seen_min.push(tier.min_price);
        }
    }

    if config.material_bonus.enabled {
        if config.material_bonus.bonuses.is_empty() {
            return Err(ConfigError::Validation(
                "material bonus is enabled but no bonuses are defined".to_string(),
            ));
        }
        let mut seen_keys: Vec<String> = Vec::new();
        for (material, bonus) in &config.material_bonus.bonuses {
            let key = normalize_words(material);
            if key.is_empty() {
                return Err(ConfigError::Validation(
                    "material bonus keys must not be blank".to_string(),
                ));
            }
            if seen_keys.contains(&key) {
                return Err(ConfigError::Validation(format!(
                    "material bonus key {material:?} duplicates another key"
                )));
            }
            seen_keys.push(key);
            if !bonus.is_finite() {
                return Err(ConfigError::Validation(format!(
                    "material bonus for {material} must be a finite number"
                )));
            }
        }
        let mut seen_aliases: Vec<String> = Vec::new();
        for (alias, target) in &config.material_bonus.synonyms {
            let alias_key = normalize_words(alias);
            if alias_key.is_empty() || normalize_words(target).is_empty() {
                return Err(ConfigError::Validation(
                    "material synonyms must not be blank".to_string(),
                ));
            }
            if seen_aliases.contains(&alias_key) {
                return Err(ConfigError::Validation(format!(
                    "material synonym {alias:?} duplicates another synonym"
                )));
            }
            seen_aliases.push(alias_key);
        }
    }

    let sub_scores = &config.sub_scores;
    let commission = sub_scores.commission_thresholds;
    let rates = [
        commission.excellent,
        commission.good,
        commission.fair,
        sub_scores.default_commission_rate,
    ];
    if rates.iter().any(|r| !r.is_finite() || !(0.0..=1.0).contains(r)) {
        return Err(ConfigError::Validation(
            "commission rates must be fractions between 0 and 1".to_string(),
        ));
    }
    if commission.excellent < commission.good || commission.good < commission.fair {
        return Err(ConfigError::Validation(
            "commission thresholds must descend from excellent to fair".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[path = "scoring_config_test.rs"]
mod tests;
