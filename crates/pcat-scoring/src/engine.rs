//! Score computation for the six scoring methods.

use pcat_core::{Product, ScoreComponent, ScoringConfig, ScoringMethod, SubScores};

use crate::adjust::{apply_material_bonus, apply_tier_multiplier};
use crate::error::ScoringError;
use crate::sub_scores::price_rating_band;

/// Scale applied to the star rating by `value_focused`.
const VALUE_RATING_SCALE: f64 = 20.0;
/// Divisor applied to the price by `value_focused`.
const VALUE_PRICE_SCALE: f64 = 10.0;
/// Score returned by `value_focused` for a zero price.
const ZERO_PRICE_SENTINEL: f64 = 0.0;

const LUXURY_WEIGHT: f64 = 2.0;
const BRAND_REPUTATION_WEIGHT: f64 = 1.5;
const TOTAL_WEIGHT: f64 = 1.0;

/// The product attributes a score is computed from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreInput {
    pub price: Option<f64>,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub material: Option<String>,
    /// Highest commission rate among the product's links.
    pub commission_rate: Option<f64>,
    pub sub_scores: SubScores,
}

impl From<&Product> for ScoreInput {
    fn from(product: &Product) -> Self {
        Self {
            price: product.attributes.price,
            rating: product.attributes.rating,
            review_count: product.attributes.review_count,
            material: product.attributes.material.clone(),
            commission_rate: None,
            sub_scores: product.sub_scores,
        }
    }
}

impl ScoreInput {
    /// Sub-score value for `component`. Non-finite values count as missing.
    #[must_use]
    pub fn component(&self, component: ScoreComponent) -> Option<f64> {
        self.sub_scores.get(component).filter(|v| v.is_finite())
    }
}

/// Conditions worth surfacing alongside a successful score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreFlag {
    /// `value_focused` saw a zero price and returned the sentinel.
    ZeroPrice,
    /// `value_focused` had no rating and used 0.
    RatingDefaulted,
}

/// A score together with how it was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    pub method: ScoringMethod,
    /// Final score after adjustments.
    pub value: f64,
    /// Primary method result before adjustments.
    pub base: f64,
    /// Components that were absent and contributed 0.
    pub defaulted: Vec<ScoreComponent>,
    pub flags: Vec<ScoreFlag>,
    /// Name and multiplier of the price tier applied, if any.
    pub tier: Option<(String, f64)>,
    /// Material key and bonus applied, if any.
    pub material_bonus: Option<(String, f64)>,
}

/// Compute the score of `input` under `method`.
///
/// # Errors
///
/// - [`ScoringError::Config`] if `config` lacks the weights `method` needs.
/// - [`ScoringError::Validation`] if the method needs a price and it is
///   missing, negative or not a number.
pub fn compute_score(
    input: &ScoreInput,
    method: ScoringMethod,
    config: &ScoringConfig,
) -> Result<f64, ScoringError> {
    compute_score_detailed(input, method, config).map(|outcome| outcome.value)
}

/// Like [`compute_score`], but also reports defaulted components, flags and
/// the adjustments applied.
///
/// # Errors
///
/// See [`compute_score`].
pub fn compute_score_detailed(
    input: &ScoreInput,
    method: ScoringMethod,
    config: &ScoringConfig,
) -> Result<ScoreOutcome, ScoringError> {
    let mut outcome = ScoreOutcome {
        method,
        value: 0.0,
        base: 0.0,
        defaulted: Vec::new(),
        flags: Vec::new(),
        tier: None,
        material_bonus: None,
    };

    let base = match method {
        ScoringMethod::PriceBased => required_price(input)?,
        ScoringMethod::WeightedComposite | ScoringMethod::ComprehensiveComposite => {
            weighted_sum(input, method, config, &mut outcome)?
        }
        ScoringMethod::ValueFocused => value_focused(input, &mut outcome)?,
        ScoringMethod::LuxuryPremium => luxury_premium(input, &mut outcome),
        ScoringMethod::OverallValue => overall_value(input)?,
    };

    if !outcome.defaulted.is_empty() {
        tracing::debug!(
            method = %method,
            defaulted = ?outcome.defaulted,
            "missing score components defaulted to 0"
        );
    }

    outcome.base = base;
    let mut value = base;

    if let Some((adjusted, tier_name, multiplier)) =
        apply_tier_multiplier(value, input, method, config)
    {
        value = adjusted;
        outcome.tier = Some((tier_name, multiplier));
    }
    if let Some((adjusted, key, bonus)) = apply_material_bonus(value, input, method, config) {
        value = adjusted;
        outcome.material_bonus = Some((key, bonus));
    }

    outcome.value = value;
    Ok(outcome)
}

fn required_price(input: &ScoreInput) -> Result<f64, ScoringError> {
    match input.price {
        None => Err(ScoringError::Validation {
            field: "price",
            reason: "price is required by this method".to_string(),
        }),
        Some(p) if p.is_nan() => Err(ScoringError::Validation {
            field: "price",
            reason: "price is not a number".to_string(),
        }),
        Some(p) if p < 0.0 => Err(ScoringError::Validation {
            field: "price",
            reason: format!("price must not be negative, got {p}"),
        }),
        Some(p) => Ok(p),
    }
}

fn component_or_default(
    input: &ScoreInput,
    component: ScoreComponent,
    outcome: &mut ScoreOutcome,
) -> f64 {
    if let Some(value) = input.component(component) {
        value
    } else {
        outcome.defaulted.push(component);
        0.0
    }
}

fn weighted_sum(
    input: &ScoreInput,
    method: ScoringMethod,
    config: &ScoringConfig,
    outcome: &mut ScoreOutcome,
) -> Result<f64, ScoringError> {
    let weights = config.weights_for(method).map_err(ScoringError::Config)?;

    let mut total = 0.0;
    for &component in method.components() {
        let weight = weights[&component];
        total += component_or_default(input, component, outcome) * weight;
    }
    Ok(total)
}

fn required_rating(input: &ScoreInput) -> Result<f64, ScoringError> {
    match input.rating {
        Some(r) if r.is_finite() => Ok(r),
        Some(_) => Err(ScoringError::Validation {
            field: "rating",
            reason: "rating is not a finite number".to_string(),
        }),
        None => Err(ScoringError::Validation {
            field: "rating",
            reason: "rating is required by this method".to_string(),
        }),
    }
}

fn overall_value(input: &ScoreInput) -> Result<f64, ScoringError> {
    let price = required_price(input)?;
    let rating = required_rating(input)?;
    Ok(price_rating_band(rating, price))
}

fn value_focused(input: &ScoreInput, outcome: &mut ScoreOutcome) -> Result<f64, ScoringError> {
    let price = required_price(input)?;

    let rating = match input.rating {
        Some(r) if r.is_finite() => r,
        Some(_) => {
            return Err(ScoringError::Validation {
                field: "rating",
                reason: "rating is not a finite number".to_string(),
            })
        }
        None => {
            outcome.flags.push(ScoreFlag::RatingDefaulted);
            0.0
        }
    };

    if price == 0.0 {
        outcome.flags.push(ScoreFlag::ZeroPrice);
        return Ok(ZERO_PRICE_SENTINEL);
    }

    Ok((rating * VALUE_RATING_SCALE) / (price / VALUE_PRICE_SCALE))
}

fn luxury_premium(input: &ScoreInput, outcome: &mut ScoreOutcome) -> f64 {
    let luxury = component_or_default(input, ScoreComponent::LuxuryScore, outcome);
    let brand = component_or_default(input, ScoreComponent::BrandReputationScore, outcome);
    let total = component_or_default(input, ScoreComponent::TotalScore, outcome);
    luxury * LUXURY_WEIGHT + brand * BRAND_REPUTATION_WEIGHT + total * TOTAL_WEIGHT
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
