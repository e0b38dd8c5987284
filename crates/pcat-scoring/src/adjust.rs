//! Secondary score adjustments: the price-tier multiplier and the material
//! bonus. Both are off unless the config enables them, and each can be
//! limited to a subset of methods.

use pcat_core::scoring_config::PriceTier;
use pcat_core::vocabulary::{normalize_words, NormalizedText};
use pcat_core::{BonusMode, ScoringConfig, ScoringMethod};

use crate::engine::ScoreInput;

fn applies_to(apply_to: &[ScoringMethod], method: ScoringMethod) -> bool {
    apply_to.is_empty() || apply_to.contains(&method)
}

/// Select the price tier for `price`.
///
/// Tiers are ordered by ascending `min_price` and lower bounds are
/// inclusive, so a price sitting exactly on a boundary belongs to the
/// higher tier. Prices below the lowest boundary have no tier.
#[must_use]
pub fn select_tier(price: f64, config: &ScoringConfig) -> Option<(&str, &PriceTier)> {
    if !price.is_finite() {
        return None;
    }
    config
        .sorted_tiers()
        .into_iter()
        .take_while(|(_, tier)| tier.min_price <= price)
        .last()
}

pub(crate) fn apply_tier_multiplier(
    value: f64,
    input: &ScoreInput,
    method: ScoringMethod,
    config: &ScoringConfig,
) -> Option<(f64, String, f64)> {
    let tiers = &config.price_tiers;
    if !tiers.enabled || !applies_to(&tiers.apply_to, method) {
        return None;
    }
    let (name, tier) = select_tier(input.price?, config)?;
    Some((
        value * tier.luxury_multiplier,
        name.to_string(),
        tier.luxury_multiplier,
    ))
}

/// Resolve a free-text material to the bonus key it earns.
///
/// The material is lowercased and stripped of punctuation (so `EGYPTIAN_COTTON`
/// reads as `egyptian cotton`), then folded through the synonym table. An
/// exact key match wins; otherwise the longest bonus key or synonym that
/// occurs in the text on word boundaries is used.
#[must_use]
pub fn resolve_material_key(material: &str, config: &ScoringConfig) -> Option<String> {
    let bonus_config = &config.material_bonus;
    let normalized = normalize_words(material);
    if normalized.is_empty() {
        return None;
    }

    let fold = |key: &str| -> String {
        bonus_config
            .synonyms
            .iter()
            .find(|(alias, _)| normalize_words(alias) == key)
            .map_or_else(|| key.to_string(), |(_, target)| normalize_words(target))
    };
    let has_bonus = |key: &str| {
        bonus_config
            .bonuses
            .keys()
            .any(|k| normalize_words(k) == key)
    };

    let folded = fold(&normalized);
    if has_bonus(&folded) {
        return Some(folded);
    }

    let text = NormalizedText::new(&normalized);
    let mut best: Option<(usize, String)> = None;
    for phrase in bonus_config
        .bonuses
        .keys()
        .chain(bonus_config.synonyms.keys())
    {
        let phrase = normalize_words(phrase);
        if !text.contains_phrase(&phrase) {
            continue;
        }
        let target = fold(&phrase);
        if !has_bonus(&target) {
            continue;
        }
        let better = match &best {
            None => true,
            Some((len, key)) => phrase.len() > *len || (phrase.len() == *len && target < *key),
        };
        if better {
            best = Some((phrase.len(), target));
        }
    }
    best.map(|(_, key)| key)
}

fn bonus_value(key: &str, config: &ScoringConfig) -> Option<f64> {
    config
        .material_bonus
        .bonuses
        .iter()
        .find(|(k, _)| normalize_words(k) == key)
        .map(|(_, v)| *v)
}

pub(crate) fn apply_material_bonus(
    value: f64,
    input: &ScoreInput,
    method: ScoringMethod,
    config: &ScoringConfig,
) -> Option<(f64, String, f64)> {
    let bonus_config = &config.material_bonus;
    if !bonus_config.enabled || !applies_to(&bonus_config.apply_to, method) {
        return None;
    }
    let key = resolve_material_key(input.material.as_deref()?, config)?;
    let bonus = bonus_value(&key, config)?;
    let adjusted = match bonus_config.mode {
        BonusMode::Additive => value + bonus,
        BonusMode::Multiplicative => value * bonus,
    };
    Some((adjusted, key, bonus))
}
