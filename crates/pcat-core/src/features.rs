use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Fixed taxonomy for pro/con features.
///
/// Declaration order is significant: the categorizer tests categories in
/// this order and the first keyword hit wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    Quality,
    Price,
    Performance,
    Design,
    Durability,
    Comfort,
    EaseOfUse,
    CustomerService,
    Shipping,
    Warranty,
    Sustainability,
    Compatibility,
    Maintenance,
    Safety,
    General,
}

impl FeatureCategory {
    pub const ALL: [FeatureCategory; 15] = [
        FeatureCategory::Quality,
        FeatureCategory::Price,
        FeatureCategory::Performance,
        FeatureCategory::Design,
        FeatureCategory::Durability,
        FeatureCategory::Comfort,
        FeatureCategory::EaseOfUse,
        FeatureCategory::CustomerService,
        FeatureCategory::Shipping,
        FeatureCategory::Warranty,
        FeatureCategory::Sustainability,
        FeatureCategory::Compatibility,
        FeatureCategory::Maintenance,
        FeatureCategory::Safety,
        FeatureCategory::General,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureCategory::Quality => "quality",
            FeatureCategory::Price => "price",
            FeatureCategory::Performance => "performance",
            FeatureCategory::Design => "design",
            FeatureCategory::Durability => "durability",
            FeatureCategory::Comfort => "comfort",
            FeatureCategory::EaseOfUse => "ease_of_use",
            FeatureCategory::CustomerService => "customer_service",
            FeatureCategory::Shipping => "shipping",
            FeatureCategory::Warranty => "warranty",
            FeatureCategory::Sustainability => "sustainability",
            FeatureCategory::Compatibility => "compatibility",
            FeatureCategory::Maintenance => "maintenance",
            FeatureCategory::Safety => "safety",
            FeatureCategory::General => "general",
        }
    }
}

impl std::fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| CoreError::UnknownVariant {
                kind: "feature category",
                value: s.to_string(),
            })
    }
}

/// Importance tier, declared from most to least important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Critical,
    High,
    Medium,
    Low,
    Minor,
}

impl Importance {
    pub const ALL: [Importance; 5] = [
        Importance::Critical,
        Importance::High,
        Importance::Medium,
        Importance::Low,
        Importance::Minor,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Importance::Critical => "critical",
            Importance::High => "high",
            Importance::Medium => "medium",
            Importance::Low => "low",
            Importance::Minor => "minor",
        }
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Importance {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Importance::ALL
            .into_iter()
            .find(|i| i.as_str() == s.trim())
            .ok_or_else(|| CoreError::UnknownVariant {
                kind: "importance",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Pro,
    Con,
}

impl Polarity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Polarity::Pro => "pro",
            Polarity::Con => "con",
        }
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Polarity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pro" => Ok(Polarity::Pro),
            "con" => Ok(Polarity::Con),
            _ => Err(CoreError::UnknownVariant {
                kind: "polarity",
                value: s.to_string(),
            }),
        }
    }
}

/// A categorized pro or con attached to a product.
///
/// `impact_score` lies in `[-1, 1]`; pros are never negative and cons are
/// never positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub text: String,
    pub polarity: Polarity,
    pub category: FeatureCategory,
    pub importance: Importance,
    pub impact_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_order_ends_with_general() {
        assert_eq!(FeatureCategory::ALL[0], FeatureCategory::Quality);
        assert_eq!(FeatureCategory::ALL[14], FeatureCategory::General);
    }

    #[test]
    fn category_parses_snake_case() {
        assert_eq!(
            "ease_of_use".parse::<FeatureCategory>().unwrap(),
            FeatureCategory::EaseOfUse
        );
        assert!("other".parse::<FeatureCategory>().is_err());
    }

    #[test]
    fn importance_orders_critical_first() {
        assert!(Importance::Critical < Importance::High);
        assert!(Importance::Low < Importance::Minor);
    }

    #[test]
    fn category_serde_matches_display() {
        for category in FeatureCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{category}\""));
        }
    }
}
