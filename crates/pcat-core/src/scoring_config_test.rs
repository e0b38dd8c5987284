use super::*;

const WEIGHTED: &str = r"
method: weighted_composite
weights:
  weighted_composite:
    total_score: 1.0
    popularity_score: 0.0
    brand_reputation_score: 0.0
    overall_value_score: 0.0
    luxury_score: 0.0
";

#[test]
fn shipped_config_is_valid() {
    let content = include_str!("../../../config/scoring.yaml");
    let config = parse_scoring_config(content).expect("shipped scoring.yaml should be valid");
    assert_eq!(config.method, ScoringMethod::PriceBased);
    assert_eq!(config.price_tiers.tiers.len(), 4);
    assert_eq!(
        config.material_bonus.synonyms.get("egyptian").map(String::as_str),
        Some("egyptian cotton")
    );
}

#[test]
fn parses_weighted_composite() {
    let config = parse_scoring_config(WEIGHTED).unwrap();
    let weights = config.weights_for(ScoringMethod::WeightedComposite).unwrap();
    assert!((weights[&ScoreComponent::TotalScore] - 1.0).abs() < f64::EPSILON);
}

#[test]
fn unknown_method_name_is_rejected_at_load() {
    let result = parse_scoring_config("method: popularity_contest\n");
    assert!(
        matches!(result, Err(ConfigError::FileParse { .. })),
        "expected FileParse, got: {result:?}"
    );
}

#[test]
fn weighted_composite_without_weights_is_rejected() {
    let result = parse_scoring_config("method: weighted_composite\n");
    assert!(
        matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("no weights")),
        "expected Validation, got: {result:?}"
    );
}

#[test]
fn weighted_composite_with_partial_weights_is_rejected() {
    let yaml = r"
method: weighted_composite
weights:
  weighted_composite:
    total_score: 1.0
";
    let result = parse_scoring_config(yaml);
    assert!(
        matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("popularity_score")),
        "expected missing component error, got: {result:?}"
    );
}

#[test]
fn unknown_component_is_rejected() {
    let yaml = r"
method: price_based
weights:
  weighted_composite:
    shipping_score: 1.0
";
    assert!(matches!(
        parse_scoring_config(yaml),
        Err(ConfigError::FileParse { .. })
    ));
}

#[test]
fn methods_without_weights_need_no_weight_map() {
    for method in [
        "price_based",
        "value_focused",
        "luxury_premium",
        "overall_value",
    ] {
        let config = parse_scoring_config(&format!("method: {method}\n")).unwrap();
        assert!(config.weights.is_empty());
    }
}

#[test]
fn enabled_tiers_must_not_be_empty() {
    let yaml = "method: price_based\nprice_tiers:\n  enabled: true\n";
    assert!(matches!(
        parse_scoring_config(yaml),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn duplicate_tier_boundaries_are_rejected() {
    let yaml = r"
method: price_based
price_tiers:
  enabled: true
  tiers:
    a: { min_price: 50, luxury_multiplier: 1.0 }
    b: { min_price: 50, luxury_multiplier: 1.2 }
";
    assert!(matches!(
        parse_scoring_config(yaml),
        Err(ConfigError::Validation(ref msg)) if msg.contains("already starts")
    ));
}

#[test]
fn tier_max_below_min_is_rejected() {
    let yaml = r"
method: price_based
price_tiers:
  enabled: true
  tiers:
    a: { min_price: 50, max_price: 10, luxury_multiplier: 1.0 }
";
    assert!(parse_scoring_config(yaml).is_err());
}

#[test]
fn disabled_tiers_are_not_validated() {
    let yaml = r"
method: price_based
price_tiers:
  enabled: false
";
    assert!(parse_scoring_config(yaml).is_ok());
}

#[test]
fn sorted_tiers_ascend_by_min_price() {
    let config = parse_scoring_config(include_str!("../../../config/scoring.yaml")).unwrap();
    let names: Vec<&str> = config.sorted_tiers().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["budget", "mid_range", "premium", "luxury"]);
}

#[test]
fn json_documents_are_accepted() {
    let json = r#"{"method": "value_focused"}"#;
    let config = parse_scoring_config(json).unwrap();
    assert_eq!(config.method, ScoringMethod::ValueFocused);
}

#[test]
fn with_method_revalidates() {
    let config = ScoringConfig::bare(ScoringMethod::PriceBased);
    assert!(config.with_method(ScoringMethod::LuxuryPremium).is_ok());
    assert!(matches!(
        config.with_method(ScoringMethod::WeightedComposite),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn load_scoring_config_reports_missing_file() {
    let result = load_scoring_config(std::path::Path::new("/nonexistent/scoring.yaml"));
    assert!(matches!(result, Err(ConfigError::FileIo { .. })));
}

#[test]
fn load_scoring_config_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scoring.yaml");
    std::fs::write(&path, WEIGHTED).unwrap();
    let config = load_scoring_config(&path).unwrap();
    assert_eq!(config.method, ScoringMethod::WeightedComposite);
}

#[test]
fn method_names_round_trip() {
    for method in ScoringMethod::ALL {
        assert_eq!(method.as_str().parse::<ScoringMethod>().unwrap(), method);
    }
}

#[test]
fn bonus_keys_equal_after_normalization_are_rejected() {
    let yaml = r"
method: price_based
material_bonus:
  enabled: true
  bonuses:
    Egyptian Cotton: 0.5
    egyptian_cotton: 0.4
";
    assert!(matches!(
        parse_scoring_config(yaml),
        Err(ConfigError::Validation(ref msg)) if msg.contains("duplicates")
    ));
}

#[test]
fn synonym_aliases_equal_after_normalization_are_rejected() {
    let yaml = r"
method: price_based
material_bonus:
  enabled: true
  bonuses:
    egyptian cotton: 0.5
    cotton: 0.1
  synonyms:
    Egyptian: egyptian cotton
    egyptian: cotton
";
    let result = parse_scoring_config(yaml);
    assert!(
        matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("duplicates another synonym")),
        "expected duplicate synonym error, got: {result:?}"
    );
}

#[test]
fn comprehensive_composite_needs_only_its_own_components() {
    let yaml = r"
method: comprehensive_composite
weights:
  comprehensive_composite:
    popularity_score: 0.3
    brand_reputation_score: 0.3
    price_value_score: 0.2
    commission_score: 0.2
";
    let config = parse_scoring_config(yaml).unwrap();
    let weights = config
        .weights_for(ScoringMethod::ComprehensiveComposite)
        .unwrap();
    assert_eq!(weights.len(), 4);
    assert!(config.weights_for(ScoringMethod::WeightedComposite).is_err());
}

#[test]
fn commission_defaults_apply_when_omitted() {
    let config = parse_scoring_config("method: price_based\n").unwrap();
    assert!((config.sub_scores.default_commission_rate - 0.10).abs() < f64::EPSILON);
    assert!((config.sub_scores.commission_thresholds.excellent - 0.15).abs() < f64::EPSILON);
}

#[test]
fn commission_thresholds_out_of_order_are_rejected() {
    let yaml = r"
method: price_based
sub_scores:
  commission_thresholds: { excellent: 0.05, good: 0.10, fair: 0.15 }
";
    assert!(matches!(
        parse_scoring_config(yaml),
        Err(ConfigError::Validation(ref msg)) if msg.contains("descend")
    ));
}
