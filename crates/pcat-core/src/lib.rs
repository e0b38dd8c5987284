pub mod app_config;
pub mod config;
pub mod features;
pub mod products;
pub mod scoring_config;
pub mod stats;
pub mod store;
pub mod vocabulary;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use features::{Feature, FeatureCategory, Importance, Polarity};
pub use products::{
    derive_sku, AffiliateLink, Candidate, CandidateImage, FetchedImage, LinkType, NewAffiliateLink,
    NewProduct, NewProductImage, Platform, Product, ProductAttributes, ProductImage, SubScores,
};
pub use scoring_config::{
    load_scoring_config, parse_scoring_config, BonusMode, CommissionThresholds,
    MaterialBonusConfig, PriceTier, PriceTierConfig, ScoreComponent, ScoringConfig,
    ScoringMethod, SubScoreConfig,
};
pub use stats::RunStats;
pub use store::{CatalogStore, ImageSink, InsertOutcome};
pub use vocabulary::{load_vocabulary, TermGroup, Vocabulary};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    FileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown {kind}: {value:?}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("invalid external id {value:?}: {reason}")]
    InvalidExternalId { value: String, reason: &'static str },
}
