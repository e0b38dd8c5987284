//! Keyword tables shared by the feature categorizer and the field extractor.
//!
//! The tables are data, not code: a default copy of `config/vocabulary.yaml`
//! is compiled in and a different file can be supplied at startup.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::features::{FeatureCategory, Importance};
use crate::ConfigError;

const BUILTIN_VOCABULARY: &str = include_str!("../../../config/vocabulary.yaml");

/// A canonical value and the phrases that identify it, e.g. `Gray` for
/// `gray` or `grey`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TermGroup {
    pub value: String,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PolarityMarkers {
    #[serde(default)]
    pub pro: Vec<String>,
    #[serde(default)]
    pub con: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Vocabulary {
    pub categories: HashMap<FeatureCategory, Vec<String>>,
    #[serde(default)]
    pub importance: HashMap<Importance, Vec<String>>,
    #[serde(default)]
    pub polarity: PolarityMarkers,
    #[serde(default)]
    pub materials: Vec<TermGroup>,
    #[serde(default)]
    pub colors: Vec<TermGroup>,
    #[serde(default)]
    pub weaves: Vec<TermGroup>,
    /// Product types named in display titles, most specific first.
    #[serde(default)]
    pub product_types: Vec<TermGroup>,
    #[serde(default)]
    pub sizes: Vec<TermGroup>,
}

impl Vocabulary {
    /// The vocabulary compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` only if the embedded document is malformed.
    pub fn builtin() -> Result<Self, ConfigError> {
        parse_vocabulary(BUILTIN_VOCABULARY, "<builtin>")
    }

    #[must_use]
    pub fn category_keywords(&self, category: FeatureCategory) -> &[String] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn importance_keywords(&self, importance: Importance) -> &[String] {
        self.importance
            .get(&importance)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Load the vocabulary from `path`, or the built-in copy when `path` is `None`.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_vocabulary(path: Option<&Path>) -> Result<Vocabulary, ConfigError> {
    let Some(path) = path else {
        return Vocabulary::builtin();
    };
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_vocabulary(&content, &path.display().to_string())
}

fn parse_vocabulary(content: &str, origin: &str) -> Result<Vocabulary, ConfigError> {
    let vocabulary: Vocabulary =
        serde_yaml::from_str(content).map_err(|e| ConfigError::FileParse {
            path: origin.to_string(),
            source: e,
        })?;
    validate_vocabulary(&vocabulary)?;
    Ok(vocabulary)
}

/// Validate a parsed vocabulary.
///
/// # Errors
///
/// Returns `ConfigError::Validation` on the first problem found.
pub fn validate_vocabulary(vocabulary: &Vocabulary) -> Result<(), ConfigError> {
    if vocabulary.categories.values().all(Vec::is_empty) {
        return Err(ConfigError::Validation(
            "vocabulary defines no category keywords".to_string(),
        ));
    }

    let keyword_lists = vocabulary
        .categories
        .iter()
        .map(|(c, k)| (c.as_str(), k))
        .chain(vocabulary.importance.iter().map(|(i, k)| (i.as_str(), k)))
        .chain([
            ("pro", &vocabulary.polarity.pro),
            ("con", &vocabulary.polarity.con),
        ]);
    for (table, keywords) in keyword_lists {
        if keywords.iter().any(|k| normalize_words(k).is_empty()) {
            return Err(ConfigError::Validation(format!(
                "blank keyword in vocabulary table {table}"
            )));
        }
    }

    for (table, groups) in [
        ("materials", &vocabulary.materials),
        ("colors", &vocabulary.colors),
        ("weaves", &vocabulary.weaves),
        ("product_types", &vocabulary.product_types),
        ("sizes", &vocabulary.sizes),
    ] {
        for group in groups {
            if group.value.trim().is_empty() || group.terms.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "vocabulary table {table} has an entry without a value or terms"
                )));
            }
            if group.terms.iter().any(|t| normalize_words(t).is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "blank term for {} in vocabulary table {table}",
                    group.value
                )));
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Phrase matching
// ---------------------------------------------------------------------------

/// Lowercase `text` and reduce it to single-space separated words.
/// Everything except letters, digits and apostrophes separates words.
#[must_use]
pub fn normalize_words(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text prepared for whole-word phrase lookups.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    padded: String,
}

impl NormalizedText {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            padded: format!(" {} ", normalize_words(text)),
        }
    }

    /// `true` if `phrase` occurs in the text on word boundaries.
    #[must_use]
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        let phrase = normalize_words(phrase);
        !phrase.is_empty() && self.padded.contains(&format!(" {phrase} "))
    }

    /// `true` if any of `phrases` occurs in the text.
    #[must_use]
    pub fn contains_any<S: AsRef<str>>(&self, phrases: &[S]) -> bool {
        phrases.iter().any(|p| self.contains_phrase(p.as_ref()))
    }

    /// Number of `phrases` that occur in the text.
    #[must_use]
    pub fn count_matches<S: AsRef<str>>(&self, phrases: &[S]) -> usize {
        phrases
            .iter()
            .filter(|p| self.contains_phrase(p.as_ref()))
            .count()
    }

    /// First group (in table order) with a term present in the text.
    #[must_use]
    pub fn first_group<'a>(&self, groups: &'a [TermGroup]) -> Option<&'a TermGroup> {
        groups.iter().find(|g| self.contains_any(&g.terms))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.padded.trim()
    }
}
