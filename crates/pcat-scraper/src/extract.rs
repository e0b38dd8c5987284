//! Keyword-table extraction of material, color, weave and dimensions from
//! free product text, plus thread count.

use std::sync::LazyLock;

use pcat_core::vocabulary::NormalizedText;
use pcat_core::{ProductAttributes, TermGroup, Vocabulary};
use regex::Regex;

static DIMENSIONS_3D_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(\d+(?:\.\d+)?)\s*(?:"|in(?:ch(?:es)?)?\.?)?\s*[x×]\s*(\d+(?:\.\d+)?)\s*(?:"|in(?:ch(?:es)?)?\.?)?\s*[x×]\s*(\d+(?:\.\d+)?)\s*("|in(?:ch(?:es)?)?|cm)?"#,
    )
    .expect("valid regex")
});
static DIMENSIONS_2D_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(\d+(?:\.\d+)?)\s*(?:"|in(?:ch(?:es)?)?\.?)?\s*[x×]\s*(\d+(?:\.\d+)?)\s*("|in(?:ch(?:es)?)?|cm)?"#,
    )
    .expect("valid regex")
});
static INCHES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(\d+(?:\.\d+)?)\s*(?:-\s*)?(?:inch(?:es)?|in\.|")"#).expect("valid regex")
});
static THREAD_COUNT_RES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        r"(?i)\b(\d{3,4})[\s-]*thread",
        r"(?i)\bthread[\s-]*count[:\s]*(\d{3,4})\b",
        r"(?i)\b(\d{3,4})\s*tc\b",
    ]
    .map(|pattern| Regex::new(pattern).expect("valid regex"))
});

/// Thread counts outside this range are treated as misreads.
const THREAD_COUNT_RANGE: std::ops::RangeInclusive<i32> = 200..=2000;

/// Signals found in a block of product text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub material: Option<String>,
    pub color: Option<String>,
    pub weave: Option<String>,
    pub dimensions: Option<String>,
    pub thread_count: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct FieldExtractor {
    vocabulary: Vocabulary,
}

impl FieldExtractor {
    #[must_use]
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Scan `text` for every signal. Each table is searched in order and the
    /// first group with a matching term wins.
    #[must_use]
    pub fn extract(&self, text: &str) -> ExtractedFields {
        let normalized = NormalizedText::new(text);
        let value_of =
            |groups: &[TermGroup]| normalized.first_group(groups).map(|g| g.value.clone());
        ExtractedFields {
            material: value_of(&self.vocabulary.materials),
            color: value_of(&self.vocabulary.colors),
            weave: value_of(&self.vocabulary.weaves),
            dimensions: extract_dimensions(text),
            thread_count: extract_thread_count(text),
        }
    }

    /// Fill attributes the scraper left empty from the title, description
    /// and feature bullets. Values already present are kept.
    pub fn fill_attributes(&self, attributes: &mut ProductAttributes, bullets: &[String]) {
        let mut corpus = String::new();
        for part in [&attributes.title, &attributes.description]
            .into_iter()
            .flatten()
            .chain(bullets)
        {
            corpus.push_str(part);
            corpus.push('\n');
        }
        if corpus.trim().is_empty() {
            return;
        }

        let found = self.extract(&corpus);
        attributes.fill_missing(&ProductAttributes {
            material: found.material,
            color: found.color,
            weave: found.weave,
            dimensions: found.dimensions,
            thread_count: found.thread_count,
            ..ProductAttributes::default()
        });
    }
}

/// First `A x B x C`, `A x B` or `N inch` measurement in `text`, normalized
/// to `A x B x C <unit>` form.
#[must_use]
pub fn extract_dimensions(text: &str) -> Option<String> {
    if let Some(c) = DIMENSIONS_3D_RE.captures(text) {
        let unit = unit_suffix(c.get(4).map(|m| m.as_str()));
        return Some(format!("{} x {} x {}{unit}", &c[1], &c[2], &c[3]));
    }
    if let Some(c) = DIMENSIONS_2D_RE.captures(text) {
        let unit = unit_suffix(c.get(3).map(|m| m.as_str()));
        return Some(format!("{} x {}{unit}", &c[1], &c[2]));
    }
    INCHES_RE
        .captures(text)
        .map(|c| format!("{} inches", &c[1]))
}

/// First plausible thread count in `text`: `800 thread count`,
/// `Thread Count: 600` or `1000TC`.
#[must_use]
pub fn extract_thread_count(text: &str) -> Option<i32> {
    THREAD_COUNT_RES.iter().find_map(|re| {
        re.captures_iter(text)
            .filter_map(|c| c[1].parse::<i32>().ok())
            .find(|n| THREAD_COUNT_RANGE.contains(n))
    })
}

fn unit_suffix(raw: Option<&str>) -> &'static str {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        Some("cm") => " cm",
        Some(_) => " inches",
        None => "",
    }
}
