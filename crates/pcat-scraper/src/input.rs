//! URL input files: CSV, plain text (one URL per line) and JSON.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use pcat_core::{ScoreComponent, SubScores};
use serde::Deserialize;

use crate::ScraperError;

const URL_COLUMNS: [&str; 3] = ["url", "link", "affiliate_url"];

/// One URL to ingest plus the optional affiliate metadata that came with it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UrlEntry {
    pub url: String,
    #[serde(default)]
    pub commission_rate: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Sub-scores given alongside the URL, keyed by component name.
    #[serde(flatten)]
    pub sub_scores: SubScores,
}

impl UrlEntry {
    fn bare(url: &str) -> Self {
        Self {
            url: url.trim().to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Txt,
    Json,
}

impl InputFormat {
    /// Infer the format from a file extension; anything unknown is text.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") => Self::Csv,
            Some("json") => Self::Json,
            _ => Self::Txt,
        }
    }
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "txt" | "text" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown input format \"{other}\" (expected csv, txt or json)")),
        }
    }
}

/// Read URL entries from `path`. The format is inferred from the extension
/// unless `format` is given.
///
/// # Errors
///
/// Returns [`ScraperError::Io`] if the file cannot be read and
/// [`ScraperError::InputFile`] if its contents do not parse.
pub fn read_input_file(
    path: &Path,
    format: Option<InputFormat>,
) -> Result<Vec<UrlEntry>, ScraperError> {
    let content = fs::read_to_string(path).map_err(|source| ScraperError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let format = format.unwrap_or_else(|| InputFormat::from_path(path));
    let invalid = |reason: String| ScraperError::InputFile {
        path: path.display().to_string(),
        reason,
    };

    let entries = match format {
        InputFormat::Csv => parse_csv(&content).map_err(invalid)?,
        InputFormat::Txt => parse_txt(&content),
        InputFormat::Json => parse_json(&content).map_err(invalid)?,
    };
    tracing::debug!(
        path = %path.display(),
        ?format,
        count = entries.len(),
        "read input file"
    );
    Ok(entries)
}

/// One URL per line; lines not starting with `http` are ignored.
#[must_use]
pub fn parse_txt(content: &str) -> Vec<UrlEntry> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("http"))
        .map(UrlEntry::bare)
        .collect()
}

/// CSV with a header row. The URL comes from a `url`/`link`/`affiliate_url`
/// column, else the first cell starting with `http`. Columns named after a
/// score component (`luxury_score`, ...) supply that sub-score.
///
/// # Errors
///
/// Returns a description of the first malformed record.
pub fn parse_csv(content: &str) -> Result<Vec<UrlEntry>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(str::to_ascii_lowercase)
        .collect();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let url_column = URL_COLUMNS.iter().find_map(|name| column(name));
    let commission_column = column("commission_rate");
    let notes_column = column("notes");
    let score_columns: Vec<(ScoreComponent, usize)> = ScoreComponent::ALL
        .into_iter()
        .filter_map(|c| column(c.as_str()).map(|i| (c, i)))
        .collect();

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        let url = url_column
            .and_then(|i| record.get(i))
            .filter(|u| u.starts_with("http"))
            .or_else(|| record.iter().find(|cell| cell.starts_with("http")));
        let Some(url) = url else {
            continue;
        };
        let cell = |i: Option<usize>| i.and_then(|i| record.get(i)).filter(|v| !v.is_empty());
        let mut sub_scores = SubScores::default();
        for &(component, i) in &score_columns {
            let value = cell(Some(i)).and_then(|v| v.parse::<f64>().ok());
            sub_scores.set(component, value.filter(|v| v.is_finite()));
        }
        entries.push(UrlEntry {
            url: url.to_string(),
            commission_rate: cell(commission_column).and_then(|v| v.parse().ok()),
            notes: cell(notes_column).map(str::to_string),
            sub_scores,
        });
    }
    Ok(entries)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonEntry {
    Url(String),
    Entry(UrlEntry),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonInput {
    Wrapped { urls: Vec<JsonEntry> },
    Bare(Vec<JsonEntry>),
}

/// `{"urls": [...]}` or a bare array; entries are URL strings or objects
/// with `url`, `commission_rate`, `notes` and any score components.
///
/// # Errors
///
/// Returns the parse error if the document has neither shape.
pub fn parse_json(content: &str) -> Result<Vec<UrlEntry>, String> {
    let input: JsonInput = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let (JsonInput::Wrapped { urls: items } | JsonInput::Bare(items)) = input;
    Ok(items
        .into_iter()
        .map(|item| match item {
            JsonEntry::Url(url) => UrlEntry::bare(&url),
            JsonEntry::Entry(entry) => UrlEntry {
                url: entry.url.trim().to_string(),
                ..entry
            },
        })
        .filter(|entry| entry.url.starts_with("http"))
        .collect())
}
