//! Product page parsing.
//!
//! Storefront markup is matched with targeted regexes for the well-known
//! element ids (`#productTitle`, `#acrCustomerReviewText`, ...). Anything
//! those miss is filled from an embedded schema.org `Product` JSON-LD block
//! when the page carries one.

use std::sync::LazyLock;

use pcat_core::{CandidateImage, ProductAttributes};
use regex::Regex;
use serde_json::Value;

use crate::ScraperError;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)id="productTitle"[^>]*>(.*?)</span>"#).expect("valid regex")
});
static OFFSCREEN_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)class="a-price[^"]*"[^>]*>\s*<span class="a-offscreen">([^<]+)</span>"#)
        .expect("valid regex")
});
static WHOLE_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)class="a-price-whole">([\d,]+)(?:<span class="a-price-decimal">\.</span>)?</span>(?:\s*<span class="a-price-fraction">(\d+)</span>)?"#,
    )
    .expect("valid regex")
});
static RATING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d(?:\.\d)?) out of 5 stars").expect("valid regex")
});
static REVIEW_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)id="acrCustomerReviewText"[^>]*>\s*([\d,]+)"#).expect("valid regex")
});
static BYLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)id="bylineInfo"[^>]*>(.*?)</a>"#).expect("valid regex")
});
static BULLETS_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)id="feature-bullets".*?<ul[^>]*>(.*?)</ul>"#).expect("valid regex")
});
static LIST_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<span class="a-list-item">(.*?)</span>"#).expect("valid regex")
});
static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)id="productDescription"[^>]*>(.*?)</div>"#).expect("valid regex")
});
static LANDING_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<img[^>]*id="landingImage"[^>]*>"#).expect("valid regex"));
static OLD_HIRES_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-old-hires="([^"]+)""#).expect("valid regex"));
static SRC_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\ssrc="([^"]+)""#).expect("valid regex"));
static HIRES_JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""hiRes"\s*:\s*"(https?://[^"]+)""#).expect("valid regex"));
static JSON_LD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type="application/ld\+json"[^>]*>(.*?)</script>"#)
        .expect("valid regex")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x?)([0-9a-fA-F]+);").expect("valid regex"));

/// Maximum number of gallery images kept per page.
const MAX_IMAGES: usize = 10;

/// Everything parsed from one product page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedPage {
    pub attributes: ProductAttributes,
    pub bullets: Vec<String>,
    /// Gallery images in page order; the first is marked primary.
    pub images: Vec<CandidateImage>,
}

/// Returns `true` for robot-check interstitials served instead of the page.
#[must_use]
pub fn is_bot_challenge(html: &str) -> bool {
    html.contains("Robot Check") || html.to_lowercase().contains("captcha")
}

/// Parse a product page.
///
/// # Errors
///
/// Returns [`ScraperError::BotChallenge`] for robot-check pages and
/// [`ScraperError::EmptyPage`] if neither a title nor a price was found.
pub fn parse_product_page(html: &str, url: &str) -> Result<ScrapedPage, ScraperError> {
    if is_bot_challenge(html) {
        return Err(ScraperError::BotChallenge {
            url: url.to_string(),
        });
    }

    let mut attributes = ProductAttributes {
        title: first_text(&TITLE_RE, html),
        price: parse_price_markup(html),
        rating: RATING_RE
            .captures(html)
            .and_then(|c| c[1].parse::<f64>().ok()),
        review_count: REVIEW_COUNT_RE
            .captures(html)
            .and_then(|c| parse_count(&c[1])),
        brand: first_text(&BYLINE_RE, html).and_then(|b| clean_brand(&b)),
        description: first_text(&DESCRIPTION_RE, html),
        ..ProductAttributes::default()
    };
    let bullets = parse_bullets(html);
    let mut image_urls = parse_image_urls(html);

    if let Some(product) = json_ld_product(html) {
        apply_json_ld(&product, &mut attributes, &mut image_urls);
    }

    if attributes.title.is_none() && attributes.price.is_none() {
        return Err(ScraperError::EmptyPage {
            url: url.to_string(),
        });
    }

    let images = image_urls
        .into_iter()
        .take(MAX_IMAGES)
        .enumerate()
        .map(|(i, url)| CandidateImage { url, primary: i == 0 })
        .collect();

    Ok(ScrapedPage {
        attributes,
        bullets,
        images,
    })
}

// ---------------------------------------------------------------------------
// Markup fields
// ---------------------------------------------------------------------------

fn first_text(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .map(|c| clean_text(&c[1]))
        .filter(|t| !t.is_empty())
}

fn parse_price_markup(html: &str) -> Option<f64> {
    if let Some(price) = OFFSCREEN_PRICE_RE
        .captures(html)
        .and_then(|c| parse_price(&c[1]))
    {
        return Some(price);
    }
    let c = WHOLE_PRICE_RE.captures(html)?;
    let whole = c[1].replace(',', "");
    let fraction = c.get(2).map_or("00", |m| m.as_str());
    format!("{whole}.{fraction}").parse().ok()
}

/// Parse a display price such as `$1,299.99`.
#[must_use]
pub fn parse_price(raw: &str) -> Option<f64> {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse::<f64>().ok().filter(|p| p.is_finite())
}

fn parse_count(raw: &str) -> Option<i64> {
    raw.replace(',', "").trim().parse().ok()
}

/// Strip the "Visit the X Store" / "Brand: X" byline decoration.
fn clean_brand(byline: &str) -> Option<String> {
    let mut brand = byline.trim();
    for prefix in ["Visit the ", "Brand: "] {
        brand = brand.strip_prefix(prefix).unwrap_or(brand);
    }
    brand = brand.strip_suffix(" Store").unwrap_or(brand).trim();
    (!brand.is_empty()).then(|| brand.to_string())
}

fn parse_bullets(html: &str) -> Vec<String> {
    let Some(block) = BULLETS_BLOCK_RE.captures(html) else {
        return Vec::new();
    };
    LIST_ITEM_RE
        .captures_iter(&block[1])
        .map(|c| clean_text(&c[1]))
        .filter(|t| !t.is_empty())
        .collect()
}

fn parse_image_urls(html: &str) -> Vec<String> {
    let mut urls = Vec::new();
    if let Some(tag) = LANDING_IMAGE_RE.find(html) {
        let tag = tag.as_str();
        let landing = OLD_HIRES_ATTR_RE
            .captures(tag)
            .or_else(|| SRC_ATTR_RE.captures(tag))
            .map(|c| decode_entities(&c[1]));
        urls.extend(landing);
    }
    for c in HIRES_JSON_RE.captures_iter(html) {
        push_unique(&mut urls, c[1].replace("\\/", "/"));
    }
    urls.retain(|u| u.starts_with("http"));
    urls
}

fn push_unique(urls: &mut Vec<String>, url: String) {
    if !urls.contains(&url) {
        urls.push(url);
    }
}

// ---------------------------------------------------------------------------
// JSON-LD fallback
// ---------------------------------------------------------------------------

fn json_ld_product(html: &str) -> Option<Value> {
    JSON_LD_RE
        .captures_iter(html)
        .filter_map(|c| serde_json::from_str::<Value>(c[1].trim()).ok())
        .find_map(find_product_node)
}

fn find_product_node(value: Value) -> Option<Value> {
    match value {
        Value::Array(items) => items.into_iter().find_map(find_product_node),
        Value::Object(mut map) => {
            if is_product_type(map.get("@type")) {
                return Some(Value::Object(map));
            }
            map.remove("@graph").and_then(find_product_node)
        }
        _ => None,
    }
}

fn is_product_type(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(t)) => t == "Product",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Product")),
        _ => false,
    }
}

/// Fill fields the markup did not yield from a JSON-LD `Product` node.
fn apply_json_ld(product: &Value, attributes: &mut ProductAttributes, images: &mut Vec<String>) {
    if attributes.title.is_none() {
        attributes.title = json_text(product.get("name"));
    }
    if attributes.brand.is_none() {
        attributes.brand = match product.get("brand") {
            Some(Value::Object(brand)) => json_text(brand.get("name")),
            other => json_text(other),
        };
    }
    if attributes.description.is_none() {
        attributes.description = json_text(product.get("description"));
    }
    if attributes.price.is_none() {
        let offer = match product.get("offers") {
            Some(Value::Array(offers)) => offers.first(),
            other => other,
        };
        attributes.price = offer
            .and_then(|o| o.get("price").or_else(|| o.get("lowPrice")))
            .and_then(json_number);
    }
    if let Some(rating) = product.get("aggregateRating") {
        if attributes.rating.is_none() {
            attributes.rating = rating.get("ratingValue").and_then(json_number);
        }
        if attributes.review_count.is_none() {
            #[allow(clippy::cast_possible_truncation)]
            let count = rating
                .get("reviewCount")
                .or_else(|| rating.get("ratingCount"))
                .and_then(json_number)
                .map(|c| c as i64);
            attributes.review_count = count;
        }
    }
    match product.get("image") {
        Some(Value::String(url)) => push_unique(images, url.clone()),
        Some(Value::Array(urls)) => {
            for url in urls.iter().filter_map(Value::as_str) {
                push_unique(images, url.to_string());
            }
        }
        _ => {}
    }
}

fn json_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(clean_text)
        .filter(|t| !t.is_empty())
}

/// JSON-LD numbers are frequently quoted (`"price": "49.99"`).
fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_price(s),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Text cleanup
// ---------------------------------------------------------------------------

/// Remove tags, decode entities and collapse whitespace.
#[must_use]
pub fn clean_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    let numeric = NUMERIC_ENTITY_RE.replace_all(text, |c: &regex::Captures<'_>| {
        let radix = if c[1].is_empty() { 10 } else { 16 };
        u32::from_str_radix(&c[2], radix)
            .ok()
            .and_then(char::from_u32)
            .map_or_else(|| c[0].to_string(), |ch| ch.to_string())
    });
    numeric
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
#[path = "page_test.rs"]
mod tests;
