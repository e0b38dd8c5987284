//! Product URL identification: platform, external id and link type.

use std::sync::LazyLock;

use pcat_core::{LinkType, Platform};
use regex::Regex;

use crate::ScraperError;

static ASIN_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/(?:dp|gp/product|gp/aw/d|product)/([A-Z0-9]{10})(?:[/?#]|$)")
        .expect("valid regex")
});
static ASIN_QUERY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[?&]asin=([A-Z0-9]{10})(?:&|$)").expect("valid regex"));
static WALMART_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/ip/(?:[^/?#]+/)?(\d+)(?:[/?#]|$)").expect("valid regex"));
static TARGET_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/A-(\d+)(?:[/?#]|$)").expect("valid regex"));
static WAYFAIR_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)-([a-z]{1,4}\d{3,})\.html").expect("valid regex"));

/// What a product URL tells us before any page is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUrl {
    pub platform: Platform,
    /// `None` for short links (e.g. `amzn.to`) that must be resolved first.
    pub external_id: Option<String>,
    pub link_type: LinkType,
}

/// Identify the platform, external id and link type of `raw_url`.
///
/// # Errors
///
/// Returns [`ScraperError::UnrecognizedUrl`] if the URL does not parse or
/// does not belong to a supported storefront.
pub fn identify(raw_url: &str) -> Result<ProductUrl, ScraperError> {
    let url = reqwest::Url::parse(raw_url.trim()).map_err(|e| ScraperError::UnrecognizedUrl {
        url: raw_url.to_string(),
        reason: e.to_string(),
    })?;
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let platform = platform_for_host(&host).ok_or_else(|| ScraperError::UnrecognizedUrl {
        url: raw_url.to_string(),
        reason: format!("unsupported host {host:?}"),
    })?;

    Ok(ProductUrl {
        platform,
        external_id: external_id(platform, raw_url),
        link_type: detect_link_type(raw_url),
    })
}

fn platform_for_host(host: &str) -> Option<Platform> {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.iter().any(|l| *l == "amazon" || *l == "amzn") {
        Some(Platform::Amazon)
    } else if labels.contains(&"walmart") {
        Some(Platform::Walmart)
    } else if labels.contains(&"target") {
        Some(Platform::Target)
    } else if labels.contains(&"wayfair") {
        Some(Platform::Wayfair)
    } else {
        None
    }
}

/// Extract the platform's product identifier from `url`, upper-cased for
/// Amazon ASINs.
#[must_use]
pub fn external_id(platform: Platform, url: &str) -> Option<String> {
    let capture = |re: &Regex| {
        re.captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    };
    match platform {
        Platform::Amazon => capture(&ASIN_PATH_RE)
            .or_else(|| capture(&ASIN_QUERY_RE))
            .map(|asin| asin.to_ascii_uppercase()),
        Platform::Walmart => capture(&WALMART_ID_RE),
        Platform::Target => capture(&TARGET_ID_RE),
        Platform::Wayfair => capture(&WAYFAIR_ID_RE).map(|id| id.to_ascii_uppercase()),
    }
}

/// `mobile` for `m.` hosts or URLs mentioning mobile, `desktop` for URLs
/// mentioning desktop, `web` otherwise.
#[must_use]
pub fn detect_link_type(url: &str) -> LinkType {
    let lower = url.to_ascii_lowercase();
    let host = reqwest::Url::parse(&lower)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();
    if host.starts_with("m.") || lower.contains("mobile") {
        LinkType::Mobile
    } else if lower.contains("desktop") {
        LinkType::Desktop
    } else {
        LinkType::Web
    }
}

/// Affiliate program a link is tagged for, used as a log field.
#[must_use]
pub fn affiliate_source(url: &str) -> &'static str {
    let lower = url.to_ascii_lowercase();
    if lower.contains("maas=") {
        "levana"
    } else if lower.contains("tag=") || lower.contains("ref=") {
        "associates"
    } else {
        "untagged"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amazon_dp_url() {
        let id = identify("https://www.amazon.com/Luxury-Sheets/dp/B08M9SMVSG?tag=abc-20").unwrap();
        assert_eq!(id.platform, Platform::Amazon);
        assert_eq!(id.external_id.as_deref(), Some("B08M9SMVSG"));
        assert_eq!(id.link_type, LinkType::Web);
    }

    #[test]
    fn amazon_gp_product_and_query_forms() {
        assert_eq!(
            external_id(Platform::Amazon, "https://www.amazon.com/gp/product/b08m9smvsg/ref=x"),
            Some("B08M9SMVSG".to_string())
        );
        assert_eq!(
            external_id(Platform::Amazon, "https://www.amazon.com/s?k=sheets&asin=B07XYZ1234"),
            Some("B07XYZ1234".to_string())
        );
    }

    #[test]
    fn amazon_short_link_has_no_id() {
        let id = identify("https://amzn.to/3xYzAbC").unwrap();
        assert_eq!(id.platform, Platform::Amazon);
        assert!(id.external_id.is_none());
    }

    #[test]
    fn mobile_host_is_mobile_link() {
        let id = identify("https://m.amazon.com/dp/B08M9SMVSG").unwrap();
        assert_eq!(id.link_type, LinkType::Mobile);
        assert_eq!(id.external_id.as_deref(), Some("B08M9SMVSG"));
    }

    #[test]
    fn desktop_marker_is_desktop_link() {
        assert_eq!(
            detect_link_type("https://www.amazon.com/dp/B08M9SMVSG?view=desktop"),
            LinkType::Desktop
        );
    }

    #[test]
    fn walmart_target_wayfair_ids() {
        assert_eq!(
            external_id(
                Platform::Walmart,
                "https://www.walmart.com/ip/Mainstays-Sheet-Set/123456789"
            ),
            Some("123456789".to_string())
        );
        assert_eq!(
            external_id(
                Platform::Target,
                "https://www.target.com/p/sheet-set/-/A-54321987#lnk=sametab"
            ),
            Some("54321987".to_string())
        );
        assert_eq!(
            external_id(
                Platform::Wayfair,
                "https://www.wayfair.com/bed-bath/pdp/sheet-set-w001234567.html"
            ),
            Some("W001234567".to_string())
        );
    }

    #[test]
    fn unsupported_host_is_rejected() {
        assert!(matches!(
            identify("https://www.ebay.com/itm/1234"),
            Err(ScraperError::UnrecognizedUrl { .. })
        ));
        assert!(matches!(
            identify("not a url"),
            Err(ScraperError::UnrecognizedUrl { .. })
        ));
    }

    #[test]
    fn amazon_url_without_asin_has_no_id() {
        let id = identify("https://www.amazon.com/s?k=bed+sheets").unwrap();
        assert!(id.external_id.is_none());
    }

    #[test]
    fn affiliate_sources() {
        assert_eq!(affiliate_source("https://amazon.com/dp/X?maas=maas_adg"), "levana");
        assert_eq!(affiliate_source("https://amazon.com/dp/X?tag=abc-20"), "associates");
        assert_eq!(affiliate_source("https://amazon.com/dp/X"), "untagged");
    }
}
