//! Storefront scraping for the product catalog pipeline: URL identification,
//! page fetching and parsing, keyword field extraction, URL input files and
//! image downloads.

pub mod client;
pub mod error;
pub mod extract;
pub mod images;
pub mod input;
pub mod page;
pub mod rate_limit;
pub mod url;

pub use client::{FetchedPage, PageClient};
pub use error::ScraperError;
pub use extract::{extract_dimensions, extract_thread_count, ExtractedFields, FieldExtractor};
pub use images::ImageDownloader;
pub use input::{read_input_file, InputFormat, UrlEntry};
pub use page::{parse_product_page, ScrapedPage};
pub use rate_limit::Cooldown;
pub use url::{affiliate_source, detect_link_type, identify, ProductUrl};
