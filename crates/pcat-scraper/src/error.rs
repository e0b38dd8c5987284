use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("bot challenge served for {url}")]
    BotChallenge { url: String },

    #[error("unrecognized product URL \"{url}\": {reason}")]
    UnrecognizedUrl { url: String, reason: String },

    #[error("no product data found on {url}")]
    EmptyPage { url: String },

    #[error("failed to read input file {path}: {reason}")]
    InputFile { path: String, reason: String },

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
