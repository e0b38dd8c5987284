use std::path::{Path, PathBuf};

use pcat_core::{FetchedImage, ImageSink};

use crate::client::PageClient;
use crate::ScraperError;

/// Downloads product images over HTTP and writes them under `images_dir`
/// as `{sku}.jpg`, `{sku}_1.jpg`, ...
#[derive(Debug, Clone)]
pub struct ImageDownloader {
    client: PageClient,
    images_dir: PathBuf,
}

impl ImageDownloader {
    #[must_use]
    pub fn new(client: PageClient, images_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            images_dir: images_dir.into(),
        }
    }

    #[must_use]
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }
}

/// File name for the `ordinal`-th image of `sku`.
#[must_use]
pub fn image_file_name(sku: &str, ordinal: usize, extension: &str) -> String {
    if ordinal == 0 {
        format!("{sku}{extension}")
    } else {
        format!("{sku}_{ordinal}{extension}")
    }
}

impl ImageSink for ImageDownloader {
    type Error = ScraperError;

    async fn fetch(&self, url: &str) -> Result<FetchedImage, ScraperError> {
        self.client.fetch_image(url).await
    }

    async fn save(
        &self,
        sku: &str,
        ordinal: usize,
        image: &FetchedImage,
    ) -> Result<String, ScraperError> {
        let io_error = |path: &Path| {
            let path = path.display().to_string();
            move |source| ScraperError::Io { path, source }
        };
        tokio::fs::create_dir_all(&self.images_dir)
            .await
            .map_err(io_error(&self.images_dir))?;
        let path = self
            .images_dir
            .join(image_file_name(sku, ordinal, image.extension()));
        tokio::fs::write(&path, &image.bytes)
            .await
            .map_err(io_error(&path))?;
        tracing::debug!(sku, path = %path.display(), bytes = image.bytes.len(), "saved image");
        Ok(path.display().to_string())
    }
}
