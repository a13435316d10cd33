//! Image sources and how their bytes are obtained

use async_trait::async_trait;
use bytes::Bytes;
use pixmatch_core::{Error, Result};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Query or catalog image: raw bytes or a fetchable location
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Bytes(Bytes),
    /// `http(s)://` URL or local file path
    Url(String),
}

impl ImageSource {
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        ImageSource::Bytes(bytes.into())
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        ImageSource::Url(url.into())
    }

    /// Stable identity of the source
    ///
    /// The location itself for URLs, a content digest for raw bytes.
    pub fn reference(&self) -> String {
        match self {
            ImageSource::Url(url) => url.clone(),
            ImageSource::Bytes(bytes) => format!("sha256:{:x}", Sha256::digest(bytes)),
        }
    }
}

#[inline]
pub fn is_remote(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Reads image bytes from a location
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<Bytes>;
}

/// Fetches `http(s)` URLs with reqwest and reads everything else from disk
pub struct DefaultFetcher {
    client: reqwest::Client,
}

impl DefaultFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for DefaultFetcher {
    async fn fetch(&self, location: &str) -> Result<Bytes> {
        if is_remote(location) {
            let response = self
                .client
                .get(location)
                .send()
                .await
                .map_err(|e| Error::Fetch(format!("{}: {}", location, e)))?;

            if !response.status().is_success() {
                return Err(Error::Fetch(format!(
                    "{}: HTTP {}",
                    location,
                    response.status()
                )));
            }

            response
                .bytes()
                .await
                .map_err(|e| Error::Fetch(format!("{}: {}", location, e)))
        } else {
            tokio::fs::read(location)
                .await
                .map(Bytes::from)
                .map_err(|e| Error::Fetch(format!("{}: {}", location, e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_reference_is_location() {
        let source = ImageSource::from_url("https://cdn.example.com/mug-1.jpg");
        assert_eq!(source.reference(), "https://cdn.example.com/mug-1.jpg");
    }

    #[test]
    fn test_bytes_reference_is_stable_digest() {
        let a = ImageSource::from_bytes(vec![1u8, 2, 3]);
        let b = ImageSource::from_bytes(vec![1u8, 2, 3]);
        let c = ImageSource::from_bytes(vec![3u8, 2, 1]);
        assert_eq!(a.reference(), b.reference());
        assert_ne!(a.reference(), c.reference());
        assert!(a.reference().starts_with("sha256:"));
        assert_eq!(a.reference().len(), "sha256:".len() + 64);
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/a.png"));
        assert!(is_remote("HTTP://example.com/a.png"));
        assert!(!is_remote("assets/products/jacket-1.jpg"));
        assert!(!is_remote("/tmp/a.png"));
    }

    #[tokio::test]
    async fn test_default_fetcher_reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.bin");
        std::fs::write(&path, b"not really an image").unwrap();

        let fetcher = DefaultFetcher::new(Duration::from_secs(1)).unwrap();
        let bytes = fetcher.fetch(path.to_str().unwrap()).await.unwrap();
        assert_eq!(&bytes[..], b"not really an image");
    }

    #[tokio::test]
    async fn test_default_fetcher_missing_file_is_fetch_error() {
        let fetcher = DefaultFetcher::new(Duration::from_secs(1)).unwrap();
        let err = fetcher.fetch("/definitely/not/here.png").await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
    }
}
