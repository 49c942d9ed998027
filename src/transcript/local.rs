//! Filesystem-backed object store

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use crate::config::Settings;
use crate::transcript::{parse_locator, FetchError, TranscriptSource};

/// Resolves `scheme://bucket/key` to `<root>/<bucket>/<key>`.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.transcripts.root.clone())
    }

    /// Map a locator onto a path under the store root
    pub fn resolve(&self, locator: &str) -> Result<PathBuf, FetchError> {
        let location = parse_locator(locator)?;

        let relative = Path::new(location.bucket).join(location.key);
        let escapes_root = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes_root {
            return Err(FetchError::InvalidLocator(locator.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl TranscriptSource for LocalObjectStore {
    async fn fetch_text(&self, locator: &str) -> Result<String, FetchError> {
        let path = self.resolve(locator)?;

        tracing::debug!("Reading transcript from: {}", path.display());
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound(locator.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(String::from_utf8(bytes)?)
    }
}
