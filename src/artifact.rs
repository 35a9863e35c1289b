//! Generated posters and where they live on disk.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::constants::{ARTIFACT_PREFIX, GENERATED_MOUNT};
use crate::error::RosterError;

/// A poster returned by the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedArtifact {
    /// base64 image bytes, as received
    pub data: String,
    /// eg `image/png`
    pub mime_type: String,
    /// file extension derived from the MIME type
    pub extension: String,
    /// `roster_<epoch-ms>.<ext>`
    pub file_name: String,
}

impl GeneratedArtifact {
    /// Names the artifact after the current time.
    pub fn new(mime_type: &str, data: String) -> Self {
        Self::at(mime_type, data, Utc::now().timestamp_millis())
    }

    /// Names the artifact after `epoch_ms`.
    pub fn at(mime_type: &str, data: String, epoch_ms: i64) -> Self {
        let extension = extension_for_mime(mime_type);
        let file_name = format!("{ARTIFACT_PREFIX}_{epoch_ms}.{extension}");
        Self {
            data,
            mime_type: mime_type.to_string(),
            extension,
            file_name,
        }
    }
}

/// `image/png` -> `png`. Falls back to `png` when the subtype is missing or unusable
/// as a filename.
pub fn extension_for_mime(mime_type: &str) -> String {
    let subtype = mime_type
        .split_once('/')
        .map(|(_, subtype)| subtype)
        .unwrap_or_default()
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match subtype.as_str() {
        "" => "png".to_string(),
        other if other.chars().all(|c| c.is_ascii_alphanumeric()) => other.to_string(),
        _ => "png".to_string(),
    }
}

/// Writes artifacts to the generated directory and hands out their public URL.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
    public_base_url: String,
}

impl ArtifactStore {
    /// `public_base_url` must not end in a slash.
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Directory the artifacts are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the directory if needed, safe to call repeatedly.
    pub async fn ensure_dir(&self) -> Result<(), RosterError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Public URL for a stored file.
    pub fn public_url(&self, file_name: &str) -> String {
        format!("{}{GENERATED_MOUNT}/{file_name}", self.public_base_url)
    }

    /// Writes the artifact and returns its public URL.
    ///
    /// Filenames only have millisecond resolution. An existing file is never
    /// replaced, a same-millisecond collision fails the write instead.
    pub async fn persist(&self, artifact: &GeneratedArtifact) -> Result<String, RosterError> {
        let bytes = STANDARD.decode(&artifact.data)?;
        let path = self.dir.join(&artifact.file_name);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|err| {
                RosterError::Persistence(format!("{}: {err}", path.display()))
            })?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        let url = self.public_url(&artifact.file_name);
        info!("Image saved ({} bytes), public URL {url}", bytes.len());
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TEST_BASE_URL;

    #[test]
    fn extensions_from_mime() {
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("image/JPEG"), "jpeg");
        assert_eq!(extension_for_mime("image/webp; q=1"), "webp");
        assert_eq!(extension_for_mime("image"), "png");
        assert_eq!(extension_for_mime("image/../../etc"), "png");
        assert_eq!(extension_for_mime("image/svg+xml"), "png");
    }

    #[test]
    fn file_name_follows_timestamp() {
        let artifact = GeneratedArtifact::at("image/png", "AAAA".to_string(), 1_700_000_000_123);
        assert_eq!(artifact.file_name, "roster_1700000000123.png");
        assert_eq!(artifact.extension, "png");
    }

    #[tokio::test]
    async fn persist_writes_decoded_bytes_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path().join("generated"), TEST_BASE_URL);
        store.ensure_dir().await.expect("mkdir");
        store.ensure_dir().await.expect("mkdir twice");

        let artifact = GeneratedArtifact::at("image/png", STANDARD.encode(b"poster"), 42);
        let url = store.persist(&artifact).await.expect("persist");
        assert_eq!(url, format!("{TEST_BASE_URL}/generated/roster_42.png"));
        let written = std::fs::read(store.dir().join("roster_42.png")).expect("read");
        assert_eq!(written, b"poster");

        let again = GeneratedArtifact::at("image/png", STANDARD.encode(b"other"), 42);
        assert!(matches!(
            store.persist(&again).await,
            Err(RosterError::Persistence(_))
        ));
        let written = std::fs::read(store.dir().join("roster_42.png")).expect("read");
        assert_eq!(written, b"poster");
    }
}
