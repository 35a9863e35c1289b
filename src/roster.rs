//! Loads the roster photos that are sent alongside the fan photo.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info};

use crate::constants::{MAX_ROSTER_IMAGES, ROSTER_EXTENSIONS};
use crate::error::RosterError;
use crate::models::{InlineImage, Style};

/// MIME type for a roster file, `None` when the extension isn't supported.
pub fn mime_for_filename(filename: &str) -> Option<String> {
    let (_, extension) = filename.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    if !ROSTER_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }
    Some(match extension.as_str() {
        "jpg" => "image/jpeg".to_string(),
        other => format!("image/{other}"),
    })
}

/// Lists supported roster files, sorted by filename and capped at [`MAX_ROSTER_IMAGES`].
///
/// A missing directory is an empty roster.
pub async fn list_roster_files(players_dir: &Path) -> Result<Vec<String>, RosterError> {
    let mut entries = match tokio::fs::read_dir(players_dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("Roster directory {} not found", players_dir.display());
            return Ok(Vec::new());
        }
        Err(err) => return Err(err.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') || mime_for_filename(&name).is_none() {
            continue;
        }
        // follows symlinks, a dangling link is skipped
        match tokio::fs::metadata(entry.path()).await {
            Ok(metadata) if metadata.is_file() => files.push(name),
            Ok(_) => {}
            Err(err) => debug!("Skipping roster entry {name}: {err}"),
        }
    }
    // read_dir order is filesystem dependent
    files.sort();
    files.truncate(MAX_ROSTER_IMAGES);
    Ok(files)
}

/// Reads the roster photos to send for `style`, in poster order.
///
/// Portrait styles never get teammates, whatever is on disk.
pub async fn load_roster_images(
    players_dir: &Path,
    style: Style,
) -> Result<Vec<InlineImage>, RosterError> {
    if style.is_portrait() {
        return Ok(Vec::new());
    }

    let files = list_roster_files(players_dir).await?;
    let mut images = Vec::with_capacity(files.len());
    for file in files {
        let Some(mime_type) = mime_for_filename(&file) else {
            continue;
        };
        let bytes = tokio::fs::read(players_dir.join(&file)).await?;
        info!("Player added: {file}");
        images.push(InlineImage::from_bytes(mime_type, &bytes));
    }
    Ok(images)
}
