//! Saving artifacts to the local filesystem.

use crate::domain::outcome::Artifact;
use crate::infra::error::{ClientError, ClientResult};
use std::path::{Path, PathBuf};

/// Write `artifact` into `dir` under its own name, creating `dir` if needed.
/// An existing file with the same name is replaced.
///
/// # Errors
/// Returns `IoError` if the directory cannot be created or the file written.
pub async fn save_artifact(artifact: &Artifact, dir: &Path) -> ClientResult<PathBuf> {
    let file_name = Path::new(&artifact.name)
        .file_name()
        .ok_or_else(|| ClientError::IoError(format!("Invalid artifact name: {}", artifact.name)))?;

    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        ClientError::IoError(format!(
            "Failed to create output directory {}: {e}",
            dir.display()
        ))
    })?;

    let path = dir.join(file_name);
    tokio::fs::write(&path, &artifact.bytes).await.map_err(|e| {
        ClientError::IoError(format!("Failed to write {}: {e}", path.display()))
    })?;

    log::info!("Saved {} ({} bytes)", path.display(), artifact.len());
    Ok(path)
}
