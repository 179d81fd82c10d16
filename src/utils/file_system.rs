//! Tools for working with the file system.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use uuid::Uuid;

/// Creates a new file at the given destination.
///
/// # Arguments
///
/// * `destination` - The path to create the file at.
pub async fn create_file(destination: impl AsRef<Path>) -> Result<File> {
    let mut open_options = OpenOptions::new();
    open_options.write(true);
    open_options.create(true);
    open_options.truncate(true);

    let file = open_options.open(destination).await?;
    Ok(file)
}

/// Creates a new directory at the given destination.
/// If the directory already exists, nothing is done.
///
/// # Arguments
///
/// * `destination` - The path to create the directory at.
pub fn create_dir(destination: impl AsRef<Path>) -> Result<()> {
    std::fs::create_dir_all(destination)?;
    Ok(())
}

/// Creates the parent directory of the given destination.
/// If the parent directory already exists, nothing is done.
///
/// # Arguments
///
/// * `destination` - The path to create the parent directory for.
pub fn create_parent_dir(destination: impl AsRef<Path>) -> Result<()> {
    if let Some(parent) = destination.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    } else {
        std::fs::create_dir_all(destination.as_ref())?;
    }

    Ok(())
}

/// Generates a random filename component with the specified length.
pub fn random_filename(length: usize) -> String {
    let uuid = Uuid::new_v4().to_string().replace('-', "");

    uuid.chars().take(length).collect()
}

/// Builds a namespaced temp path for one pipeline artifact, so concurrent
/// runs never collide on file names.
///
/// # Arguments
///
/// * `dir` - The directory the artifact lives in.
/// * `stage` - A short tag naming the artifact, e.g. `video` or `audio`.
/// * `extension` - The file extension, without the dot.
pub fn temp_media_path(dir: impl AsRef<Path>, stage: &str, extension: &str) -> PathBuf {
    dir.as_ref()
        .join(format!("{}_{}.{}", stage, random_filename(8), extension))
}

/// Removes a temporary file and logs any errors.
/// Does not propagate errors to avoid interrupting the execution flow.
///
/// # Arguments
///
/// * `file_path` - The path of the file to delete
///
/// # Returns
///
/// `true` if the file was successfully deleted, `false` otherwise
pub async fn remove_temp_file(file_path: impl AsRef<Path> + std::fmt::Debug) -> bool {
    let result = tokio::fs::remove_file(&file_path).await;

    if let Err(ref e) = result {
        tracing::warn!("Failed to remove temporary file {:?}: {}", file_path, e);
    }

    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_paths_are_namespaced_per_call() {
        let first = temp_media_path("/tmp/out", "video", "mp4");
        let second = temp_media_path("/tmp/out", "video", "mp4");

        assert_ne!(first, second);
        assert!(first.to_string_lossy().ends_with(".mp4"));
        assert!(
            first
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("video_")
        );
    }

    #[test]
    fn random_filename_respects_length() {
        let name = random_filename(8);
        assert_eq!(name.len(), 8);
    }
}
