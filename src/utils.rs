use crate::error::Res;
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Write a file.
pub(crate) async fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Res<()> {
    let path = path.as_ref();
    tokio::fs::write(path, contents)
        .await
        .context(format!("Unable to write to {}", path.to_string_lossy()))
}

/// Read a file to a `String`.
pub(crate) async fn read(path: &Path) -> Res<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Deserialize a JSON file into type `T`.
pub(crate) async fn deserialize<T>(path: &Path) -> Res<T>
where
    T: DeserializeOwned,
{
    let content = read(path).await?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON file at {}", path.display()))
}

/// Basically move a file. Renames `from` -> `to`.
pub(crate) async fn rename(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Res<()> {
    tokio::fs::rename(from.as_ref(), to.as_ref())
        .await
        .with_context(|| {
            format!(
                "Unable to move file from '{}' to '{}'",
                from.as_ref().to_string_lossy(),
                to.as_ref().to_string_lossy()
            )
        })
}

/// Create a directory and all of its parents if they do not exist.
pub(crate) async fn make_dir(p: &Path) -> Res<()> {
    tokio::fs::create_dir_all(p)
        .await
        .with_context(|| format!("Unable to create directory at {}", p.to_string_lossy()))
}

/// Resolve `p` into an absolute path with symlinks resolved. `p` must exist.
pub(crate) async fn canonicalize(p: &Path) -> Res<PathBuf> {
    tokio::fs::canonicalize(p)
        .await
        .with_context(|| format!("Unable to canonicalize the path {}", p.to_string_lossy()))
}
