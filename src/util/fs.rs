use anyhow::anyhow;
use async_recursion::async_recursion;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

pub const CUE_SUFFIX: &str = ".cue";

/// Recursively collects every file below `dir_path`. Symlinked directories are
/// not descended into.
#[async_recursion]
pub async fn get_all_files(dir_path: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dir = fs::read_dir(dir_path).await?;
    let mut files = Vec::new();

    while let Some(entry) = dir.next_entry().await? {
        let path = entry.path();

        if entry.file_type().await?.is_dir() {
            files.append(&mut get_all_files(&path).await?);
        } else {
            files.push(path);
        }
    }

    Ok(files)
}

pub fn is_cue_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.as_encoded_bytes().ends_with(CUE_SUFFIX.as_bytes()))
}

/// All cue sheets below `dir_path`, sorted so runs are reproducible.
pub async fn find_cue_files(dir_path: &Path) -> io::Result<Vec<PathBuf>> {
    let mut cue_files: Vec<_> = get_all_files(dir_path)
        .await?
        .into_iter()
        .filter(|path| is_cue_file(path))
        .collect();
    cue_files.sort();

    Ok(cue_files)
}

fn starts_with_tilde(path: &Path) -> bool {
    matches!(path.components().next(), Some(Component::Normal(first)) if first == "~")
}

/// Replaces a leading `~` with `home`.
pub fn expand_home(path: &Path, home: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => home.join(components.as_path()),
        _ => path.to_path_buf(),
    }
}

/// Expands `~` and makes `path` absolute against the current directory.
pub fn resolve_dir(path: &Path) -> anyhow::Result<PathBuf> {
    resolve_dir_with_home(path, dirs::home_dir().as_deref())
}

fn resolve_dir_with_home(path: &Path, home: Option<&Path>) -> anyhow::Result<PathBuf> {
    let expanded = if starts_with_tilde(path) {
        let home = home.ok_or_else(|| anyhow!("Cannot find home directory"))?;
        expand_home(path, home)
    } else {
        path.to_path_buf()
    };

    Ok(std::path::absolute(expanded)?)
}

/// `reference` with its extension swapped for `extension`, directory part kept.
pub fn replace_extension(reference: &str, extension: &str) -> String {
    Path::new(reference)
        .with_extension(extension)
        .to_string_lossy()
        .into_owned()
}
