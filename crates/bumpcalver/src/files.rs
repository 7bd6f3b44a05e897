//! Writing a new version into every configured file.
use crate::handlers::{self, Locator, Registry};
use std::path::{Path, PathBuf};

/// A file containing a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTarget {
    pub path: PathBuf,
    /// Format tag such as `python` or `toml`, resolved by the [`Registry`] on use.
    pub file_type: String,
    pub locator: Option<Locator>,
}

impl FileTarget {
    pub fn new(path: impl Into<PathBuf>, file_type: impl Into<String>, locator: Locator) -> Self {
        Self {
            path: path.into(),
            file_type: file_type.into(),
            locator: Some(locator),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// Files that were modified, relative to the working directory and in target order.
    ///
    /// For a dry run, the files that would have been modified.
    pub modified_paths: Vec<PathBuf>,
    /// Unified diffs of a dry run, one for each of the `modified_paths`.
    pub diffs: Vec<String>,
}

impl UpdateResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modified_paths.is_empty()
    }
}

/// `path` relative to `working_dir`, going up with `..` for files outside of it.
///
/// Paths on another root (e.g. a different drive) are returned unchanged.
fn relative_to(path: &Path, working_dir: &Path) -> PathBuf {
    use std::path::Component;
    if let Ok(relative) = path.strip_prefix(working_dir) {
        return relative.to_path_buf();
    }
    let path_components: Vec<Component<'_>> = path.components().collect();
    let dir_components: Vec<Component<'_>> = working_dir.components().collect();
    let common = path_components
        .iter()
        .zip(&dir_components)
        .take_while(|(a, b)| a == b)
        .count();
    // nothing shared, e.g. another drive
    if common == 0 || dir_components[common..].contains(&Component::ParentDir) {
        return path.to_path_buf();
    }
    let up = dir_components[common..]
        .iter()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|_| Component::ParentDir);
    up.chain(path_components[common..].iter().copied()).collect()
}

/// Write `new_version` into every target.
///
/// Targets are processed in order. A target that cannot be updated is logged and skipped,
/// it never aborts the batch. With `dry_run`, nothing is written and the diffs are returned.
pub fn update_version_in_files(
    registry: &Registry,
    targets: &[FileTarget],
    new_version: &str,
    working_dir: &Path,
    dry_run: bool,
) -> UpdateResult {
    let mut result = UpdateResult::default();
    for target in targets {
        let path = working_dir.join(&target.path);
        let handler = match registry.resolve(&target.file_type) {
            Ok(handler) => handler,
            Err(err) => {
                tracing::error!(?path, "{err}, skipping");
                continue;
            }
        };
        let Some(locator) = target.locator.as_ref() else {
            tracing::error!(?path, "no variable or pattern configured, skipping");
            continue;
        };
        if !handler.supports(locator) {
            tracing::error!(
                ?path,
                file_type = %handler.file_type(),
                "unsupported {} locator, skipping",
                locator.kind()
            );
            continue;
        }
        match handlers::update_file(handler, &path, locator, new_version, dry_run) {
            Ok(Some(modification)) => {
                let relative = relative_to(&path, working_dir);
                if dry_run {
                    let diff = modification.diff(&relative).unwrap_or_default();
                    tracing::info!("{diff}");
                    result.diffs.push(diff);
                }
                result.modified_paths.push(relative);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::error!(?path, "error updating version: {err}");
            }
        }
    }
    result
}
