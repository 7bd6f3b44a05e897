pub mod git;

#[cfg(test)]
pub mod temp;

use crate::{
    config::{DEFAULT_COMMIT_MESSAGE, DEFAULT_TAG_NAME, NEW_VERSION},
    f_string::PythonFormatString,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub trait VersionControlSystem {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open the VCS repository.
    fn open(path: impl Into<PathBuf>) -> Result<Self, Self::Error>
    where
        Self: Sized;

    /// Get the path to the VCS directory.
    fn path(&self) -> &Path;

    /// Is the path inside of a working tree of the VCS?
    fn is_repository(&self) -> Result<bool, Self::Error>;

    /// Add files to the staging area of the VCS.
    fn add(&self, files: &[impl AsRef<Path>]) -> Result<(), Self::Error>;

    /// Commit staged changes to the VCS.
    fn commit(&self, message: &str) -> Result<(), Self::Error>;

    /// Create a new tag for the VCS.
    fn tag(&self, name: &str, message: Option<&str>) -> Result<(), Self::Error>;

    /// Get all tags for the VCS
    fn tags(&self) -> Result<Vec<String>, Self::Error>;
}

/// Templates for the names of release commits and tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTemplates {
    pub tag_name: PythonFormatString,
    pub commit_message: PythonFormatString,
}

impl Default for ReleaseTemplates {
    fn default() -> Self {
        Self {
            tag_name: PythonFormatString::parse(DEFAULT_TAG_NAME).unwrap_or_default(),
            commit_message: PythonFormatString::parse(DEFAULT_COMMIT_MESSAGE).unwrap_or_default(),
        }
    }
}

impl ReleaseTemplates {
    fn render(template: &PythonFormatString, new_version: &str) -> String {
        let values: HashMap<&str, &str> = [(NEW_VERSION, new_version)].into_iter().collect();
        template.format(&values, false).unwrap_or_default()
    }

    #[must_use]
    pub fn tag_name(&self, new_version: &str) -> String {
        Self::render(&self.tag_name, new_version)
    }

    #[must_use]
    pub fn commit_message(&self, new_version: &str) -> String {
        Self::render(&self.commit_message, new_version)
    }
}

/// What [`tag_release`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Release {
    pub committed: bool,
    pub tag: Option<String>,
}

/// Commit the modified `files` (with `auto_commit`) and tag the release.
///
/// Nothing happens outside of a repository.
/// Failures are logged and never abort, the version files have been written at this point.
pub fn tag_release<VCS>(
    repo: &VCS,
    new_version: &str,
    files: &[PathBuf],
    auto_commit: bool,
    templates: &ReleaseTemplates,
) -> Release
where
    VCS: VersionControlSystem,
{
    let mut release = Release::default();
    match repo.is_repository() {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(path = ?repo.path(), "not a git repository, skipping git tag");
            return release;
        }
        Err(err) => {
            tracing::error!(path = ?repo.path(), "failed to detect git repository: {err}");
            return release;
        }
    }

    if auto_commit {
        if files.is_empty() {
            tracing::warn!("no files were updated, skipping git commit");
        } else {
            let message = templates.commit_message(new_version);
            let committed = repo.add(files).and_then(|()| repo.commit(&message));
            match committed {
                Ok(()) => {
                    tracing::info!(
                        commit_message = message,
                        files = files.len(),
                        "committed version files"
                    );
                    release.committed = true;
                }
                Err(err) => {
                    tracing::error!("failed to commit version files: {err}");
                    return release;
                }
            }
        }
    } else {
        tracing::info!("auto commit is disabled, tagging the current commit");
    }

    let tag_name = templates.tag_name(new_version);
    match repo.tags() {
        Ok(tags) if tags.contains(&tag_name) => {
            tracing::warn!(tag = tag_name, "tag already exists, skipping git tag");
            return release;
        }
        Ok(_) => {}
        Err(err) => {
            tracing::error!("failed to list git tags: {err}");
            return release;
        }
    }
    match repo.tag(&tag_name, None) {
        Ok(()) => {
            tracing::info!(tag = tag_name, "created git tag");
            release.tag = Some(tag_name);
        }
        Err(err) => tracing::error!(tag = tag_name, "failed to create git tag: {err}"),
    }
    release
}

#[cfg(test)]
mod tests {
    use super::{Release, ReleaseTemplates, VersionControlSystem, tag_release};
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};
    use similar_asserts::assert_eq as sim_assert_eq;

    #[derive(thiserror::Error, Debug)]
    #[error("fake vcs error")]
    struct FakeError;

    /// Records calls instead of running a VCS.
    #[derive(Debug, Default)]
    struct FakeRepository {
        path: PathBuf,
        is_repository: bool,
        fail_commit: bool,
        tags: RefCell<Vec<String>>,
        calls: RefCell<Vec<String>>,
    }

    impl VersionControlSystem for FakeRepository {
        type Error = FakeError;

        fn open(path: impl Into<PathBuf>) -> Result<Self, FakeError> {
            Ok(Self {
                path: path.into(),
                is_repository: true,
                ..Self::default()
            })
        }

        fn path(&self) -> &Path {
            &self.path
        }

        fn is_repository(&self) -> Result<bool, FakeError> {
            Ok(self.is_repository)
        }

        fn add(&self, files: &[impl AsRef<Path>]) -> Result<(), FakeError> {
            let files: Vec<_> = files
                .iter()
                .map(|file| file.as_ref().display().to_string())
                .collect();
            self.calls.borrow_mut().push(format!("add {}", files.join(" ")));
            Ok(())
        }

        fn commit(&self, message: &str) -> Result<(), FakeError> {
            if self.fail_commit {
                return Err(FakeError);
            }
            self.calls.borrow_mut().push(format!("commit {message}"));
            Ok(())
        }

        fn tag(&self, name: &str, _message: Option<&str>) -> Result<(), FakeError> {
            self.calls.borrow_mut().push(format!("tag {name}"));
            self.tags.borrow_mut().push(name.to_string());
            Ok(())
        }

        fn tags(&self) -> Result<Vec<String>, FakeError> {
            Ok(self.tags.borrow().clone())
        }
    }

    fn files() -> Vec<PathBuf> {
        vec![PathBuf::from("pyproject.toml"), PathBuf::from("src/version.py")]
    }

    #[test]
    fn commit_and_tag() -> color_eyre::eyre::Result<()> {
        crate::tests::init();
        let repo = FakeRepository::open(".")?;
        let release = tag_release(
            &repo,
            "2024-01-01-001",
            &files(),
            true,
            &ReleaseTemplates::default(),
        );
        sim_assert_eq!(
            release,
            Release {
                committed: true,
                tag: Some("2024-01-01-001".to_string()),
            }
        );
        sim_assert_eq!(
            repo.calls.borrow().clone(),
            vec![
                "add pyproject.toml src/version.py".to_string(),
                "commit Bump version to 2024-01-01-001".to_string(),
                "tag 2024-01-01-001".to_string(),
            ]
        );
        Ok(())
    }

    #[test]
    fn tag_without_commit_and_existing_tag() -> color_eyre::eyre::Result<()> {
        crate::tests::init();
        let repo = FakeRepository::open(".")?;
        let templates = ReleaseTemplates {
            tag_name: "v{new_version}".parse()?,
            ..ReleaseTemplates::default()
        };
        let release = tag_release(&repo, "2024-01-01-001", &[], true, &templates);
        sim_assert_eq!(release.tag.as_deref(), Some("v2024-01-01-001"));
        assert!(!release.committed);

        let release = tag_release(&repo, "2024-01-01-001", &files(), false, &templates);
        sim_assert_eq!(release, Release::default());
        sim_assert_eq!(repo.calls.borrow().clone(), vec!["tag v2024-01-01-001".to_string()]);
        Ok(())
    }

    #[test]
    fn failures_are_not_fatal() {
        crate::tests::init();
        let repo = FakeRepository {
            is_repository: false,
            ..FakeRepository::default()
        };
        let release = tag_release(&repo, "2024-01-01-001", &files(), true, &ReleaseTemplates::default());
        sim_assert_eq!(release, Release::default());
        assert!(repo.calls.borrow().is_empty());

        let repo = FakeRepository {
            is_repository: true,
            fail_commit: true,
            ..FakeRepository::default()
        };
        let release = tag_release(&repo, "2024-01-01-001", &files(), true, &ReleaseTemplates::default());
        sim_assert_eq!(release, Release::default());
        assert!(repo.tags.borrow().is_empty());
    }
}
