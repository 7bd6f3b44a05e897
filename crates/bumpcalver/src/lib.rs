#![forbid(unsafe_code)]

pub mod calver;
pub mod command;
pub mod config;
pub mod date;
pub mod diagnostics;
pub mod f_string;
pub mod files;
pub mod handlers;
pub mod logging;
pub mod token;
pub mod vcs;

use crate::{
    files::{FileTarget, UpdateResult},
    handlers::Registry,
    logging::{LogExt, Verbosity},
    vcs::{Release, ReleaseTemplates, VersionControlSystem},
};
use chrono::{DateTime, Utc};
use colored::Colorize;
use std::path::Path;

/// How the new version is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Date and build count, continuing the count found in the first configured file.
    Build,
    /// Date and time of day, e.g. `2024-01-01-1430`.
    Timestamp,
}

/// Marker prepended to pre-release versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreRelease {
    Beta,
    ReleaseCandidate,
}

impl PreRelease {
    #[must_use]
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Beta => "beta-",
            Self::ReleaseCandidate => "rc-",
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BumpError {
    #[error("no files specified in the configuration")]
    NoFiles,
}

/// Outcome of a bump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bumped {
    pub new_version: String,
    pub updated: UpdateResult,
    /// Present when tagging is enabled and this is not a dry run.
    pub release: Option<Release>,
}

/// Bumpcalver manager
#[derive(Debug)]
pub struct BumpCalver<VCS, L> {
    pub repo: VCS,
    pub config: config::FinalizedConfig,
    pub registry: Registry,
    pub logger: L,
    pub dry_run: bool,
}

impl<VCS, L> BumpCalver<VCS, L>
where
    VCS: VersionControlSystem,
    L: logging::Log,
{
    /// The directory file paths are relative to and git commands run in.
    pub fn working_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Compute the new version at `now`.
    ///
    /// # Errors
    /// When no files are configured.
    pub fn new_version(
        &self,
        mode: Mode,
        pre_release: Option<PreRelease>,
        now: DateTime<Utc>,
    ) -> Result<String, BumpError> {
        let first = self.config.files.first().ok_or(BumpError::NoFiles)?;
        let tz = date::resolve_timezone(&self.config.timezone);
        let version = match mode {
            Mode::Build => {
                let target = FileTarget {
                    path: self.working_dir().join(&first.path),
                    ..first.clone()
                };
                let current_date = date::format_date(now, &tz);
                calver::build_version(
                    &self.registry,
                    &target,
                    &self.config.version_format,
                    &current_date,
                )
            }
            Mode::Timestamp => date::format_datetime_version(now, &tz),
        };
        let prefix = pre_release.map(|pre_release| pre_release.prefix()).unwrap_or_default();
        Ok(format!("{prefix}{version}"))
    }

    /// Compute the new version at the current time and write it into every configured file.
    ///
    /// # Errors
    /// When no files are configured.
    pub fn bump(&self, mode: Mode, pre_release: Option<PreRelease>) -> Result<Bumped, BumpError> {
        self.bump_at(mode, pre_release, Utc::now())
    }

    /// Compute the new version at `now` and write it into every configured file.
    ///
    /// Files that cannot be updated are skipped. If `git_tag` is enabled, the modified
    /// files are committed (with `auto_commit`) and the release is tagged.
    ///
    /// # Errors
    /// When no files are configured.
    pub fn bump_at(
        &self,
        mode: Mode,
        pre_release: Option<PreRelease>,
        now: DateTime<Utc>,
    ) -> Result<Bumped, BumpError> {
        let new_version = self.new_version(mode, pre_release, now)?;
        tracing::info!(new_version, ?mode, dry_run = self.dry_run, "bumping version");
        self.logger.log_new_version(&new_version, self.dry_run);

        let updated = files::update_version_in_files(
            &self.registry,
            &self.config.files,
            &new_version,
            self.working_dir(),
            self.dry_run,
        );
        for (idx, path) in updated.modified_paths.iter().enumerate() {
            self.logger
                .log_modification(path, updated.diffs.get(idx).map(String::as_str));
        }
        if updated.is_empty() {
            tracing::warn!(new_version, "no files were updated");
        }

        let release = self.release(&new_version, &updated);
        Ok(Bumped {
            new_version,
            updated,
            release,
        })
    }

    fn release(&self, new_version: &str, updated: &UpdateResult) -> Option<Release> {
        if !self.config.git_tag {
            return None;
        }
        let templates = ReleaseTemplates {
            tag_name: self.config.tag_name.clone(),
            commit_message: self.config.commit_message.clone(),
        };
        self.logger
            .log(Verbosity::Medium, &format!("{}", "[git]".magenta()));
        if self.dry_run {
            self.logger.log(
                Verbosity::Medium,
                &format!(
                    "\t{}{}",
                    "would tag ".dimmed(),
                    templates.tag_name(new_version).yellow()
                ),
            );
            return None;
        }
        let release = vcs::tag_release(
            &self.repo,
            new_version,
            &updated.modified_paths,
            self.config.auto_commit,
            &templates,
        );
        if release.committed {
            self.logger.log(
                Verbosity::Medium,
                &format!(
                    "\t{}{}",
                    "commit ".dimmed(),
                    templates.commit_message(new_version).cyan()
                ),
            );
        }
        if let Some(tag) = &release.tag {
            self.logger.log(
                Verbosity::Medium,
                &format!("\t{}{}", "tag ".dimmed(), tag.yellow()),
            );
        }
        Some(release)
    }
}
