use crate::{command::run_command, vcs::VersionControlSystem};
use color_eyre::eyre;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Whether a `git` executable can be run.
pub fn git_available() -> bool {
    run_command(Command::new("git").arg("--version")).is_ok()
}

/// A fresh git repository in a temporary directory.
pub struct GitRepository<VCS> {
    inner: VCS,
    #[allow(dead_code)]
    dir: TempDir,
}

impl<VCS> GitRepository<VCS>
where
    VCS: VersionControlSystem,
{
    /// Returns `None` when git is not installed.
    pub fn new() -> eyre::Result<Option<Self>> {
        if !git_available() {
            tracing::warn!("git is not available");
            return Ok(None);
        }
        let dir = TempDir::with_prefix("bumpcalver-")?;
        Self::init(dir.path())?;
        let inner = VCS::open(dir.path())?;
        Ok(Some(Self { inner, dir }))
    }

    fn init(path: &Path) -> eyre::Result<()> {
        let commands: [&[&str]; 5] = [
            &["init"],
            &["config", "user.name", "bumpcalver"],
            &["config", "user.email", "bumpcalver@example.com"],
            &["config", "commit.gpgsign", "false"],
            &["config", "tag.gpgsign", "false"],
        ];
        for args in commands {
            let mut cmd = Command::new("git");
            cmd.args(args).current_dir(path);
            let _ = run_command(&mut cmd)?;
        }
        Ok(())
    }
}

impl<Repo> std::ops::Deref for GitRepository<Repo> {
    type Target = Repo;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
