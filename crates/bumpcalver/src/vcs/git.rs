use crate::{command::run_command, vcs::VersionControlSystem};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("command failed: {0}")]
    CommandFailed(#[from] crate::command::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GitRepository {
    path: PathBuf,
}

impl GitRepository {
    fn git(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.path);
        cmd
    }
}

impl VersionControlSystem for GitRepository {
    type Error = Error;

    fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        Ok(Self { path: path.into() })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn is_repository(&self) -> Result<bool, Error> {
        let mut cmd = self.git();
        cmd.args(["rev-parse", "--is-inside-work-tree"]);
        match run_command(&mut cmd) {
            Ok(output) => Ok(output.stdout.trim() == "true"),
            Err(crate::command::Error::Failed { output, .. }) => {
                tracing::debug!(path = ?self.path, stderr = output.stderr.trim(), "not a git repository");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn add(&self, files: &[impl AsRef<Path>]) -> Result<(), Error> {
        let files = files
            .iter()
            .map(|f| f.as_ref().to_string_lossy().to_string());
        let mut cmd = self.git();
        cmd.arg("add").arg("--").args(files);
        let add_output = run_command(&mut cmd)?;
        tracing::trace!(stdout = add_output.stdout, "git add");
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<(), Error> {
        let mut cmd = self.git();
        cmd.args(["commit", "--message", message]);
        let commit_output = run_command(&mut cmd)?;
        tracing::trace!(stdout = commit_output.stdout, "git commit");
        Ok(())
    }

    fn tag(&self, name: &str, message: Option<&str>) -> Result<(), Error> {
        let mut cmd = self.git();
        cmd.arg("tag");
        if let Some(message) = message {
            cmd.args(["--annotate", "--message", message]);
        }
        cmd.arg(name);
        let tag_output = run_command(&mut cmd)?;
        tracing::trace!(stdout = tag_output.stdout, "git tag");
        Ok(())
    }

    fn tags(&self) -> Result<Vec<String>, Error> {
        let mut cmd = self.git();
        cmd.args(["tag", "--list"]);
        let output = run_command(&mut cmd)?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect())
    }
}
