use std::process::{Command, ExitStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitStatus,
}

impl From<std::process::Output> for Output {
    fn from(output: std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into(),
            stderr: String::from_utf8_lossy(&output.stderr).into(),
            status: output.status,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to run `{command}`")]
    Io {
        #[source]
        source: std::io::Error,
        command: String,
    },

    #[error(
        "`{}` failed with code {}:\n\n--- Stdout:\n {}\n--- Stderr:\n {}",
        command,
        output.status.code().unwrap_or(1),
        output.stdout,
        output.stderr
    )]
    Failed { command: String, output: Output },
}

fn describe(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `cmd` to completion, capturing its output.
///
/// # Errors
/// When the command cannot be spawned or exits with a non-zero code.
pub fn run_command(cmd: &mut Command) -> Result<Output, Error> {
    let output = cmd.output().map_err(|source| Error::Io {
        source,
        command: describe(cmd),
    })?;
    if !output.status.success() {
        return Err(Error::Failed {
            command: describe(cmd),
            output: output.into(),
        });
    }
    Ok(output.into())
}
