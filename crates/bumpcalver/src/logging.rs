//! Human readable progress output, filtered by verbosity.
use colored::Colorize;
use std::path::Path;

/// Controls level of detail emitted by loggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Verbosity {
    /// No logs will be emitted.
    Off = 0,
    /// The new version and the modified files.
    Low = 1,
    /// Diffs and version control actions.
    Medium = 2,
    /// Everything.
    High = 3,
}

impl From<u8> for Verbosity {
    fn from(value: u8) -> Self {
        match value {
            0 => Verbosity::Off,
            1 => Verbosity::Low,
            2 => Verbosity::Medium,
            _ => Verbosity::High,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoOpLogger {}

impl Log for NoOpLogger {
    fn log(&self, _: Verbosity, _: &str) {}
}

/// Forwards messages to `tracing`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TracingLogger {
    /// Only messages with lower or equal verbosity will be logged.
    verbosity: Verbosity,
}

impl TracingLogger {
    #[must_use]
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

impl Log for TracingLogger {
    fn log(&self, verbosity: Verbosity, message: &str) {
        if verbosity > self.verbosity {
            return;
        }
        tracing::info!("{message}");
    }
}

pub trait Log {
    /// Log a message if `verbosity` is within the configured level.
    fn log(&self, verbosity: Verbosity, message: &str);
}

pub trait LogExt {
    /// Log the version that is written.
    fn log_new_version(&self, new_version: &str, dry_run: bool);

    /// Log a modified file and, if available, the diff of the modification.
    fn log_modification(&self, path: &Path, diff: Option<&str>);
}

impl<T> LogExt for T
where
    T: Log,
{
    fn log_new_version(&self, new_version: &str, dry_run: bool) {
        let prefix = if dry_run { "would update" } else { "updating" };
        self.log(
            Verbosity::Low,
            &format!("{} to version {}", prefix.dimmed(), new_version.green()),
        );
    }

    fn log_modification(&self, path: &Path, diff: Option<&str>) {
        self.log(
            Verbosity::Low,
            &format!("{}", format!("[{}]", path.to_string_lossy()).magenta()),
        );
        let Some(diff) = diff else {
            return;
        };
        self.log(Verbosity::Medium, "");
        for line in diff.lines() {
            let mut line = format!("\t{line}");
            line.push_str("\x1b[0;0m"); // reset all styles at end of line
            self.log(Verbosity::Medium, &line);
        }
    }
}
