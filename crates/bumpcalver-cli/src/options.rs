use bumpcalver::{Mode, PreRelease, config::Config};
use clap::Parser;
use std::path::PathBuf;

/// Resolve a pair of `--flag` and `--no-flag` switches.
///
/// `None` if neither was given, so the config value applies.
fn switch(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

/// Logging flags to `#[command(flatten)]` into your CLI
#[derive(clap::Args, Debug, Clone, Copy, Default)]
pub struct Verbosity {
    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity",
        long_help = None,
    )]
    pub verbose: u8,

    #[arg(
        long,
        short = 'q',
        action = clap::ArgAction::Count,
        global = true,
        help = "Decrease logging verbosity",
        long_help = None,
        conflicts_with = "verbose",
    )]
    pub quiet: u8,
}

impl Verbosity {
    #[must_use]
    pub fn verbosity(&self) -> bumpcalver::logging::Verbosity {
        if self.quiet > 0 {
            bumpcalver::logging::Verbosity::Off
        } else {
            self.verbose.into()
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "bumpcalver",
    version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
    about = "bump calendar versions in your project files",
)]
pub struct Options {
    #[clap(
        long = "dir",
        help = "project directory to run bumpcalver in",
        env = "BUMPCALVER_DIR"
    )]
    pub dir: Option<PathBuf>,

    #[clap(
        long = "config-file",
        help = "config file to read the configuration from (pyproject.toml or bumpcalver.toml)",
        env = "BUMPCALVER_CONFIG_FILE"
    )]
    pub config_file: Option<PathBuf>,

    #[arg(
        long = "color",
        env = "BUMPCALVER_COLOR",
        help = "enable or disable color"
    )]
    pub color_choice: Option<termcolor::ColorChoice>,

    #[command(flatten)]
    pub verbosity: Verbosity,

    #[arg(
        long = "log",
        env = "BUMPCALVER_LOG_LEVEL",
        aliases = ["log-level"],
        help = "Log level. When using a more sophisticated logging setup using RUST_LOG environment variable, this option is overwritten."
    )]
    pub log_level: Option<tracing::metadata::Level>,

    #[arg(
        long = "log-format",
        env = "BUMPCALVER_LOG_FORMAT",
        help = "log format (json, pretty or pretty-compact)"
    )]
    pub log_format: Option<crate::logging::LogFormat>,

    #[clap(
        long = "build",
        help = "use a build count instead of the time of day, continuing the count of the first configured file",
        action = clap::ArgAction::SetTrue,
    )]
    pub build: bool,

    #[clap(
        long = "beta",
        help = "prefix the version with `beta-`",
        action = clap::ArgAction::SetTrue,
        conflicts_with = "rc",
    )]
    pub beta: bool,

    #[clap(
        long = "rc",
        help = "prefix the version with `rc-`",
        action = clap::ArgAction::SetTrue,
    )]
    pub rc: bool,

    #[clap(
        long = "timezone",
        help = "timezone of the date in the version, e.g. `Europe/Berlin`",
        env = "BUMPCALVER_TIMEZONE"
    )]
    pub timezone: Option<String>,

    #[clap(
        long = "git-tag",
        help = "create a git tag for the new version",
        action = clap::ArgAction::SetTrue,
        conflicts_with = "no_git_tag",
    )]
    pub git_tag: bool,

    #[clap(
        long = "no-git-tag",
        help = "do not create a git tag",
        action = clap::ArgAction::SetTrue,
    )]
    pub no_git_tag: bool,

    #[clap(
        long = "auto-commit",
        help = "commit the updated files before tagging",
        action = clap::ArgAction::SetTrue,
        conflicts_with = "no_auto_commit",
    )]
    pub auto_commit: bool,

    #[clap(
        long = "no-auto-commit",
        help = "tag the current commit without committing the updated files",
        action = clap::ArgAction::SetTrue,
    )]
    pub no_auto_commit: bool,

    #[clap(
        short = 'n',
        long = "dry-run",
        help = "don't write any files, just pretend.",
        env = "BUMPCALVER_DRY_RUN",
        action = clap::ArgAction::SetTrue
    )]
    pub dry_run: bool,
}

impl Options {
    #[must_use]
    pub fn mode(&self) -> Mode {
        if self.build { Mode::Build } else { Mode::Timestamp }
    }

    #[must_use]
    pub fn pre_release(&self) -> Option<PreRelease> {
        if self.beta {
            Some(PreRelease::Beta)
        } else if self.rc {
            Some(PreRelease::ReleaseCandidate)
        } else {
            None
        }
    }

    /// Config values given on the command line.
    #[must_use]
    pub fn config_overrides(&self) -> Config {
        Config {
            timezone: self.timezone.clone(),
            git_tag: switch(self.git_tag, self.no_git_tag),
            auto_commit: switch(self.auto_commit, self.no_auto_commit),
            ..Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Options;
    use bumpcalver::{Mode, PreRelease};
    use clap::Parser;

    #[test]
    fn defaults() {
        let options = Options::try_parse_from(["bumpcalver"]).unwrap();
        assert_eq!(options.mode(), Mode::Timestamp);
        assert_eq!(options.pre_release(), None);
        let overrides = options.config_overrides();
        assert_eq!(overrides.git_tag, None);
        assert_eq!(overrides.auto_commit, None);
        assert_eq!(overrides.timezone, None);
    }

    #[test]
    fn flags_override_config() {
        let options = Options::try_parse_from([
            "bumpcalver",
            "--build",
            "--rc",
            "--no-git-tag",
            "--auto-commit",
            "--timezone",
            "UTC",
        ])
        .unwrap();
        assert_eq!(options.mode(), Mode::Build);
        assert_eq!(options.pre_release(), Some(PreRelease::ReleaseCandidate));
        let overrides = options.config_overrides();
        assert_eq!(overrides.git_tag, Some(false));
        assert_eq!(overrides.auto_commit, Some(true));
        assert_eq!(overrides.timezone.as_deref(), Some("UTC"));
    }

    #[test]
    fn conflicting_flags() {
        assert!(Options::try_parse_from(["bumpcalver", "--beta", "--rc"]).is_err());
        assert!(Options::try_parse_from(["bumpcalver", "--git-tag", "--no-git-tag"]).is_err());
    }
}
