pub mod toml;

use crate::{
    diagnostics::{self, FileId, Printer, ToDiagnostics},
    f_string::PythonFormatString,
    files::FileTarget,
    token::VersionFormatTemplate,
};
use codespan_reporting::diagnostic::Diagnostic;
use std::path::{Path, PathBuf};

pub use self::toml::ParseError;

pub const DEFAULT_TIMEZONE: &str = "America/New_York";
pub const DEFAULT_GIT_TAG: bool = false;
pub const DEFAULT_AUTO_COMMIT: bool = false;
pub const DEFAULT_TAG_NAME: &str = "{new_version}";
pub const DEFAULT_COMMIT_MESSAGE: &str = "Bump version to {new_version}";

/// Placeholder available in `tag_name` and `commit_message`.
pub const NEW_VERSION: &str = "new_version";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read config file {path:?}")]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config file {path:?}")]
    Toml {
        #[source]
        source: ParseError,
        path: PathBuf,
    },
    #[error(transparent)]
    Diagnostics(#[from] diagnostics::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConfigFile {
    /// The `[tool.bumpcalver]` table of a `pyproject.toml`.
    PyProject(PathBuf),
    /// A `bumpcalver.toml` with the configuration at the top level.
    BumpcalverToml(PathBuf),
}

impl ConfigFile {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PyProject(path) | Self::BumpcalverToml(path) => path.as_ref(),
        }
    }

    /// Guess the kind of an explicitly given config file from its name.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_pyproject = path
            .file_name()
            .is_some_and(|name| name.eq_ignore_ascii_case("pyproject.toml"));
        if is_pyproject {
            Self::PyProject(path)
        } else {
            Self::BumpcalverToml(path)
        }
    }
}

/// Config file candidates of `dir`, in order of precedence.
pub fn config_file_locations(dir: &Path) -> impl Iterator<Item = ConfigFile> + use<'_> {
    [
        ConfigFile::PyProject(dir.join("pyproject.toml")),
        ConfigFile::BumpcalverToml(dir.join("bumpcalver.toml")),
    ]
    .into_iter()
}

/// Configuration as written in a config file.
///
/// Unset values are `None`, see [`Config::finalize`] for the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub version_format: Option<VersionFormatTemplate>,
    pub timezone: Option<String>,
    pub git_tag: Option<bool>,
    pub auto_commit: Option<bool>,
    pub tag_name: Option<PythonFormatString>,
    pub commit_message: Option<PythonFormatString>,
    pub files: Vec<FileTarget>,
}

/// Configuration with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedConfig {
    pub version_format: VersionFormatTemplate,
    pub timezone: String,
    pub git_tag: bool,
    pub auto_commit: bool,
    pub tag_name: PythonFormatString,
    pub commit_message: PythonFormatString,
    pub files: Vec<FileTarget>,
}

fn default_format_string(value: &str) -> PythonFormatString {
    PythonFormatString::parse(value).unwrap_or_default()
}

impl Default for FinalizedConfig {
    fn default() -> Self {
        Config::default().finalize()
    }
}

impl Config {
    /// Apply `overrides` on top of this config, e.g. values given on the command line.
    pub fn merge_with(&mut self, overrides: &Self) {
        if let Some(version_format) = &overrides.version_format {
            self.version_format = Some(version_format.clone());
        }
        if let Some(timezone) = &overrides.timezone {
            self.timezone = Some(timezone.clone());
        }
        if let Some(git_tag) = overrides.git_tag {
            self.git_tag = Some(git_tag);
        }
        if let Some(auto_commit) = overrides.auto_commit {
            self.auto_commit = Some(auto_commit);
        }
        if let Some(tag_name) = &overrides.tag_name {
            self.tag_name = Some(tag_name.clone());
        }
        if let Some(commit_message) = &overrides.commit_message {
            self.commit_message = Some(commit_message.clone());
        }
        self.files.extend(overrides.files.iter().cloned());
    }

    /// Resolve relative file paths against `base_dir`.
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        for file in &mut self.files {
            if file.path.is_relative() {
                file.path = base_dir.join(&file.path);
            }
        }
    }

    #[must_use]
    pub fn finalize(self) -> FinalizedConfig {
        FinalizedConfig {
            version_format: self.version_format.unwrap_or_default(),
            timezone: self
                .timezone
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            git_tag: self.git_tag.unwrap_or(DEFAULT_GIT_TAG),
            auto_commit: self.auto_commit.unwrap_or(DEFAULT_AUTO_COMMIT),
            tag_name: self
                .tag_name
                .unwrap_or_else(|| default_format_string(DEFAULT_TAG_NAME)),
            commit_message: self
                .commit_message
                .unwrap_or_else(|| default_format_string(DEFAULT_COMMIT_MESSAGE)),
            files: self.files,
        }
    }
}

/// Parse a config file, returning `None` if it holds no bumpcalver configuration.
///
/// Diagnostics for warnings and errors are emitted to `printer`.
/// Relative file paths are resolved against the directory of the config file.
///
/// # Errors
/// When the config file cannot be read or is invalid.
pub fn load_config<W>(
    config_file: &ConfigFile,
    printer: &Printer<W>,
) -> Result<Option<Config>, Error>
where
    W: codespan_reporting::term::termcolor::WriteColor,
{
    let path = config_file.path();
    let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
        source,
        path: path.to_path_buf(),
    })?;
    let file_id = printer.add_source_file(path, contents.clone());

    let mut diagnostics: Vec<Diagnostic<FileId>> = vec![];
    let result = match config_file {
        ConfigFile::PyProject(_) => {
            Config::from_pyproject_toml(&contents, file_id, &mut diagnostics)
        }
        ConfigFile::BumpcalverToml(_) => {
            Config::from_bumpcalver_toml(&contents, file_id, &mut diagnostics)
        }
    };
    if let Err(ref err) = result {
        diagnostics.extend(err.to_diagnostics(file_id));
    }
    for diagnostic in &diagnostics {
        printer.emit(diagnostic)?;
    }

    let mut config = result.map_err(|source| Error::Toml {
        source,
        path: path.to_path_buf(),
    })?;
    if let Some(config) = config.as_mut() {
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base_dir);
    }
    tracing::debug!(?path, found = config.is_some(), "loaded config file");
    Ok(config)
}

/// Find the config in one of the default config file locations of `dir`.
///
/// # Errors
/// When a config file exists but cannot be read or is invalid.
pub fn find_config<W>(
    dir: &Path,
    printer: &Printer<W>,
) -> Result<Option<(ConfigFile, Config)>, Error>
where
    W: codespan_reporting::term::termcolor::WriteColor,
{
    for config_file in config_file_locations(dir) {
        if !config_file.path().is_file() {
            continue;
        }
        if let Some(config) = load_config(&config_file, printer)? {
            return Ok(Some((config_file, config)));
        }
    }
    Ok(None)
}
