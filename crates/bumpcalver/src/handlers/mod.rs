//! Reading and replacing versions in the supported file grammars.
//!
//! Every grammar implements [`VersionHandler`] on file contents. The provided
//! [`VersionHandler::read_version`] and [`VersionHandler::update_version`] wrap that with
//! file I/O and never fail: problems are logged and reported as absent or unchanged.
pub mod dockerfile;
pub mod json;
pub mod makefile;
pub mod python;
pub mod toml;
pub mod xml;
pub mod yaml;

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
#[error("io error for {path:?}")]
pub struct IoError {
    #[source]
    pub source: std::io::Error,
    pub path: PathBuf,
}

impl IoError {
    pub fn new(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            path: path.into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("failed to parse {file_type} content: {message}")]
    Parse { file_type: FileType, message: String },
    #[error("failed to serialize {file_type} content: {message}")]
    Serialize { file_type: FileType, message: String },
    #[error("{file_type} files cannot be located by {locator}")]
    UnsupportedLocator { file_type: FileType, locator: String },
}

impl Error {
    pub(crate) fn parse(file_type: FileType, message: impl std::fmt::Display) -> Self {
        Self::Parse {
            file_type,
            message: message.to_string(),
        }
    }

    pub(crate) fn serialize(file_type: FileType, message: impl std::fmt::Display) -> Self {
        Self::Serialize {
            file_type,
            message: message.to_string(),
        }
    }

    pub(crate) fn unsupported_locator(file_type: FileType, locator: &Locator) -> Self {
        Self::UnsupportedLocator {
            file_type,
            locator: locator.kind().to_string(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Hash)]
#[error("unsupported file type {0:?}")]
pub struct UnsupportedFormatError(pub String);

/// The closed set of supported file grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileType {
    /// `name = "value"` assignments in source files.
    Python,
    /// Nested tables.
    Toml,
    /// Nested mappings.
    Yaml,
    /// Nested objects.
    Json,
    /// Element text content.
    Xml,
    /// `LABEL`, `ARG` and `ENV` instructions.
    Dockerfile,
    /// `NAME = value` and `NAME := value` variables.
    Makefile,
}

impl FileType {
    pub const ALL: [FileType; 7] = [
        Self::Python,
        Self::Toml,
        Self::Yaml,
        Self::Json,
        Self::Xml,
        Self::Dockerfile,
        Self::Makefile,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Toml => "toml",
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Dockerfile => "dockerfile",
            Self::Makefile => "makefile",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FileType {
    type Err = UnsupportedFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|file_type| s.trim().eq_ignore_ascii_case(file_type.as_str()))
            .ok_or_else(|| UnsupportedFormatError(s.to_string()))
    }
}

/// Where inside a file the version lives.
#[derive(Debug, Clone)]
pub enum Locator {
    /// A variable or key name, or an element path for XML.
    Variable(String),
    /// A dot separated section path and the key inside of it.
    Section { section: String, variable: String },
    /// A regular expression whose first capture group is the version.
    Pattern(regex::Regex),
}

impl PartialEq for Locator {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Variable(a), Self::Variable(b)) => a == b,
            (
                Self::Section {
                    section: sa,
                    variable: va,
                },
                Self::Section {
                    section: sb,
                    variable: vb,
                },
            ) => sa == sb && va == vb,
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for Locator {}

impl Locator {
    /// Build a locator from the optional fields of a file target.
    ///
    /// A `variable` takes precedence over a `pattern`. A `section` is only used together
    /// with a `variable`. Returns `None` if neither `variable` nor `pattern` is set.
    #[must_use]
    pub fn from_parts(
        variable: Option<String>,
        section: Option<String>,
        pattern: Option<regex::Regex>,
    ) -> Option<Self> {
        let variable = variable.filter(|variable| !variable.trim().is_empty());
        let section = section.filter(|section| !section.trim().is_empty());
        match (variable, section, pattern) {
            (Some(variable), Some(section), _) => Some(Self::Section { section, variable }),
            (Some(variable), None, _) => Some(Self::Variable(variable)),
            (None, _, Some(pattern)) => Some(Self::Pattern(pattern)),
            (None, _, None) => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Variable(_) => "variable",
            Self::Section { .. } => "section",
            Self::Pattern(_) => "pattern",
        }
    }

    /// The section path (possibly empty) and the key for structured formats.
    pub(crate) fn key_path(&self) -> Option<(Vec<&str>, &str)> {
        match self {
            Self::Variable(variable) => Some((vec![], variable.as_str())),
            Self::Section { section, variable } => Some((
                section
                    .split('.')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect(),
                variable.as_str(),
            )),
            Self::Pattern(_) => None,
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Variable(variable) => write!(f, "{variable}"),
            Self::Section { section, variable } => write!(f, "{section}.{variable}"),
            Self::Pattern(pattern) => write!(f, "/{}/", pattern.as_str()),
        }
    }
}

/// Replace the byte range `span` of `contents` with `replacement`.
pub(crate) fn splice(contents: &str, span: std::ops::Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(contents.len() + replacement.len());
    out.push_str(&contents[..span.start]);
    out.push_str(replacement);
    out.push_str(&contents[span.end..]);
    out
}

/// Find the version captured by the first group of `pattern`.
pub(crate) fn find_pattern(contents: &str, pattern: &regex::Regex) -> Option<String> {
    let captures = pattern.captures(contents)?;
    captures
        .get(1)
        .or_else(|| captures.get(0))
        .map(|m| m.as_str().to_string())
}

/// Replace the first group of the first match of `pattern`.
pub(crate) fn replace_pattern(
    contents: &str,
    pattern: &regex::Regex,
    new_version: &str,
) -> Option<String> {
    let captures = pattern.captures(contents)?;
    let m = captures.get(1).or_else(|| captures.get(0))?;
    Some(splice(contents, m.range(), new_version))
}

/// A version reader and writer for one file grammar.
pub trait VersionHandler: std::fmt::Debug + Send + Sync {
    fn file_type(&self) -> FileType;

    /// Is `locator` a valid way of addressing a version in this grammar?
    fn supports(&self, locator: &Locator) -> bool;

    /// Find the current version in `contents`.
    ///
    /// Returns `Ok(None)` if the locator does not resolve.
    ///
    /// # Errors
    /// When the contents cannot be parsed or the locator is not supported.
    fn find_version(&self, contents: &str, locator: &Locator) -> Result<Option<String>, Error>;

    /// Return `contents` with the version at `locator` replaced by `new_version`.
    ///
    /// Returns `Ok(None)` if the locator does not resolve. Nothing is ever inserted.
    ///
    /// # Errors
    /// When the contents cannot be parsed or serialized or the locator is not supported.
    fn replace_version(
        &self,
        contents: &str,
        locator: &Locator,
        new_version: &str,
    ) -> Result<Option<String>, Error>;

    /// Read the current version from the file at `path`.
    ///
    /// Missing files, unresolved locators and parse failures are logged and reported as `None`.
    fn read_version(&self, path: &Path, locator: &Locator) -> Option<String> {
        let contents = match read_file(path) {
            Ok(Some(contents)) => contents,
            Ok(None) => {
                tracing::warn!(?path, "{} not found", path.display());
                return None;
            }
            Err(err) => {
                tracing::error!(?path, "error reading version: {err}");
                return None;
            }
        };
        match self.find_version(&contents, locator) {
            Ok(Some(version)) => {
                tracing::debug!(?path, %locator, version, "found version");
                Some(version)
            }
            Ok(None) => {
                tracing::warn!(?path, %locator, "version not found");
                None
            }
            Err(err) => {
                tracing::error!(?path, "error reading version: {err}");
                None
            }
        }
    }

    /// Replace the version in the file at `path`.
    ///
    /// Returns `true` only if the version was located and the file contents changed.
    fn update_version(&self, path: &Path, locator: &Locator, new_version: &str) -> bool {
        match update_file(self, path, locator, new_version, false) {
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(err) => {
                tracing::error!(?path, "error updating version: {err}");
                false
            }
        }
    }
}

/// The old and new contents of a file that was (or would be) modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    pub before: String,
    pub after: String,
}

impl Modification {
    /// A unified diff of the change, if anything changed.
    #[must_use]
    pub fn diff(&self, path: &Path) -> Option<String> {
        if self.before == self.after {
            return None;
        }
        let label_before = format!("{} (before)", path.display());
        let label_after = format!("{} (after)", path.display());
        let diff = similar_asserts::SimpleDiff::from_str(
            &self.before,
            &self.after,
            &label_before,
            &label_after,
        );
        Some(diff.to_string())
    }
}

pub(crate) fn read_file(path: &Path) -> Result<Option<String>, IoError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(IoError::new(source, path)),
    }
}

/// Replace the version in the file at `path`, writing the result unless `dry_run`.
///
/// Returns the modification if the file contents changed.
///
/// # Errors
/// When the file cannot be read, parsed, serialized or written.
pub fn update_file<H>(
    handler: &H,
    path: &Path,
    locator: &Locator,
    new_version: &str,
    dry_run: bool,
) -> Result<Option<Modification>, Error>
where
    H: VersionHandler + ?Sized,
{
    let Some(before) = read_file(path)? else {
        tracing::warn!(?path, "{} not found", path.display());
        return Ok(None);
    };
    let Some(after) = handler.replace_version(&before, locator, new_version)? else {
        tracing::warn!(
            ?path,
            %locator,
            file_type = %handler.file_type(),
            "version not found, file left unchanged"
        );
        return Ok(None);
    };
    if before == after {
        tracing::info!(?path, version = new_version, "already up to date");
        return Ok(None);
    }
    if !dry_run {
        std::fs::write(path, &after).map_err(|source| IoError::new(source, path))?;
    }
    tracing::info!(?path, version = new_version, dry_run, "updated version");
    Ok(Some(Modification { before, after }))
}

/// Maps format tags to their handlers.
#[derive(Debug)]
pub struct Registry {
    handlers: IndexMap<FileType, Box<dyn VersionHandler>>,
}

impl Default for Registry {
    /// A registry with a handler for every [`FileType`].
    fn default() -> Self {
        Self::empty()
            .with(python::PythonHandler)
            .with(toml::TomlHandler)
            .with(yaml::YamlHandler)
            .with(json::JsonHandler)
            .with(xml::XmlHandler)
            .with(dockerfile::DockerfileHandler)
            .with(makefile::MakefileHandler)
    }
}

impl Registry {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: IndexMap::new(),
        }
    }

    /// Register `handler` for its file type, replacing any previous handler.
    #[must_use]
    pub fn with(mut self, handler: impl VersionHandler + 'static) -> Self {
        self.handlers.insert(handler.file_type(), Box::new(handler));
        self
    }

    pub fn file_types(&self) -> impl Iterator<Item = FileType> + '_ {
        self.handlers.keys().copied()
    }

    /// Look up the handler for a format tag.
    ///
    /// # Errors
    /// When the tag is unknown or has no registered handler.
    pub fn resolve(&self, file_type: &str) -> Result<&dyn VersionHandler, UnsupportedFormatError> {
        let parsed: FileType = file_type.parse()?;
        self.handlers
            .get(&parsed)
            .map(AsRef::as_ref)
            .ok_or_else(|| UnsupportedFormatError(file_type.to_string()))
    }
}
